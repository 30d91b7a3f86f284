use anyhow::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Logs go to a file so tracing output never fights the terminal UI.
    let data_dir = sitefind::default_data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let appender = tracing_appender::rolling::never(&data_dir, "sitefind.log");
    let (writer, _guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    sitefind::run()
}
