pub mod config;
pub mod index;
pub mod overlay;
pub mod ui;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

use config::Config;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "sitefind",
    version,
    about = "Keyboard-invocable TUI search overlay over a prebuilt static search bundle"
)]
pub struct Cli {
    /// Path to the config file (defaults to the platform config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI
    Tui {
        /// Render once headlessly and exit (CI-friendly)
        #[arg(long, default_value_t = false)]
        once: bool,

        /// Override the search bundle path
        #[arg(long)]
        bundle: Option<PathBuf>,
    },
    /// Write a small sample bundle so the app is runnable out of the box
    DemoBundle {
        /// Where to write it (defaults to the platform data dir)
        path: Option<PathBuf>,
    },
    /// Generate shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate man page to stdout
    Man,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Tui { once, bundle } => ui::tui::run_tui(cfg, bundle, once),
        Commands::DemoBundle { path } => {
            let path = path.unwrap_or_else(default_bundle_path);
            index::bundle::write_demo_bundle(&path)?;
            println!("wrote demo bundle to {}", path.display());
            Ok(())
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "sitefind", &mut std::io::stdout());
            Ok(())
        }
        Commands::Man => {
            let cmd = Cli::command();
            let man = clap_mangen::Man::new(cmd);
            let mut out = std::io::stdout();
            man.render(&mut out)?;
            Ok(())
        }
    }
}

pub fn default_bundle_path() -> PathBuf {
    default_data_dir().join("bundle.json")
}

pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "sitefind", "sitefind")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
