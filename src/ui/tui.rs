//! Ratatui event loop wiring the trigger and the search overlay together.
//!
//! One UI thread polls crossterm events on a short tick and drains pipeline
//! resolutions between ticks; all index work happens on the tokio runtime
//! handed to the pipeline, so nothing here blocks.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;

use crate::config::{Config, Theme};
use crate::index::IndexHandle;
use crate::index::bundle::BundleIndex;
use crate::overlay::pipeline::{Resolution, SearchPipeline};
use crate::overlay::{DialogEvent, OpenState, Overlay};
use crate::ui::components::theme::ThemePalette;
use crate::ui::hotkeys::HotkeyRegistry;
use crate::ui::trigger::Trigger;
use crate::ui::view::{self, Screen, UiRects};

const TICK: Duration = Duration::from_millis(30);

pub fn run_tui(cfg: Config, bundle_override: Option<PathBuf>, once: bool) -> Result<()> {
    let bundle_path = bundle_override
        .or_else(|| cfg.bundle.clone())
        .unwrap_or_else(crate::default_bundle_path);

    if once {
        return run_once(&cfg, bundle_path);
    }

    let rt = tokio::runtime::Runtime::new()?;

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut hotkeys = HotkeyRegistry::default();
    let res = event_loop(
        &mut terminal,
        &cfg,
        bundle_path,
        rt.handle().clone(),
        &mut hotkeys,
    );
    teardown_terminal()?;
    res
}

struct App {
    open: OpenState,
    overlay: Overlay,
    selected: ListState,
    theme_dark: bool,
    status: String,
    site: Option<String>,
}

impl App {
    fn dismiss(&mut self, event: DialogEvent) {
        self.open.apply(event);
        if !self.open.is_open() {
            self.overlay.on_close();
        }
    }
}

fn event_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    cfg: &Config,
    bundle_path: PathBuf,
    rt: tokio::runtime::Handle,
    hotkeys: &mut HotkeyRegistry,
) -> Result<()> {
    let handle = Arc::new(IndexHandle::new(Arc::new(BundleIndex::new(&bundle_path))));
    let (pipeline, mut resolutions) =
        SearchPipeline::new(handle, Duration::from_millis(cfg.debounce_ms), rt);

    let trigger = Trigger::mount(hotkeys, "Search");

    let mut app = App {
        open: OpenState::default(),
        overlay: Overlay::new(cfg.reset_on_close),
        selected: ListState::default(),
        theme_dark: matches!(cfg.theme, Theme::Dark),
        status: format!("bundle: {}", bundle_path.display()),
        site: cfg.site.clone(),
    };

    // A terminal failure must not skip the unmount below.
    let res = run_loop(terminal, &pipeline, &mut resolutions, hotkeys, &trigger, &mut app);
    trigger.unmount(hotkeys);
    res
}

fn run_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    pipeline: &SearchPipeline,
    resolutions: &mut tokio::sync::mpsc::UnboundedReceiver<Resolution>,
    hotkeys: &HotkeyRegistry,
    trigger: &Trigger,
    app: &mut App,
) -> Result<()> {
    let mut rects = UiRects::default();
    let mut needs_draw = true;

    'outer: loop {
        while let Ok(res) = resolutions.try_recv() {
            if app.overlay.commit(res.token, res.items) {
                let first = (!app.overlay.items().is_empty()).then_some(0);
                app.selected.select(first);
                needs_draw = true;
            }
        }

        if needs_draw {
            draw(terminal, trigger, app, &mut rects)?;
            needs_draw = false;
        }

        if !event::poll(TICK)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                // The global shortcut is consumed here and never forwarded
                // to the focused input.
                if let Some(ev) = trigger.on_key(hotkeys, &key) {
                    if app.open.is_open() {
                        app.dismiss(ev);
                    } else {
                        app.open.apply(ev);
                    }
                    needs_draw = true;
                } else if app.open.is_open() {
                    needs_draw = on_overlay_key(&key, app, pipeline);
                } else {
                    match key.code {
                        KeyCode::Esc | KeyCode::Char('q') => break 'outer,
                        KeyCode::F(2) => {
                            app.theme_dark = !app.theme_dark;
                            needs_draw = true;
                        }
                        _ => {}
                    }
                }
            }
            Event::Mouse(m) => {
                if let MouseEventKind::Down(MouseButton::Left) = m.kind {
                    if app.open.is_open() {
                        if let Some(ev) = view::outside_press(rects.panel, m.column, m.row) {
                            app.dismiss(ev);
                            needs_draw = true;
                        }
                    } else if let Some(ev) = trigger.on_click(rects.button, m.column, m.row) {
                        app.open.apply(ev);
                        needs_draw = true;
                    }
                }
            }
            Event::Resize(_, _) => needs_draw = true,
            _ => {}
        }
    }

    Ok(())
}

fn draw<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    trigger: &Trigger,
    app: &mut App,
    rects: &mut UiRects,
) -> Result<()> {
    let palette = if app.theme_dark {
        ThemePalette::dark()
    } else {
        ThemePalette::light()
    };
    terminal.draw(|f| {
        let mut screen = Screen {
            open: app.open,
            overlay: &app.overlay,
            trigger_label: trigger.label(),
            palette,
            selected: &mut app.selected,
            status: &app.status,
        };
        view::draw(f, &mut screen, rects);
    })?;
    Ok(())
}

/// Key handling while the dialog is open. Returns whether a redraw is due.
fn on_overlay_key(key: &KeyEvent, app: &mut App, pipeline: &SearchPipeline) -> bool {
    match key.code {
        // The platform dismiss signal funnels through the same close path
        // as the outside click.
        KeyCode::Esc => {
            app.dismiss(DialogEvent::NativeClose);
            true
        }
        KeyCode::Backspace => {
            let mut q = app.overlay.query().to_owned();
            if q.pop().is_none() {
                return false;
            }
            let token = pipeline.issue(&q);
            app.overlay.set_query(q, token);
            app.selected.select(None);
            true
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let mut q = app.overlay.query().to_owned();
            q.push(c);
            let token = pipeline.issue(&q);
            app.overlay.set_query(q, token);
            app.selected.select(None);
            true
        }
        KeyCode::Up => {
            move_selection(app, -1);
            true
        }
        KeyCode::Down => {
            move_selection(app, 1);
            true
        }
        KeyCode::Enter => {
            open_selected(app);
            true
        }
        _ => false,
    }
}

fn move_selection(app: &mut App, delta: isize) {
    let len = app.overlay.items().len();
    if len == 0 {
        return;
    }
    let current = app.selected.selected().unwrap_or(0) as isize;
    let next = (current + delta).rem_euclid(len as isize) as usize;
    app.selected.select(Some(next));
}

/// Open the selected result's link with the platform opener.
fn open_selected(app: &mut App) {
    let Some(idx) = app.selected.selected() else {
        return;
    };
    let Some(item) = app.overlay.items().get(idx) else {
        return;
    };
    let url = match &app.site {
        Some(base) => format!("{}{}", base.trim_end_matches('/'), item.url),
        None => item.url.clone(),
    };
    let opener = std::env::var("BROWSER").unwrap_or_else(|_| {
        if cfg!(target_os = "macos") {
            "open".into()
        } else {
            "xdg-open".into()
        }
    });
    match std::process::Command::new(&opener)
        .arg(&url)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
    {
        Ok(mut child) => {
            // Reap off-thread; an unwaited child lingers as a zombie.
            std::thread::spawn(move || {
                let _ = child.wait();
            });
            app.status = format!("opened {url}");
        }
        Err(e) => {
            tracing::warn!(url = %url, opener = %opener, error = %e, "failed to open link");
            app.status = format!("could not open {url}: {e}");
        }
    }
}

/// Headless single-frame render plus one real index round-trip. CI-friendly:
/// touches neither raw mode nor the alternate screen.
fn run_once(cfg: &Config, bundle_path: PathBuf) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let handle = Arc::new(IndexHandle::new(Arc::new(BundleIndex::new(&bundle_path))));
    rt.block_on(async {
        let index = handle.ensure_ready().await?;
        let matches = index.search("a").await?.unwrap_or_default();
        tracing::info!(matches = matches.len(), "headless search round-trip");
        anyhow::Ok(())
    })?;

    let backend = ratatui::backend::TestBackend::new(80, 24);
    let mut terminal = Terminal::new(backend)?;
    let mut hotkeys = HotkeyRegistry::default();
    let trigger = Trigger::mount(&mut hotkeys, "Search");
    let mut app = App {
        open: OpenState::default(),
        overlay: Overlay::new(cfg.reset_on_close),
        selected: ListState::default(),
        theme_dark: matches!(cfg.theme, Theme::Dark),
        status: String::new(),
        site: cfg.site.clone(),
    };
    app.open.apply(DialogEvent::Activate);
    let mut rects = UiRects::default();
    let drawn = draw(&mut terminal, &trigger, &mut app, &mut rects);
    trigger.unmount(&mut hotkeys);
    drawn?;

    println!("ok: bundle at {}", bundle_path.display());
    Ok(())
}

fn teardown_terminal() -> Result<()> {
    let mut stdout = io::stdout();
    disable_raw_mode()?;
    execute!(stdout, LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ResultItem;
    use crate::overlay::pipeline::QueryToken;

    fn app() -> App {
        App {
            open: OpenState::default(),
            overlay: Overlay::new(false),
            selected: ListState::default(),
            theme_dark: true,
            status: String::new(),
            site: None,
        }
    }

    #[test]
    fn dismiss_runs_overlay_close_hook() {
        let mut app = App {
            overlay: Overlay::new(true),
            ..app()
        };
        app.open.apply(DialogEvent::Activate);
        app.overlay.set_query("rust".into(), QueryToken::from_raw(1));

        app.dismiss(DialogEvent::OutsideClick);
        assert!(!app.open.is_open());
        assert_eq!(app.overlay.query(), "", "reset_on_close clears the query");
    }

    /// Backend whose draw always fails, standing in for a broken terminal.
    struct FailingBackend;

    impl ratatui::backend::Backend for FailingBackend {
        fn draw<'a, I>(&mut self, _content: I) -> io::Result<()>
        where
            I: Iterator<Item = (u16, u16, &'a ratatui::buffer::Cell)>,
        {
            Err(io::Error::other("terminal went away"))
        }
        fn hide_cursor(&mut self) -> io::Result<()> {
            Ok(())
        }
        fn show_cursor(&mut self) -> io::Result<()> {
            Ok(())
        }
        fn get_cursor_position(&mut self) -> io::Result<ratatui::layout::Position> {
            Ok(ratatui::layout::Position::ORIGIN)
        }
        fn set_cursor_position<P: Into<ratatui::layout::Position>>(
            &mut self,
            _position: P,
        ) -> io::Result<()> {
            Ok(())
        }
        fn clear(&mut self) -> io::Result<()> {
            Ok(())
        }
        fn size(&self) -> io::Result<ratatui::layout::Size> {
            Ok(ratatui::layout::Size::new(80, 24))
        }
        fn window_size(&mut self) -> io::Result<ratatui::backend::WindowSize> {
            Err(io::Error::other("unsupported"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn terminal_failure_releases_the_shortcut() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut terminal = Terminal::new(FailingBackend).unwrap();
        let mut hotkeys = HotkeyRegistry::default();

        let res = event_loop(
            &mut terminal,
            &Config::default(),
            PathBuf::from("missing-bundle.json"),
            rt.handle().clone(),
            &mut hotkeys,
        );

        assert!(res.is_err());
        assert!(hotkeys.is_empty(), "shortcut binding must not leak");
    }

    #[test]
    fn open_selected_reports_the_opened_url() {
        // `true` exits immediately; the reaper thread waits it out.
        unsafe { std::env::set_var("BROWSER", "true") };
        let mut app = app();
        app.site = Some("https://example.org/".into());
        let token = QueryToken::from_raw(1);
        app.overlay.set_query("a".into(), token);
        assert!(app.overlay.commit(
            token,
            vec![ResultItem {
                url: "/a/".into(),
                title: "A".into(),
                excerpt: String::new(),
            }],
        ));
        app.selected.select(Some(0));

        open_selected(&mut app);
        assert_eq!(app.status, "opened https://example.org/a/");
    }

    #[test]
    fn selection_wraps_both_directions() {
        let mut app = app();
        app.open.apply(DialogEvent::Activate);
        let token = QueryToken::from_raw(1);
        app.overlay.set_query("x".into(), token);
        let item = |url: &str| ResultItem {
            url: url.into(),
            title: url.into(),
            excerpt: String::new(),
        };
        assert!(app.overlay.commit(token, vec![item("/a/"), item("/b/")]));

        app.selected.select(Some(0));
        move_selection(&mut app, -1);
        assert_eq!(app.selected.selected(), Some(1));
        move_selection(&mut app, 1);
        assert_eq!(app.selected.selected(), Some(0));
    }
}
