//! Rendering: home screen, trigger button, and the overlay panel.
//!
//! Drawing records the rects that event handling needs (the trigger button
//! and the overlay's content box) into [`UiRects`]; hit-testing against
//! geometry that has never been rendered is a no-op.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};

use crate::overlay::{DialogEvent, OpenState, Overlay, Phase};
use crate::ui::components::theme::ThemePalette;
use crate::ui::trigger::SHORTCUT_LABEL;

/// Geometry recorded during the last draw.
#[derive(Debug, Default, Clone, Copy)]
pub struct UiRects {
    pub button: Option<Rect>,
    pub panel: Option<Rect>,
}

pub struct Screen<'a> {
    pub open: OpenState,
    pub overlay: &'a Overlay,
    pub trigger_label: &'a str,
    pub palette: ThemePalette,
    pub selected: &'a mut ListState,
    pub status: &'a str,
}

pub fn footer_legend() -> &'static str {
    "Ctrl+K search | F2 theme | Enter open link | Esc close/quit"
}

/// Pointer press routed while the dialog is open: outside the panel's
/// content box closes, inside is a no-op, unknown geometry is a no-op.
pub fn outside_press(panel: Option<Rect>, column: u16, row: u16) -> Option<DialogEvent> {
    let panel = panel?;
    (!panel.contains(Position::new(column, row))).then_some(DialogEvent::OutsideClick)
}

pub fn draw(f: &mut Frame, screen: &mut Screen, rects: &mut UiRects) {
    let palette = screen.palette;
    let area = f.area();
    f.render_widget(
        Block::default().style(Style::default().bg(palette.bg).fg(palette.fg)),
        area,
    );

    let [header, body, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(area);

    rects.button = Some(draw_header(f, header, screen.trigger_label, palette));
    draw_body(f, body, screen.status, palette);
    f.render_widget(
        Paragraph::new(footer_legend()).style(palette.hint_style()),
        footer,
    );

    if screen.open.is_open() {
        rects.panel = Some(draw_overlay(f, area, screen));
    } else {
        rects.panel = None;
    }
}

/// Header bar with the site title and the trigger button; returns the
/// button's rect for click routing.
fn draw_header(f: &mut Frame, area: Rect, label: &str, palette: ThemePalette) -> Rect {
    let button_text = format!("[ {label} ({SHORTCUT_LABEL}) ]");
    let button_width = button_text.chars().count() as u16;
    let [title, button] =
        Layout::horizontal([Constraint::Min(1), Constraint::Length(button_width)]).areas(area);

    f.render_widget(Paragraph::new("~ sitefind").style(palette.title()), title);
    f.render_widget(
        Paragraph::new(button_text).style(
            Style::default()
                .fg(palette.bg)
                .bg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
        button,
    );
    button
}

fn draw_body(f: &mut Frame, area: Rect, status: &str, palette: ThemePalette) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "A static site, searched from the terminal.",
            palette.text(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Press {SHORTCUT_LABEL} or click the button to search."),
            palette.hint_style(),
        )),
    ];
    if !status.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(status.to_owned(), palette.hint_style())));
    }
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

/// Panel geometry: centered horizontally, anchored at the upper third.
/// Never larger than the frame, even below the preferred minimum size.
pub fn panel_rect(area: Rect) -> Rect {
    let width = area.width.saturating_sub(8).clamp(20, 72).min(area.width);
    let height = area.height.saturating_sub(4).clamp(5, 18).min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + area.height / 3;
    let y = y.min(area.bottom().saturating_sub(height));
    Rect::new(x, y, width, height)
}

fn draw_overlay(f: &mut Frame, area: Rect, screen: &mut Screen) -> Rect {
    let palette = screen.palette;
    dim_backdrop(f, area);

    let panel = panel_rect(area);
    f.render_widget(Clear, panel);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border_focus))
        .style(Style::default().bg(palette.surface).fg(palette.fg))
        .title(Span::styled(" Search ", palette.title()));
    let inner = block.inner(panel);
    f.render_widget(block, panel);

    let [input, results] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).areas(inner);

    let query = screen.overlay.query();
    if query.is_empty() {
        f.render_widget(
            Paragraph::new("Search...").style(palette.hint_style()),
            input,
        );
    } else {
        f.render_widget(
            Paragraph::new(format!("{query}█")).style(palette.text()),
            input,
        );
    }

    match screen.overlay.phase(screen.open) {
        Phase::Closed => {}
        Phase::Idle => f.render_widget(
            Paragraph::new("Type to search the site.").style(palette.hint_style()),
            results,
        ),
        Phase::Searching => f.render_widget(
            Paragraph::new("Loading...").style(palette.hint_style()),
            results,
        ),
        Phase::Empty => f.render_widget(
            Paragraph::new(format!("No results for \"{query}\"")).style(palette.hint_style()),
            results,
        ),
        Phase::Results => {
            let items: Vec<ListItem> = screen
                .overlay
                .items()
                .iter()
                .map(|item| {
                    ListItem::new(vec![
                        Line::from(Span::styled(item.title.clone(), palette.title())),
                        Line::from(Span::styled(item.url.clone(), palette.hint_style())),
                        excerpt_line(&item.excerpt, palette),
                    ])
                })
                .collect();
            let list = List::new(items)
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
                .highlight_symbol("> ");
            f.render_stateful_widget(list, results, screen.selected);
        }
    }

    panel
}

fn dim_backdrop(f: &mut Frame, area: Rect) {
    let buf = f.buffer_mut();
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            if let Some(cell) = buf.cell_mut(Position::new(x, y)) {
                cell.set_style(Style::default().add_modifier(Modifier::DIM));
            }
        }
    }
}

/// Render a `<mark>`-highlighted, HTML-escaped excerpt as styled spans.
pub fn excerpt_line(excerpt: &str, palette: ThemePalette) -> Line<'static> {
    let mut spans = Vec::new();
    let mut rest = excerpt;
    loop {
        match rest.find("<mark>") {
            Some(open) => {
                if open > 0 {
                    spans.push(Span::styled(unescape_html(&rest[..open]), palette.text()));
                }
                let after_open = &rest[open + "<mark>".len()..];
                match after_open.find("</mark>") {
                    Some(close) => {
                        spans.push(Span::styled(
                            unescape_html(&after_open[..close]),
                            palette.marked(),
                        ));
                        rest = &after_open[close + "</mark>".len()..];
                    }
                    None => {
                        // Unbalanced fragment; show the remainder as-is.
                        spans.push(Span::styled(unescape_html(after_open), palette.text()));
                        break;
                    }
                }
            }
            None => {
                if !rest.is_empty() {
                    spans.push(Span::styled(unescape_html(rest), palette.text()));
                }
                break;
            }
        }
    }
    Line::from(spans)
}

fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outside_press_geometry() {
        let panel = Rect::new(10, 5, 40, 10);
        // Strictly inside: no-op.
        assert_eq!(outside_press(Some(panel), 20, 8), None);
        // Strictly outside (backdrop): closes.
        assert_eq!(
            outside_press(Some(panel), 2, 2),
            Some(DialogEvent::OutsideClick)
        );
        assert_eq!(
            outside_press(Some(panel), 20, 20),
            Some(DialogEvent::OutsideClick)
        );
        // Panel never rendered: no-op rather than erroring.
        assert_eq!(outside_press(None, 2, 2), None);
    }

    #[test]
    fn panel_rect_stays_within_area() {
        let area = Rect::new(0, 0, 100, 30);
        let panel = panel_rect(area);
        assert!(panel.right() <= area.right());
        assert!(panel.bottom() <= area.bottom());
        assert_eq!(panel.y, 10);

        let tiny = panel_rect(Rect::new(0, 0, 24, 6));
        assert!(tiny.width >= 16);

        // Frames smaller than the preferred minimum still get a panel that fits.
        for (w, h) in [(12, 4), (3, 2), (1, 1), (0, 0)] {
            let area = Rect::new(0, 0, w, h);
            let panel = panel_rect(area);
            assert!(panel.right() <= area.right(), "{w}x{h}: {panel:?}");
            assert!(panel.bottom() <= area.bottom(), "{w}x{h}: {panel:?}");
        }
    }

    #[test]
    fn open_overlay_renders_on_a_tiny_terminal() {
        use ratatui::{Terminal, backend::TestBackend};

        let mut overlay = Overlay::new(false);
        let token = crate::overlay::pipeline::QueryToken::from_raw(1);
        overlay.set_query("rust".into(), token);
        let mut open = OpenState::default();
        open.apply(DialogEvent::Activate);

        let mut terminal = Terminal::new(TestBackend::new(12, 4)).unwrap();
        let mut selected = ListState::default();
        let mut rects = UiRects::default();
        terminal
            .draw(|f| {
                let mut screen = Screen {
                    open,
                    overlay: &overlay,
                    trigger_label: "Search",
                    palette: ThemePalette::dark(),
                    selected: &mut selected,
                    status: "",
                };
                draw(f, &mut screen, &mut rects);
            })
            .unwrap();

        let panel = rects.panel.unwrap();
        let area = Rect::new(0, 0, 12, 4);
        assert!(panel.right() <= area.right());
        assert!(panel.bottom() <= area.bottom());
    }

    #[test]
    fn excerpt_line_splits_marks_and_unescapes() {
        let palette = ThemePalette::dark();
        let line = excerpt_line("a &amp; <mark>rust</mark> tail", palette);
        let texts: Vec<String> = line.spans.iter().map(|s| s.content.to_string()).collect();
        assert_eq!(texts, vec!["a & ", "rust", " tail"]);
        assert_eq!(line.spans[1].style, palette.marked());
    }

    #[test]
    fn excerpt_line_tolerates_unbalanced_mark() {
        let palette = ThemePalette::dark();
        let line = excerpt_line("<mark>dangling", palette);
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].content, "dangling");
    }
}
