use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use heliport_core::auth::{decide, Decision, SessionState};

use crate::app::{App, AppState, Screen};

use super::screens::{auth, booking, dashboard, home, routes};
use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title bar
            Constraint::Length(2), // Screens
            Constraint::Min(10),   // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Heliport - Helicopter Taxi";
    let user = match app.store.state() {
        SessionState::Loading => "Checking session...".to_string(),
        SessionState::Authenticated(session) => session.display_label().to_string(),
        SessionState::Unauthenticated => "[a] Sign in".to_string(),
    };
    let right = format!("{}  [?] Help ", user);
    let padding = title_padding(area.width, title, &right);

    let line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(padding)),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());
    frame.render_widget(Paragraph::new(line).block(block), area);
}

/// Spaces between the left and right parts of the title bar, counted in
/// characters so names outside ASCII line up.
fn title_padding(width: u16, left: &str, right: &str) -> usize {
    (width as usize).saturating_sub(left.chars().count() + right.chars().count())
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let tabs = [
        ("[1] Home", Screen::Home),
        ("[2] Routes", Screen::Routes),
        ("[3] Book", Screen::Booking),
        ("[4] Dashboard", Screen::Dashboard),
    ];

    let mut spans = vec![Span::raw(" ")];
    for (i, (label, screen)) in tabs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        spans.push(Span::styled(*label, styles::tab_style(app.screen == *screen)));
    }
    if app.screen == Screen::Auth {
        spans.push(Span::styled(" | ", styles::muted_style()));
        spans.push(Span::styled(Screen::Auth.title(), styles::tab_style(true)));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    if app.screen.is_protected() {
        match decide(app.store.state()) {
            Decision::Placeholder => {
                render_placeholder(frame, area, "Checking your session...");
                return;
            }
            // The app switches to sign-in on its next tick
            Decision::Redirect => {
                render_placeholder(frame, area, "Sign in required");
                return;
            }
            Decision::Render => {}
        }
    }

    match app.screen {
        Screen::Home => home::render(frame, app, area),
        Screen::Routes => routes::render(frame, app, area),
        Screen::Booking => booking::render(frame, app, area),
        Screen::Dashboard => dashboard::render(frame, app, area),
        Screen::Auth => auth::render(frame, app, area),
    }
}

/// Neutral content shown while the session is unresolved
pub fn render_placeholder(frame: &mut Frame, area: Rect, message: &str) {
    let y = area.y + area.height / 2;
    let line_area = Rect::new(area.x, y, area.width, 1);
    let paragraph = Paragraph::new(Span::styled(message, styles::muted_style()))
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, line_area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.screen {
        Screen::Routes => "[Enter] book route | [r]eload | [q]uit",
        Screen::Booking => "[Enter] edit/submit | [←/→] choose | [q]uit",
        Screen::Dashboard => "[b]ook | [r]eload | [o] sign out | [q]uit",
        Screen::Auth => "[Tab] next field | [Ctrl+T] sign in/up | [Esc] back",
        Screen::Home if app.is_authenticated() => "[o] sign out | [q]uit",
        Screen::Home => "[a] sign in | [q]uit",
    };

    let left = app
        .status_message
        .as_ref()
        .map(|msg| format!(" {} ", msg))
        .unwrap_or_default();
    let right = format!(" {} ", shortcuts);
    let padding = (area.width as usize)
        .saturating_sub(left.chars().count())
        .saturating_sub(right.chars().count());

    let line = Line::from(vec![
        Span::styled(left, styles::highlight_style()),
        Span::raw(" ".repeat(padding)),
        Span::styled(right, styles::muted_style()),
    ]);
    frame.render_widget(Paragraph::new(line).style(styles::status_bar_style()), area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 24, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");
    let lines = vec![
        Line::from(Span::styled("  Heliport", styles::title_style())),
        Line::from(Span::styled(format!("  version {}", version), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-4", "Home / Routes / Book / Dashboard"),
        help_line("a", "Sign in or create an account"),
        help_line("↑/↓ Tab", "Move between items and fields"),
        help_line("Esc", "Go back"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("r", "Reload the current screen"),
        help_line("o", "Sign out"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled(" Booking", styles::highlight_style())),
        help_line("Enter", "Edit field / submit request"),
        help_line("←/→", "Choose route, helicopter, passengers"),
        Line::from(""),
        Line::from(Span::styled(" Routes", styles::highlight_style())),
        help_line("Tab", "Switch between routes and fleet"),
        help_line("Enter", "Book the selected route"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());
    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(40, 6, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_padding_counts_characters() {
        // "Zoë Ångström" is 12 characters but 15 bytes
        let right = "Zoë Ångström";
        assert_eq!(title_padding(40, "  Heliport", right), 40 - 10 - 12);
        assert_eq!(title_padding(5, "  Heliport", right), 0);
    }

    #[test]
    fn test_centered_rect_fits_inside_area() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered_rect_fixed(10, 4, area), Rect::new(5, 3, 10, 4));
        assert_eq!(centered_rect_fixed(30, 20, area), Rect::new(0, 0, 20, 10));
    }
}
