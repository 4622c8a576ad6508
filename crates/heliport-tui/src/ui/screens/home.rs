use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

const SERVICES: [(&str, &str); 4] = [
    ("Safety First", "Rigorous maintenance and certified pilots"),
    ("On-Time Guarantee", "Punctual departures, no traffic"),
    ("Luxury Experience", "Premium interiors and headsets"),
    ("24/7 Support", "Concierge for bookings and changes"),
];

const SERVICE_AREAS: [&str; 8] = [
    "Manhattan",
    "Brooklyn",
    "Queens",
    "Bronx",
    "JFK Airport",
    "LaGuardia",
    "The Hamptons",
    "Newark",
];

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("  Elite Helicopter Taxi Service", styles::title_style())),
        Line::from(Span::styled(
            "  Skip the traffic, embrace the sky.",
            styles::muted_style(),
        )),
        Line::from(""),
    ];

    for (title, desc) in SERVICES {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<20}", title), styles::highlight_style()),
            Span::raw(desc),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("  Service Areas", styles::title_style())));
    lines.push(Line::from(format!("  {}", SERVICE_AREAS.join(" · "))));
    lines.push(Line::from(""));

    let next_step = match app.store.session() {
        Some(session) => format!(
            "  Welcome back, {}. Press 3 to book a flight or 4 for your dashboard.",
            session.display_label()
        ),
        None => "  Press 2 to explore routes or a to sign in.".to_string(),
    };
    lines.push(Line::from(Span::styled(next_step, styles::success_style())));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}
