use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use heliport_core::data::Dashboard;
use heliport_core::utils::{format_flight_when, format_passengers, format_price};

use crate::app::{App, LoadState};
use crate::ui::render::render_placeholder;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.dashboard.view();
    let Some(ref dashboard) = view.dashboard else {
        let message = match view.load {
            LoadState::Failed(ref e) => format!("{}  [r] retry", e),
            _ => "Loading your dashboard...".to_string(),
        };
        render_placeholder(frame, area, &message);
        return;
    };

    let email = app
        .store
        .session()
        .map(|s| s.email.clone())
        .unwrap_or_default();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(6)])
        .split(area);

    render_welcome(frame, dashboard, &email, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    render_recent_bookings(frame, dashboard, columns[0]);
    render_order_history(frame, dashboard, columns[1]);
}

fn render_welcome(frame: &mut Frame, dashboard: &Dashboard, email: &str, area: Rect) {
    let mut lines = vec![Line::from(vec![
        Span::raw("Welcome back, "),
        Span::styled(dashboard.greeting_name(email).to_string(), styles::highlight_style()),
    ])];
    if let Some(phone) = dashboard.profile.as_ref().and_then(|p| p.phone.as_deref()) {
        lines.push(Line::from(Span::styled(format!("{} · {}", email, phone), styles::muted_style())));
    } else {
        lines.push(Line::from(Span::styled(email.to_string(), styles::muted_style())));
    }

    let block = Block::default()
        .title(" Dashboard ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_recent_bookings(frame: &mut Frame, dashboard: &Dashboard, area: Rect) {
    let mut lines = Vec::new();
    if dashboard.recent_bookings.is_empty() {
        lines.push(Line::from(Span::styled("No bookings yet", styles::muted_style())));
        lines.push(Line::from(Span::styled("Press b to book your first flight", styles::muted_style())));
    }
    for booking in &dashboard.recent_bookings {
        lines.push(Line::from(vec![
            Span::raw(format!("{} → {}  ", booking.departure_point, booking.destination)),
            Span::styled(booking.status.display_name().to_string(), styles::status_style(&booking.status)),
        ]));
        lines.push(Line::from(Span::styled(
            format!(
                "  {} · {}",
                format_flight_when(&booking.flight_date, &booking.flight_time),
                format_passengers(booking.passengers)
            ),
            styles::muted_style(),
        )));
    }

    let block = Block::default()
        .title(" Recent Bookings ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_order_history(frame: &mut Frame, dashboard: &Dashboard, area: Rect) {
    let mut lines = Vec::new();
    if dashboard.order_history.is_empty() {
        lines.push(Line::from(Span::styled("No completed flights yet", styles::muted_style())));
    }
    for order in &dashboard.order_history {
        let amount = order.total_amount.map(format_price).unwrap_or_default();
        lines.push(Line::from(vec![
            Span::raw(format!("{} → {}  ", order.route_from, order.route_to)),
            Span::styled(order.status.display_name().to_string(), styles::status_style(&order.status)),
            Span::styled(format!("  {}", amount), styles::highlight_style()),
        ]));
        let helicopter = order
            .helicopter_used
            .as_deref()
            .map(|h| format!(" · {}", h))
            .unwrap_or_default();
        lines.push(Line::from(Span::styled(
            format!(
                "  {} · {}{}",
                format_flight_when(&order.flight_date, &order.flight_time),
                format_passengers(order.passengers),
                helicopter
            ),
            styles::muted_style(),
        )));
    }

    let block = Block::default()
        .title(" Order History ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
