use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use heliport_core::utils::{format_passengers, format_price};

use crate::app::{App, BookingField, BookingForm, Catalog};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let form = &app.booking.view().form;
    render_form(frame, form, &app.catalog, chunks[0]);
    render_summary(frame, form, &app.catalog, chunks[1]);
}

fn field_value(form: &BookingForm, catalog: &Catalog, field: BookingField) -> String {
    let editing = form.editing && form.focus == field;
    match field {
        BookingField::Route => form
            .route
            .and_then(|i| catalog.routes.get(i))
            .map(|r| r.summary())
            .unwrap_or_else(|| "Custom route".to_string()),
        BookingField::Helicopter => form
            .helicopter
            .and_then(|i| catalog.helicopters.get(i))
            .map(|h| h.label())
            .unwrap_or_else(|| "Any available".to_string()),
        BookingField::Passengers => format_passengers(form.passengers),
        BookingField::Date if form.date.is_empty() && !editing => "YYYY-MM-DD".to_string(),
        BookingField::Time if form.time.is_empty() && !editing => "HH:MM".to_string(),
        other => form.text(other).to_string(),
    }
}

fn render_form(frame: &mut Frame, form: &BookingForm, catalog: &Catalog, area: Rect) {
    let mut lines = vec![Line::from("")];

    for field in BookingField::ALL {
        let focused = form.focus == field;

        if field == BookingField::Submit {
            lines.push(Line::from(""));
            let label = if form.submitting {
                "  Submitting...  "
            } else if focused {
                " ▶ Submit Booking Request ◀ "
            } else {
                "   Submit Booking Request   "
            };
            let style = if focused {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            lines.push(Line::from(vec![
                Span::raw("   ["),
                Span::styled(label, style),
                Span::raw("]"),
            ]));
            continue;
        }

        let value = field_value(form, catalog, field);
        let value_style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let decorated = match (field.is_text(), focused, form.editing) {
            (true, true, true) => format!("{}▌", value),
            (false, true, _) => format!("◀ {} ▶", value),
            _ => value,
        };

        lines.push(Line::from(vec![
            Span::styled(format!("  {:<15}", field.label()), styles::muted_style()),
            Span::styled(decorated, value_style),
        ]));
    }

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    }

    let block = Block::default()
        .title(" Book Your Flight ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_summary(frame: &mut Frame, form: &BookingForm, catalog: &Catalog, area: Rect) {
    let mut lines = vec![Line::from(Span::styled("Flight Summary", styles::title_style())), Line::from("")];

    match form.route.and_then(|i| catalog.routes.get(i)) {
        Some(route) => {
            lines.push(Line::from(route.label()));
            let total = route.price_per_person * f64::from(form.passengers);
            lines.push(Line::from(vec![
                Span::styled("Estimated fare: ", styles::highlight_style()),
                Span::raw(format_price(total)),
            ]));
        }
        None => lines.push(Line::from(Span::styled(
            "Pick a route for an estimated fare, or enter your own departure and destination.",
            styles::muted_style(),
        ))),
    }

    if let Some(heli) = form.helicopter.and_then(|i| catalog.helicopters.get(i)) {
        lines.push(Line::from(""));
        lines.push(Line::from(heli.label()));
        if form.passengers > heli.capacity {
            lines.push(Line::from(Span::styled(
                format!("Only {} seats on this helicopter", heli.capacity),
                styles::error_style(),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "We'll contact you within 24 hours to confirm your flight details.",
        styles::muted_style(),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}
