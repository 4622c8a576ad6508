use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use heliport_core::utils::{format_duration, format_price, truncate_string};

use crate::app::{App, LoadState, RoutesFocus};
use crate::ui::render::render_placeholder;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    match app.catalog.load {
        LoadState::NotLoaded | LoadState::Loading if app.catalog.routes.is_empty() => {
            render_placeholder(frame, area, "Loading routes...");
            return;
        }
        LoadState::Failed(ref e) if app.catalog.routes.is_empty() => {
            render_placeholder(frame, area, &format!("Failed to load routes: {}  [r] retry", e));
            return;
        }
        _ => {}
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_route_list(frame, app, chunks[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);
    render_fleet_list(frame, app, right[0]);
    render_helicopter_detail(frame, app, right[1]);
}

fn render_route_list(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.routes.view();
    let width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = app
        .catalog
        .routes
        .iter()
        .enumerate()
        .map(|(i, route)| {
            let distance = route
                .distance_miles
                .map(|d| format!(" · {} mi", d))
                .unwrap_or_default();
            let lines = vec![
                Line::from(truncate_string(&route.label(), width)),
                Line::from(Span::styled(
                    format!(
                        "  {}{} · {} per person",
                        format_duration(route.duration_minutes),
                        distance,
                        format_price(route.price_per_person)
                    ),
                    styles::muted_style(),
                )),
            ];
            let style = if i == view.route_selection && view.focus == RoutesFocus::Routes {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(lines).style(style)
        })
        .collect();

    let block = Block::default()
        .title(format!(" Popular Routes ({}) ", app.catalog.routes.len()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(view.focus == RoutesFocus::Routes));

    let mut state = ListState::default();
    state.select(Some(view.route_selection));
    frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
}

fn render_fleet_list(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.routes.view();

    let items: Vec<ListItem> = app
        .catalog
        .helicopters
        .iter()
        .enumerate()
        .map(|(i, heli)| {
            let style = if i == view.fleet_selection && view.focus == RoutesFocus::Fleet {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(Line::from(heli.label())).style(style)
        })
        .collect();

    let block = Block::default()
        .title(format!(" Our Fleet ({}) ", app.catalog.helicopters.len()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(view.focus == RoutesFocus::Fleet));

    let mut state = ListState::default();
    state.select(Some(view.fleet_selection));
    frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
}

fn render_helicopter_detail(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let Some(heli) = app.catalog.helicopters.get(app.routes.view().fleet_selection) else {
        let empty = Paragraph::new(Span::styled(" No helicopters available", styles::muted_style()))
            .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(heli.name.clone(), styles::title_style())),
        Line::from(vec![
            Span::styled("Model: ", styles::highlight_style()),
            Span::raw(heli.model.clone()),
        ]),
        Line::from(vec![
            Span::styled("Capacity: ", styles::highlight_style()),
            Span::raw(format!("{} passengers", heli.capacity)),
        ]),
        Line::from(vec![
            Span::styled("Rate: ", styles::highlight_style()),
            Span::raw(heli.rate_display()),
        ]),
    ];
    if let Some(ref description) = heli.description {
        lines.push(Line::from(""));
        lines.push(Line::from(description.clone()));
    }
    let specs = heli.specification_rows();
    if !specs.is_empty() {
        lines.push(Line::from(""));
        for (label, value) in specs {
            lines.push(Line::from(vec![
                Span::styled(format!("{}: ", label), styles::muted_style()),
                Span::raw(value),
            ]));
        }
    }

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}
