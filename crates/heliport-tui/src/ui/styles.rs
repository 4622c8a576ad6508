use ratatui::style::{Color, Modifier, Style};

// Color palette
pub const SKY: Color = Color::Rgb(80, 150, 210);
pub const GOLD: Color = Color::Rgb(210, 170, 70);
pub const SUCCESS: Color = Color::Rgb(96, 160, 96);
pub const ERROR: Color = Color::Rgb(192, 64, 64);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const HIGHLIGHT: Color = Color::Rgb(48, 48, 64);

pub fn title_style() -> Style {
    Style::default().fg(SKY).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default().bg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(GOLD)
}

pub fn success_style() -> Style {
    Style::default().fg(SUCCESS)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(SKY)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(SKY)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(32, 32, 40)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default().fg(GOLD).add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

/// Color for a booking status badge
pub fn status_style(status: &heliport_core::data::BookingStatus) -> Style {
    use heliport_core::data::BookingStatus;
    match status {
        BookingStatus::Completed => success_style(),
        BookingStatus::Confirmed => Style::default().fg(SKY),
        BookingStatus::Pending => highlight_style(),
        BookingStatus::Cancelled => error_style(),
        BookingStatus::Other(_) => muted_style(),
    }
}
