use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AuthFocus, AuthMode};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

/// Width of the visible part of a text field
const FIELD_WIDTH: usize = 24;

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    // Show the tail of long input so the cursor stays visible
    let shown: String = {
        let count = value.chars().count();
        value.chars().skip(count.saturating_sub(FIELD_WIDTH)).collect()
    };
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::styled(format!("  {:<11}[", label), styles::muted_style()),
        Span::styled(format!("{:<width$}{}", shown, cursor, width = FIELD_WIDTH), style),
        Span::styled("]", styles::muted_style()),
    ])
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(session) = app.store.session() {
        let lines = vec![
            Line::from(""),
            Line::from(vec![
                Span::raw("  Signed in as "),
                Span::styled(session.display_label().to_string(), styles::highlight_style()),
            ]),
            Line::from(Span::styled("  Press 4 for your dashboard or o to sign out.", styles::muted_style())),
        ];
        frame.render_widget(Paragraph::new(lines), area);
        return;
    }

    let form = &app.auth_form;
    let height = if form.error.is_some() { 13 } else { 11 };
    let dialog = centered_rect_fixed(46, height, area);
    frame.render_widget(Clear, dialog);

    let (title, button) = match form.mode {
        AuthMode::SignIn => (" Sign In ", "Sign In"),
        AuthMode::SignUp => (" Create Account ", "Sign Up"),
    };

    let mut lines = vec![Line::from("")];
    if form.mode == AuthMode::SignUp {
        lines.push(field_line("Full name:", &form.full_name, form.focus == AuthFocus::FullName));
    }
    lines.push(field_line("Email:", &form.email, form.focus == AuthFocus::Email));
    let masked = "*".repeat(form.password.chars().count());
    lines.push(field_line("Password:", &masked, form.focus == AuthFocus::Password));
    lines.push(Line::from(""));

    let button_focused = form.focus == AuthFocus::Button;
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let button_text = if button_focused {
        format!(" ▶ {} ◀ ", button)
    } else {
        format!("   {}   ", button)
    };
    lines.push(Line::from(vec![
        Span::raw("              ["),
        Span::styled(button_text, button_style),
        Span::raw("]"),
    ]));

    lines.push(Line::from(""));
    let toggle = match form.mode {
        AuthMode::SignIn => "  No account? Ctrl+T to sign up",
        AuthMode::SignUp => "  Have an account? Ctrl+T to sign in",
    };
    lines.push(Line::from(Span::styled(toggle, styles::muted_style())));

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    }

    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), dialog);
}
