//! Keyboard input handling for the TUI.
//!
//! Text fields take every printable key while they have focus (the auth form
//! always, booking fields while editing). Everywhere else single keys are
//! shortcuts.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, AppState, AuthFocus, BookingField, BookingForm, RoutesFocus, Screen};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    if app.screen == Screen::Auth && !app.is_authenticated() {
        handle_auth_input(app, key).await;
        return Ok(false);
    }

    if app.screen == Screen::Booking && app.booking.view().form.editing {
        handle_booking_edit(&mut app.booking.view_mut().form, key);
        return Ok(false);
    }

    // Global shortcuts
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char(c @ '1'..='4') => {
            if let Some(screen) = Screen::from_digit(c) {
                app.status_message = None;
                app.switch_screen(screen);
            }
            return Ok(false);
        }
        KeyCode::Char('a') if !app.is_authenticated() => {
            app.open_auth(None);
            return Ok(false);
        }
        KeyCode::Char('o') => {
            app.sign_out().await;
            return Ok(false);
        }
        KeyCode::Char('r') => {
            app.reload_current();
            return Ok(false);
        }
        KeyCode::Esc if app.screen != Screen::Home => {
            app.switch_screen(Screen::Home);
            return Ok(false);
        }
        _ => {}
    }

    match app.screen {
        Screen::Routes => handle_routes_input(app, key),
        Screen::Booking => handle_booking_input(app, key),
        Screen::Dashboard => {
            if key.code == KeyCode::Char('b') {
                app.switch_screen(Screen::Booking);
            }
        }
        Screen::Home | Screen::Auth => {}
    }

    Ok(false)
}

async fn handle_auth_input(app: &mut App, key: KeyEvent) {
    let form = &mut app.auth_form;
    match key.code {
        KeyCode::Esc => {
            form.return_to = None;
            app.switch_screen(Screen::Home);
        }
        KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => form.toggle_mode(),
        KeyCode::Down | KeyCode::Tab => form.focus_next(),
        KeyCode::Up | KeyCode::BackTab => form.focus_prev(),
        KeyCode::Enter => {
            if form.focus == AuthFocus::Button {
                app.submit_auth().await;
            } else {
                form.focus_next();
            }
        }
        KeyCode::Backspace => form.pop_char(),
        KeyCode::Char(c) => form.push_char(c),
        _ => {}
    }
}

fn handle_routes_input(app: &mut App, key: KeyEvent) {
    let route_count = app.catalog.routes.len();
    let fleet_count = app.catalog.helicopters.len();
    let view = app.routes.view_mut();

    match key.code {
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Left | KeyCode::Right => {
            view.focus = match view.focus {
                RoutesFocus::Routes => RoutesFocus::Fleet,
                RoutesFocus::Fleet => RoutesFocus::Routes,
            };
        }
        KeyCode::Up | KeyCode::Char('k') => match view.focus {
            RoutesFocus::Routes => view.route_selection = view.route_selection.saturating_sub(1),
            RoutesFocus::Fleet => view.fleet_selection = view.fleet_selection.saturating_sub(1),
        },
        KeyCode::Down | KeyCode::Char('j') => match view.focus {
            RoutesFocus::Routes if view.route_selection + 1 < route_count => {
                view.route_selection += 1;
            }
            RoutesFocus::Fleet if view.fleet_selection + 1 < fleet_count => {
                view.fleet_selection += 1;
            }
            _ => {}
        },
        KeyCode::Enter => {
            let focus = view.focus;
            let (route_index, fleet_index) = (view.route_selection, view.fleet_selection);
            let form = &mut app.booking.view_mut().form;
            match focus {
                RoutesFocus::Routes => {
                    if let Some(route) = app.catalog.routes.get(route_index) {
                        form.choose_route(route_index, route);
                        form.focus = BookingField::Date;
                    }
                }
                RoutesFocus::Fleet => {
                    if fleet_index < fleet_count {
                        form.helicopter = Some(fleet_index);
                    }
                }
            }
            app.switch_screen(Screen::Booking);
        }
        _ => {}
    }
}

fn handle_booking_input(app: &mut App, key: KeyEvent) {
    let route_count = app.catalog.routes.len();
    let fleet_count = app.catalog.helicopters.len();
    let form = &mut app.booking.view_mut().form;

    match key.code {
        KeyCode::Down | KeyCode::Tab => form.focus = form.focus.next(),
        KeyCode::Up | KeyCode::BackTab => form.focus = form.focus.prev(),
        KeyCode::Left | KeyCode::Right => {
            let forward = key.code == KeyCode::Right;
            match form.focus {
                BookingField::Route => {
                    match BookingForm::cycle_choice(form.route, route_count, forward) {
                        Some(i) => {
                            if let Some(route) = app.catalog.routes.get(i) {
                                form.choose_route(i, route);
                            }
                        }
                        None => form.route = None,
                    }
                }
                BookingField::Helicopter => {
                    form.helicopter = BookingForm::cycle_choice(form.helicopter, fleet_count, forward);
                }
                BookingField::Passengers => form.adjust_passengers(forward),
                _ => {}
            }
        }
        KeyCode::Enter => {
            if form.focus == BookingField::Submit {
                app.submit_booking();
            } else if form.focus.is_text() {
                form.editing = true;
                form.error = None;
            } else {
                form.focus = form.focus.next();
            }
        }
        _ => {}
    }
}

fn handle_booking_edit(form: &mut BookingForm, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => form.editing = false,
        KeyCode::Tab | KeyCode::Down => {
            form.editing = false;
            form.focus = form.focus.next();
            form.editing = form.focus.is_text();
        }
        KeyCode::BackTab | KeyCode::Up => {
            form.editing = false;
            form.focus = form.focus.prev();
            form.editing = form.focus.is_text();
        }
        KeyCode::Backspace => form.pop_char(),
        KeyCode::Char(c) => form.push_char(c),
        _ => {}
    }
}
