//! Application state management for Heliport.
//!
//! This module contains the core `App` struct: the session store, one access
//! gate per protected screen, form state, and the channels background tasks
//! report back on.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use heliport_core::auth::{
    AccessGate, AuthError, AuthProvider, Gated, HostedAuth, SessionFile, SessionState,
    SessionStore,
};
use heliport_core::config::{Config, EMAIL_VAR, PASSWORD_VAR};
use heliport_core::data::{
    Booking, BookingRequest, Dashboard, DataClient, DataError, Helicopter, Route, MAX_PASSENGERS,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for email input.
const MAX_EMAIL_LENGTH: usize = 100;

/// Maximum length for password input.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for free-text booking fields.
const MAX_FIELD_LENGTH: usize = 80;

/// Maximum length for the special requests field.
const MAX_REQUESTS_LENGTH: usize = 300;

/// How often the session is checked for an upcoming expiry.
const SESSION_CHECK_INTERVAL: Duration = Duration::from_secs(30);

pub const BOOKING_SUBMITTED: &str =
    "Booking request submitted. We'll contact you within 24 hours to confirm your flight details.";
pub const BOOKING_FAILED: &str = "Failed to submit booking request. Please try again.";
pub const DASHBOARD_FAILED: &str = "Failed to load user data";
pub const SIGN_OUT_FAILED: &str = "Failed to sign out";

// ============================================================================
// UI State Types
// ============================================================================

/// Top-level screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Routes,
    Booking,
    Dashboard,
    Auth,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Home => "Home",
            Screen::Routes => "Routes",
            Screen::Booking => "Book a Flight",
            Screen::Dashboard => "Dashboard",
            Screen::Auth => "Sign In",
        }
    }

    /// Screens reachable with the number keys
    pub fn from_digit(c: char) -> Option<Self> {
        match c {
            '1' => Some(Screen::Home),
            '2' => Some(Screen::Routes),
            '3' => Some(Screen::Booking),
            '4' => Some(Screen::Dashboard),
            _ => None,
        }
    }

    /// Screens that need a signed-in user
    pub fn is_protected(&self) -> bool {
        matches!(self, Screen::Routes | Screen::Booking | Screen::Dashboard)
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Progress of a screen's data
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    Failed(String),
}

// ============================================================================
// Auth Form
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    SignIn,
    SignUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFocus {
    FullName,
    Email,
    Password,
    Button,
}

#[derive(Debug, Clone)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub focus: AuthFocus,
    pub error: Option<String>,
    /// Screen to open once signed in
    pub return_to: Option<Screen>,
}

impl Default for AuthForm {
    fn default() -> Self {
        Self {
            mode: AuthMode::SignIn,
            full_name: String::new(),
            email: String::new(),
            password: String::new(),
            focus: AuthFocus::Email,
            error: None,
            return_to: None,
        }
    }
}

impl AuthForm {
    fn fields(&self) -> &'static [AuthFocus] {
        match self.mode {
            AuthMode::SignIn => &[AuthFocus::Email, AuthFocus::Password, AuthFocus::Button],
            AuthMode::SignUp => &[
                AuthFocus::FullName,
                AuthFocus::Email,
                AuthFocus::Password,
                AuthFocus::Button,
            ],
        }
    }

    pub fn focus_next(&mut self) {
        let fields = self.fields();
        let pos = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(pos + 1) % fields.len()];
    }

    pub fn focus_prev(&mut self) {
        let fields = self.fields();
        let pos = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(pos + fields.len() - 1) % fields.len()];
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::SignIn => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::SignIn,
        };
        self.error = None;
        if !self.fields().contains(&self.focus) {
            self.focus = AuthFocus::Email;
        }
    }

    pub fn push_char(&mut self, c: char) {
        match self.focus {
            AuthFocus::FullName => {
                if can_add_char(self.full_name.chars().count(), MAX_FIELD_LENGTH, c) {
                    self.full_name.push(c);
                }
            }
            AuthFocus::Email => {
                if can_add_char(self.email.chars().count(), MAX_EMAIL_LENGTH, c) {
                    self.email.push(c);
                }
            }
            AuthFocus::Password => {
                if can_add_char(self.password.chars().count(), MAX_PASSWORD_LENGTH, c) {
                    self.password.push(c);
                }
            }
            AuthFocus::Button => {}
        }
    }

    pub fn pop_char(&mut self) {
        match self.focus {
            AuthFocus::FullName => {
                self.full_name.pop();
            }
            AuthFocus::Email => {
                self.email.pop();
            }
            AuthFocus::Password => {
                self.password.pop();
            }
            AuthFocus::Button => {}
        }
    }

    /// Local checks before contacting the auth service
    fn check(&self) -> Option<&'static str> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Some("Email and password required");
        }
        if self.mode == AuthMode::SignUp && self.full_name.trim().is_empty() {
            return Some("Full name required");
        }
        None
    }
}

/// Text shown to the user for an auth failure
pub fn auth_error_message(error: &AuthError) -> String {
    match error {
        AuthError::InvalidCredentials => "Invalid email or password".to_string(),
        AuthError::AlreadyRegistered => "An account with this email already exists".to_string(),
        AuthError::SessionExpired => "Your session has expired. Please sign in again.".to_string(),
        AuthError::ServiceUnreachable(_) => {
            "Unable to reach the service. Check your internet connection.".to_string()
        }
        AuthError::Unknown(detail) => detail.clone(),
    }
}

// ============================================================================
// Booking Form
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingField {
    Route,
    Helicopter,
    Departure,
    Destination,
    Date,
    Time,
    Passengers,
    Name,
    Email,
    Phone,
    Requests,
    Submit,
}

impl BookingField {
    pub const ALL: [BookingField; 12] = [
        BookingField::Route,
        BookingField::Helicopter,
        BookingField::Departure,
        BookingField::Destination,
        BookingField::Date,
        BookingField::Time,
        BookingField::Passengers,
        BookingField::Name,
        BookingField::Email,
        BookingField::Phone,
        BookingField::Requests,
        BookingField::Submit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BookingField::Route => "Route",
            BookingField::Helicopter => "Helicopter",
            BookingField::Departure => "Departure *",
            BookingField::Destination => "Destination *",
            BookingField::Date => "Date *",
            BookingField::Time => "Time *",
            BookingField::Passengers => "Passengers",
            BookingField::Name => "Full name *",
            BookingField::Email => "Email *",
            BookingField::Phone => "Phone *",
            BookingField::Requests => "Requests",
            BookingField::Submit => "Submit",
        }
    }

    /// Fields edited by typing, as opposed to choosing
    pub fn is_text(&self) -> bool {
        !matches!(
            self,
            BookingField::Route
                | BookingField::Helicopter
                | BookingField::Passengers
                | BookingField::Submit
        )
    }

    pub fn next(&self) -> Self {
        let pos = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        let pos = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(pos + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingForm {
    /// Index into the catalog's routes
    pub route: Option<usize>,
    /// Index into the catalog's helicopters
    pub helicopter: Option<usize>,
    pub departure: String,
    pub destination: String,
    pub date: String,
    pub time: String,
    pub passengers: u32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub requests: String,
    pub focus: BookingField,
    pub editing: bool,
    pub error: Option<String>,
    pub submitting: bool,
}

impl Default for BookingForm {
    fn default() -> Self {
        Self {
            route: None,
            helicopter: None,
            departure: String::new(),
            destination: String::new(),
            date: String::new(),
            time: String::new(),
            passengers: 1,
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            requests: String::new(),
            focus: BookingField::Route,
            editing: false,
            error: None,
            submitting: false,
        }
    }
}

impl BookingForm {
    fn text_mut(&mut self, field: BookingField) -> Option<(&mut String, usize)> {
        match field {
            BookingField::Departure => Some((&mut self.departure, MAX_FIELD_LENGTH)),
            BookingField::Destination => Some((&mut self.destination, MAX_FIELD_LENGTH)),
            BookingField::Date => Some((&mut self.date, 10)),
            BookingField::Time => Some((&mut self.time, 5)),
            BookingField::Name => Some((&mut self.name, MAX_FIELD_LENGTH)),
            BookingField::Email => Some((&mut self.email, MAX_EMAIL_LENGTH)),
            BookingField::Phone => Some((&mut self.phone, 30)),
            BookingField::Requests => Some((&mut self.requests, MAX_REQUESTS_LENGTH)),
            _ => None,
        }
    }

    pub fn text(&self, field: BookingField) -> &str {
        match field {
            BookingField::Departure => &self.departure,
            BookingField::Destination => &self.destination,
            BookingField::Date => &self.date,
            BookingField::Time => &self.time,
            BookingField::Name => &self.name,
            BookingField::Email => &self.email,
            BookingField::Phone => &self.phone,
            BookingField::Requests => &self.requests,
            _ => "",
        }
    }

    pub fn push_char(&mut self, c: char) {
        let focus = self.focus;
        if let Some((text, max)) = self.text_mut(focus) {
            if can_add_char(text.chars().count(), max, c) {
                text.push(c);
            }
        }
    }

    pub fn pop_char(&mut self) {
        let focus = self.focus;
        if let Some((text, _)) = self.text_mut(focus) {
            text.pop();
        }
    }

    /// Pick the route at `index`, filling departure and destination from it.
    pub fn choose_route(&mut self, index: usize, route: &Route) {
        self.route = Some(index);
        self.departure = route.from_location.clone();
        self.destination = route.to_location.clone();
    }

    /// Step a choice field; `None` (no choice) sits before the first entry.
    pub fn cycle_choice(current: Option<usize>, len: usize, forward: bool) -> Option<usize> {
        if len == 0 {
            return None;
        }
        match (current, forward) {
            (None, true) => Some(0),
            (None, false) => Some(len - 1),
            (Some(i), true) if i + 1 < len => Some(i + 1),
            (Some(i), false) if i > 0 => Some(i - 1),
            _ => None,
        }
    }

    pub fn adjust_passengers(&mut self, forward: bool) {
        self.passengers = if forward {
            (self.passengers + 1).min(MAX_PASSENGERS)
        } else {
            self.passengers.saturating_sub(1).max(1)
        };
    }

    /// Build the request to send, resolving chosen indices against the catalog.
    pub fn to_request(&self, catalog: &Catalog) -> BookingRequest {
        let requests = self.requests.trim();
        BookingRequest {
            helicopter_id: self
                .helicopter
                .and_then(|i| catalog.helicopters.get(i))
                .map(|h| h.id.clone()),
            route_id: self
                .route
                .and_then(|i| catalog.routes.get(i))
                .map(|r| r.id.clone()),
            departure_point: self.departure.trim().to_string(),
            destination: self.destination.trim().to_string(),
            flight_date: self.date.trim().to_string(),
            flight_time: self.time.trim().to_string(),
            passengers: self.passengers,
            customer_name: self.name.trim().to_string(),
            customer_email: self.email.trim().to_string(),
            customer_phone: self.phone.trim().to_string(),
            special_requests: (!requests.is_empty()).then(|| requests.to_string()),
        }
    }

    /// Clear everything but the customer's contact details
    pub fn reset_flight(&mut self) {
        *self = Self {
            name: std::mem::take(&mut self.name),
            email: std::mem::take(&mut self.email),
            phone: std::mem::take(&mut self.phone),
            ..Self::default()
        };
    }
}

// ============================================================================
// Screen Views
// ============================================================================

/// Routes and available helicopters, shared by the Routes and Booking screens
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub routes: Vec<Route>,
    pub helicopters: Vec<Helicopter>,
    pub load: LoadState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutesFocus {
    Routes,
    Fleet,
}

#[derive(Debug, Clone)]
pub struct RoutesView {
    pub focus: RoutesFocus,
    pub route_selection: usize,
    pub fleet_selection: usize,
}

impl Default for RoutesView {
    fn default() -> Self {
        Self {
            focus: RoutesFocus::Routes,
            route_selection: 0,
            fleet_selection: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookingView {
    pub form: BookingForm,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardView {
    pub dashboard: Option<Dashboard>,
    pub load: LoadState,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from background tasks.
///
/// Customer data carries the user it was fetched for, so a result that
/// arrives after that user signed out is dropped.
enum TaskResult {
    Catalog(Result<(Vec<Route>, Vec<Helicopter>), DataError>),
    Dashboard {
        user_id: String,
        result: Result<Dashboard, DataError>,
    },
    BookingSubmitted(Result<Booking, DataError>),
}

/// What evaluating the current screen's gate asks the app to do
enum GateStep {
    Wait,
    Ready,
    Redirect(Option<Screen>),
}

fn step<V>(gate: &mut AccessGate<V, Screen>, state: &SessionState) -> GateStep {
    match gate.evaluate(state) {
        Gated::Placeholder | Gated::Hidden => GateStep::Wait,
        Gated::Render(_) => GateStep::Ready,
        Gated::Redirect(redirect) => GateStep::Redirect(redirect.return_to),
    }
}

// ============================================================================
// App
// ============================================================================

/// Main application state container
pub struct App {
    pub config: Config,
    pub store: SessionStore,
    data: DataClient,
    /// Hosted auth client, for keeping the session fresh
    hosted: Option<Arc<HostedAuth>>,
    /// Whether `config` is written back to disk
    persist_config: bool,

    // UI State
    pub state: AppState,
    pub screen: Screen,
    pub auth_form: AuthForm,
    pub status_message: Option<String>,

    // Protected screens
    pub routes: AccessGate<RoutesView, Screen>,
    pub booking: AccessGate<BookingView, Screen>,
    pub dashboard: AccessGate<DashboardView, Screen>,
    pub catalog: Catalog,

    /// Who the UI last saw signed in
    signed_in_as: Option<String>,

    // Channels
    session_rx: mpsc::UnboundedReceiver<SessionState>,
    task_rx: mpsc::Receiver<TaskResult>,
    task_tx: mpsc::Sender<TaskResult>,

    last_session_check: Instant,
    /// Session refresh still running, if any
    refresh_task: Option<JoinHandle<()>>,
}

impl App {
    /// Create the app against the configured hosted backend
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        let connection = config.connection()?;
        debug!(service_url = %connection.service_url, "Connection configured");

        let mut hosted = HostedAuth::new(&connection)?;
        match config.cache_dir() {
            Ok(dir) => hosted = hosted.with_session_file(SessionFile::new(dir)),
            Err(e) => warn!(error = %e, "No cache directory, session will not persist"),
        }
        let hosted = Arc::new(hosted);
        let data = DataClient::new(&connection)?;

        let mut app = Self::with_services(config, hosted.clone(), data);
        app.hosted = Some(hosted);
        app.persist_config = true;

        if let Ok(email) = std::env::var(EMAIL_VAR) {
            app.auth_form.email = email;
        }
        if let Ok(password) = std::env::var(PASSWORD_VAR) {
            app.auth_form.password = password;
        }
        Ok(app)
    }

    /// Create the app on top of any auth provider and data client
    pub fn with_services(config: Config, provider: Arc<dyn AuthProvider>, data: DataClient) -> Self {
        let mut store = SessionStore::new(provider);

        let (session_tx, session_rx) = mpsc::unbounded_channel();
        store.subscribe_state(move |state| {
            // The receiver lives as long as the app; a send error only
            // happens during teardown
            let _ = session_tx.send(state.clone());
        });

        let (task_tx, task_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let mut auth_form = AuthForm::default();
        if let Some(ref email) = config.last_email {
            auth_form.email = email.clone();
            auth_form.focus = AuthFocus::Password;
        }

        Self {
            config,
            store,
            data,
            hosted: None,
            persist_config: false,
            state: AppState::Normal,
            screen: Screen::Home,
            auth_form,
            status_message: None,
            routes: AccessGate::returning_to(RoutesView::default(), Screen::Routes),
            booking: AccessGate::returning_to(BookingView::default(), Screen::Booking),
            dashboard: AccessGate::returning_to(DashboardView::default(), Screen::Dashboard),
            catalog: Catalog::default(),
            signed_in_as: None,
            session_rx,
            task_rx,
            task_tx,
            last_session_check: Instant::now(),
            refresh_task: None,
        }
    }

    /// Resolve the starting session. The UI shows placeholders until this returns.
    pub async fn initialize(&mut self) {
        self.store.initialize().await;
        self.check_background_tasks();
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.state().is_authenticated()
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn switch_screen(&mut self, screen: Screen) {
        if screen == self.screen {
            return;
        }
        debug!(from = ?self.screen, to = ?screen, "Switching screen");
        self.screen = screen;

        // Coming back to a protected screen while signed out redirects again
        match screen {
            Screen::Routes => self.routes.reset(),
            Screen::Booking => self.booking.reset(),
            Screen::Dashboard => self.dashboard.reset(),
            Screen::Home | Screen::Auth => {}
        }
        self.sync_gate();
    }

    /// Open the sign-in screen, remembering where to go afterwards
    pub fn open_auth(&mut self, return_to: Option<Screen>) {
        self.auth_form.return_to = return_to;
        self.auth_form.error = None;
        self.auth_form.focus = if self.auth_form.email.is_empty() {
            AuthFocus::Email
        } else {
            AuthFocus::Password
        };
        self.screen = Screen::Auth;
    }

    /// Evaluate the gate of the current screen and act on it
    fn sync_gate(&mut self) {
        let state = self.store.current_state();
        let step = match self.screen {
            Screen::Routes => step(&mut self.routes, &state),
            Screen::Booking => step(&mut self.booking, &state),
            Screen::Dashboard => step(&mut self.dashboard, &state),
            Screen::Home | Screen::Auth => return,
        };

        match step {
            GateStep::Wait => {}
            GateStep::Ready => self.ensure_loaded(),
            GateStep::Redirect(return_to) => {
                info!(screen = ?self.screen, "Sign-in required");
                self.open_auth(return_to);
            }
        }
    }

    /// Start loading the current screen's data the first time it renders
    fn ensure_loaded(&mut self) {
        match self.screen {
            Screen::Routes | Screen::Booking => {
                if self.catalog.load == LoadState::NotLoaded {
                    self.load_catalog();
                }
            }
            Screen::Dashboard => {
                if self.dashboard.view().load == LoadState::NotLoaded {
                    self.load_dashboard();
                }
            }
            Screen::Home | Screen::Auth => {}
        }
    }

    /// Reload the current screen's data
    pub fn reload_current(&mut self) {
        if !self.is_authenticated() {
            return;
        }
        match self.screen {
            Screen::Routes | Screen::Booking => self.load_catalog(),
            Screen::Dashboard => self.load_dashboard(),
            Screen::Home | Screen::Auth => {}
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Submit the auth form. The screen changes when the store reports the
    /// new session, not here.
    pub async fn submit_auth(&mut self) {
        if let Some(problem) = self.auth_form.check() {
            self.auth_form.error = Some(problem.to_string());
            return;
        }
        self.auth_form.error = None;

        let email = self.auth_form.email.trim().to_string();
        let password = self.auth_form.password.clone();
        let result = match self.auth_form.mode {
            AuthMode::SignIn => self.store.sign_in(&email, &password).await,
            AuthMode::SignUp => {
                let name = self.auth_form.full_name.trim().to_string();
                self.store.sign_up(&email, &password, &name).await
            }
        };

        match result {
            Ok(()) => {
                self.auth_form.password.clear();
                self.remember_email(email);
            }
            Err(e) => {
                warn!(error = %e, mode = ?self.auth_form.mode, "Authentication failed");
                self.auth_form.error = Some(auth_error_message(&e));
            }
        }
    }

    fn remember_email(&mut self, email: String) {
        if self.config.last_email.as_deref() == Some(email.as_str()) {
            return;
        }
        self.config.last_email = Some(email);
        if self.persist_config {
            if let Err(e) = self.config.save() {
                warn!(error = %e, "Failed to save config");
            }
        }
    }

    pub async fn sign_out(&mut self) {
        if !self.is_authenticated() {
            return;
        }
        if let Err(e) = self.store.sign_out().await {
            warn!(error = %e, "Sign-out failed");
            self.status_message = Some(SIGN_OUT_FAILED.to_string());
        }
    }

    fn on_session_changed(&mut self, state: SessionState) {
        match state {
            SessionState::Authenticated(session) => {
                let label = session.display_label().to_string();
                info!(user_id = %session.user_id, "Signed in");
                self.status_message = Some(format!("Signed in as {}", label));
                self.signed_in_as = Some(session.user_id.clone());

                let form = &mut self.booking.view_mut().form;
                if form.name.is_empty() {
                    form.name = session.display_name.clone().unwrap_or_default();
                }
                if form.email.is_empty() {
                    form.email = session.email.clone();
                }

                if self.screen == Screen::Auth {
                    let target = self.auth_form.return_to.take().unwrap_or(Screen::Dashboard);
                    self.auth_form.error = None;
                    self.switch_screen(target);
                }
            }
            SessionState::Unauthenticated => {
                if self.signed_in_as.take().is_some() {
                    self.status_message = Some("Signed out".to_string());
                }
                // Nothing of the previous user stays on screen
                *self.dashboard.view_mut() = DashboardView::default();
                *self.booking.view_mut() = BookingView::default();
            }
            SessionState::Loading => {}
        }
    }

    // =========================================================================
    // Background Tasks
    // =========================================================================

    fn client(&self) -> DataClient {
        match self.store.session() {
            Some(session) => self.data.with_session(&session),
            None => self.data.anonymous(),
        }
    }

    async fn send_result(tx: &mpsc::Sender<TaskResult>, result: TaskResult) {
        if tx.send(result).await.is_err() {
            debug!("App closed before background task finished");
        }
    }

    pub fn load_catalog(&mut self) {
        self.catalog.load = LoadState::Loading;
        let client = self.client();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let (routes, fleet) = tokio::join!(client.routes(), client.available_helicopters());
            let result = routes.and_then(|r| fleet.map(|f| (r, f)));
            Self::send_result(&tx, TaskResult::Catalog(result)).await;
        });
    }

    pub fn load_dashboard(&mut self) {
        let Some(session) = self.store.session() else {
            return;
        };
        self.dashboard.view_mut().load = LoadState::Loading;
        let client = self.data.with_session(&session);
        let user_id = session.user_id.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = client.dashboard().await;
            Self::send_result(&tx, TaskResult::Dashboard { user_id, result }).await;
        });
    }

    /// Validate and send the booking form
    pub fn submit_booking(&mut self) {
        let form = &self.booking.view().form;
        if form.submitting {
            return;
        }
        let request = form.to_request(&self.catalog);

        let problem = match request.validate() {
            Err(e) => Some(e.to_string()),
            Ok(()) => form
                .helicopter
                .and_then(|i| self.catalog.helicopters.get(i))
                .filter(|h| !request.fits_capacity(h))
                .map(|h| format!("{} seats at most {} passengers", h.name, h.capacity)),
        };
        if let Some(problem) = problem {
            self.booking.view_mut().form.error = Some(problem);
            return;
        }

        let form = &mut self.booking.view_mut().form;
        form.error = None;
        form.submitting = true;
        form.editing = false;

        let client = self.client();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = client.submit_booking(&request).await;
            Self::send_result(&tx, TaskResult::BookingSubmitted(result)).await;
        });
    }

    /// Apply session changes and finished background work. Called every tick.
    pub fn check_background_tasks(&mut self) {
        self.store.process_pending();

        let mut changes = Vec::new();
        while let Ok(state) = self.session_rx.try_recv() {
            changes.push(state);
        }
        for state in changes {
            self.on_session_changed(state);
        }

        let mut results = Vec::new();
        while let Ok(result) = self.task_rx.try_recv() {
            results.push(result);
        }
        for result in results {
            self.process_task_result(result);
        }

        self.sync_gate();
        self.keep_session_fresh();
    }

    fn process_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Catalog(Ok((routes, helicopters))) => {
                debug!(routes = routes.len(), helicopters = helicopters.len(), "Catalog loaded");
                self.catalog = Catalog {
                    routes,
                    helicopters,
                    load: LoadState::Loaded,
                };
                let view = self.routes.view_mut();
                view.route_selection = view.route_selection.min(self.catalog.routes.len().saturating_sub(1));
                view.fleet_selection = view.fleet_selection.min(self.catalog.helicopters.len().saturating_sub(1));
            }
            TaskResult::Catalog(Err(e)) => {
                warn!(error = %e, "Failed to load routes");
                self.catalog.load = LoadState::Failed(e.to_string());
                self.status_message = Some(format!("Failed to load routes: {}", e));
            }
            TaskResult::Dashboard { user_id, result } => {
                if self.store.state().user_id() != Some(user_id.as_str()) {
                    debug!(user_id = %user_id, "Dropping dashboard for signed-out user");
                    return;
                }
                let view = self.dashboard.view_mut();
                match result {
                    Ok(dashboard) => {
                        view.dashboard = Some(dashboard);
                        view.load = LoadState::Loaded;
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to load dashboard");
                        view.load = LoadState::Failed(DASHBOARD_FAILED.to_string());
                        self.status_message = Some(DASHBOARD_FAILED.to_string());
                    }
                }
            }
            TaskResult::BookingSubmitted(result) => {
                let form = &mut self.booking.view_mut().form;
                form.submitting = false;
                match result {
                    Ok(booking) => {
                        info!(booking_id = %booking.id, "Booking confirmed by service");
                        form.reset_flight();
                        self.status_message = Some(BOOKING_SUBMITTED.to_string());
                        // Recent bookings changed
                        self.dashboard.view_mut().load = LoadState::NotLoaded;
                    }
                    Err(DataError::Validation(msg)) => form.error = Some(msg),
                    Err(e) => {
                        warn!(error = %e, "Booking submission failed");
                        form.error = Some(BOOKING_FAILED.to_string());
                    }
                }
            }
        }
    }

    /// Renew the session ahead of expiry. The outcome arrives as a change
    /// notification.
    fn keep_session_fresh(&mut self) {
        let Some(ref hosted) = self.hosted else {
            return;
        };
        if self.last_session_check.elapsed() < SESSION_CHECK_INTERVAL {
            return;
        }
        if self.refresh_task.as_ref().is_some_and(|task| !task.is_finished()) {
            debug!("Session refresh still running");
            return;
        }
        self.last_session_check = Instant::now();

        let hosted = hosted.clone();
        self.refresh_task = Some(tokio::spawn(async move {
            if let Err(e) = hosted.refresh_if_needed().await {
                warn!(error = %e, "Session refresh failed");
            }
        }));
    }
}

// ============================================================================
// Input Validation Helpers
// ============================================================================

/// Check if a character is valid for text input
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a character should be accepted into a field holding `current_len` chars
pub fn can_add_char(current_len: usize, max_len: usize, c: char) -> bool {
    current_len < max_len && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use heliport_core::auth::{AuthChange, ChangeFeed, Session, SignUpMetadata, Subscription};
    use heliport_core::config::Connection;

    use super::*;

    // -------------------------------------------------------------------------
    // Test doubles
    // -------------------------------------------------------------------------

    fn session(user_id: &str) -> Session {
        Session {
            user_id: user_id.to_string(),
            email: format!("{}@example.com", user_id),
            display_name: Some("Amelia Earhart".to_string()),
            expires_at: Utc::now() + chrono::Duration::hours(1),
            credential_token: format!("token-{}", user_id),
            refresh_token: None,
        }
    }

    struct FakeAuth {
        feed: ChangeFeed,
        existing: Option<Session>,
        fail_sign_out: bool,
        sign_outs: Mutex<usize>,
    }

    impl FakeAuth {
        fn new(existing: Option<Session>) -> Self {
            Self {
                feed: ChangeFeed::new(),
                existing,
                fail_sign_out: false,
                sign_outs: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl AuthProvider for FakeAuth {
        async fn get_current_session(&self) -> Result<Option<Session>, AuthError> {
            Ok(self.existing.clone())
        }

        fn subscribe(&self) -> Subscription {
            self.feed.subscribe()
        }

        async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
            if password != "secret" {
                return Err(AuthError::InvalidCredentials);
            }
            let mut s = session("user-1");
            s.email = email.to_string();
            self.feed.emit(AuthChange::signed_in(s.clone()));
            Ok(s)
        }

        async fn sign_up(
            &self,
            _email: &str,
            _password: &str,
            _metadata: &SignUpMetadata,
        ) -> Result<Session, AuthError> {
            Err(AuthError::AlreadyRegistered)
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            *self.sign_outs.lock().unwrap() += 1;
            if self.fail_sign_out {
                return Err(AuthError::ServiceUnreachable("offline".to_string()));
            }
            self.feed.emit(AuthChange::signed_out());
            Ok(())
        }
    }

    fn app_with(provider: FakeAuth) -> (App, Arc<FakeAuth>) {
        let provider = Arc::new(provider);
        // Nothing listens here; background loads fail quietly
        let data = DataClient::new(&Connection::new("http://127.0.0.1:9", "anon")).unwrap();
        let app = App::with_services(Config::default(), provider.clone(), data);
        (app, provider)
    }

    fn catalog() -> Catalog {
        Catalog {
            routes: vec![Route {
                id: "r1".to_string(),
                from_location: "Manhattan".to_string(),
                to_location: "JFK".to_string(),
                duration_minutes: 15,
                distance_miles: None,
                price_per_person: 195.0,
            }],
            helicopters: vec![Helicopter {
                id: "h1".to_string(),
                name: "Sky One".to_string(),
                model: "R44".to_string(),
                capacity: 3,
                hourly_rate: 900.0,
                description: None,
                image_url: None,
                specifications: None,
                status: "available".to_string(),
            }],
            load: LoadState::Loaded,
        }
    }

    // -------------------------------------------------------------------------
    // Screen Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_screen_digits_and_protection() {
        assert_eq!(Screen::from_digit('1'), Some(Screen::Home));
        assert_eq!(Screen::from_digit('4'), Some(Screen::Dashboard));
        assert_eq!(Screen::from_digit('5'), None);
        assert!(!Screen::Home.is_protected());
        assert!(!Screen::Auth.is_protected());
        assert!(Screen::Routes.is_protected());
        assert!(Screen::Booking.is_protected());
        assert!(Screen::Dashboard.is_protected());
    }

    // -------------------------------------------------------------------------
    // Form Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_auth_form_focus_cycles_per_mode() {
        let mut form = AuthForm::default();
        form.focus_prev();
        assert_eq!(form.focus, AuthFocus::Button);
        form.focus_next();
        assert_eq!(form.focus, AuthFocus::Email);

        form.toggle_mode();
        assert_eq!(form.mode, AuthMode::SignUp);
        form.focus_prev();
        assert_eq!(form.focus, AuthFocus::FullName);

        // Full name is not part of sign-in
        form.toggle_mode();
        assert_eq!(form.focus, AuthFocus::Email);
    }

    #[test]
    fn test_auth_form_checks_required_fields() {
        let mut form = AuthForm::default();
        assert!(form.check().is_some());
        form.email = "a@b.com".to_string();
        form.password = "pw".to_string();
        assert!(form.check().is_none());
        form.toggle_mode();
        assert_eq!(form.check(), Some("Full name required"));
    }

    #[test]
    fn test_auth_error_messages() {
        assert_eq!(auth_error_message(&AuthError::InvalidCredentials), "Invalid email or password");
        assert!(auth_error_message(&AuthError::ServiceUnreachable("x".to_string())).contains("Unable to reach"));
        assert_eq!(auth_error_message(&AuthError::Unknown("Confirm email".to_string())), "Confirm email");
    }

    #[test]
    fn test_input_length_limits() {
        assert!(can_add_char(0, 5, 'a'));
        assert!(!can_add_char(5, 5, 'a'));
        assert!(!can_add_char(0, 5, '\n'));

        let mut form = BookingForm {
            focus: BookingField::Time,
            ..Default::default()
        };
        for c in "14:300".chars() {
            form.push_char(c);
        }
        assert_eq!(form.time, "14:30");
    }

    #[test]
    fn test_booking_request_from_form() {
        let catalog = catalog();
        let mut form = BookingForm::default();
        form.choose_route(0, &catalog.routes[0]);
        form.date = "2025-06-01".to_string();
        form.time = "14:30".to_string();
        form.name = " Amelia ".to_string();
        form.email = "amelia@example.com".to_string();
        form.phone = "555".to_string();

        let request = form.to_request(&catalog);
        assert_eq!(request.route_id.as_deref(), Some("r1"));
        assert_eq!(request.helicopter_id, None);
        assert_eq!(request.departure_point, "Manhattan");
        assert_eq!(request.destination, "JFK");
        assert_eq!(request.customer_name, "Amelia");
        assert_eq!(request.special_requests, None);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_choice_cycling_includes_no_choice() {
        assert_eq!(BookingForm::cycle_choice(None, 2, true), Some(0));
        assert_eq!(BookingForm::cycle_choice(Some(1), 2, true), None);
        assert_eq!(BookingForm::cycle_choice(None, 2, false), Some(1));
        assert_eq!(BookingForm::cycle_choice(Some(0), 2, false), None);
        assert_eq!(BookingForm::cycle_choice(None, 0, true), None);
    }

    #[test]
    fn test_passenger_bounds_and_reset() {
        let mut form = BookingForm::default();
        form.adjust_passengers(false);
        assert_eq!(form.passengers, 1);
        for _ in 0..10 {
            form.adjust_passengers(true);
        }
        assert_eq!(form.passengers, MAX_PASSENGERS);

        form.name = "Amelia".to_string();
        form.destination = "JFK".to_string();
        form.reset_flight();
        assert_eq!(form.name, "Amelia");
        assert!(form.destination.is_empty());
        assert_eq!(form.passengers, 1);
    }

    // -------------------------------------------------------------------------
    // App Flow Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_protected_screen_redirects_then_returns_after_sign_in() {
        let (mut app, _) = app_with(FakeAuth::new(None));
        app.initialize().await;
        assert!(!app.is_authenticated());

        app.switch_screen(Screen::Dashboard);
        assert_eq!(app.screen, Screen::Auth);
        assert_eq!(app.auth_form.return_to, Some(Screen::Dashboard));

        app.auth_form.email = "a@b.com".to_string();
        app.auth_form.password = "wrong".to_string();
        app.submit_auth().await;
        app.check_background_tasks();
        assert_eq!(app.auth_form.error.as_deref(), Some("Invalid email or password"));
        assert_eq!(app.screen, Screen::Auth);

        app.auth_form.password = "secret".to_string();
        app.submit_auth().await;
        app.check_background_tasks();
        assert!(app.is_authenticated());
        assert_eq!(app.screen, Screen::Dashboard);
        assert!(app.auth_form.password.is_empty());
        assert_eq!(app.config.last_email.as_deref(), Some("a@b.com"));
        assert_eq!(app.booking.view().form.email, "a@b.com");
    }

    #[tokio::test]
    async fn test_leaving_and_returning_redirects_again() {
        let (mut app, _) = app_with(FakeAuth::new(None));
        app.initialize().await;

        app.switch_screen(Screen::Routes);
        assert_eq!(app.screen, Screen::Auth);
        app.switch_screen(Screen::Home);
        app.switch_screen(Screen::Routes);
        assert_eq!(app.screen, Screen::Auth);
        assert_eq!(app.auth_form.return_to, Some(Screen::Routes));
    }

    #[tokio::test]
    async fn test_existing_session_opens_protected_screen() {
        let (mut app, _) = app_with(FakeAuth::new(Some(session("user-7"))));
        app.initialize().await;
        assert_eq!(app.status_message.as_deref(), Some("Signed in as Amelia Earhart"));

        app.switch_screen(Screen::Booking);
        assert_eq!(app.screen, Screen::Booking);
        assert_eq!(app.catalog.load, LoadState::Loading);
        assert_eq!(app.booking.view().form.name, "Amelia Earhart");
    }

    #[tokio::test]
    async fn test_sign_out_from_protected_screen_redirects() {
        let (mut app, provider) = app_with(FakeAuth::new(Some(session("user-7"))));
        app.initialize().await;
        app.switch_screen(Screen::Dashboard);
        assert_eq!(app.screen, Screen::Dashboard);

        app.sign_out().await;
        app.check_background_tasks();
        assert_eq!(*provider.sign_outs.lock().unwrap(), 1);
        assert_eq!(app.status_message.as_deref(), Some("Signed out"));
        assert_eq!(app.screen, Screen::Auth);
        assert_eq!(app.auth_form.return_to, Some(Screen::Dashboard));
        assert!(app.dashboard.view().dashboard.is_none());
    }

    #[tokio::test]
    async fn test_failed_sign_out_keeps_session() {
        let mut provider = FakeAuth::new(Some(session("user-7")));
        provider.fail_sign_out = true;
        let (mut app, _) = app_with(provider);
        app.initialize().await;

        app.sign_out().await;
        app.check_background_tasks();
        assert!(app.is_authenticated());
        assert_eq!(app.status_message.as_deref(), Some(SIGN_OUT_FAILED));
    }

    #[tokio::test]
    async fn test_dashboard_for_previous_user_is_dropped() {
        let (mut app, _) = app_with(FakeAuth::new(Some(session("user-7"))));
        app.initialize().await;

        app.process_task_result(TaskResult::Dashboard {
            user_id: "someone-else".to_string(),
            result: Ok(Dashboard::default()),
        });
        assert!(app.dashboard.view().dashboard.is_none());

        app.process_task_result(TaskResult::Dashboard {
            user_id: "user-7".to_string(),
            result: Ok(Dashboard::default()),
        });
        assert_eq!(app.dashboard.view().load, LoadState::Loaded);
    }

    #[tokio::test]
    async fn test_booking_capacity_is_checked_before_sending() {
        let (mut app, _) = app_with(FakeAuth::new(Some(session("user-7"))));
        app.initialize().await;
        app.catalog = catalog();

        let form = &mut app.booking.view_mut().form;
        form.choose_route(0, &app.catalog.routes[0]);
        form.helicopter = Some(0);
        form.passengers = 4;
        form.date = "2025-06-01".to_string();
        form.time = "14:30".to_string();
        form.phone = "555".to_string();

        app.submit_booking();
        let form = &app.booking.view().form;
        assert_eq!(form.error.as_deref(), Some("Sky One seats at most 3 passengers"));
        assert!(!form.submitting);
    }

    #[tokio::test]
    async fn test_booking_result_resets_form() {
        let (mut app, _) = app_with(FakeAuth::new(Some(session("user-7"))));
        app.initialize().await;
        app.booking.view_mut().form.destination = "JFK".to_string();
        app.booking.view_mut().form.submitting = true;

        app.process_task_result(TaskResult::BookingSubmitted(Err(DataError::ServerError(
            "boom".to_string(),
        ))));
        assert_eq!(app.booking.view().form.error.as_deref(), Some(BOOKING_FAILED));
        assert_eq!(app.booking.view().form.destination, "JFK");

        let booking: Booking = serde_json::from_value(serde_json::json!({
            "id": "b1", "departure_point": "Manhattan", "destination": "JFK",
            "flight_date": "2025-06-01", "flight_time": "14:30", "passengers": 1,
            "status": "pending"
        }))
        .unwrap();
        app.process_task_result(TaskResult::BookingSubmitted(Ok(booking)));
        assert!(app.booking.view().form.destination.is_empty());
        assert_eq!(app.status_message.as_deref(), Some(BOOKING_SUBMITTED));
    }
}
