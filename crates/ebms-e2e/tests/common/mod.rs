//! Simulated EBMS application on top of `MockDriver`.
//!
//! Mirrors the screens the suite targets: login, dashboard, users list and
//! the create-user form, with a session cookie and a redirect-to-login guard.

#![allow(dead_code)]

use ebms_e2e::prelude::*;
use std::fmt;
use std::sync::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;

pub const USER_EMAIL: &str = "user@example.com";
pub const USER_PASSWORD: &str = "secret123";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const SESSION_COOKIE: &str = "sessionid";
pub const INVALID_LOGIN: &str = "Invalid email or password";
pub const DUPLICATE_EMAIL: &str = "User with this email already exists";

pub fn email_field() -> Selector {
    Selector::label("Email")
}

pub fn password_field() -> Selector {
    Selector::label("Password")
}

pub fn login_button() -> Selector {
    Selector::role_named("button", "Login")
}

pub fn logout_button() -> Selector {
    Selector::role_named("button", "Logout")
}

pub fn user_menu() -> Selector {
    Selector::test_id("user-menu")
}

pub fn user_rows() -> Selector {
    Selector::css("table tbody tr")
}

pub fn search_input() -> Selector {
    Selector::placeholder("Search")
}

fn toast_error() -> Selector {
    Selector::test_id("toast-error")
}

fn toast_success() -> Selector {
    Selector::test_id("toast-success")
}

const FORM_TEXT_FIELDS: [&str; 4] = ["First Name", "Last Name", "Email", "Contact Number"];

/// Short timeouts so failing waits stay fast
pub fn config() -> Arc<EnvConfig> {
    let _ = init_tracing("ebms_e2e=debug", LogFormat::Pretty);
    Arc::new(
        EnvConfig::default()
            .with_navigation_timeout(500)
            .with_action_timeout(500)
            .with_soft_timeout(60),
    )
}

/// Fresh application with two existing users
pub fn app() -> Arc<MockDriver> {
    let driver = MockDriver::default().shared();
    register_routes(&driver);
    register_behaviour(&driver);
    driver.with_state(|state| {
        state.push_record("Ann Lee ann.lee@example.org");
        state.push_record("Bo Kim bo.kim@example.net");
    });
    driver
}

/// Shared page handle for the application
pub fn page(driver: &Arc<MockDriver>) -> SharedPage {
    driver.clone()
}

fn register_routes(driver: &MockDriver) {
    driver.route(
        "/login",
        MockScreen::new("EBMS | Login")
            .with(&email_field(), MockElement::new())
            .with(&password_field(), MockElement::new())
            .with(&login_button(), MockElement::new()),
    );
    driver.route(
        "/dashboard",
        MockScreen::new("EBMS | Dashboard")
            .with(&Selector::role("heading"), MockElement::with_text(" Dashboard "))
            .with(&user_menu(), MockElement::with_text(USER_EMAIL))
            .with(&logout_button(), MockElement::new())
            .with(&Selector::role_named("link", "Users"), MockElement::new()),
    );
    driver.route(
        "/admin/users/",
        MockScreen::new("EBMS | Users")
            .with(&Selector::role("table"), MockElement::new())
            .with(&Selector::role_named("link", "Add User"), MockElement::new())
            .with(&search_input(), MockElement::new())
            .with(&Selector::role_named("button", "Search"), MockElement::new())
            .with(&logout_button(), MockElement::new()),
    );

    let mut form = MockScreen::new("EBMS | Create User");
    for label in FORM_TEXT_FIELDS {
        form = form.with(&Selector::label(label), MockElement::new());
    }
    driver.route(
        "/admin/users/create/",
        form.with(
            &Selector::label("Permission Group"),
            MockElement::select(["Admin", "Manager", "Operator", "Viewer"]),
        )
        .with(&Selector::label("Status"), MockElement::select(["Active", "Inactive"]))
        .with(&Selector::role_named("button", "Submit"), MockElement::new())
        .with(&logout_button(), MockElement::new()),
    );
}

fn render_rows(state: &mut MockState, filter: &str) {
    state.remove(&user_rows());
    let records = state.records().to_vec();
    for record in records.iter().filter(|r| r.contains(filter)) {
        state.append(&user_rows(), MockElement::with_text(record.clone()));
    }
}

fn register_behaviour(driver: &MockDriver) {
    driver.guard(|state, path| {
        (path != "/login" && !state.has_cookie(SESSION_COOKIE)).then(|| "/login".to_string())
    });

    driver.on_load(|state, path| {
        if path == "/admin/users/" {
            render_rows(state, "");
        }
    });

    driver.on_click(&login_button(), |state| {
        let email = state.value_of(&email_field()).unwrap_or_default();
        let password = state.value_of(&password_field()).unwrap_or_default();
        let valid = matches!(
            (email.as_str(), password.as_str()),
            (USER_EMAIL, USER_PASSWORD) | (ADMIN_EMAIL, ADMIN_PASSWORD)
        );
        if valid {
            let domain = state.domain();
            state.set_cookie(Cookie::session(SESSION_COOKIE, "s3cr3t-session", domain));
            state.navigate("/dashboard");
        } else {
            state.show(&toast_error(), MockElement::with_text(INVALID_LOGIN));
        }
    });

    driver.on_click(&logout_button(), |state| {
        state.clear_cookie(SESSION_COOKIE);
        state.navigate("/login");
    });

    driver.on_click(&Selector::role_named("link", "Users"), |state| {
        state.navigate("/admin/users/");
    });

    driver.on_click(&Selector::role_named("link", "Add User"), |state| {
        state.navigate("/admin/users/create/");
    });

    driver.on_click(&Selector::role_named("button", "Search"), |state| {
        let term = state.value_of(&search_input()).unwrap_or_default();
        render_rows(state, term.trim());
    });

    driver.on_click(&Selector::role_named("button", "Submit"), |state| {
        let values: Vec<String> = FORM_TEXT_FIELDS
            .iter()
            .map(|label| state.value_of(&Selector::label(*label)).unwrap_or_default())
            .collect();
        let [first, last, email, _phone] = [&values[0], &values[1], &values[2], &values[3]];

        if values.iter().any(|v| v.trim().is_empty()) || !email.contains('@') {
            state.show(&toast_error(), MockElement::with_text("Please fill all required fields"));
            return;
        }
        if state.records().iter().any(|r| r.ends_with(&format!(" {email}"))) {
            state.show(&toast_error(), MockElement::with_text(DUPLICATE_EMAIL));
            return;
        }

        state.push_record(format!("{first} {last} {email}"));
        state.navigate("/admin/users/");
        state.show(&toast_success(), MockElement::with_text(USER_ADDED_MESSAGE));
    });
}

/// One event seen by [`EventLog`]
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
    pub in_test_span: bool,
}

/// Layer recording every event, for asserting on log output
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<CapturedEvent>>>);

impl EventLog {
    /// Capture events on this thread until the guard drops
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn with_message(&self, message: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.message == message)
            .collect()
    }
}

impl<S> Layer<S> for EventLog
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut message = MessageField::default();
        event.record(&mut message);
        let in_test_span = ctx
            .event_scope(event)
            .into_iter()
            .flatten()
            .any(|span| span.name() == "e2e_test");
        self.0.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: message.0,
            in_test_span,
        });
    }
}

#[derive(Default)]
struct MessageField(String);

impl Visit for MessageField {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}
