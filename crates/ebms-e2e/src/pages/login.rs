use crate::auth::Credentials;
use crate::locator::Locator;
use crate::page_object::{BasePage, PageObject};
use crate::result::E2eResult;

/// Login screen (`/login`)
#[derive(Debug, Clone)]
pub struct LoginPage {
    base: BasePage,
    email_input: Locator,
    password_input: Locator,
    login_button: Locator,
}

impl PageObject for LoginPage {
    const PATH: &'static str = "/login";

    fn create(base: BasePage) -> E2eResult<Self> {
        Ok(Self {
            base,
            email_input: Locator::parse("label=Email")?,
            password_input: Locator::parse("label=Password")?,
            login_button: Locator::parse(r#"role=button[name="Login"]"#)?,
        })
    }

    fn base(&self) -> &BasePage {
        &self.base
    }

    fn ready_locator(&self) -> &Locator {
        &self.email_input
    }
}

impl LoginPage {
    /// Fill both fields and press Login
    pub async fn submit_credentials(&self, email: &str, password: &str) -> E2eResult<()> {
        tracing::debug!(email, "submitting login form");
        self.base.fill(&self.email_input, email).await?;
        self.base.fill(&self.password_input, password).await?;
        self.base.click(&self.login_button).await
    }

    /// Submit `credentials`
    pub async fn login(&self, credentials: &Credentials) -> E2eResult<()> {
        self.submit_credentials(&credentials.email, &credentials.password)
            .await
    }

    /// Whether the email, password and submit controls are all showing
    pub async fn is_form_visible(&self) -> E2eResult<bool> {
        for locator in [&self.email_input, &self.password_input, &self.login_button] {
            if !self.base.is_visible(locator).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Error toast text, or `""`
    pub async fn error_message(&self) -> String {
        self.base.error_banner_text().await
    }

    /// Email field locator
    #[must_use]
    pub const fn email_input(&self) -> &Locator {
        &self.email_input
    }

    /// Password field locator
    #[must_use]
    pub const fn password_input(&self) -> &Locator {
        &self.password_input
    }
}
