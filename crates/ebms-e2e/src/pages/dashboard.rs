use crate::locator::Locator;
use crate::page_object::{BasePage, PageObject};
use crate::pages::UsersListPage;
use crate::result::E2eResult;

/// Landing screen after login (`/dashboard`)
#[derive(Debug, Clone)]
pub struct DashboardPage {
    base: BasePage,
    user_menu: Locator,
    logout_button: Locator,
    heading: Locator,
    users_link: Locator,
}

impl PageObject for DashboardPage {
    const PATH: &'static str = "/dashboard";

    fn create(base: BasePage) -> E2eResult<Self> {
        Ok(Self {
            base,
            user_menu: Locator::parse("testid=user-menu")?,
            logout_button: Locator::parse(r#"role=button[name="Logout"]"#)?,
            heading: Locator::parse("role=heading")?,
            users_link: Locator::parse(r#"role=link[name="Users"]"#)?,
        })
    }

    fn base(&self) -> &BasePage {
        &self.base
    }

    fn ready_locator(&self) -> &Locator {
        &self.user_menu
    }
}

impl DashboardPage {
    /// Soft check for the signed-in user menu
    pub async fn is_authenticated(&self) -> E2eResult<bool> {
        self.base.is_visible(&self.user_menu).await
    }

    /// Heading text
    pub async fn heading(&self) -> E2eResult<String> {
        self.base.text_of(&self.heading).await
    }

    /// Press Logout
    pub async fn logout(&self) -> E2eResult<()> {
        tracing::info!("logging out from dashboard");
        self.base.click(&self.logout_button).await
    }

    /// Follow the Users link and wait for the list
    pub async fn open_users(&self) -> E2eResult<UsersListPage> {
        self.base.click(&self.users_link).await?;
        let users = UsersListPage::create(self.base.clone())?;
        users.wait_until_loaded().await?;
        Ok(users)
    }

    /// User menu locator
    #[must_use]
    pub const fn user_menu(&self) -> &Locator {
        &self.user_menu
    }
}
