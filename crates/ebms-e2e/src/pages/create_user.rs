use crate::data::UserRecord;
use crate::locator::Locator;
use crate::page_object::{BasePage, PageObject};
use crate::result::E2eResult;

/// Success banner text after a user is created
pub const USER_ADDED_MESSAGE: &str = "New User has been added";

/// Create-user form (`/admin/users/create/`)
#[derive(Debug, Clone)]
pub struct CreateUserPage {
    base: BasePage,
    first_name: Locator,
    last_name: Locator,
    email: Locator,
    contact_number: Locator,
    permission_group: Locator,
    status: Locator,
    submit_button: Locator,
}

impl PageObject for CreateUserPage {
    const PATH: &'static str = "/admin/users/create/";

    fn create(base: BasePage) -> E2eResult<Self> {
        Ok(Self {
            base,
            first_name: Locator::parse("label=First Name")?,
            last_name: Locator::parse("label=Last Name")?,
            email: Locator::parse("label=Email")?,
            contact_number: Locator::parse("label=Contact Number")?,
            permission_group: Locator::parse("label=Permission Group")?,
            status: Locator::parse("label=Status")?,
            submit_button: Locator::parse(r#"role=button[name="Submit"]"#)?,
        })
    }

    fn base(&self) -> &BasePage {
        &self.base
    }

    fn ready_locator(&self) -> &Locator {
        &self.first_name
    }
}

impl CreateUserPage {
    /// Enter every field of `user`
    pub async fn fill_form(&self, user: &UserRecord) -> E2eResult<()> {
        let base = &self.base;
        base.fill(&self.first_name, &user.first_name).await?;
        base.fill(&self.last_name, &user.last_name).await?;
        base.fill(&self.email, &user.email).await?;
        base.fill(&self.contact_number, &user.contact_number).await?;
        base.select_option(&self.permission_group, &user.permission_group)
            .await?;
        base.select_option(&self.status, &user.status).await
    }

    /// Press Submit
    pub async fn submit(&self) -> E2eResult<()> {
        self.base.click(&self.submit_button).await
    }

    /// Fill and submit
    pub async fn create_user(&self, user: &UserRecord) -> E2eResult<()> {
        tracing::info!(email = %user.email, "creating user");
        self.fill_form(user).await?;
        self.submit().await
    }

    /// Success toast text, or `""`
    pub async fn success_message(&self) -> String {
        self.base.success_banner_text().await
    }

    /// Error toast text, or `""`
    pub async fn error_message(&self) -> String {
        self.base.error_banner_text().await
    }
}
