use crate::locator::{Locator, Selector};
use crate::page_object::{BasePage, PageObject};
use crate::pages::CreateUserPage;
use crate::result::E2eResult;

/// Admin users table (`/admin/users/`)
#[derive(Debug, Clone)]
pub struct UsersListPage {
    base: BasePage,
    users_table: Locator,
    add_user_link: Locator,
    search_input: Locator,
    search_button: Locator,
    rows: Locator,
}

impl PageObject for UsersListPage {
    const PATH: &'static str = "/admin/users/";

    fn create(base: BasePage) -> E2eResult<Self> {
        Ok(Self {
            base,
            users_table: Locator::parse("role=table")?,
            add_user_link: Locator::parse(r#"role=link[name="Add User"]"#)?,
            search_input: Locator::parse("placeholder=Search")?,
            search_button: Locator::parse(r#"role=button[name="Search"]"#)?,
            rows: Locator::parse("css=table tbody tr")?,
        })
    }

    fn base(&self) -> &BasePage {
        &self.base
    }

    fn ready_locator(&self) -> &Locator {
        &self.users_table
    }
}

impl UsersListPage {
    /// Follow "Add User" and wait for the form
    pub async fn click_add_user(&self) -> E2eResult<CreateUserPage> {
        self.base.click(&self.add_user_link).await?;
        let form = CreateUserPage::create(self.base.clone())?;
        form.wait_until_loaded().await?;
        Ok(form)
    }

    /// Filter the table
    pub async fn search(&self, term: &str) -> E2eResult<()> {
        tracing::debug!(term, "searching users");
        self.base.fill(&self.search_input, term).await?;
        self.base.click(&self.search_button).await?;
        self.base.wait_for(&self.users_table).await
    }

    /// Soft check that some row shows `email`
    pub async fn contains_user(&self, email: &str) -> E2eResult<bool> {
        self.base
            .is_visible(&Locator::new(Selector::text(email)))
            .await
    }

    /// Rows currently in the table
    pub async fn row_count(&self) -> E2eResult<usize> {
        self.base.page().count(self.rows.selector()).await
    }
}
