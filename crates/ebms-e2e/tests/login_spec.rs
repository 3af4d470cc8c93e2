//! Login and session behaviour.

mod common;

use common::{app, config, page, INVALID_LOGIN, SESSION_COOKIE, USER_EMAIL};
use ebms_e2e::prelude::*;
use std::time::Duration;

#[tokio::test]
async fn login_form_is_visible() {
    let driver = app();
    with_login_page(page(&driver), config(), |session| async move {
        assert!(session.page.is_form_visible().await?);
        assert!(session.page.is_current().await?);
        assert_eq!(session.page.base().page_title().await?, "EBMS | Login");
        Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn valid_credentials_reach_dashboard() {
    let driver = app();
    with_authenticated(page(&driver), config(), |mut ctx| async move {
        let dashboard = ctx.page::<DashboardPage>().await?;
        dashboard
            .base()
            .validate_url_matches(&UrlPattern::regex(r"dashboard|home|/$")?)
            .await?;
        assert!(dashboard.is_authenticated().await?);
        assert_eq!(dashboard.heading().await?, "Dashboard");
        Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn invalid_password_shows_error_toast() {
    let driver = app();
    with_login_page(page(&driver), config(), |session| async move {
        session
            .page
            .submit_credentials(USER_EMAIL, "wrong-password")
            .await?;
        assert_eq!(session.page.error_message().await, INVALID_LOGIN);
        assert!(session.page.is_current().await?);
        Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn successful_login_has_no_error_toast() {
    let driver = app();
    let config = config();
    let credentials = config.credentials.clone();
    with_login_page(page(&driver), config, |session| async move {
        session.page.login(&credentials).await?;
        assert_eq!(session.page.error_message().await, "");
        assert!(!session.page.is_current().await?);
        Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn admin_can_log_in() {
    let driver = app();
    let page = page(&driver);
    let config = config();

    ebms_e2e::auth::login_as_admin(&page, &config).await.unwrap();
    assert!(ebms_e2e::auth::is_authenticated(&page, Duration::from_millis(200))
        .await
        .unwrap());
}

#[tokio::test]
async fn protected_route_redirects_to_login() {
    let driver = app();
    let page = page(&driver);
    let config = config();

    ebms_e2e::auth::navigate(&page, &config, "/dashboard")
        .await
        .unwrap();
    assert!(page.current_url().await.unwrap().ends_with("/login"));
}

#[tokio::test]
async fn dashboard_logout_ends_session() {
    let driver = app();
    let storage = with_dashboard_page(page(&driver), config(), |session| async move {
        session.page.logout().await?;
        let login = LoginPage::create(session.page.base().clone())?;
        login.wait_until_loaded().await?;
        session.context.shared_page().storage_state().await
    })
    .await
    .unwrap();

    assert!(storage.cookie(SESSION_COOKIE).is_none());
}

#[tokio::test]
async fn storage_state_is_saved_after_login() {
    let driver = app();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user.json");
    let target = path.clone();

    with_authenticated(page(&driver), config(), |ctx| async move {
        ebms_e2e::auth::save_storage_state(ctx.shared_page(), &target).await?;
        Ok(())
    })
    .await
    .unwrap();

    let saved = StorageState::load(&path).unwrap();
    let cookie = saved.cookie(SESSION_COOKIE).unwrap();
    assert_eq!(cookie.domain, "localhost");
}
