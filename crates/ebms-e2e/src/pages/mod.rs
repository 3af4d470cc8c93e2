//! Screen wrappers for the EBMS application.

mod create_user;
mod dashboard;
mod login;
mod users_list;

pub use create_user::{CreateUserPage, USER_ADDED_MESSAGE};
pub use dashboard::DashboardPage;
pub use login::LoginPage;
pub use users_list::UsersListPage;
