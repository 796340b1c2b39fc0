use thiserror::Error;

use crate::db_types::{NewUser, UserAccount, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserManagementError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User {0} already exists")]
    UserAlreadyExists(UserId),
}

impl From<sqlx::Error> for UserManagementError {
    fn from(e: sqlx::Error) -> Self {
        UserManagementError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Creates a new user. Fails with [`UserManagementError::UserAlreadyExists`] if the login is taken.
    async fn insert_user(&self, user: NewUser) -> Result<UserAccount, UserManagementError>;

    async fn fetch_user(&self, user_id: &UserId) -> Result<Option<UserAccount>, UserManagementError>;
}
