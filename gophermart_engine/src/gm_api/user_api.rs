use std::fmt::Debug;

use gm_common::Secret;
use log::*;

use crate::{
    db_types::{NewUser, UserAccount, UserId},
    gm_api::errors::UserApiError,
    helpers::{hash_password, verify_password},
    traits::UserManagement,
};

pub struct UserApi<B> {
    db: B,
}

impl<B> Debug for UserApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserApi")
    }
}

impl<B> UserApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> UserApi<B>
where B: UserManagement
{
    /// Creates a user. Surrounding whitespace is stripped from the login; the password is used as given but must not
    /// be blank.
    pub async fn register(&self, login: &str, password: &Secret<String>) -> Result<UserAccount, UserApiError> {
        let login = login.trim();
        if login.is_empty() {
            return Err(UserApiError::EmptyLogin);
        }
        if password.reveal().trim().is_empty() {
            return Err(UserApiError::EmptyPassword);
        }
        let user = NewUser { user_id: UserId::from(login), password_hash: hash_password(password.reveal()) };
        let account = self.db.insert_user(user).await?;
        info!("🔄️👤️ Registered new user {}", account.user_id);
        Ok(account)
    }

    /// Checks the password for `login`. Unknown logins and wrong passwords give the same error.
    pub async fn authenticate(&self, login: &str, password: &Secret<String>) -> Result<UserAccount, UserApiError> {
        let user_id = UserId::from(login.trim());
        let account = self.db.fetch_user(&user_id).await?.ok_or(UserApiError::InvalidCredentials)?;
        match verify_password(password.reveal(), &account.password_hash) {
            Ok(true) => {
                debug!("🔄️👤️ {user_id} authenticated");
                Ok(account)
            },
            Ok(false) => Err(UserApiError::InvalidCredentials),
            Err(e) => {
                error!("🔄️👤️ Password hash for {user_id} is unreadable. {e}");
                Err(UserApiError::InvalidCredentials)
            },
        }
    }
}
