use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, UserAccount, UserId},
    traits::UserManagementError,
};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<UserAccount, UserManagementError> {
    let result = sqlx::query_as::<_, UserAccount>(
        "INSERT INTO users (user_id, password_hash, created_at) VALUES (?, ?, ?) RETURNING user_id, password_hash, \
         created_at",
    )
    .bind(&user.user_id)
    .bind(&user.password_hash)
    .bind(Utc::now())
    .fetch_one(conn)
    .await;
    match result {
        Ok(account) => {
            debug!("🗃️ Created user account for {}", account.user_id);
            Ok(account)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(UserManagementError::UserAlreadyExists(user.user_id)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_user(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Option<UserAccount>, UserManagementError> {
    let account =
        sqlx::query_as::<_, UserAccount>("SELECT user_id, password_hash, created_at FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(conn)
            .await?;
    Ok(account)
}
