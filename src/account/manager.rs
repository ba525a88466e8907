/// User accounts and JWT sessions

use crate::{
    account::{
        password,
        tokens::{JwtIssuer, TokenType},
        TokenPair,
    },
    config::AdminBootstrap,
    db::account::{BlacklistedToken, User},
    error::{InventoryError, InventoryResult},
};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, is_superuser, is_active, date_joined, last_login";

const INVALID_CREDENTIALS: &str = "No active account found with the given credentials.";

/// Account manager service
pub struct AccountManager {
    db: SqlitePool,
    jwt: JwtIssuer,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(db: SqlitePool, jwt: JwtIssuer) -> Self {
        Self { db, jwt }
    }

    /// Create a new user with a hashed password
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        is_superuser: bool,
    ) -> InventoryResult<User> {
        if username.trim().is_empty() {
            return Err(InventoryError::Validation("Username cannot be empty".to_string()));
        }

        if !email.contains('@') {
            return Err(InventoryError::Validation("Invalid email format".to_string()));
        }

        let password_hash = password::hash_password_blocking(password).await?;
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO account (username, email, password_hash, is_superuser, is_active, date_joined)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(username)
        .bind(email)
        .bind(&password_hash)
        .bind(is_superuser)
        .bind(true)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                InventoryError::Conflict("Username or email already registered".to_string())
            }
            other => InventoryError::Database(other),
        })?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            is_superuser,
            is_active: true,
            date_joined: now,
            last_login: None,
        })
    }

    /// Create the configured superuser unless the username is already taken
    pub async fn ensure_superuser(&self, admin: &AdminBootstrap) -> InventoryResult<()> {
        if self.get_user_by_username(&admin.username).await?.is_some() {
            tracing::debug!("Bootstrap admin {} already exists", admin.username);
            return Ok(());
        }

        let user = self
            .create_user(&admin.username, &admin.email, &admin.password, true)
            .await?;
        tracing::info!("Created bootstrap admin {} (id {})", user.username, user.id);

        Ok(())
    }

    /// Get user by id
    pub async fn get_user(&self, id: i64) -> InventoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM account WHERE id = ?1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// Find user by email
    pub async fn get_user_by_email(&self, email: &str) -> InventoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM account WHERE email = ?1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// Find user by username
    pub async fn get_user_by_username(&self, username: &str) -> InventoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM account WHERE username = ?1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// Replace the password of `user` with a freshly salted hash of `new_password`.
    ///
    /// The update only applies while the stored hash is still `user.password_hash`.
    /// Returns `false` when the account is gone or its password changed since
    /// `user` was loaded.
    pub async fn replace_password(&self, user: &User, new_password: &str) -> InventoryResult<bool> {
        let password_hash = password::hash_password_blocking(new_password).await?;

        let result = sqlx::query(
            "UPDATE account SET password_hash = ?1 WHERE id = ?2 AND password_hash = ?3",
        )
        .bind(&password_hash)
        .bind(user.id)
        .bind(&user.password_hash)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Check a password against the stored hash
    pub async fn check_password(&self, user: &User, password: &str) -> InventoryResult<bool> {
        password::verify_password_blocking(password, &user.password_hash).await
    }

    /// Authenticate with username and password and issue a token pair
    pub async fn login(&self, username: &str, password: &str) -> InventoryResult<(User, TokenPair)> {
        let invalid = || InventoryError::Authentication(INVALID_CREDENTIALS.to_string());

        let user = self.get_user_by_username(username).await?.ok_or_else(invalid)?;

        if !user.is_active || !self.check_password(&user, password).await? {
            return Err(invalid());
        }

        sqlx::query("UPDATE account SET last_login = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(user.id)
            .execute(&self.db)
            .await?;

        let tokens = TokenPair {
            access: self.jwt.issue(user.id, TokenType::Access)?,
            refresh: self.jwt.issue(user.id, TokenType::Refresh)?,
        };

        Ok((user, tokens))
    }

    /// Exchange a refresh token for a new access token
    pub async fn refresh(&self, refresh_token: &str) -> InventoryResult<String> {
        let claims = self.jwt.verify(refresh_token, TokenType::Refresh)?;

        if self.get_blacklisted(&claims.jti).await?.is_some() {
            return Err(InventoryError::Authentication("Token is blacklisted".to_string()));
        }

        let user = self
            .get_user(claims.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| InventoryError::Authentication("User not found".to_string()))?;

        self.jwt.issue(user.id, TokenType::Access)
    }

    /// Blacklist a refresh token owned by `user_id`
    pub async fn logout(&self, user_id: i64, refresh_token: &str) -> InventoryResult<()> {
        let claims = self
            .jwt
            .verify(refresh_token, TokenType::Refresh)
            .map_err(|_| InventoryError::Validation("Token is invalid or expired".to_string()))?;

        if claims.user_id != user_id {
            return Err(InventoryError::Validation(
                "Token does not belong to the authenticated user".to_string(),
            ));
        }

        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .ok_or_else(|| InventoryError::Validation("Token is invalid or expired".to_string()))?;

        sqlx::query(
            "INSERT OR IGNORE INTO token_blacklist (jti, user_id, expires_at, blacklisted_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&claims.jti)
        .bind(claims.user_id)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        tracing::info!("Refresh token {} blacklisted for user {}", claims.jti, user_id);

        Ok(())
    }

    /// Look up a blacklisted refresh token by id
    pub async fn get_blacklisted(&self, jti: &str) -> InventoryResult<Option<BlacklistedToken>> {
        let token = sqlx::query_as::<_, BlacklistedToken>(
            "SELECT jti, user_id, expires_at, blacklisted_at FROM token_blacklist WHERE jti = ?1",
        )
        .bind(jti)
        .fetch_optional(&self.db)
        .await?;

        Ok(token)
    }

    /// Validate an access token and load its active user
    pub async fn authenticate_access(&self, token: &str) -> InventoryResult<User> {
        let claims = self.jwt.verify(token, TokenType::Access)?;

        self.get_user(claims.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| InventoryError::Authentication("User not found".to_string()))
    }
}
