//! Authentication service for user registration, login, and token issuance

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use shared::{User, UserRole};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
}

/// Input for registering a new user
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub name: String,
    pub role: Option<UserRole>,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Issued access token
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

type UserRow = (Uuid, String, String, String, chrono::DateTime<chrono::Utc>);

fn user_from_row(row: UserRow) -> AppResult<User> {
    let role = UserRole::from_str(&row.3)
        .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Unknown role '{}'", row.3)))?;
    Ok(User {
        id: row.0,
        email: row.1,
        name: row.2,
        role,
        created_at: row.4,
    })
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
        }
    }

    /// Register a new user.
    pub async fn register(&self, input: RegisterInput) -> AppResult<User> {
        input.validate()?;

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Password hashing failed: {}", e)))?;

        let role = input.role.unwrap_or(UserRole::Cashier);

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, name, role, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, role, created_at
            "#,
        )
        .bind(&input.email)
        .bind(&input.name)
        .bind(role.as_str())
        .bind(&password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateEntry("email".to_string())
            }
            _ => AppError::DatabaseError(e),
        })?;

        user_from_row(row)
    }

    /// Authenticate a user with email and password.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthTokens> {
        let row = sqlx::query_as::<_, (Uuid, String, String)>(
            "SELECT id, role, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        let valid = verify(password, &row.2).map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Password verification failed: {}", e))
        })?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        self.generate_token(row.0, &row.1)
    }

    /// Validate an access token and return its claims.
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })?;

        Ok(token_data.claims)
    }

    /// Fetch a user by id.
    pub async fn get_user(&self, id: Uuid) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        user_from_row(row)
    }

    fn generate_token(&self, user_id: Uuid, role: &str) -> AppResult<AuthTokens> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_token_expiry);

        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Token generation failed: {}", e)))?;

        Ok(AuthTokens {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }
}
