use crate::handlers::password::PasswordService;
use crate::handlers::repository::{KpiRepository, RepositoryError};
use crate::models::all_models::{ErrorDetail, Token, User};
use actix_web::{http::header, http::StatusCode, web, HttpResponse, ResponseError};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Lifetime of a normal session.
pub const ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;
/// Lifetime of a "remember me" session.
pub const REMEMBER_ME_EXPIRE_DAYS: i64 = 7;

const UNAUTHORIZED_DETAIL: &str = "Could not validate credentials";

/// Structure representing JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: String, // Username
    pub exp: i64,    // Expiration timestamp
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token expired")]
    TokenExpired,

    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("internal auth error: {0}")]
    Internal(String),
}

impl AuthError {
    fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials | AuthError::TokenExpired | AuthError::UserNotFound
        )
    }
}

// The three rejection cases render identically so callers cannot tell which
// one happened.
impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        if self.is_unauthorized() {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_unauthorized() {
            HttpResponse::Unauthorized()
                .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
                .json(ErrorDetail::new(UNAUTHORIZED_DETAIL))
        } else {
            error!("Authentication failed internally: {}", self);
            HttpResponse::InternalServerError().json(ErrorDetail::new("Internal server error"))
        }
    }
}

/// Signs and checks bearer tokens with a secret loaded once at startup.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against an explicit clock in `validate_token_at`.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        TokenService {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn issue_token(&self, subject: &str, extended: bool) -> Result<String, AuthError> {
        self.issue_token_at(subject, extended, Utc::now())
    }

    pub fn issue_token_at(
        &self,
        subject: &str,
        extended: bool,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let lifetime = if extended {
            Duration::days(REMEMBER_ME_EXPIRE_DAYS)
        } else {
            Duration::minutes(ACCESS_TOKEN_EXPIRE_MINUTES)
        };
        let claims = Claims {
            sub: subject.to_string(),
            exp: (now + lifetime).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    /// Returns the token's subject.
    pub fn validate_token(&self, token: &str) -> Result<String, AuthError> {
        self.validate_token_at(token, Utc::now())
    }

    pub fn validate_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Rejected token: {}", e);
                AuthError::InvalidCredentials
            })?
            .claims;

        if claims.sub.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        if claims.exp <= now.timestamp() {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims.sub)
    }
}

/// Credential verification and session issuance on top of the repository.
#[derive(Clone)]
pub struct AuthService {
    passwords: PasswordService,
    tokens: TokenService,
    // Verified against when the username is unknown, so both paths cost one hash.
    dummy_hash: Arc<str>,
}

impl AuthService {
    pub fn new(passwords: PasswordService, tokens: TokenService) -> Result<Self, AuthError> {
        let dummy_hash = passwords
            .hash_password("dummy-password-for-unknown-users")
            .map_err(|e| AuthError::Internal(format!("hash: {e}")))?;

        Ok(AuthService {
            passwords,
            tokens,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Hashes on the blocking pool; the hash is deliberately slow.
    pub async fn hash_password(&self, plain: String) -> Result<String, AuthError> {
        let passwords = self.passwords.clone();
        web::block(move || passwords.hash_password(&plain))
            .await
            .map_err(|e| AuthError::Internal(format!("blocking pool: {e}")))?
            .map_err(|e| AuthError::Internal(format!("hash: {e}")))
    }

    async fn verify_password(&self, plain: String, digest: String) -> Result<bool, AuthError> {
        let passwords = self.passwords.clone();
        web::block(move || passwords.verify_password(&plain, &digest))
            .await
            .map_err(|e| AuthError::Internal(format!("blocking pool: {e}")))
    }

    pub async fn login(
        &self,
        repo: &dyn KpiRepository,
        username: &str,
        password: String,
        extended: bool,
    ) -> Result<Token, AuthError> {
        let record = repo.find_user_by_username(username).await?;

        let (user, digest) = match record {
            Some(record) => (Some(record.user), record.password_hash),
            None => (None, self.dummy_hash.to_string()),
        };
        let verified = self.verify_password(password, digest).await?;

        match user {
            Some(user) if verified => {
                let token = self.tokens.issue_token(&user.user_name, extended)?;
                Ok(Token::bearer(token))
            }
            Some(_) => Err(AuthError::InvalidCredentials),
            None => Err(AuthError::UserNotFound),
        }
    }

    /// Resolves the user a bearer token was issued to.
    pub async fn authenticate(
        &self,
        repo: &dyn KpiRepository,
        token: &str,
    ) -> Result<User, AuthError> {
        let username = self.tokens.validate_token(token)?;
        repo.find_user_by_username(&username)
            .await?
            .map(|record| record.user)
            .ok_or(AuthError::UserNotFound)
    }
}

#[cfg(test)]
pub(crate) fn test_auth_service() -> AuthService {
    AuthService::new(
        crate::handlers::password::test_password_service(),
        TokenService::new(b"test-secret"),
    )
    .unwrap()
}
