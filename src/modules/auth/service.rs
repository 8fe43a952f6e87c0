use super::dto::{LoginRequest, TokenClaims, TokenResponse};
use crate::common::security;
use crate::state::AppState;
use anyhow::{Result, anyhow};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, get_current_timestamp};
use time::Duration;

/// Lifetime of tokens issued by `/login`.
pub const TOKEN_TTL: Duration = Duration::hours(3);

pub struct AuthService;

impl AuthService {
    pub fn login(state: &AppState, req: LoginRequest) -> Result<TokenResponse> {
        let account = state
            .accounts
            .find_user_by_username(&req.username)
            .ok_or_else(|| anyhow!("wrong username/password"))?;

        security::verify_password(&req.password, &account.password_hash)
            .map_err(|_| anyhow!("wrong username/password"))?;

        let token = Self::create_token(&account.username, &state.config.jwt_secret, TOKEN_TTL)?;

        Ok(TokenResponse {
            token,
            expires_in: TOKEN_TTL.whole_seconds().unsigned_abs(),
        })
    }

    pub fn create_token(username: &str, secret: &str, ttl: Duration) -> Result<String> {
        let now = get_current_timestamp() as usize;
        let claims = TokenClaims {
            sub: username.to_string(),
            iat: now,
            exp: (now as i64 + ttl.whole_seconds()).max(0) as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| anyhow!(e.to_string()))
    }

    pub fn verify_token(token: &str, secret: &str) -> Result<TokenClaims> {
        let data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}
