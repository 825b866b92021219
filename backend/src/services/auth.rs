//! PIN login and role token management

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use shared::Role;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// PINs used when a development deployment configures no hashes
const DEV_PINS: [(Role, &str); 3] = [
    (Role::Admin, "1234"),
    (Role::Manager, "5678"),
    (Role::Cook, "9999"),
];

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    pin_hashes: Arc<Vec<(Role, String)>>,
    jwt_secret: String,
    access_token_expiry: i64,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub pin: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Role name
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub role: Role,
}

impl AuthService {
    /// Resolve the role PIN hashes from configuration.
    ///
    /// Development falls back to hashing the well-known PINs; any other
    /// environment must configure all three hashes.
    pub fn new(config: &Config) -> AppResult<Self> {
        let configured = [
            (Role::Admin, config.auth.admin_pin_hash.clone()),
            (Role::Manager, config.auth.manager_pin_hash.clone()),
            (Role::Cook, config.auth.cook_pin_hash.clone()),
        ];

        let mut pin_hashes = Vec::with_capacity(configured.len());
        for (role, configured_hash) in configured {
            let pin_hash = match configured_hash {
                Some(h) if !h.trim().is_empty() => h,
                _ if config.is_development() => {
                    let pin = DEV_PINS
                        .iter()
                        .find(|(r, _)| *r == role)
                        .map(|(_, pin)| *pin)
                        .ok_or_else(|| AppError::Internal(format!("No PIN for {}", role)))?;
                    tracing::warn!(role = %role, "Using development PIN");
                    hash(pin, config.auth.bcrypt_cost)
                        .map_err(|e| AppError::Internal(format!("PIN hashing failed: {}", e)))?
                }
                _ => {
                    return Err(AppError::Configuration(format!(
                        "auth.{}_pin_hash must be set outside development",
                        role
                    )))
                }
            };
            pin_hashes.push((role, pin_hash));
        }

        Ok(Self {
            pin_hashes: Arc::new(pin_hashes),
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
        })
    }

    /// Resolve a PIN to a role and issue a token
    pub async fn login(&self, pin: &str) -> AppResult<LoginResponse> {
        if pin.trim().is_empty() {
            return Err(AppError::validation("pin", "PIN is required"));
        }

        // bcrypt is CPU bound; keep it off the async workers
        let pin_hashes = Arc::clone(&self.pin_hashes);
        let pin = pin.to_string();
        let role = tokio::task::spawn_blocking(move || {
            pin_hashes
                .iter()
                .find(|(_, pin_hash)| verify(&pin, pin_hash).unwrap_or(false))
                .map(|(role, _)| *role)
        })
        .await
        .map_err(|e| AppError::Internal(format!("PIN verification task failed: {}", e)))?;

        let Some(role) = role else {
            tracing::warn!("PIN login rejected");
            return Err(AppError::InvalidCredentials);
        };

        let response = self.generate_token(role)?;
        tracing::info!(role = %role, "PIN login succeeded");
        Ok(response)
    }

    /// Validate an access token and return its claims
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })?;

        Ok(token_data.claims)
    }

    fn generate_token(&self, role: Role) -> AppResult<LoginResponse> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_token_expiry);

        let claims = Claims {
            sub: role.as_str().to_string(),
            role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_config() -> Config {
        let mut config = Config::default();
        config.environment = "development".to_string();
        config.auth.bcrypt_cost = 4;
        config
    }

    #[tokio::test]
    async fn test_development_pins_resolve_roles() {
        let auth = AuthService::new(&dev_config()).unwrap();
        assert_eq!(auth.login("1234").await.unwrap().role, Role::Admin);
        assert_eq!(auth.login("5678").await.unwrap().role, Role::Manager);
        assert_eq!(auth.login("9999").await.unwrap().role, Role::Cook);
    }

    #[tokio::test]
    async fn test_concurrent_logins_share_hashes() {
        let auth = AuthService::new(&dev_config()).unwrap();
        let (admin, manager, cook) = tokio::try_join!(
            auth.login("1234"),
            auth.login("5678"),
            auth.login("9999"),
        )
        .unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(manager.role, Role::Manager);
        assert_eq!(cook.role, Role::Cook);
    }

    #[tokio::test]
    async fn test_wrong_pin_rejected() {
        let auth = AuthService::new(&dev_config()).unwrap();
        assert!(matches!(auth.login("0000").await, Err(AppError::InvalidCredentials)));
        assert!(matches!(auth.login(" ").await, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_token_round_trip_carries_role() {
        let auth = AuthService::new(&dev_config()).unwrap();
        let login = auth.login("5678").await.unwrap();
        let claims = auth.validate_token(&login.access_token).unwrap();
        assert_eq!(claims.role, Role::Manager);
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 3600);
    }

    #[test]
    fn test_production_requires_hashes() {
        let mut config = dev_config();
        config.environment = "production".to_string();
        assert!(matches!(
            AuthService::new(&config),
            Err(AppError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_configured_hash_used() {
        let mut config = dev_config();
        config.environment = "production".to_string();
        config.auth.admin_pin_hash = Some(hash("4242", 4).unwrap());
        config.auth.manager_pin_hash = Some(hash("4343", 4).unwrap());
        config.auth.cook_pin_hash = Some(hash("4444", 4).unwrap());
        let auth = AuthService::new(&config).unwrap();
        assert_eq!(auth.login("4343").await.unwrap().role, Role::Manager);
        assert!(auth.login("1234").await.is_err());
    }

    #[tokio::test]
    async fn test_tampered_token_rejected() {
        let auth = AuthService::new(&dev_config()).unwrap();
        let login = auth.login("1234").await.unwrap();
        let tampered = format!("{}x", login.access_token);
        assert!(matches!(
            auth.validate_token(&tampered),
            Err(AppError::InvalidToken)
        ));
    }
}
