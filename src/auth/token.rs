use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::key::SigningKey;
use crate::auth::provider::{AuthenticationPrincipal, TokenProvider};
use crate::auth::user::{Role, UserLookup};
use crate::clock::{Clock, SystemClock};
use crate::config::{RoleSource, TokenConfig};
use crate::constants::BEARER_PREFIX;
use crate::error::{JwtProviderError, Result, TokenErrorKind};

/// JWT Claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user identity)
    pub sub: String,
    /// Role names at issuance time
    #[serde(default)]
    pub roles: Vec<String>,
    /// Issued at (as UTC timestamp)
    #[serde(default, deserialize_with = "numeric_date")]
    pub iat: i64,
    /// Expiration time (as UTC timestamp)
    #[serde(deserialize_with = "numeric_date")]
    pub exp: i64,
}

// NumericDate may be fractional; fractions are floored to whole seconds
fn numeric_date<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct NumericDate;

    impl<'de> Visitor<'de> for NumericDate {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a NumericDate in seconds")
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<i64, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<i64, E> {
            i64::try_from(value).map_err(|_| E::custom("NumericDate out of range"))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<i64, E> {
            if value.is_finite() && value >= i64::MIN as f64 && value < i64::MAX as f64 {
                Ok(value.floor() as i64)
            } else {
                Err(E::custom("NumericDate out of range"))
            }
        }
    }

    deserializer.deserialize_any(NumericDate)
}

impl Claims {
    /// Creates claims issued at `now` that expire after `validity`
    pub fn new(
        identity: String,
        roles: Vec<String>,
        now: DateTime<Utc>,
        validity: Duration,
    ) -> Result<Self> {
        let expires_at = chrono::Duration::from_std(validity)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .ok_or_else(|| {
                JwtProviderError::ValidationError("Token validity window is out of range".to_string())
            })?;

        Ok(Self {
            sub: identity,
            roles,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        })
    }

    /// Expired unless the expiration is strictly after `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

/// HS256 token provider backed by a user lookup collaborator
pub struct JwtTokenProvider {
    key: SigningKey,
    validity: Duration,
    role_source: RoleSource,
    validation: Validation,
    users: Arc<dyn UserLookup>,
    clock: Arc<dyn Clock>,
}

impl JwtTokenProvider {
    /// Creates a provider using the system clock and fresh user roles
    pub fn new(key: SigningKey, validity: Duration, users: Arc<dyn UserLookup>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock instead
        validation.validate_exp = false;
        validation.leeway = 0;
        // No audience policy: tokens carrying `aud` are accepted as-is
        validation.validate_aud = false;
        // `exp` presence is enforced by `Claims` itself
        validation.set_required_spec_claims(&["sub"]);

        log::debug!(
            "JWT provider ready: key fingerprint {}, validity {:?}",
            key.fingerprint(),
            validity
        );

        Self {
            key,
            validity,
            role_source: RoleSource::UserRecord,
            validation,
            users,
            clock: Arc::new(SystemClock),
        }
    }

    /// Creates a provider from a loaded configuration
    pub fn from_config(config: &TokenConfig, users: Arc<dyn UserLookup>) -> Result<Self> {
        let provider = Self::new(config.signing_key()?, config.validity, users)
            .with_role_source(config.role_source);
        Ok(provider)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_role_source(mut self, role_source: RoleSource) -> Self {
        self.role_source = role_source;
        self
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    pub fn key_fingerprint(&self) -> &str {
        self.key.fingerprint()
    }

    /// Verifies signature and expiry and returns the claims
    pub fn decode_claims(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, self.key.decoding_key(), &self.validation)?;
        let claims = token_data.claims;

        if claims.is_expired_at(self.clock.now()) {
            log::debug!("JWT rejected: expired at {}", claims.exp);
            return Err(JwtProviderError::TokenError(TokenErrorKind::Expired));
        }

        Ok(claims)
    }

    fn roles_from_claims(&self, claims: &Claims) -> BTreeSet<Role> {
        claims
            .roles
            .iter()
            .filter_map(|name| match name.parse::<Role>() {
                Ok(role) => Some(role),
                Err(_) => {
                    log::warn!("Ignoring unknown role '{}' in token for {}", name, claims.sub);
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl TokenProvider for JwtTokenProvider {
    fn create_token(&self, identity: &str, roles: &[String]) -> Result<String> {
        if identity.is_empty() {
            return Err(JwtProviderError::ValidationError(
                "Token identity must not be empty".to_string(),
            ));
        }

        let claims = Claims::new(
            identity.to_string(),
            roles.to_vec(),
            self.clock.now(),
            self.validity,
        )?;

        encode(&Header::new(Algorithm::HS256), &claims, self.key.encoding_key())
            .map_err(|e| JwtProviderError::SigningError(format!("Failed to generate token: {}", e)))
    }

    fn validate_token(&self, token: &str) -> Result<bool> {
        self.decode_claims(token)?;
        Ok(true)
    }

    fn get_username(&self, token: &str) -> Result<String> {
        Ok(self.decode_claims(token)?.sub)
    }

    async fn get_authentication(&self, token: &str) -> Result<AuthenticationPrincipal> {
        let claims = self.decode_claims(token)?;
        let identity = claims.sub.clone();

        let user = match self.users.find_by_identity(&identity).await? {
            Some(user) => user,
            None => {
                log::debug!("Token subject {} has no user record", identity);
                return Err(JwtProviderError::TokenError(TokenErrorKind::UserNotFound));
            }
        };

        let roles = match self.role_source {
            RoleSource::UserRecord => user.roles.iter().copied().collect(),
            RoleSource::Token => self.roles_from_claims(&claims),
        };

        Ok(AuthenticationPrincipal::new(identity, roles))
    }

    fn provider_name(&self) -> &'static str {
        "JWT"
    }
}

/// Extracts bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<String> {
    auth_header.strip_prefix(BEARER_PREFIX).map(str::to_string)
}
