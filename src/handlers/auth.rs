//! Bearer-token authentication for inbound requests

use std::sync::Arc;

use crate::auth::provider::{AuthenticationPrincipal, TokenProvider};
use crate::config::TokenConfig;
use crate::constants::DEFAULT_MAX_TOKEN_LENGTH;
use crate::error::{JwtProviderError, Result, TokenErrorKind};
use crate::security_logger::{log_security_event, SecurityEvent};

/// Resolves the `Authorization` header of a request into a principal
#[derive(Clone)]
pub struct AuthenticationFilter {
    provider: Arc<dyn TokenProvider>,
    max_token_length: usize,
}

impl AuthenticationFilter {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            max_token_length: DEFAULT_MAX_TOKEN_LENGTH,
        }
    }

    /// Creates a filter enforcing the configured token length limit
    pub fn from_config(provider: Arc<dyn TokenProvider>, config: &TokenConfig) -> Self {
        Self::new(provider).with_max_token_length(config.max_token_length)
    }

    pub fn max_token_length(&self) -> usize {
        self.max_token_length
    }

    pub fn with_max_token_length(mut self, max_token_length: usize) -> Self {
        self.max_token_length = max_token_length;
        self
    }

    pub fn provider(&self) -> &Arc<dyn TokenProvider> {
        &self.provider
    }

    /// Authenticate a request from its `Authorization` header value.
    ///
    /// Returns `Ok(None)` when the request carries no bearer token, so it can
    /// continue unauthenticated and be refused later by access control. A token
    /// that is present but fails any check is an error.
    pub async fn authenticate(
        &self,
        authorization_header: Option<&str>,
    ) -> Result<Option<AuthenticationPrincipal>> {
        let token = match self.provider.resolve_token(authorization_header) {
            Some(token) => token,
            None => {
                log::debug!("No bearer token on request");
                return Ok(None);
            }
        };

        if let Err(e) = check_token_shape(&token, self.max_token_length) {
            log_security_event(SecurityEvent::MalformedCredentials {
                reason: e.to_string(),
            })
            .await;
            return Err(JwtProviderError::TokenError(TokenErrorKind::Invalid));
        }

        if let Err(e) = self.provider.validate_token(&token) {
            log_security_event(SecurityEvent::TokenValidationFailed {
                reason: e.to_string(),
            })
            .await;
            return Err(e);
        }

        match self.provider.get_authentication(&token).await {
            Ok(principal) => {
                log_security_event(SecurityEvent::AuthenticationSuccess {
                    identity: principal.identity.clone(),
                })
                .await;
                Ok(Some(principal))
            }
            Err(JwtProviderError::TokenError(TokenErrorKind::UserNotFound)) => {
                let identity = self
                    .provider
                    .get_username(&token)
                    .unwrap_or_else(|_| "<unknown>".to_string());
                log_security_event(SecurityEvent::UserNotFound { identity }).await;
                Err(JwtProviderError::TokenError(TokenErrorKind::UserNotFound))
            }
            Err(e) => {
                log_security_event(SecurityEvent::AuthenticationFailed {
                    identity: None,
                    reason: e.to_string(),
                })
                .await;
                Err(e)
            }
        }
    }
}

/// Cheap checks run before any parsing or signature work
pub fn check_token_shape(token: &str, max_token_length: usize) -> Result<()> {
    if token.len() > max_token_length {
        return Err(JwtProviderError::ValidationError("Token too long".to_string()));
    }

    if token.chars().any(|c| c.is_control()) {
        return Err(JwtProviderError::ValidationError(
            "Token contains invalid characters".to_string(),
        ));
    }

    Ok(())
}
