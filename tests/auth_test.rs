use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::Arc;
use std::time::Duration;

use jwt_provider::auth::token::{Claims, JwtTokenProvider};
use jwt_provider::auth::{Role, SigningKey, TokenProvider, User};
use jwt_provider::clock::FixedClock;
use jwt_provider::config::RoleSource;
use jwt_provider::error::TokenErrorKind;
use jwt_provider::storage::InMemoryUserStore;

const EMAIL: &str = "aboba@example.com";

// Issued by another JWT library for aboba@example.com, HMAC key "secret",
// iat 1688913940, exp 1688917540
const SAMPLE_TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9\
    .eyJzdWIiOiJhYm9iYUBleGFtcGxlLmNvbSIsInJvbGVzIjpbI\
    lVTRVIiXSwiaWF0IjoxNjg4OTEzOTQwLCJleHAiOjE2ODg5MTc1NDB9.\
    EIY8ogg-_eDP_Nxd8b1PdM97vWzE_zrYaJxR0VsXMmY";

// Issued by another JWT library for bob@i.ua, HMAC key "c2VjcmV0",
// iat 1688463817, exp 2003823817
const LONG_LIVED_TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJib2JAaS51YSIsInJvbGVz\
    IjpbIlVTRVIiXSwiaWF0IjoxNjg4NDYzODE3LCJleHAiOjIwMDM4MjM4MTd9.M7y6\
    0o_yqULv7EfPGo5kIervVhyOXDVxohYqmPEasis";

// 2026-01-01T00:00:00Z
const NOW: i64 = 1_767_225_600;

fn user_store() -> Arc<InMemoryUserStore> {
    Arc::new(InMemoryUserStore::with_users(vec![User::with_roles(
        EMAIL.to_string(),
        "123456".to_string(),
        &[Role::User],
    )]))
}

fn provider_at(secret: &[u8], timestamp: i64) -> (JwtTokenProvider, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::at_timestamp(timestamp));
    let provider = JwtTokenProvider::new(
        SigningKey::from_secret(secret),
        Duration::from_secs(3600),
        user_store(),
    )
    .with_clock(clock.clone());
    (provider, clock)
}

fn roles(names: &[&str]) -> Vec<String> {
    names.iter().map(|r| r.to_string()).collect()
}

#[test]
fn test_create_token_then_validate() {
    let (provider, _) = provider_at(b"test-signing-key", NOW);

    let token = provider.create_token(EMAIL, &roles(&["USER"])).unwrap();
    assert_eq!(token.split('.').count(), 3);

    assert!(provider.validate_token(&token).unwrap());
    assert_eq!(provider.get_username(&token).unwrap(), EMAIL);
}

#[test]
fn test_create_token_preserves_roles_verbatim() {
    let (provider, _) = provider_at(b"test-signing-key", NOW);

    let token = provider.create_token(EMAIL, &roles(&["ADMIN", "USER", "USER"])).unwrap();
    let claims = provider.decode_claims(&token).unwrap();
    assert_eq!(claims.roles, roles(&["ADMIN", "USER", "USER"]));

    let token = provider.create_token(EMAIL, &[]).unwrap();
    let claims = provider.decode_claims(&token).unwrap();
    assert!(claims.roles.is_empty());
}

#[test]
fn test_create_token_sets_issued_at_and_expiry() {
    let (provider, _) = provider_at(b"test-signing-key", NOW);

    let token = provider.create_token(EMAIL, &roles(&["USER"])).unwrap();
    let claims = provider.decode_claims(&token).unwrap();
    assert_eq!(claims.iat, NOW);
    assert_eq!(claims.exp, NOW + 3600);
}

#[test]
fn test_create_token_rejects_empty_identity() {
    let (provider, _) = provider_at(b"test-signing-key", NOW);

    let err = provider.create_token("", &roles(&["USER"])).unwrap_err();
    assert!(err.token_kind().is_none());
}

#[test]
fn test_token_expires_after_validity_window() {
    let (provider, clock) = provider_at(b"test-signing-key", NOW);
    let token = provider.create_token(EMAIL, &roles(&["USER"])).unwrap();

    clock.advance_secs(3599);
    assert!(provider.validate_token(&token).unwrap());

    // Expiry is exclusive
    clock.advance_secs(1);
    let err = provider.validate_token(&token).unwrap_err();
    assert_eq!(err.token_kind(), Some(TokenErrorKind::Expired));
    assert_eq!(err.to_string(), "Expired or invalid JWT token");
}

#[test]
fn test_sample_token_is_expired() {
    let (provider, _) = provider_at(b"secret", NOW);

    let err = provider.validate_token(SAMPLE_TOKEN).unwrap_err();
    assert_eq!(err.to_string(), "Expired or invalid JWT token");
    assert!(err.is_expired_or_invalid());
    // The signature is fine, only the expiry fails
    assert_eq!(err.token_kind(), Some(TokenErrorKind::Expired));
}

#[test]
fn test_sample_token_valid_within_its_window() {
    let (provider, _) = provider_at(b"secret", 1_688_915_000);

    assert!(provider.validate_token(SAMPLE_TOKEN).unwrap());
    assert_eq!(provider.get_username(SAMPLE_TOKEN).unwrap(), EMAIL);
    assert_eq!(provider.decode_claims(SAMPLE_TOKEN).unwrap().roles, roles(&["USER"]));
}

#[test]
fn test_sample_token_with_wrong_key_is_invalid() {
    let (provider, _) = provider_at(b"another-signing-key", 1_688_915_000);

    let err = provider.validate_token(SAMPLE_TOKEN).unwrap_err();
    assert_eq!(err.to_string(), "Expired or invalid JWT token");
    assert_eq!(err.token_kind(), Some(TokenErrorKind::Invalid));
}

#[test]
fn test_long_lived_foreign_token_validates() {
    let (provider, _) = provider_at(b"c2VjcmV0", NOW);

    assert!(provider.validate_token(LONG_LIVED_TOKEN).unwrap());
    assert_eq!(provider.get_username(LONG_LIVED_TOKEN).unwrap(), "bob@i.ua");
}

#[test]
fn test_base64_key_verifies_raw_key_tokens() {
    let clock = Arc::new(FixedClock::at_timestamp(1_688_915_000));
    let provider = JwtTokenProvider::new(
        SigningKey::from_base64("c2VjcmV0").unwrap(),
        Duration::from_secs(3600),
        user_store(),
    )
    .with_clock(clock);

    assert!(provider.validate_token(SAMPLE_TOKEN).unwrap());
}

#[test]
fn test_garbage_token_is_invalid() {
    let (provider, _) = provider_at(b"secret", NOW);

    let err = provider.validate_token("mjud,kajrb,awvf,habr,kh arel").unwrap_err();
    assert_eq!(err.to_string(), "Expired or invalid JWT token");
    assert_eq!(err.token_kind(), Some(TokenErrorKind::Invalid));

    assert!(provider.validate_token("").is_err());
    assert!(provider.validate_token("invalid.token.here").is_err());
}

#[test]
fn test_token_signed_with_other_secret_is_invalid() {
    let (issuer, _) = provider_at(b"issuer-signing-key", NOW);
    let (verifier, _) = provider_at(b"verifier-signing-key", NOW);

    let token = issuer.create_token(EMAIL, &roles(&["USER"])).unwrap();
    let err = verifier.validate_token(&token).unwrap_err();
    assert_eq!(err.token_kind(), Some(TokenErrorKind::Invalid));
    assert!(verifier.get_username(&token).is_err());
}

#[test]
fn test_tampered_payload_is_invalid() {
    let (provider, _) = provider_at(b"test-signing-key", NOW);
    let token = provider.create_token(EMAIL, &roles(&["USER"])).unwrap();
    let other = provider.create_token("mallory@example.com", &roles(&["ADMIN"])).unwrap();

    // Graft the second payload onto the first signature
    let parts: Vec<&str> = token.split('.').collect();
    let other_parts: Vec<&str> = other.split('.').collect();
    let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

    let err = provider.validate_token(&forged).unwrap_err();
    assert_eq!(err.token_kind(), Some(TokenErrorKind::Invalid));
}

#[test]
fn test_other_algorithm_is_invalid() {
    let (provider, _) = provider_at(b"test-signing-key", NOW);
    let claims = Claims {
        sub: EMAIL.to_string(),
        roles: roles(&["USER"]),
        iat: NOW,
        exp: NOW + 3600,
    };
    let token = encode(
        &Header::new(Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(b"test-signing-key"),
    )
    .unwrap();

    let err = provider.validate_token(&token).unwrap_err();
    assert_eq!(err.token_kind(), Some(TokenErrorKind::Invalid));
}

#[test]
fn test_resolve_token() {
    let (provider, _) = provider_at(b"secret", NOW);

    let header = format!("Bearer {}", SAMPLE_TOKEN);
    assert_eq!(provider.resolve_token(Some(header.as_str())), Some(SAMPLE_TOKEN.to_string()));

    assert_eq!(provider.resolve_token(Some(SAMPLE_TOKEN)), None);
    assert_eq!(provider.resolve_token(None), None);
    assert_eq!(provider.resolve_token(Some("bearer abc")), None);
    assert_eq!(provider.resolve_token(Some("Bearer ")), Some(String::new()));
}

#[tokio::test]
async fn test_get_authentication_for_known_user() {
    let (provider, _) = provider_at(b"test-signing-key", NOW);
    let token = provider.create_token(EMAIL, &roles(&["USER"])).unwrap();

    let principal = provider.get_authentication(&token).await.unwrap();
    assert_eq!(principal.identity, EMAIL);
    assert!(principal.has_role(Role::User));
    assert_eq!(principal.authorities(), vec!["ROLE_USER"]);
    assert!(principal.credentials.is_empty());
}

#[tokio::test]
async fn test_get_authentication_unknown_user() {
    let (provider, _) = provider_at(b"test-signing-key", NOW);
    let token = provider.create_token("ghost@example.com", &roles(&["USER"])).unwrap();

    let err = provider.get_authentication(&token).await.unwrap_err();
    assert_eq!(err.token_kind(), Some(TokenErrorKind::UserNotFound));
    assert!(!err.is_expired_or_invalid());
}

#[tokio::test]
async fn test_get_authentication_uses_current_roles() {
    let store = user_store();
    let clock = Arc::new(FixedClock::at_timestamp(NOW));
    let provider = JwtTokenProvider::new(
        SigningKey::from_secret(b"test-signing-key"),
        Duration::from_secs(3600),
        store.clone(),
    )
    .with_clock(clock);

    let token = provider.create_token(EMAIL, &roles(&["USER"])).unwrap();

    // Promote the user after the token was issued
    store
        .insert(User::with_roles(EMAIL.to_string(), "123456".to_string(), &[Role::Admin]))
        .await;

    let principal = provider.get_authentication(&token).await.unwrap();
    assert!(principal.has_role(Role::Admin));
    assert!(!principal.has_role(Role::User));
}

#[tokio::test]
async fn test_get_authentication_with_token_roles() {
    let store = Arc::new(InMemoryUserStore::with_users(vec![User::with_roles(
        EMAIL.to_string(),
        "123456".to_string(),
        &[Role::Admin],
    )]));
    let provider = JwtTokenProvider::new(
        SigningKey::from_secret(b"test-signing-key"),
        Duration::from_secs(3600),
        store,
    )
    .with_clock(Arc::new(FixedClock::at_timestamp(NOW)))
    .with_role_source(RoleSource::Token);

    let token = provider
        .create_token(EMAIL, &roles(&["USER", "SUPERUSER"]))
        .unwrap();

    let principal = provider.get_authentication(&token).await.unwrap();
    assert!(principal.has_role(Role::User));
    assert!(!principal.has_role(Role::Admin));
    assert_eq!(principal.roles.len(), 1);
}

#[tokio::test]
async fn test_get_authentication_rejects_expired_token() {
    let (provider, _) = provider_at(b"secret", NOW);

    let err = provider.get_authentication(SAMPLE_TOKEN).await.unwrap_err();
    assert_eq!(err.to_string(), "Expired or invalid JWT token");
}

#[test]
fn test_provider_is_shareable_across_threads() {
    let (provider, _) = provider_at(b"test-signing-key", NOW);
    let provider: Arc<dyn TokenProvider> = Arc::new(provider);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let provider = provider.clone();
            std::thread::spawn(move || {
                let identity = format!("user{}@example.com", i);
                let token = provider.create_token(&identity, &[]).unwrap();
                assert!(provider.validate_token(&token).unwrap());
                provider.get_username(&token).unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), format!("user{}@example.com", i));
    }
}

fn sign(payload: &serde_json::Value, secret: &[u8]) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        payload,
        &EncodingKey::from_secret(secret),
    )
    .unwrap()
}

#[test]
fn test_audience_claim_is_accepted() {
    let (provider, _) = provider_at(b"test-signing-key", NOW);
    let token = sign(
        &serde_json::json!({
            "sub": EMAIL,
            "roles": ["USER"],
            "iat": NOW,
            "exp": NOW + 60,
            "aud": "web",
        }),
        b"test-signing-key",
    );

    assert!(provider.validate_token(&token).unwrap());
    assert_eq!(provider.get_username(&token).unwrap(), EMAIL);
}

#[test]
fn test_fractional_expiry_is_floored() {
    let (provider, clock) = provider_at(b"test-signing-key", NOW);
    let token = sign(
        &serde_json::json!({
            "sub": EMAIL,
            "iat": NOW as f64 + 0.25,
            "exp": (NOW + 60) as f64 + 0.5,
        }),
        b"test-signing-key",
    );

    assert!(provider.validate_token(&token).unwrap());
    let claims = provider.decode_claims(&token).unwrap();
    assert_eq!(claims.iat, NOW);
    assert_eq!(claims.exp, NOW + 60);

    clock.set_timestamp(NOW + 60);
    let err = provider.validate_token(&token).unwrap_err();
    assert_eq!(err.token_kind(), Some(TokenErrorKind::Expired));
}

#[test]
fn test_signed_token_without_expiry_is_invalid() {
    let (provider, _) = provider_at(b"test-signing-key", NOW);
    let token = sign(
        &serde_json::json!({ "sub": EMAIL, "roles": ["USER"], "iat": NOW }),
        b"test-signing-key",
    );

    let err = provider.validate_token(&token).unwrap_err();
    assert_eq!(err.token_kind(), Some(TokenErrorKind::Invalid));
    assert_eq!(err.to_string(), "Expired or invalid JWT token");
}

#[test]
fn test_signed_token_without_subject_is_invalid() {
    let (provider, _) = provider_at(b"test-signing-key", NOW);
    let token = sign(
        &serde_json::json!({ "roles": ["USER"], "iat": NOW, "exp": NOW + 60 }),
        b"test-signing-key",
    );

    let err = provider.validate_token(&token).unwrap_err();
    assert_eq!(err.token_kind(), Some(TokenErrorKind::Invalid));
    assert!(provider.get_username(&token).is_err());
}

#[tokio::test]
async fn test_get_authentication_rejects_token_expiring_mid_flight() {
    let (provider, clock) = provider_at(b"test-signing-key", NOW);
    let token = provider.create_token(EMAIL, &roles(&["USER"])).unwrap();

    clock.set_timestamp(NOW + 3600);
    let err = provider.get_authentication(&token).await.unwrap_err();
    assert_eq!(err.token_kind(), Some(TokenErrorKind::Expired));
}
