use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::app::ports::{
    ParsedToken, TokenParseError, TokenPayload, TokenPort, TokenProfile, TokenPurpose,
};
use crate::error::{Result, TaskerError};

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Claims {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fingerprint: Option<String>,
    purpose: TokenPurpose,
    /// Unique per token, so two tokens issued in the same second still differ
    jti: String,
    iat: i64,
    exp: i64,
}

/// HS256 JSON Web Tokens.
#[derive(Debug, Clone, Default)]
pub struct JwtTokenAdapter;

impl JwtTokenAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TokenPort for JwtTokenAdapter {
    async fn generate(&self, payload: &TokenPayload, profile: &TokenProfile) -> Result<String> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            id: payload.id.clone(),
            fingerprint: payload.fingerprint.clone(),
            purpose: profile.purpose,
            jti: uuid::Uuid::new_v4().to_string(),
            iat,
            exp: iat + profile.expires_in_secs,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(profile.secret_key.as_bytes()),
        )
        .map_err(|e| TaskerError::Token {
            message: format!("Token creation failed: {e}"),
        })
    }

    async fn parse(
        &self,
        token: &str,
        profile: &TokenProfile,
    ) -> std::result::Result<ParsedToken, TokenParseError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(profile.secret_key.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenParseError {
                name: "TokenExpiredError".to_string(),
                message: "jwt expired".to_string(),
            },
            _ => TokenParseError {
                name: "JsonWebTokenError".to_string(),
                message: e.to_string(),
            },
        })?;

        if claims.purpose != profile.purpose {
            return Err(TokenParseError {
                name: "JsonWebTokenError".to_string(),
                message: "token was not issued for this purpose".to_string(),
            });
        }

        Ok(ParsedToken {
            payload: TokenPayload {
                id: claims.id,
                fingerprint: claims.fingerprint,
            },
            created_in: claims.iat,
            expires_in: claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(purpose: TokenPurpose, secret: &str, ttl: i64) -> TokenProfile {
        TokenProfile {
            purpose,
            secret_key: secret.to_string(),
            expires_in_secs: ttl,
        }
    }

    #[tokio::test]
    async fn test_generate_then_parse() {
        let adapter = JwtTokenAdapter::new();
        let access = profile(TokenPurpose::Access, "access-secret", 1200);
        let token = adapter
            .generate(&TokenPayload::for_account("acc-1"), &access)
            .await
            .unwrap();

        let parsed = adapter.parse(&token, &access).await.unwrap();
        assert_eq!(parsed.payload.id, "acc-1");
        assert_eq!(parsed.expires_in - parsed.created_in, 1200);
    }

    #[tokio::test]
    async fn test_tokens_in_same_second_differ() {
        let adapter = JwtTokenAdapter::new();
        let access = profile(TokenPurpose::Access, "access-secret", 1200);
        let payload = TokenPayload::for_account("acc-1");
        let first = adapter.generate(&payload, &access).await.unwrap();
        let second = adapter.generate(&payload, &access).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let adapter = JwtTokenAdapter::new();
        let access = profile(TokenPurpose::Access, "access-secret", -60);
        let token = adapter
            .generate(&TokenPayload::for_account("acc-1"), &access)
            .await
            .unwrap();

        let err = adapter.parse(&token, &access).await.unwrap_err();
        assert_eq!(err.name, "TokenExpiredError");
    }

    #[tokio::test]
    async fn test_wrong_secret_or_purpose_is_rejected() {
        let adapter = JwtTokenAdapter::new();
        let access = profile(TokenPurpose::Access, "shared-secret", 1200);
        let refresh = profile(TokenPurpose::Refresh, "shared-secret", 1200);
        let other = profile(TokenPurpose::Access, "other-secret", 1200);

        let token = adapter
            .generate(&TokenPayload::for_account("acc-1"), &access)
            .await
            .unwrap();

        assert!(adapter.parse(&token, &other).await.is_err());
        assert!(adapter.parse(&token, &refresh).await.is_err());
        assert!(adapter.parse("not-a-token", &access).await.is_err());
    }

    #[tokio::test]
    async fn test_fingerprint_round_trips() {
        let adapter = JwtTokenAdapter::new();
        let recover = profile(TokenPurpose::Recover, "recover-secret", 1800);
        let payload = TokenPayload {
            id: "acc-1".into(),
            fingerprint: Some("abc123".into()),
        };
        let token = adapter.generate(&payload, &recover).await.unwrap();
        let parsed = adapter.parse(&token, &recover).await.unwrap();
        assert_eq!(parsed.payload, payload);
    }
}
