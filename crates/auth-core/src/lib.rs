//! phonebook-auth-core - 仪表盘会话令牌
//!
//! 会话以 HS256 JWT 表示，通过 HttpOnly cookie 或 Bearer 头携带。
//! `ver` 记录签发时的会话版本；用户修改密码后版本递增，旧令牌随之失效。

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use phonebook_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 会话 Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (dashboard user ID)
    pub sub: String,
    /// Username
    pub username: String,
    /// Session version
    pub ver: i32,
    /// Expiration time
    pub exp: i64,
    /// Issued at
    pub iat: i64,
    /// JWT ID
    pub jti: String,
    /// Issuer
    #[serde(default)]
    pub iss: String,
    /// Audience
    #[serde(default)]
    pub aud: String,
}

impl Claims {
    pub fn new(
        user_id: i64,
        username: &str,
        session_version: i32,
        expires_in_secs: i64,
        issuer: &str,
        audience: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            username: username.to_string(),
            ver: session_version,
            exp: (now + Duration::seconds(expires_in_secs)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::now_v7().to_string(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
        }
    }

    pub fn user_id(&self) -> AppResult<i64> {
        self.sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))
    }
}

/// Token 服务
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in: i64,
    issuer: String,
    audience: String,
}

impl TokenService {
    pub fn new(secret: &str, expires_in: i64, issuer: String, audience: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expires_in,
            issuer,
            audience,
        }
    }

    /// 签发会话令牌
    pub fn issue(&self, user_id: i64, username: &str, session_version: i32) -> AppResult<String> {
        let claims = Claims::new(
            user_id,
            username,
            session_version,
            self.expires_in,
            &self.issuer,
            &self.audience,
        );

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))
    }

    /// 验证会话令牌（签名、过期、签发者、受众）
    pub fn validate(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.validate_exp = true;
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::unauthorized(format!("Invalid token: {}", e)))?
            .claims;

        if claims.jti.is_empty() {
            return Err(AppError::unauthorized("Token ID (jti) missing"));
        }

        Ok(claims)
    }

    /// 会话有效期（秒）
    pub fn expires_in(&self) -> i64 {
        self.expires_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str, expires_in: i64) -> TokenService {
        TokenService::new(
            secret,
            expires_in,
            "phonebook".to_string(),
            "phonebook-dashboard".to_string(),
        )
    }

    #[test]
    fn test_issue_and_validate() {
        let tokens = service("test_secret", 3600);
        let token = tokens.issue(42, "operator", 3).unwrap();

        let claims = tokens.validate(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.username, "operator");
        assert_eq!(claims.ver, 3);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service("secret-a", 3600).issue(1, "operator", 0).unwrap();
        let result = service("secret-b", 3600).validate(&token);
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service("test_secret", -3600);
        let token = tokens.issue(1, "operator", 0).unwrap();
        assert!(tokens.validate(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(service("test_secret", 3600).validate("not-a-jwt").is_err());
    }

    #[test]
    fn test_audience_mismatch_rejected() {
        let other = TokenService::new("s", 3600, "phonebook".to_string(), "other".to_string());
        let token = other.issue(1, "operator", 0).unwrap();
        assert!(service("s", 3600).validate(&token).is_err());
    }
}
