//! Bearer tokens: HS256 JWTs whose subject is the username.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 480;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username.
    pub sub: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }
}

/// A token ready to hand to the client.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtService {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn issue(&self, username: &str) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(IssuedToken {
            token,
            expires_in: self.ttl.num_seconds(),
        })
    }

    /// Fails for malformed, tampered or expired tokens.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_and_verify() {
        let jwt = JwtService::new("test-secret", DEFAULT_TOKEN_TTL_MINUTES);
        let issued = jwt.issue("ana").unwrap();
        assert_eq!(issued.expires_in, 480 * 60);
        let claims = jwt.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "ana");
        assert!(claims.expires_at() > Utc::now());
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = JwtService::new("secret-a", 60).issue("ana").unwrap().token;
        assert!(JwtService::new("secret-b", 60).verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // Expired well past the default leeway.
        let jwt = JwtService::new("test-secret", -5);
        let token = jwt.issue("ana").unwrap().token;
        assert!(jwt.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let jwt = JwtService::new("test-secret", 60);
        assert!(jwt.verify("not.a.token").is_err());
    }
}
