use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use crate::claims::{AuthClaims, TokenValidationError, validate_claims};

/// Token verification seam.
///
/// The API middleware holds an `Arc<dyn JwtValidator>`, so tests and future
/// identity providers can swap the implementation without touching HTTP code.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>)
    -> Result<AuthClaims, TokenValidationError>;
}

/// HS256 shared-secret validator.
pub struct Hs256JwtValidator {
    decoding_key: DecodingKey,
}

impl Hs256JwtValidator {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthClaims, TokenValidationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // The claims carry RFC3339 windows instead of numeric exp/nbf;
        // the window check happens in validate_claims below.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<AuthClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| TokenValidationError::Malformed)?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use loyalty_core::ClientId;

    use super::*;

    fn mint(secret: &str, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> String {
        let claims = AuthClaims {
            sub: ClientId::new(),
            email: "holder@example.com".to_string(),
            issued_at,
            expires_at,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("failed to encode jwt")
    }

    #[test]
    fn accepts_a_well_formed_token() {
        let now = Utc::now();
        let token = mint("secret", now - Duration::minutes(1), now + Duration::minutes(10));

        let validator = Hs256JwtValidator::new("secret");
        let claims = validator.validate(&token, now).expect("token should verify");
        assert_eq!(claims.email, "holder@example.com");
    }

    #[test]
    fn rejects_a_token_signed_with_another_secret() {
        let now = Utc::now();
        let token = mint("secret", now - Duration::minutes(1), now + Duration::minutes(10));

        let validator = Hs256JwtValidator::new("other-secret");
        assert_eq!(
            validator.validate(&token, now),
            Err(TokenValidationError::Malformed)
        );
    }

    #[test]
    fn rejects_an_expired_token() {
        let now = Utc::now();
        let token = mint("secret", now - Duration::minutes(20), now - Duration::minutes(10));

        let validator = Hs256JwtValidator::new("secret");
        assert_eq!(
            validator.validate(&token, now),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn rejects_garbage_tokens() {
        let validator = Hs256JwtValidator::new("secret");
        assert_eq!(
            validator.validate("not-a-jwt", Utc::now()),
            Err(TokenValidationError::Malformed)
        );
    }
}
