//! Session token codec.
//!
//! A token is an HS256 JWT keyed by the server's session secret. It embeds
//! the whole [`SessionClaim`], so decoding needs no database round-trip.
//! Expiry is checked here, at decode time, against an explicit clock.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use podcast_core::{Email, Role, SESSION_TTL_SECONDS, SessionClaim, UserId};

use super::AuthError;

/// Wire form of a session claim.
#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    sub: String,
    email: String,
    name: String,
    role: Role,
    iat: i64,
    exp: i64,
}

/// Encodes claims into signed tokens and validates them back.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec keyed by `secret`.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let key = secret.expose_secret().as_bytes();

        // Expiry is enforced by `decode_at` against the caller's clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation,
        }
    }

    /// Serialize and sign a claim.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenEncoding` if signing fails.
    pub fn encode(&self, claim: &SessionClaim) -> Result<String, AuthError> {
        let iat = claim.issued_at.timestamp();
        let claims = TokenClaims {
            sub: claim.user_id.to_string(),
            email: claim.email.to_string(),
            name: claim.name.clone(),
            role: claim.role,
            iat,
            exp: iat + SESSION_TTL_SECONDS,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenEncoding(e.to_string()))
    }

    /// Validate a token against the current time.
    ///
    /// # Errors
    ///
    /// See [`TokenCodec::decode_at`].
    pub fn decode(&self, token: &str) -> Result<SessionClaim, AuthError> {
        self.decode_at(token, Utc::now())
    }

    /// Validate a token as of `now`.
    ///
    /// # Errors
    ///
    /// - `AuthError::MissingToken` for an empty string
    /// - `AuthError::InvalidSignature` if the signature does not verify
    /// - `AuthError::MalformedToken` if the token or its claims cannot be parsed
    /// - `AuthError::Expired` if more than seven days have passed since issue
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaim, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::InvalidSignature
                }
                _ => AuthError::MalformedToken,
            }
        })?;
        let claims = data.claims;

        let now_ts = now.timestamp();
        if now_ts - claims.iat > SESSION_TTL_SECONDS || now_ts > claims.exp {
            return Err(AuthError::Expired);
        }

        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::MalformedToken)?;
        let email = Email::parse(&claims.email).map_err(|_| AuthError::MalformedToken)?;
        let issued_at =
            DateTime::from_timestamp(claims.iat, 0).ok_or(AuthError::MalformedToken)?;

        Ok(SessionClaim {
            user_id,
            email,
            name: claims.name,
            role: claims.role,
            issued_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    const SECRET: &str = "t3st-s1gn1ng-k3y-w1th-3nough-3ntr0py!";

    fn codec() -> TokenCodec {
        TokenCodec::new(&SecretString::from(SECRET))
    }

    fn claim(now: DateTime<Utc>) -> SessionClaim {
        SessionClaim::new(
            UserId::new(7),
            Email::parse("host@example.com").unwrap(),
            "Host".to_owned(),
            Role::User,
            now,
        )
    }

    #[test]
    fn test_round_trip_returns_original_claim() {
        let now = Utc::now();
        let original = claim(now);
        let token = codec().encode(&original).unwrap();

        assert_eq!(codec().decode_at(&token, now).unwrap(), original);
    }

    #[test]
    fn test_expires_after_seven_days() {
        let issued = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let token = codec().encode(&claim(issued)).unwrap();

        let last_valid = issued + TimeDelta::seconds(SESSION_TTL_SECONDS);
        assert!(codec().decode_at(&token, last_valid).is_ok());

        let too_late = last_valid + TimeDelta::seconds(1);
        assert!(matches!(
            codec().decode_at(&token, too_late),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn test_other_secret_fails_signature() {
        let now = Utc::now();
        let token = codec().encode(&claim(now)).unwrap();
        let other = TokenCodec::new(&SecretString::from("an0ther-s1gn1ng-k3y-0f-g00d-l3ngth!"));

        assert!(matches!(
            other.decode_at(&token, now),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_tampered_payload_fails_signature() {
        let now = Utc::now();
        let token = codec().encode(&claim(now)).unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = codec()
            .encode(&SessionClaim {
                role: Role::Admin,
                ..claim(now)
            })
            .unwrap();
        let forged_payload = forged.split('.').nth(1).unwrap();
        parts[1] = forged_payload;
        let tampered = parts.join(".");

        assert!(matches!(
            codec().decode_at(&tampered, now),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            codec().decode("not-a-token"),
            Err(AuthError::MalformedToken)
        ));
        assert!(matches!(codec().decode(""), Err(AuthError::MissingToken)));
    }

    #[test]
    fn test_decode_failures_are_session_rejections() {
        let issued = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let token = codec().encode(&claim(issued)).unwrap();
        let expired_at = issued + TimeDelta::seconds(SESSION_TTL_SECONDS + 1);
        let other = TokenCodec::new(&SecretString::from("an0ther-s1gn1ng-k3y-0f-g00d-l3ngth!"));

        for err in [
            codec().decode("").unwrap_err(),
            codec().decode("not-a-token").unwrap_err(),
            codec().decode_at(&token, expired_at).unwrap_err(),
            other.decode_at(&token, issued).unwrap_err(),
        ] {
            assert!(err.is_session_rejection(), "{err}");
        }
    }
}
