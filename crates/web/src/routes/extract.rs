//! Request body extractor accepting JSON or URL-encoded forms.
//!
//! The login and registration pages post JSON from script, while the admin
//! pages submit plain HTML forms; handlers take either.

use axum::{
    Form, Json,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Body deserialized from `application/json` or, for anything else, from
/// `application/x-www-form-urlencoded`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonOrForm<T>(pub T);

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().starts_with("application/json"))
}

impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_json(&req) {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self(value))
        }
    }
}

/// Trimmed, non-empty value of an optional text field.
///
/// # Errors
///
/// Returns `AppError::BadRequest` naming the field when it is absent or blank.
pub fn required<'a>(field: Option<&'a str>, name: &str) -> Result<&'a str, AppError> {
    field
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{name} is required")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Login {
        email: String,
    }

    #[tokio::test]
    async fn test_reads_json() {
        let req = Request::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"email":"a@b.co"}"#))
            .unwrap();
        let JsonOrForm(login) = JsonOrForm::<Login>::from_request(req, &()).await.unwrap();
        assert_eq!(login.email, "a@b.co");
    }

    #[tokio::test]
    async fn test_reads_form() {
        let req = Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("email=a%40b.co"))
            .unwrap();
        let JsonOrForm(login) = JsonOrForm::<Login>::from_request(req, &()).await.unwrap();
        assert_eq!(login.email, "a@b.co");
    }

    #[tokio::test]
    async fn test_bad_body_is_bad_request() {
        let req = Request::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let err = JsonOrForm::<Login>::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_required() {
        assert_eq!(required(Some("  x "), "name").unwrap(), "x");
        assert!(required(Some("   "), "name").is_err());
        assert!(required(None, "name").is_err());
    }
}
