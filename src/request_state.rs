use std::convert::Infallible;

use aide::OperationInput;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

/// `Authorization` header value split on its first space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials<'a> {
    pub scheme: &'a str,
    pub token: &'a str,
}

/// Parse `<scheme> <token>`. A value without a space or with an empty token is rejected.
pub fn parse_authorization(value: &str) -> Option<Credentials<'_>> {
    let (scheme, token) = value.split_once(' ')?;

    if token.is_empty() {
        return None;
    }

    Some(Credentials { scheme, token })
}

/// Raw `Authorization` header of a request.
///
/// Extraction never fails, missing or non-ascii headers are kept as `None`
/// so the guard pipeline decides how to answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestAuthorization(pub Option<String>);

impl RequestAuthorization {
    pub fn credentials(&self) -> Option<Credentials<'_>> {
        self.0.as_deref().and_then(parse_authorization)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestAuthorization
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        Ok(Self(value))
    }
}

impl OperationInput for RequestAuthorization {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_authorization() {
        assert_eq!(
            parse_authorization("ApplePass abc123"),
            Some(Credentials {
                scheme: "ApplePass",
                token: "abc123"
            })
        );
        assert_eq!(parse_authorization("ApplePass"), None);
        assert_eq!(parse_authorization("ApplePass "), None);
        assert_eq!(parse_authorization(""), None);
    }

    #[test]
    fn test_parse_authorization_splits_on_first_space() {
        let credentials = parse_authorization("ApplePass abc def").unwrap();
        assert_eq!(credentials.scheme, "ApplePass");
        assert_eq!(credentials.token, "abc def");
    }

    #[test]
    fn test_missing_header_has_no_credentials() {
        assert_eq!(RequestAuthorization(None).credentials(), None);
    }
}
