use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::Serialize;

/// Header carrying the caller id issued by the external identity provider.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Who a pipeline result is attributed to.
///
/// Identity is resolved upstream; this service only reads the opaque id.
/// It is never rendered into a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerIdentity {
    Identified(String),
    Anonymous,
}

impl Serialize for CallerIdentity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CallerIdentity::Identified(id) => serializer.serialize_some(id),
            CallerIdentity::Anonymous => serializer.serialize_none(),
        }
    }
}

impl std::fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallerIdentity::Identified(id) => write!(f, "user:{id}"),
            CallerIdentity::Anonymous => write!(f, "anonymous"),
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CallerIdentity {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| CallerIdentity::Identified(v.to_string()))
            .unwrap_or(CallerIdentity::Anonymous);
        Ok(identity)
    }
}
