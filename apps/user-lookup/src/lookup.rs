use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use tracing::{error, warn};
use user_store::{DecodeError, FromItem, StoreError, User, UserStore};

/// Query parameter carrying the identifier
pub const USER_ID_PARAM: &str = "user_id";

/// Every way a lookup can end without a user.
///
/// `Display` is the exact response body sent to the caller; the wrapped
/// sources are only logged.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Error querying DynamoDB")]
    Query(#[source] StoreError),

    #[error("User not found")]
    NotFound,

    #[error("Error unmarshalling DynamoDB result")]
    Decode(#[from] DecodeError),

    #[error("Error marshalling user to JSON")]
    Encode(#[source] serde_json::Error),
}

impl LookupError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LookupError::NotFound => StatusCode::NOT_FOUND,
            LookupError::Query(_) | LookupError::Decode(_) | LookupError::Encode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Metric label
    pub fn outcome(&self) -> &'static str {
        match self {
            LookupError::Query(_) => "query_error",
            LookupError::NotFound => "not_found",
            LookupError::Decode(_) => "decode_error",
            LookupError::Encode(_) => "encode_error",
        }
    }
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.to_string()));
        *response.status_mut() = self.status_code();
        response
    }
}

/// Successful lookup: the user serialized as JSON
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserJson(pub String);

impl IntoResponse for UserJson {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.0));
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

/// Look up `user_id` and render the first match.
///
/// The identifier goes to the store untouched, empty string included. When
/// several items match, the first one returned by the store wins.
pub async fn lookup_user(store: &dyn UserStore, user_id: &str) -> Result<UserJson, LookupError> {
    let items = store.query_by_user_id(user_id).await.map_err(|e| {
        error!(error = %e, table = %store.table_name(), "Failed to query user store");
        LookupError::Query(e)
    })?;

    let Some(item) = items.into_iter().next() else {
        return Err(LookupError::NotFound);
    };

    let user = User::from_item(&item).inspect_err(|e| {
        warn!(field = e.field(), error = %e, "Stored user does not match the expected shape");
    })?;

    let body = serde_json::to_string(&user).map_err(|e| {
        error!(error = %e, "Failed to serialize user");
        LookupError::Encode(e)
    })?;

    Ok(UserJson(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use user_store::{AttributeValue, MemoryUserStore};

    fn store_with(ids: &[AttributeValue]) -> MemoryUserStore {
        let items = ids
            .iter()
            .map(|id| [("user_id".to_string(), id.clone())].into_iter().collect())
            .collect();
        MemoryUserStore::new("Users", items)
    }

    #[tokio::test]
    async fn found_user_renders_json() {
        let store = store_with(&[AttributeValue::S("abc123".into())]);
        let body = lookup_user(&store, "abc123").await.unwrap();
        assert_eq!(body, UserJson(r#"{"user_id":"abc123"}"#.to_string()));
    }

    #[tokio::test]
    async fn empty_result_is_not_found() {
        let store = store_with(&[]);
        let err = lookup_user(&store, "").await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "User not found");
    }

    #[test]
    fn error_bodies_and_statuses() {
        let query = LookupError::Query(StoreError::new("Users", "timed out"));
        assert_eq!(query.to_string(), "Error querying DynamoDB");
        assert_eq!(query.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(query.outcome(), "query_error");

        let decode = LookupError::from(DecodeError::MissingAttribute { field: "user_id" });
        assert_eq!(decode.to_string(), "Error unmarshalling DynamoDB result");
        assert_eq!(decode.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let encode_source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let encode = LookupError::Encode(encode_source);
        assert_eq!(encode.to_string(), "Error marshalling user to JSON");
        assert_eq!(encode.outcome(), "encode_error");
    }

    #[test]
    fn error_responses_carry_no_content_type() {
        let response = LookupError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }
}
