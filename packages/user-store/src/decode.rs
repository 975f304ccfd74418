use crate::types::{Item, User, USER_ID_ATTRIBUTE};
use aws_sdk_dynamodb::types::AttributeValue;

/// Failure to turn a stored item into a typed record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("attribute `{field}` is missing")]
    MissingAttribute { field: &'static str },

    #[error("attribute `{field}` has type {found}, expected {expected}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

impl DecodeError {
    /// Name of the attribute that failed to decode
    pub fn field(&self) -> &'static str {
        match self {
            DecodeError::MissingAttribute { field } => *field,
            DecodeError::TypeMismatch { field, .. } => *field,
        }
    }
}

/// Strict decoding from a store item.
///
/// Implementations must either produce a complete value or fail; a record with
/// some fields silently defaulted is never returned.
pub trait FromItem: Sized {
    fn from_item(item: &Item) -> Result<Self, DecodeError>;
}

impl FromItem for User {
    fn from_item(item: &Item) -> Result<Self, DecodeError> {
        Ok(User {
            user_id: required_string(item, USER_ID_ATTRIBUTE)?,
        })
    }
}

/// Read a string (`S`) attribute, failing on absence or any other type.
///
/// Unlike `dynamodbattribute.UnmarshalMap`, a missing or `NULL` attribute is an
/// error here, not an empty string.
pub fn required_string(item: &Item, field: &'static str) -> Result<String, DecodeError> {
    match item.get(field) {
        Some(AttributeValue::S(value)) => Ok(value.clone()),
        Some(other) => Err(DecodeError::TypeMismatch {
            field,
            expected: "S",
            found: type_descriptor(other),
        }),
        None => Err(DecodeError::MissingAttribute { field }),
    }
}

/// DynamoDB wire type descriptor for an attribute value
pub fn type_descriptor(value: &AttributeValue) -> &'static str {
    match value {
        AttributeValue::S(_) => "S",
        AttributeValue::N(_) => "N",
        AttributeValue::B(_) => "B",
        AttributeValue::Bool(_) => "BOOL",
        AttributeValue::Null(_) => "NULL",
        AttributeValue::L(_) => "L",
        AttributeValue::M(_) => "M",
        AttributeValue::Ss(_) => "SS",
        AttributeValue::Ns(_) => "NS",
        AttributeValue::Bs(_) => "BS",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(pairs: &[(&str, AttributeValue)]) -> Item {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn decodes_string_key() {
        let user = User::from_item(&item(&[("user_id", AttributeValue::S("abc123".into()))]))
            .unwrap();
        assert_eq!(user.user_id, "abc123");
    }

    #[test]
    fn ignores_unmodeled_attributes() {
        let user = User::from_item(&item(&[
            ("user_id", AttributeValue::S("abc123".into())),
            ("age", AttributeValue::N("42".into())),
            ("email", AttributeValue::S("a@example.com".into())),
        ]))
        .unwrap();
        assert_eq!(
            user,
            User {
                user_id: "abc123".into()
            }
        );
    }

    #[test]
    fn number_key_is_a_type_mismatch() {
        let err = User::from_item(&item(&[("user_id", AttributeValue::N("7".into()))]))
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::TypeMismatch {
                field: "user_id",
                expected: "S",
                found: "N",
            }
        );
        assert_eq!(err.field(), "user_id");
    }

    #[test]
    fn null_key_is_a_type_mismatch() {
        let err = User::from_item(&item(&[("user_id", AttributeValue::Null(true))])).unwrap_err();
        assert!(matches!(err, DecodeError::TypeMismatch { found: "NULL", .. }));
    }

    #[test]
    fn missing_key_fails() {
        let err = User::from_item(&item(&[("email", AttributeValue::S("x".into()))])).unwrap_err();
        assert_eq!(err, DecodeError::MissingAttribute { field: "user_id" });
        assert_eq!(err.to_string(), "attribute `user_id` is missing");
    }

    #[test]
    fn empty_string_key_decodes() {
        let user = User::from_item(&item(&[("user_id", AttributeValue::S(String::new()))]))
            .unwrap();
        assert_eq!(user.user_id, "");
    }
}
