use aws_sdk_dynamodb::types::AttributeValue;
use serde::Serialize;
use std::collections::HashMap;

/// Partition key of the users table
pub const USER_ID_ATTRIBUTE: &str = "user_id";

/// Raw item as returned by the store: attribute name -> typed value
pub type Item = HashMap<String, AttributeValue>;

/// A user record as exposed to callers.
///
/// Only the key attribute is modeled. Any other attribute stored on the item
/// is dropped during decoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct User {
    pub user_id: String,
}
