pub mod decode;
pub mod dynamo;
pub mod memory;
pub mod store;
pub mod types;

pub use decode::{DecodeError, FromItem};
pub use dynamo::DynamoUserStore;
pub use memory::MemoryUserStore;
pub use store::{StoreError, UserStore};
pub use types::{Item, User, USER_ID_ATTRIBUTE};

/// Re-exported so callers can build items without depending on the SDK directly
pub use aws_sdk_dynamodb::types::AttributeValue;
