//! Wire model types for dynamodel.
//!
//! These are the in-process shapes exchanged with a transport collaborator:
//! the tagged [`AttributeValue`], the [`RequestDescriptor`] the compiler
//! emits, and the [`RawResponse`] the decoder consumes. All of them serialize
//! with serde in the store's JSON naming, so a transport can forward them
//! without translation.
#![allow(clippy::module_name_repetitions)]

pub mod attribute_value;
pub mod operations;
pub mod request;
pub mod response;

pub use attribute_value::{AttributeValue, Item};
pub use operations::OperationKind;
pub use request::RequestDescriptor;
pub use response::{DeleteRequest, PutRequest, RawResponse, WriteRequest};
