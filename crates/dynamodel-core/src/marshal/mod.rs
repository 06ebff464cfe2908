//! Conversion between native values and wire attribute values.
//!
//! - [`number`]: exact decimal numbers within the store's numeric range.
//! - [`value`]: the native [`Value`] union and single-value conversion.
//! - [`record`]: whole records through a [`TableSchema`](crate::schema::TableSchema).
//! - [`bridge`]: `serde` types to and from records.

pub mod bridge;
pub mod number;
pub mod record;
pub mod value;

pub use bridge::{from_record, to_record};
pub use number::Number;
pub use record::{Record, marshal_record, unmarshal_item};
pub use value::{
    AttributeKind, Value, check_kind, from_wire, from_wire_inferred, kind_of, to_wire, to_wire_as,
};
