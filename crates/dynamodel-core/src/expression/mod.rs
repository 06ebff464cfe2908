//! Expression trees and their compilation to placeholder-safe text.
//!
//! - [`path`]: document paths built from segments.
//! - [`condition`]: condition trees for key conditions, filters and
//!   conditional writes.
//! - [`update`]: update actions.
//! - [`placeholder`]: name and value placeholder allocation.
//! - [`builder`]: the compiler producing expression strings.

pub mod builder;
pub mod condition;
pub mod path;
pub mod placeholder;
pub mod update;

pub use builder::{ExpressionBuilder, MAX_IN_OPERANDS};
pub use condition::{CompareOp, Condition};
pub use path::{Path, PathSegment};
pub use placeholder::PlaceholderTable;
pub use update::{UpdateAction, UpdateClause};
