//! Update actions.

use crate::expression::path::Path;
use crate::marshal::Value;

/// The clause an [`UpdateAction`] is emitted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UpdateClause {
    /// `SET`
    Set,
    /// `REMOVE`
    Remove,
    /// `ADD`
    Add,
    /// `DELETE`
    Delete,
}

impl UpdateClause {
    /// Clause keyword.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Set => "SET",
            Self::Remove => "REMOVE",
            Self::Add => "ADD",
            Self::Delete => "DELETE",
        }
    }
}

/// One modification applied by an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateAction {
    /// `SET path = value`
    Set {
        /// Target.
        path: Path,
        /// New value.
        value: Value,
    },
    /// `SET path = if_not_exists(path, value)`
    SetIfNotExists {
        /// Target.
        path: Path,
        /// Value used only when the attribute is absent.
        value: Value,
    },
    /// `SET path = list_append(path, values)`
    AppendToList {
        /// Target list.
        path: Path,
        /// Elements appended.
        values: Vec<Value>,
    },
    /// `REMOVE path`
    Remove(Path),
    /// `ADD path value` where the value is a number.
    AddNumeric {
        /// Target number.
        path: Path,
        /// Increment, possibly negative.
        value: Value,
    },
    /// `ADD path value` where the value is a set.
    AddToSet {
        /// Target set.
        path: Path,
        /// Elements added.
        value: Value,
    },
    /// `DELETE path value` where the value is a set.
    DeleteFromSet {
        /// Target set.
        path: Path,
        /// Elements removed.
        value: Value,
    },
}

impl UpdateAction {
    /// The path this action modifies.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Set { path, .. }
            | Self::SetIfNotExists { path, .. }
            | Self::AppendToList { path, .. }
            | Self::Remove(path)
            | Self::AddNumeric { path, .. }
            | Self::AddToSet { path, .. }
            | Self::DeleteFromSet { path, .. } => path,
        }
    }

    /// The clause this action belongs to.
    #[must_use]
    pub fn clause(&self) -> UpdateClause {
        match self {
            Self::Set { .. } | Self::SetIfNotExists { .. } | Self::AppendToList { .. } => {
                UpdateClause::Set
            }
            Self::Remove(_) => UpdateClause::Remove,
            Self::AddNumeric { .. } | Self::AddToSet { .. } => UpdateClause::Add,
            Self::DeleteFromSet { .. } => UpdateClause::Delete,
        }
    }
}
