use serde::Deserialize;
use serde::Serialize;

use crate::Error;

/// Everything a walk produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalkOutput<T> {
    /// Transformed entries in pre-order: each directory precedes its
    /// descendants, siblings keep scan order.
    pub items: Vec<T>,
    /// One entry per subtree pruned or stat tolerated under
    /// [`ErrorPolicy::WarnAndSkip`](crate::ErrorPolicy::WarnAndSkip).
    pub warnings: Vec<Error>,
}

impl<T> Default for WalkOutput<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl<T> WalkOutput<T> {
    /// Whether the walk saw no failures at all.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
