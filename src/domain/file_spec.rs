use serde::{Deserialize, Serialize};

use super::StoragePath;

/// Where one uploaded audio file lives and which report group it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    pub group: String,
    pub storage_path: StoragePath,
}

impl FileSpec {
    pub fn new(group: impl Into<String>, storage_path: StoragePath) -> Self {
        Self {
            group: group.into(),
            storage_path,
        }
    }
}
