use std::path::PathBuf;

use crate::models::StoreMode;

/// Store connection targets and merge mode, supplied by the caller before
/// repository construction. The core never reads configuration files.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    pub primary_path: PathBuf,
    pub secondary_path: Option<PathBuf>,
    pub mode: StoreMode,
}

impl RepositoryConfig {
    #[must_use]
    pub fn primary_only(primary_path: impl Into<PathBuf>) -> Self {
        Self {
            primary_path: primary_path.into(),
            secondary_path: None,
            mode: StoreMode::PrimaryOnly,
        }
    }

    #[must_use]
    pub fn hybrid(
        primary_path: impl Into<PathBuf>,
        secondary_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            primary_path: primary_path.into(),
            secondary_path: Some(secondary_path.into()),
            mode: StoreMode::Hybrid,
        }
    }
}
