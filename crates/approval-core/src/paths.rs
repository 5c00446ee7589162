/// Path constants and utilities for the approval data directory
use approval_types::ApplicationType;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use crate::constants::DEFAULT_DATA_DIR;

// Static storage for configurable data root
static DATA_ROOT: OnceCell<PathBuf> = OnceCell::new();

/// Initialize the data root directory. Can only be called once.
/// If not called, the default `/data/approvals` will be used.
pub fn init_data_root(path: PathBuf) -> Result<(), String> {
    DATA_ROOT.set(path).map_err(|_| "Data root already initialized".to_string())
}

/// Get the configured data root or the default
pub fn data_root() -> PathBuf {
    DATA_ROOT
        .get()
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

// Directory names (relative to the data root)
pub const APPLICATIONS_DIR_NAME: &str = "applications";
pub const HISTORY_DIR_NAME: &str = "history";
pub const NOTIFICATIONS_DIR_NAME: &str = "notifications";
pub const ACTIONS_DIR_NAME: &str = "actions";
pub const PROCESSED_DIR_NAME: &str = "processed";
pub const FAILED_DIR_NAME: &str = "failed";

// Path builder functions, all relative to an explicit root
pub fn applications_dir(root: &Path, kind: ApplicationType) -> PathBuf {
    root.join(APPLICATIONS_DIR_NAME).join(kind.as_str())
}

pub fn history_dir(root: &Path) -> PathBuf {
    root.join(HISTORY_DIR_NAME)
}

pub fn notifications_dir(root: &Path) -> PathBuf {
    root.join(NOTIFICATIONS_DIR_NAME)
}

pub fn actions_dir(root: &Path) -> PathBuf {
    root.join(ACTIONS_DIR_NAME)
}

pub fn actions_processed_dir(root: &Path) -> PathBuf {
    actions_dir(root).join(PROCESSED_DIR_NAME)
}

pub fn actions_failed_dir(root: &Path) -> PathBuf {
    actions_dir(root).join(FAILED_DIR_NAME)
}

/// Get all directories that should exist under a data root
pub fn all_directories(root: &Path) -> Vec<PathBuf> {
    vec![
        root.to_path_buf(),
        applications_dir(root, ApplicationType::Training),
        applications_dir(root, ApplicationType::Gcr),
        history_dir(root),
        notifications_dir(root),
        actions_dir(root),
        actions_processed_dir(root),
        actions_failed_dir(root),
    ]
}

/// Create every directory of the layout
pub fn ensure_layout(root: &Path) -> std::io::Result<()> {
    for dir in all_directories(root) {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_root() {
        // Nothing in the test binary initialises the root
        assert_eq!(data_root(), PathBuf::from("/data/approvals"));
    }

    #[test]
    fn test_directory_hierarchy() {
        let root = Path::new("/srv/approvals");
        assert_eq!(
            applications_dir(root, ApplicationType::Gcr),
            PathBuf::from("/srv/approvals/applications/gcr")
        );
        assert!(actions_processed_dir(root).starts_with(actions_dir(root)));
        assert!(actions_failed_dir(root).starts_with(actions_dir(root)));
    }

    #[test]
    fn test_all_directories_unique_and_rooted() {
        let root = Path::new("/srv/approvals");
        let all_dirs = all_directories(root);
        let unique_dirs: HashSet<_> = all_dirs.iter().collect();

        assert_eq!(all_dirs.len(), unique_dirs.len(), "All directories should be unique");
        for dir in &all_dirs {
            assert!(dir.starts_with(root), "Path {:?} should start with the root", dir);
        }
    }

    #[test]
    fn test_ensure_layout_creates_directories() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        ensure_layout(temp_dir.path()).unwrap();

        for dir in all_directories(temp_dir.path()) {
            assert!(dir.is_dir(), "{:?} should exist", dir);
        }
    }
}
