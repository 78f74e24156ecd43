//! Storage root catalog for flatdb
//!
//! Tables are not registered anywhere: a table exists when its file exists
//! under the storage root. The catalog resolves names to paths and lists
//! what is there.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::sql::parser::is_valid_name;

/// File extension of table files
pub const TABLE_EXTENSION: &str = "csv";

/// Catalog over a storage root directory
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
}

impl Catalog {
    /// Create a catalog over `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage root if it does not exist yet
    pub fn ensure_root(&self) -> Result<()> {
        if !self.root.is_dir() {
            debug!(root = %self.root.display(), "creating storage root");
            fs::create_dir_all(&self.root)?;
        }
        Ok(())
    }

    /// Path of the file backing `name`
    pub fn table_path(&self, name: &str) -> Result<PathBuf> {
        if !is_valid_name(name) {
            return Err(Error::InvalidTableName(name.to_string()));
        }
        Ok(self.root.join(format!("{}.{}", name, TABLE_EXTENSION)))
    }

    /// Check if a table exists
    pub fn table_exists(&self, name: &str) -> bool {
        self.table_path(name)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// Get all table names, sorted
    pub fn list_tables(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(TABLE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if is_valid_name(stem) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_table_path() {
        let catalog = Catalog::new("/data/");
        assert_eq!(
            catalog.table_path("users").unwrap(),
            PathBuf::from("/data/users.csv")
        );
        assert!(matches!(
            catalog.table_path("../etc"),
            Err(Error::InvalidTableName(_))
        ));
        assert!(matches!(
            catalog.table_path(""),
            Err(Error::InvalidTableName(_))
        ));
    }

    #[test]
    fn test_list_tables() {
        let dir = tempdir().unwrap();
        let catalog = Catalog::new(dir.path().join("db"));
        assert!(catalog.list_tables().unwrap().is_empty());

        catalog.ensure_root().unwrap();
        fs::write(catalog.root().join("users.csv"), "id\nint64\n").unwrap();
        fs::write(catalog.root().join("accounts.csv"), "id\nint64\n").unwrap();
        fs::write(catalog.root().join("notes.txt"), "ignored").unwrap();

        assert_eq!(catalog.list_tables().unwrap(), vec!["accounts", "users"]);
        assert!(catalog.table_exists("users"));
        assert!(!catalog.table_exists("notes"));
    }
}
