use super::types::Course;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Term does not exist: {term} (no course table at {path})")]
    TermUnavailable { term: String, path: PathBuf },

    #[error("Invalid term '{term}' (must be a plain name such as 202540)")]
    InvalidTerm { term: String },

    #[error("Failed to read course table for term {term}")]
    Io {
        term: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid course table for term {term}")]
    Parse {
        term: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of already-resolved course records for a term.
///
/// Scraping, grade attribution and storage live behind this trait; the
/// scheduling engine only ever sees the returned records.
pub trait TermCatalog {
    fn courses(&self, term: &str) -> Result<Vec<Course>, CatalogError>;
}

/// Term tables stored as `<dir>/<term>.json`, each a JSON array of course records.
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    dir: PathBuf,
}

impl DirectoryCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn term_path(&self, term: &str) -> PathBuf {
        self.dir.join(format!("{}.json", term))
    }
}

impl TermCatalog for DirectoryCatalog {
    fn courses(&self, term: &str) -> Result<Vec<Course>, CatalogError> {
        if !is_plain_term(term) {
            return Err(CatalogError::InvalidTerm {
                term: term.to_string(),
            });
        }
        let path = self.term_path(term);
        if !path.exists() {
            return Err(CatalogError::TermUnavailable {
                term: term.to_string(),
                path,
            });
        }

        let file = File::open(&path).map_err(|source| CatalogError::Io {
            term: term.to_string(),
            source,
        })?;
        let courses: Vec<Course> =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| CatalogError::Parse {
                term: term.to_string(),
                source,
            })?;

        debug!(term, path = %path.display(), courses = courses.len(), "loaded term table");
        Ok(courses)
    }
}

/// Terms name a file inside the data directory, so they may not walk out of it
fn is_plain_term(term: &str) -> bool {
    !term.is_empty() && !term.contains(['/', '\\']) && !term.contains("..")
}

/// In-memory catalog, mostly for tests and embedding.
impl TermCatalog for std::collections::HashMap<String, Vec<Course>> {
    fn courses(&self, term: &str) -> Result<Vec<Course>, CatalogError> {
        self.get(term).cloned().ok_or_else(|| CatalogError::TermUnavailable {
            term: term.to_string(),
            path: PathBuf::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TABLE: &str = r#"[
        {"subject": "CSCI 301", "crn": 40001, "days": "MWF", "start_time": 900, "end_time": 950},
        {"subject": "CSCI 301", "crn": 40002, "days": "TR", "start_time": 1000, "end_time": 1120},
        {"subject": "MATH 204", "crn": 40100, "days": "TBD"}
    ]"#;

    #[test]
    fn test_load_term_table() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("202440.json"), TABLE).unwrap();

        let catalog = DirectoryCatalog::new(dir.path());
        let courses = catalog.courses("202440").unwrap();
        assert_eq!(courses.len(), 3);
        assert_eq!(courses[1].crn, 40002);
        assert!(!courses[2].is_schedulable());
    }

    #[test]
    fn test_missing_term_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = DirectoryCatalog::new(dir.path());
        let err = catalog.courses("199910").unwrap_err();
        assert!(matches!(err, CatalogError::TermUnavailable { .. }));
        assert!(err.to_string().contains("199910"));
    }

    #[test]
    fn test_invalid_table_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("202440.json"), "{ not json").unwrap();
        let catalog = DirectoryCatalog::new(dir.path());
        assert!(matches!(
            catalog.courses("202440"),
            Err(CatalogError::Parse { .. })
        ));
    }

    #[test]
    fn test_term_outside_data_dir_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let data = root.path().join("terms");
        fs::create_dir(&data).unwrap();
        fs::write(root.path().join("secret.json"), TABLE).unwrap();

        let catalog = DirectoryCatalog::new(&data);
        for term in ["../secret", "..", "a/b", "a\\b", ""] {
            assert!(
                matches!(catalog.courses(term), Err(CatalogError::InvalidTerm { .. })),
                "term {:?} should be rejected",
                term
            );
        }
    }

    #[test]
    fn test_hashmap_catalog() {
        let mut map = std::collections::HashMap::new();
        map.insert("202440".to_string(), Vec::new());
        assert!(map.courses("202440").unwrap().is_empty());
        assert!(map.courses("202510").is_err());
    }
}
