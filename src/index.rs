//! The note index: an ordered list of note records persisted as a JSON array
//! in `index.json`. Loaded fully into memory per command, written back
//! atomically (write-to-temp-then-rename) so a crash never leaves a torn file.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NoteError, Result};

/// Default index filename, looked up in the working directory.
pub const INDEX_FILE: &str = "index.json";

/// One indexed note. `id` and `time` are fixed at first indexing;
/// `name`, `img`, and `tags` are refreshed on every re-index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: String,
    pub name: Option<String>,
    pub img: Option<String>,
    pub time: DateTime<Utc>,
    pub tags: Vec<String>,
}

/// Metadata extracted from a compiled note, used to create or refresh a record.
#[derive(Debug, Clone, Default)]
pub struct NoteMeta {
    pub name: Option<String>,
    pub img: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Default)]
pub struct NoteIndex {
    records: Vec<NoteRecord>,
}

impl NoteIndex {
    /// Load the index from disk. Missing file is an error; use
    /// [`NoteIndex::load_or_default`] for commands that may create the index.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(NoteError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        let records: Vec<NoteRecord> =
            serde_json::from_str(&contents).map_err(|e| NoteError::IndexCorrupt {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(Self { records })
    }

    /// Load the index, starting empty if the file does not exist yet.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(index) => Ok(index),
            Err(NoteError::FileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Write the full index back to disk atomically: serialize into a temp
    /// file in the same directory, then rename over the target.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = match dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
            None => tempfile::NamedTempFile::new_in(".")?,
        };
        serde_json::to_writer(&mut tmp, &self.records).map_err(|e| NoteError::IndexCorrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tmp.persist(path).map_err(|e| NoteError::Io(e.error))?;
        debug!(path = %path.display(), records = self.records.len(), "index saved");
        Ok(())
    }

    pub fn get(&self, slug: &str) -> Option<&NoteRecord> {
        self.records.iter().find(|r| r.id == slug)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert a new record or refresh an existing one. A new record gets a
    /// fresh timestamp; an existing record keeps its `id` and `time` and only
    /// takes the new `name`, `img`, and `tags`. Does not sort.
    pub fn upsert(&mut self, slug: &str, meta: NoteMeta) -> &NoteRecord {
        match self.records.iter_mut().position(|r| r.id == slug) {
            Some(pos) => {
                let record = &mut self.records[pos];
                record.name = meta.name;
                record.img = meta.img;
                record.tags = meta.tags;
                debug!(slug, "index record refreshed");
                &self.records[pos]
            }
            None => {
                self.records.push(NoteRecord {
                    id: slug.to_string(),
                    name: meta.name,
                    img: meta.img,
                    time: Utc::now(),
                    tags: meta.tags,
                });
                debug!(slug, "index record created");
                self.records.last().expect("record just pushed")
            }
        }
    }

    /// Remove the record for `slug`, returning it. The index is left
    /// untouched when the slug is absent.
    pub fn remove(&mut self, slug: &str) -> Result<NoteRecord> {
        let pos = self
            .records
            .iter()
            .position(|r| r.id == slug)
            .ok_or_else(|| NoteError::NotFound {
                slug: slug.to_string(),
            })?;
        Ok(self.records.remove(pos))
    }

    /// Reorder records by timestamp, newest first. Records with equal
    /// timestamps keep their relative order.
    pub fn sort_by_time_desc(&mut self) {
        self.records.sort_by(|a, b| b.time.cmp(&a.time));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn meta(name: &str, tags: &[&str]) -> NoteMeta {
        NoteMeta {
            name: Some(name.to_string()),
            img: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_upsert_creates_then_refreshes() {
        let mut index = NoteIndex::default();
        index.upsert("note-1", meta("First", &["a"]));
        let original_time = index.get("note-1").unwrap().time;

        index.upsert("note-1", meta("Second", &["b", "c"]));
        assert_eq!(index.len(), 1);

        let record = index.get("note-1").unwrap();
        assert_eq!(record.name.as_deref(), Some("Second"));
        assert_eq!(record.tags, vec!["b", "c"]);
        assert_eq!(record.time, original_time);
    }

    #[test]
    fn test_remove_missing_slug_errors_and_leaves_index_unchanged() {
        let mut index = NoteIndex::default();
        index.upsert("note-1", meta("Only", &[]));

        let err = index.remove("note-2").unwrap_err();
        assert!(matches!(err, NoteError::NotFound { slug } if slug == "note-2"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remove_existing() {
        let mut index = NoteIndex::default();
        index.upsert("note-1", meta("One", &[]));
        index.upsert("note-2", meta("Two", &[]));

        let removed = index.remove("note-1").unwrap();
        assert_eq!(removed.id, "note-1");
        assert_eq!(index.len(), 1);
        assert!(index.get("note-1").is_none());
    }

    #[test]
    fn test_sort_by_time_desc_is_stable() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let record = |id: &str, time| NoteRecord {
            id: id.to_string(),
            name: None,
            img: None,
            time,
            tags: Vec::new(),
        };
        let mut index = NoteIndex {
            records: vec![record("old", t0), record("tied-a", t1), record("tied-b", t1)],
        };

        index.sort_by_time_desc();
        let ids: Vec<&str> = index.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["tied-a", "tied-b", "old"]);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(INDEX_FILE);

        let mut index = NoteIndex::default();
        index.upsert("note-1", meta("Hello", &["math"]));
        index.save(&path).unwrap();

        let loaded = NoteIndex::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("note-1").unwrap().name.as_deref(), Some("Hello"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = NoteIndex::load(Path::new("/nonexistent/index.json")).unwrap_err();
        assert!(matches!(err, NoteError::FileNotFound { .. }));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let index = NoteIndex::load_or_default(Path::new("/nonexistent/index.json")).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_load_corrupt_index() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(INDEX_FILE);
        std::fs::write(&path, "{\"not\": \"an array\"}").unwrap();

        let err = NoteIndex::load(&path).unwrap_err();
        assert!(matches!(err, NoteError::IndexCorrupt { .. }));
    }
}
