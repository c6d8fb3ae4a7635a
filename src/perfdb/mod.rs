//! # Tuning Database
//!
//! Persisted results of past tuning runs. Records are keyed twice: by the
//! problem signature, then by solver id inside the record. Values are the
//! serialized perf-config JSON the owning solver knows how to decode; the
//! database itself never interprets them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// All solver entries stored for one problem. Keys are solver database ids,
/// values are opaque serialized perf configs. Serializes as the bare map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DbRecord {
    entries: HashMap<String, String>,
}

impl DbRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, solver_id: &str, params: &str) {
        self.entries.insert(solver_id.to_string(), params.to_string());
    }

    pub fn get(&self, solver_id: &str) -> Option<&str> {
        self.entries.get(solver_id).map(String::as_str)
    }

    pub fn remove(&mut self, solver_id: &str) -> Option<String> {
        self.entries.remove(solver_id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn solver_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Storage interface the solver layer reads perf configs through. `problem`
/// is the problem signature string, `solver_id` the id of the solver that
/// owns the entry.
pub trait PerfDb {
    fn load(&self, problem: &str, solver_id: &str) -> Option<String>;
    fn store(&mut self, problem: &str, solver_id: &str, params: &str);
    fn find_record(&self, problem: &str) -> Option<DbRecord>;
}

/// In-memory database. Used by the search routines in tests and by callers
/// that manage persistence themselves.
#[derive(Debug, Clone, Default)]
pub struct MemPerfDb {
    entries: HashMap<String, DbRecord>,
}

impl MemPerfDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_count(&self) -> usize {
        self.entries.len()
    }
}

impl PerfDb for MemPerfDb {
    fn load(&self, problem: &str, solver_id: &str) -> Option<String> {
        self.entries
            .get(problem)
            .and_then(|r| r.get(solver_id))
            .map(str::to_string)
    }

    fn store(&mut self, problem: &str, solver_id: &str, params: &str) {
        self.entries
            .entry(problem.to_string())
            .or_default()
            .set(solver_id, params);
    }

    fn find_record(&self, problem: &str) -> Option<DbRecord> {
        self.entries.get(problem).cloned()
    }
}

/// JSON-file-backed database. The whole file is read once at open and
/// rewritten after every store; last write wins. A missing or unreadable
/// file opens as an empty database rather than failing, so a wiped cache
/// only costs a re-tune.
#[derive(Debug)]
pub struct FilePerfDb {
    entries: HashMap<String, DbRecord>,
    file_path: PathBuf,
}

impl FilePerfDb {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let file_path = path.as_ref().to_path_buf();
        if file_path.exists() {
            if let Ok(content) = fs::read_to_string(&file_path) {
                if let Ok(entries) = serde_json::from_str::<HashMap<String, DbRecord>>(&content) {
                    return Self { entries, file_path };
                }
                eprintln!(
                    "[PerfDb] {} is not a valid database, starting empty",
                    file_path.display()
                );
            }
        }
        Self {
            entries: HashMap::new(),
            file_path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn save(&self) {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                let _ = fs::create_dir_all(parent);
            }
        }
        if let Ok(content) = serde_json::to_string_pretty(&self.entries) {
            if let Err(e) = fs::write(&self.file_path, content) {
                eprintln!("[PerfDb] failed to save {}: {}", self.file_path.display(), e);
            }
        }
    }
}

impl PerfDb for FilePerfDb {
    fn load(&self, problem: &str, solver_id: &str) -> Option<String> {
        self.entries
            .get(problem)
            .and_then(|r| r.get(solver_id))
            .map(str::to_string)
    }

    fn store(&mut self, problem: &str, solver_id: &str, params: &str) {
        self.entries
            .entry(problem.to_string())
            .or_default()
            .set(solver_id, params);
        self.save();
    }

    fn find_record(&self, problem: &str) -> Option<DbRecord> {
        self.entries.get(problem).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_db_round_trip() {
        let mut db = MemPerfDb::new();
        assert_eq!(db.load("p1", "s1"), None);
        db.store("p1", "s1", "{\"tile\":64}");
        assert_eq!(db.load("p1", "s1").as_deref(), Some("{\"tile\":64}"));
        assert_eq!(db.load("p1", "s2"), None);
        assert_eq!(db.load("p2", "s1"), None);
    }

    #[test]
    fn record_holds_multiple_solvers() {
        let mut db = MemPerfDb::new();
        db.store("p1", "s1", "a");
        db.store("p1", "s2", "b");
        let record = db.find_record("p1").unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("s1"), Some("a"));
        assert_eq!(record.get("s2"), Some("b"));
    }

    #[test]
    fn store_overwrites() {
        let mut db = MemPerfDb::new();
        db.store("p1", "s1", "old");
        db.store("p1", "s1", "new");
        assert_eq!(db.load("p1", "s1").as_deref(), Some("new"));
        assert_eq!(db.find_record("p1").unwrap().len(), 1);
    }
}
