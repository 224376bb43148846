//! Test data providers
//!
//! [`JsonStoreHttpTestDataSource`] reads every `*.td.json` file below a set of
//! directories. A file is keyed by its `_guid_`, or by its file name without
//! the `.td.json` suffix. `_extends_` names another test data whose content is
//! deep-merged underneath, so a file only states what differs from its base.

use crate::error::{TestDataError, TestDataResult};
use crate::model::HttpTestData;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Suffix of test data files
pub const TEST_DATA_SUFFIX: &str = ".td.json";

const GUID_KEY: &str = "_guid_";
const EXTENDS_KEY: &str = "_extends_";

/// Supplies test data by test call id
pub trait HttpTestDataSource {
    fn get_data_for_test_call(&self, test_data_id: &str) -> TestDataResult<HttpTestData>;
}

/// Raw content of one test data file
#[derive(Debug, Clone)]
struct Entry {
    path: PathBuf,
    content: Map<String, Value>,
}

/// Test data read from JSON files on disk
#[derive(Debug, Clone, Default)]
pub struct JsonStoreHttpTestDataSource {
    entries: HashMap<String, Entry>,
}

impl JsonStoreHttpTestDataSource {
    /// Load every test data file below the given directories
    pub fn new<I, P>(dirs: I) -> TestDataResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut store = Self::default();
        for dir in dirs {
            let dir = dir.as_ref();
            let files = find_test_data_files(dir)?;
            if files.is_empty() {
                warn!("No test data files found in {:?}", dir);
            }
            for path in files {
                store.load_file(&path)?;
            }
        }
        debug!(count = store.entries.len(), "Loaded test data");
        Ok(store)
    }

    fn load_file(&mut self, path: &Path) -> TestDataResult<()> {
        debug!("Loading test data file: {:?}", path);

        let content = fs::read_to_string(path).map_err(|e| TestDataError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|e| TestDataError::ParseJson {
            path: path.to_path_buf(),
            source: e,
        })?;
        let Value::Object(content) = value else {
            return Err(TestDataError::NotAnObject {
                path: path.to_path_buf(),
            });
        };

        let id = match content.get(GUID_KEY).and_then(Value::as_str) {
            Some(guid) => guid.to_string(),
            None => file_stem(path),
        };

        if let Some(existing) = self.entries.get(&id) {
            return Err(TestDataError::DuplicateId {
                id,
                first: existing.path.clone(),
                second: path.to_path_buf(),
            });
        }

        trace!(id = %id, "Registered test data");
        self.entries.insert(
            id,
            Entry {
                path: path.to_path_buf(),
                content,
            },
        );
        Ok(())
    }

    /// Ids of every loaded test data, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Content of a test data with its `_extends_` chain merged in
    pub fn resolve(&self, id: &str) -> TestDataResult<Map<String, Value>> {
        let mut chain = Vec::new();
        let mut resolved = self.resolve_chain(id, &mut chain)?;
        resolved.insert(GUID_KEY.to_string(), Value::String(id.to_string()));
        Ok(resolved)
    }

    fn resolve_chain(&self, id: &str, chain: &mut Vec<String>) -> TestDataResult<Map<String, Value>> {
        if chain.iter().any(|seen| seen == id) {
            chain.push(id.to_string());
            return Err(TestDataError::CircularExtends {
                chain: chain.join(" -> "),
            });
        }

        let entry = self.entries.get(id).ok_or_else(|| match chain.last() {
            Some(child) => TestDataError::UnknownBase {
                id: child.clone(),
                base: id.to_string(),
            },
            None => TestDataError::NotFound { id: id.to_string() },
        })?;
        chain.push(id.to_string());

        match entry.content.get(EXTENDS_KEY).and_then(Value::as_str) {
            Some(base) => {
                trace!(id, base, "Resolving _extends_");
                let mut merged = self.resolve_chain(base, chain)?;
                deep_merge(&mut merged, &entry.content);
                Ok(merged)
            }
            None => Ok(entry.content.clone()),
        }
    }
}

impl HttpTestDataSource for JsonStoreHttpTestDataSource {
    fn get_data_for_test_call(&self, test_data_id: &str) -> TestDataResult<HttpTestData> {
        let resolved = self.resolve(test_data_id)?;
        serde_json::from_value(Value::Object(resolved)).map_err(|e| TestDataError::InvalidData {
            id: test_data_id.to_string(),
            source: e,
        })
    }
}

/// Overlay `overlay` onto `base`; mappings merge key by key, anything else replaces
pub fn deep_merge(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Object(base_map)), Value::Object(overlay_map)) => {
                deep_merge(base_map, overlay_map);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

fn file_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.strip_suffix(TEST_DATA_SUFFIX)
        .map(str::to_string)
        .unwrap_or(name)
}

/// All test data files below `dir`, sorted by path
fn find_test_data_files(dir: &Path) -> TestDataResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let entries = fs::read_dir(&current).map_err(|e| TestDataError::ReadDir {
            path: current.clone(),
            source: e,
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| TestDataError::ReadDir {
                path: current.clone(),
                source: e,
            })?;
            let file_type = entry.file_type().map_err(|e| TestDataError::ReadDir {
                path: current.clone(),
                source: e,
            })?;
            let path = entry.path();
            // Symlinked directories are not followed
            if file_type.is_dir() {
                pending.push(path);
            } else if path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(TEST_DATA_SUFFIX))
                .unwrap_or(false)
            {
                files.push(path);
            } else {
                trace!("Skipping non test data file: {:?}", path);
            }
        }
    }

    files.sort();
    Ok(files)
}
