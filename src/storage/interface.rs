//! The interface document
//!
//! `interface.json` is JSON with comments. The analyzer reads two things from
//! it: each task's `entry` node (the reachability roots) and the keys of
//! every `pipeline_override` object, wherever it is nested.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use super::document::{load_jsonc, DocumentError};
use crate::domain::type_name;

#[derive(Debug, Error)]
pub enum InterfaceError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("interface root must be a JSON object, found {0}")]
    NotObject(&'static str),
}

/// Entry points and override keys declared by the interface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interface {
    pub path: PathBuf,

    /// Task entry node names, in declaration order
    pub entries: Vec<String>,

    /// Node names targeted by any `pipeline_override`
    pub override_keys: BTreeSet<String>,
}

impl Interface {
    /// Reads and parses an interface file
    pub fn load(path: &Path) -> Result<Self, InterfaceError> {
        let value = load_jsonc(path)?;
        Self::from_value(path, &value)
    }

    /// Extracts entries and override keys from a parsed document
    pub fn from_value(path: &Path, value: &Value) -> Result<Self, InterfaceError> {
        let root = value
            .as_object()
            .ok_or_else(|| InterfaceError::NotObject(type_name(value)))?;

        let entries = root
            .get("task")
            .and_then(Value::as_array)
            .map(|tasks| {
                tasks
                    .iter()
                    .filter_map(|task| task.get("entry").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let mut override_keys = BTreeSet::new();
        collect_override_keys(value, &mut override_keys);

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            override_keys,
        })
    }
}

fn collect_override_keys(value: &Value, keys: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Object(overrides)) = map.get("pipeline_override") {
                keys.extend(overrides.keys().cloned());
            }
            for child in map.values() {
                collect_override_keys(child, keys);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_override_keys(item, keys);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn collects_entries_in_order() {
        let value = json!({
            "task": [
                {"name": "Daily", "entry": "DailyStart"},
                {"name": "Broken"},
                {"name": "Arena", "entry": "ArenaStart"}
            ]
        });

        let interface = Interface::from_value(Path::new("interface.json"), &value).unwrap();
        assert_eq!(interface.entries, vec!["DailyStart", "ArenaStart"]);
    }

    #[test]
    fn collects_nested_override_keys() {
        let value = json!({
            "task": [{"entry": "Start", "pipeline_override": {"Start": {"enabled": false}}}],
            "option": {
                "Difficulty": {
                    "cases": [
                        {"name": "Hard", "pipeline_override": {"PickHard": {}, "Start": {}}},
                        {"name": "Easy", "pipeline_override": {"PickEasy": {}}}
                    ]
                }
            }
        });

        let interface = Interface::from_value(Path::new("interface.json"), &value).unwrap();
        let keys: Vec<_> = interface.override_keys.iter().map(String::as_str).collect();
        assert_eq!(keys, vec!["PickEasy", "PickHard", "Start"]);
    }

    #[test]
    fn root_must_be_object() {
        let err = Interface::from_value(Path::new("interface.json"), &json!([])).unwrap_err();
        assert!(matches!(err, InterfaceError::NotObject("array")));
    }

    #[test]
    fn loads_commented_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("interface.json");
        fs::write(
            &path,
            "{\n  // tasks shown in the UI\n  \"task\": [{\"entry\": \"Start\" /* main */}]\n}\n",
        )
        .unwrap();

        let interface = Interface::load(&path).unwrap();
        assert_eq!(interface.entries, vec!["Start"]);
        assert_eq!(interface.path, path);
    }
}
