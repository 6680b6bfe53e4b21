//! Import of YAML pose and scene files
//!
//! The older tool kept `saved_poses.yaml` and `saved_scenes.yaml` with the
//! same fields as the JSON documents. They are read here and copied into a
//! store; the YAML files themselves are never written.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;

use super::{DocumentStore, StoreError, StoreResult};

/// Read every document from a YAML map file. An empty file, or one holding
/// only `null`, has no documents.
pub fn read_yaml<D: DeserializeOwned>(path: &Path) -> StoreResult<BTreeMap<String, D>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Failed to read YAML file");
        StoreError::Io(e)
    })?;
    if text.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let map: Option<BTreeMap<String, D>> = serde_yaml::from_str(&text)?;
    Ok(map.unwrap_or_default())
}

/// Copy every document in the YAML file at `path` into `store`, replacing
/// documents of the same name. Returns how many were imported.
pub fn import_yaml<D: DeserializeOwned>(
    path: &Path,
    store: &dyn DocumentStore<D>,
) -> StoreResult<usize> {
    let docs = read_yaml::<D>(path)?;
    let count = docs.len();
    for (name, doc) in docs {
        store.save(&name, doc)?;
    }
    tracing::info!(path = %path.display(), count, "Imported YAML documents");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joints::NUM_JOINTS;
    use crate::store::{MemoryStore, PoseDocument, SceneDocument};

    fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_import_pose_file() {
        let dir = tempfile::tempdir().unwrap();
        let angles = vec!["- 0.25"; NUM_JOINTS].join("\n    ");
        let text = format!(
            concat!(
                "wave:\n",
                "  angles:\n    {}\n",
                "  joint_names: []\n",
                "  timestamp: '2024-05-01 09:30:00'\n",
                "  description: 'Custom pose: wave'\n",
            ),
            angles
        );
        let path = write(dir.path(), "saved_poses.yaml", &text);

        let store = MemoryStore::<PoseDocument>::new();
        assert_eq!(import_yaml(&path, &store).unwrap(), 1);

        let doc = store.load("wave").unwrap().unwrap();
        assert_eq!(doc.angles().unwrap(), [0.25; NUM_JOINTS]);
        assert_eq!(doc.timestamp, "2024-05-01 09:30:00");
        assert_eq!(doc.description, "Custom pose: wave");
    }

    #[test]
    fn test_import_scene_file() {
        let dir = tempfile::tempdir().unwrap();
        let text = "\
greet:
  steps:
  - pose_name: wave
    hold_time: 1.5
    interp_time: 0.5
  - pose_name: rest
  timestamp: '2024-05-01 09:31:00'
  loop: true
";
        let path = write(dir.path(), "saved_scenes.yaml", text);

        let store = MemoryStore::<SceneDocument>::new();
        assert_eq!(import_yaml(&path, &store).unwrap(), 1);

        let scene = store.load("greet").unwrap().unwrap().into_scene("greet");
        assert!(scene.looping);
        assert_eq!(scene.steps.len(), 2);
        assert_eq!(scene.steps[0].interp_time, 0.5);
        assert_eq!(scene.steps[1].hold_time, 0.0);
        assert_eq!(scene.steps[1].interp_time, 1.0);
    }

    #[test]
    fn test_empty_and_null_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::<SceneDocument>::new();
        for (name, text) in [("empty.yaml", ""), ("null.yaml", "null\n"), ("map.yaml", "{}\n")] {
            let path = write(dir.path(), name, text);
            assert_eq!(import_yaml(&path, &store).unwrap(), 0);
        }
    }

    #[test]
    fn test_bad_yaml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "broken.yaml", "wave: [unclosed\n");
        let store = MemoryStore::<PoseDocument>::new();
        assert!(matches!(import_yaml(&path, &store), Err(StoreError::Yaml(_))));
        assert!(matches!(
            import_yaml(&dir.path().join("missing.yaml"), &store),
            Err(StoreError::Io(_))
        ));
    }
}
