//! File Map persistence.
//!
//! The [`FileMapStore`] owns the JSON artifact handed from the crawl phase
//! to the render phase. The render phase reads only this file and never
//! walks working copies.

use std::path::{Path, PathBuf};

use docmesh_shared::{DocmeshError, FileMap, Result};
use tracing::{debug, info, instrument};

/// Handle on the File Map artifact at a fixed location.
#[derive(Debug, Clone)]
pub struct FileMapStore {
    path: PathBuf,
}

impl FileMapStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write `file_map` atomically (temp file, then rename).
    #[instrument(skip_all, fields(path = %self.path.display(), files = file_map.len()))]
    pub fn save(&self, file_map: &FileMap) -> Result<()> {
        if let Some(dup) = file_map.duplicate_path() {
            return Err(DocmeshError::artifact(
                &self.path,
                format!("refusing to save duplicate path {dup}"),
            ));
        }

        let json = serde_json::to_string_pretty(file_map).map_err(|e| {
            DocmeshError::artifact(&self.path, format!("JSON serialization failed: {e}"))
        })?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DocmeshError::io(parent, e))?;
        }
        write_atomic(&self.path, json.as_bytes())?;

        info!("file map saved");
        Ok(())
    }

    /// Read the artifact back. Missing or malformed files are artifact errors.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<FileMap> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            DocmeshError::artifact(&self.path, format!("cannot read file map: {e}"))
        })?;

        let file_map: FileMap = serde_json::from_str(&content).map_err(|e| {
            DocmeshError::artifact(&self.path, format!("malformed file map: {e}"))
        })?;

        debug!(files = file_map.len(), "file map loaded");
        Ok(file_map)
    }
}

/// Write `content` to a sibling temp file, then rename it over `target`.
pub fn write_atomic(target: &Path, content: &[u8]) -> Result<()> {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = target.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, content).map_err(|e| DocmeshError::io(&temp, e))?;
    std::fs::rename(&temp, target).map_err(|e| DocmeshError::io(target, e))?;

    debug!(path = %target.display(), size = content.len(), "wrote file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use docmesh_shared::{FileDescriptor, UNCATEGORIZED};
    use pretty_assertions::assert_eq;

    use super::*;

    fn descriptor(path: &str, name: &str, category: &str) -> FileDescriptor {
        FileDescriptor {
            path: path.into(),
            name: name.into(),
            repository: "docs".into(),
            category: category.into(),
        }
    }

    fn sample() -> FileMap {
        FileMap::from(vec![
            descriptor("/w/docs/docs/z.md", "z", UNCATEGORIZED),
            descriptor("/w/docs/docs/lib/components/a.md", "a", "Components"),
            descriptor("/w/docs/docs/m.md", "m", UNCATEGORIZED),
        ])
    }

    #[test]
    fn save_then_load_preserves_order() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = FileMapStore::new(tmp.path().join("files-map.json"));

        store.save(&sample()).expect("save");
        assert!(store.exists());
        assert_eq!(store.load().expect("load"), sample());
    }

    #[test]
    fn saving_unchanged_map_is_byte_identical() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = FileMapStore::new(tmp.path().join("files-map.json"));

        store.save(&sample()).expect("save");
        let first = std::fs::read(store.path()).expect("read");
        store.save(&store.load().expect("load")).expect("save again");
        let second = std::fs::read(store.path()).expect("read");
        assert_eq!(first, second);
    }

    #[test]
    fn save_creates_parent_and_leaves_no_temp_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = FileMapStore::new(tmp.path().join("nested/work/files-map.json"));
        store.save(&sample()).expect("save");

        for entry in std::fs::read_dir(tmp.path().join("nested/work")).expect("read_dir") {
            let name = entry.expect("entry").file_name().to_string_lossy().to_string();
            assert!(!name.starts_with('.'), "temp file left behind: {name}");
        }
    }

    #[test]
    fn save_rejects_duplicate_paths() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = FileMapStore::new(tmp.path().join("files-map.json"));
        let mut map = sample();
        map.push(descriptor("/w/docs/docs/z.md", "again", UNCATEGORIZED));

        let err = store.save(&map).unwrap_err();
        assert!(matches!(err, DocmeshError::Artifact { .. }));
        assert!(!store.exists());
    }

    #[test]
    fn load_missing_is_artifact_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = FileMapStore::new(tmp.path().join("files-map.json"));

        let err = store.load().unwrap_err();
        assert!(matches!(err, DocmeshError::Artifact { .. }));
    }

    #[test]
    fn load_malformed_is_artifact_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("files-map.json");
        std::fs::write(&path, r#"{"path": "not an array"}"#).expect("write");

        let err = FileMapStore::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("malformed file map"));
    }

    #[test]
    fn empty_map_roundtrips() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = FileMapStore::new(tmp.path().join("files-map.json"));
        store.save(&FileMap::new()).expect("save");
        assert!(store.load().expect("load").is_empty());
    }
}
