//! JSON-file backed record store.
//!
//! The whole mapping lives in memory after the first access and is written
//! back in full after every insert.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::AppResult;
use crate::short_id;

/// What a short id points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRecord {
    pub link: String,
    pub preview_image: String,
    pub preview_text: String,
    #[serde(default)]
    pub preview_description: String,
}

pub type Records = BTreeMap<String, PreviewRecord>;

pub struct RecordStore {
    path: PathBuf,
    // None until the backing file has been read once.
    records: Mutex<Option<Records>>,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the backing file if it has not been read yet and returns the
    /// number of records in memory.
    pub async fn load(&self) -> usize {
        let mut guard = self.records.lock().await;
        Self::ensure_loaded(&self.path, &mut guard).await.len()
    }

    pub async fn get(&self, short_id: &str) -> Option<PreviewRecord> {
        let mut guard = self.records.lock().await;
        Self::ensure_loaded(&self.path, &mut guard)
            .await
            .get(short_id)
            .cloned()
    }

    pub async fn contains(&self, short_id: &str) -> bool {
        let mut guard = self.records.lock().await;
        Self::ensure_loaded(&self.path, &mut guard)
            .await
            .contains_key(short_id)
    }

    pub async fn len(&self) -> usize {
        self.load().await
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Stores `record` under a fresh short id and persists the mapping.
    ///
    /// The lock is held across id generation, insert and save, so two
    /// creates in this process never clobber each other's write.
    pub async fn create(&self, record: PreviewRecord) -> AppResult<String> {
        let mut guard = self.records.lock().await;
        let records = Self::ensure_loaded(&self.path, &mut guard).await;

        let short_id = short_id::generate_unique(|candidate| records.contains_key(candidate));
        records.insert(short_id.clone(), record);

        if let Err(e) = write_records(&self.path, records).await {
            records.remove(&short_id);
            return Err(e);
        }
        Ok(short_id)
    }

    /// Writes the in-memory mapping back to disk.
    pub async fn save(&self) -> AppResult<()> {
        let mut guard = self.records.lock().await;
        let records = Self::ensure_loaded(&self.path, &mut guard).await;
        write_records(&self.path, records).await
    }

    async fn ensure_loaded<'a>(path: &Path, slot: &'a mut Option<Records>) -> &'a mut Records {
        if slot.is_none() {
            *slot = Some(read_records(path).await);
        }
        slot.get_or_insert_with(Records::new)
    }
}

/// Missing or unreadable files yield an empty mapping.
async fn read_records(path: &Path) -> Records {
    let raw = match fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No data file at {}, starting empty", path.display());
            return Records::new();
        }
        Err(e) => {
            tracing::warn!("Cannot read {}: {}, starting empty", path.display(), e);
            return Records::new();
        }
    };

    match serde_json::from_slice(&raw) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!("Cannot parse {}: {}, starting empty", path.display(), e);
            Records::new()
        }
    }
}

/// Replaces the file via write-to-temp and rename.
async fn write_records(path: &Path, records: &Records) -> AppResult<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut ser)?;

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent).await?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "records.json".to_string());
    let tmp = parent.join(format!(".{}.tmp.{}", file_name, std::process::id()));

    fs::write(&tmp, &buf).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(link: &str) -> PreviewRecord {
        PreviewRecord {
            link: link.to_string(),
            preview_image: "http://localhost:2000/uploads/cat.png".to_string(),
            preview_text: "Hello".to_string(),
            preview_description: "World".to_string(),
        }
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path().join("link_previews.json"));
        assert!(store.is_empty().await);
        assert!(store.get("abc123").await.is_none());
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("link_previews.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = RecordStore::new(&path);
        assert_eq!(store.load().await, 0);
    }

    #[tokio::test]
    async fn create_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("link_previews.json");

        let store = RecordStore::new(&path);
        let id = store.create(record("https://example.com")).await.unwrap();
        assert_eq!(id.len(), short_id::SHORT_ID_LEN);
        assert!(store.contains(&id).await);

        let reopened = RecordStore::new(&path);
        assert_eq!(reopened.get(&id).await, Some(record("https://example.com")));
    }

    #[tokio::test]
    async fn file_format_uses_flat_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("link_previews.json");

        let store = RecordStore::new(&path);
        let id = store.create(record("https://example.com")).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n    \""), "expected 4-space indent:\n{raw}");
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[&id]["link"], "https://example.com");
        assert_eq!(value[&id]["preview_text"], "Hello");
        assert_eq!(value[&id]["preview_description"], "World");
        assert_eq!(value[&id]["preview_image"], "http://localhost:2000/uploads/cat.png");
    }

    #[tokio::test]
    async fn save_rewrites_loaded_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("link_previews.json");
        // Compact input, missing description.
        std::fs::write(
            &path,
            r#"{"Ab12Cd":{"link":"https://example.com","preview_image":"x","preview_text":"t"}}"#,
        )
        .unwrap();

        let store = RecordStore::new(&path);
        assert_eq!(store.load().await, 1);
        store.save().await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("{\n    \"Ab12Cd\": {\n        \"link\""), "{raw}");
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["Ab12Cd"]["preview_description"], "");

        let reopened = RecordStore::new(&path);
        assert_eq!(reopened.get("Ab12Cd").await, store.get("Ab12Cd").await);
    }

    #[tokio::test]
    async fn save_on_empty_store_writes_empty_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("link_previews.json");

        RecordStore::new(&path).save().await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[tokio::test]
    async fn description_defaults_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("link_previews.json");
        std::fs::write(
            &path,
            r#"{"Ab12Cd": {"link": "https://example.com", "preview_image": "x", "preview_text": "t"}}"#,
        )
        .unwrap();

        let store = RecordStore::new(&path);
        let rec = store.get("Ab12Cd").await.unwrap();
        assert_eq!(rec.preview_description, "");
    }

    #[tokio::test]
    async fn ids_stay_unique() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path().join("link_previews.json"));

        let mut seen = std::collections::HashSet::new();
        for i in 0..50 {
            let id = store.create(record(&format!("https://example.com/{i}"))).await.unwrap();
            assert!(seen.insert(id));
        }
        assert_eq!(store.len().await, 50);
    }

    #[tokio::test]
    async fn failed_save_does_not_keep_record() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("link_previews.json");
        std::fs::create_dir(&path).unwrap();

        let store = RecordStore::new(&path);
        assert!(store.create(record("https://example.com")).await.is_err());
        assert!(store.is_empty().await);
    }
}
