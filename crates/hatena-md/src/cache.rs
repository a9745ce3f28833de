//! Persistent mapping from absolute local image paths to Fotolife embed
//! tokens, colocated with the output directory. The reverse index is
//! rebuilt on load and on every mutation so both directions stay
//! consistent; each insert is persisted synchronously, so a crash loses at
//! most the in-flight upload.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CACHE_FILE_NAME: &str = "uploaded_images.json";

#[derive(Debug, Default)]
pub struct UploadCache {
    path: PathBuf,
    forward: BTreeMap<String, String>,
    reverse: HashMap<String, String>,
}

impl UploadCache {
    /// Load the cache file colocated with `output_dir`. A missing or
    /// unparsable file is non-fatal and yields an empty cache.
    pub fn load(output_dir: &Path) -> Self {
        let path = output_dir.join(CACHE_FILE_NAME);
        let forward = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    log::warn!("ignoring unreadable upload cache {}: {e}", path.display());
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };

        let mut cache = Self {
            path,
            forward,
            reverse: HashMap::new(),
        };
        cache.rebuild_reverse();
        cache
    }

    pub fn token_for(&self, local_path: &str) -> Option<&str> {
        self.forward.get(local_path).map(String::as_str)
    }

    pub fn local_path_for(&self, token: &str) -> Option<&str> {
        self.reverse.get(token).map(String::as_str)
    }

    /// Record a successful upload and persist the cache immediately.
    pub fn insert(&mut self, local_path: String, token: String) -> io::Result<()> {
        self.forward.insert(local_path, token);
        self.rebuild_reverse();
        self.persist()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    fn rebuild_reverse(&mut self) {
        self.reverse = self
            .forward
            .iter()
            .map(|(path, token)| (token.clone(), path.clone()))
            .collect();
    }

    fn persist(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.forward).map_err(io::Error::other)?;
        fs::write(&self.path, format!("{json}\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_yields_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = UploadCache::load(dir.path());
        assert!(cache.is_empty());
        assert_eq!(cache.token_for("/img/a.png"), None);
    }

    #[test]
    fn test_insert_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();

        let mut cache = UploadCache::load(dir.path());
        cache
            .insert("/img/a.png".to_string(), "[f:id:u:1p:plain]".to_string())
            .unwrap();

        // A fresh load sees the entry and a consistent reverse index
        let reloaded = UploadCache::load(dir.path());
        assert_eq!(reloaded.token_for("/img/a.png"), Some("[f:id:u:1p:plain]"));
        assert_eq!(reloaded.local_path_for("[f:id:u:1p:plain]"), Some("/img/a.png"));
    }

    #[test]
    fn test_reverse_index_tracks_mutations() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = UploadCache::load(dir.path());

        cache
            .insert("/img/a.png".to_string(), "[f:id:u:1p:plain]".to_string())
            .unwrap();
        cache
            .insert("/img/b.png".to_string(), "[f:id:u:2p:plain]".to_string())
            .unwrap();

        assert_eq!(cache.local_path_for("[f:id:u:2p:plain]"), Some("/img/b.png"));
        assert_eq!(cache.local_path_for("[f:id:u:9p:plain]"), None);
    }

    #[test]
    fn test_unparsable_cache_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CACHE_FILE_NAME), "{oops").unwrap();

        let cache = UploadCache::load(dir.path());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_file_is_pretty_printed_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = UploadCache::load(dir.path());
        cache
            .insert("/img/写真.png".to_string(), "[f:id:u:1p:plain]".to_string())
            .unwrap();

        let raw = fs::read_to_string(dir.path().join(CACHE_FILE_NAME)).unwrap();
        assert!(raw.contains("  \"/img/写真.png\""));
        assert!(!raw.contains("\\u"));
    }
}
