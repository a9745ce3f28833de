//! Image reference resolution between local Markdown and Fotolife embeds.
//!
//! The outbound direction uploads local `![alt](path)` references through
//! the caching uploader and substitutes embed tokens into the payload; the
//! inbound direction rewrites known tokens back into local relative image
//! references. Path resolution is purely lexical.

use std::path::Path;

use hatena_md_core::images::{find_local_image_refs, replace_embed_tokens};

use crate::cache::UploadCache;
use crate::error::Error;

/// Collaborator that pushes one image to the remote side. Abstracted so
/// the resolver can be exercised without a network.
#[allow(async_fn_in_trait)]
pub trait ImageUploader {
    async fn upload(&self, path: &Path) -> Result<String, Error>;
}

pub struct ImageResolver<'a> {
    cache: &'a mut UploadCache,
}

impl<'a> ImageResolver<'a> {
    pub fn new(cache: &'a mut UploadCache) -> Self {
        Self { cache }
    }

    /// Upload every local image referenced by `body` and substitute the
    /// embed tokens, left to right.
    ///
    /// Cached paths are substituted without touching the network. A failed
    /// upload leaves the original reference in place and processing
    /// continues with the remaining matches.
    pub async fn upload_and_replace<U: ImageUploader>(
        &mut self,
        uploader: &U,
        body: &str,
        base_dir: &Path,
    ) -> String {
        let refs = find_local_image_refs(body);
        if refs.is_empty() {
            return body.to_string();
        }

        let mut out = String::with_capacity(body.len());
        let mut last = 0;
        for image in refs {
            let relative = image.path.strip_prefix("./").unwrap_or(&image.path);
            let absolute = base_dir.join(relative);
            let key = absolute.to_string_lossy().into_owned();

            let token = match self.cache.token_for(&key) {
                Some(token) => Some(token.to_string()),
                None => match uploader.upload(&absolute).await {
                    Ok(token) => {
                        if let Err(e) = self.cache.insert(key, token.clone()) {
                            log::warn!("failed to persist upload cache: {e}");
                        }
                        Some(token)
                    }
                    Err(e) => {
                        log::warn!("image upload failed for {}: {e}", absolute.display());
                        None
                    }
                },
            };

            out.push_str(&body[last..image.start]);
            match token {
                Some(token) => out.push_str(&token),
                None => out.push_str(&body[image.start..image.end]),
            }
            last = image.end;
        }
        out.push_str(&body[last..]);
        out
    }

    /// Rewrite every cached embed token in `body` into a Markdown image
    /// reference relative to the directory that will contain
    /// `output_path`. Unknown tokens are left unchanged.
    pub fn localize_references(&self, body: &str, output_path: &Path) -> String {
        let dir = output_path.parent().unwrap_or_else(|| Path::new(""));
        replace_embed_tokens(body, |token| {
            let local = Path::new(self.cache.local_path_for(token)?);
            let relative = match local.strip_prefix(dir) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => {
                    let name = local
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    Path::new("img").join(name)
                }
            };
            Some(format!("![]({})", relative.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;

    /// Test double that records every upload request.
    struct RecordingUploader {
        calls: RefCell<Vec<PathBuf>>,
        fail: bool,
    }

    impl RecordingUploader {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail: true,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl ImageUploader for RecordingUploader {
        async fn upload(&self, path: &Path) -> Result<String, Error> {
            self.calls.borrow_mut().push(path.to_path_buf());
            if self.fail {
                Err(Error::Network("boom".to_string()))
            } else {
                Ok(format!("[f:id:u:{}p:plain]", self.call_count()))
            }
        }
    }

    #[tokio::test]
    async fn test_upload_substitutes_tokens_left_to_right() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = UploadCache::load(dir.path());
        let mut resolver = ImageResolver::new(&mut cache);
        let uploader = RecordingUploader::new();

        let body = "a ![x](./img/a.png) b ![y](img/b.png) c";
        let out = resolver
            .upload_and_replace(&uploader, body, Path::new("/base"))
            .await;

        assert_eq!(out, "a [f:id:u:1p:plain] b [f:id:u:2p:plain] c");
        assert_eq!(uploader.call_count(), 2);
        // The leading ./ is stripped before joining
        assert_eq!(uploader.calls.borrow()[0], Path::new("/base/img/a.png"));
    }

    #[tokio::test]
    async fn test_repeated_path_uploads_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = UploadCache::load(dir.path());
        let mut resolver = ImageResolver::new(&mut cache);
        let uploader = RecordingUploader::new();

        let body = "![a](img/x.png) and again ![b](img/x.png)";
        resolver
            .upload_and_replace(&uploader, body, Path::new("/base"))
            .await;
        assert_eq!(uploader.call_count(), 1);

        // A second pass in the same session is served from the cache
        resolver
            .upload_and_replace(&uploader, body, Path::new("/base"))
            .await;
        assert_eq!(uploader.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_original_reference() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = UploadCache::load(dir.path());
        let mut resolver = ImageResolver::new(&mut cache);
        let uploader = RecordingUploader::failing();

        let body = "before ![x](img/a.png) after";
        let out = resolver
            .upload_and_replace(&uploader, body, Path::new("/base"))
            .await;

        assert_eq!(out, body);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_remote_references_are_not_uploaded() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = UploadCache::load(dir.path());
        let mut resolver = ImageResolver::new(&mut cache);
        let uploader = RecordingUploader::new();

        let body = "![a](https://example.com/x.png)";
        let out = resolver
            .upload_and_replace(&uploader, body, Path::new("/base"))
            .await;

        assert_eq!(out, body);
        assert_eq!(uploader.call_count(), 0);
    }

    #[test]
    fn test_localize_rewrites_known_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = UploadCache::load(dir.path());
        cache
            .insert("/posts/img/x.png".to_string(), "[f:id:u:1p:plain]".to_string())
            .unwrap();
        let resolver = ImageResolver::new(&mut cache);

        let body = "see [f:id:u:1p:plain] and [f:id:u:9p:plain]";
        let out = resolver.localize_references(body, Path::new("/posts/20240305/entry.md"));

        // Cached token becomes a relative reference, the unknown one stays
        assert_eq!(out, "see ![](img/x.png) and [f:id:u:9p:plain]");
    }

    #[test]
    fn test_localize_prefers_path_under_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = UploadCache::load(dir.path());
        cache
            .insert(
                "/posts/20240305/img/x.png".to_string(),
                "[f:id:u:1p:plain]".to_string(),
            )
            .unwrap();
        let resolver = ImageResolver::new(&mut cache);

        let out =
            resolver.localize_references("[f:id:u:1p:plain]", Path::new("/posts/20240305/e.md"));
        assert_eq!(out, "![](img/x.png)");
    }
}
