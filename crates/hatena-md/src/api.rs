//! Remote transport for the blog AtomPub endpoint and the Fotolife
//! image-upload side channel. Calls are sequential and blocking from the
//! caller's point of view; there is no retry or timeout layer beyond what
//! reqwest provides.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::StatusCode;

use hatena_md_core::atom;
use hatena_md_core::entry::{Entry, EntrySummary};
use hatena_md_core::wsse;

use crate::config::Credentials;
use crate::error::Error;
use crate::images::ImageUploader;

const FOTOLIFE_ENDPOINT: &str = "https://f.hatena.ne.jp/atom/post";

pub struct HatenaClient {
    http: reqwest::Client,
    credentials: Credentials,
}

impl HatenaClient {
    pub fn new(credentials: Credentials) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self { http, credentials })
    }

    fn atom_endpoint(&self) -> String {
        format!(
            "https://blog.hatena.ne.jp/{}/{}/atom",
            self.credentials.hatena_id, self.credentials.blog_id
        )
    }

    /// Create a new entry; returns the id assigned by the remote side.
    pub async fn create_entry(
        &self,
        title: &str,
        body: &str,
        categories: &[String],
        draft: bool,
    ) -> Result<String, Error> {
        let payload = atom::build_entry_xml(
            &self.credentials.hatena_id,
            title,
            body,
            categories,
            draft,
        );

        let response = self
            .http
            .post(format!("{}/entry", self.atom_endpoint()))
            .basic_auth(&self.credentials.hatena_id, Some(&self.credentials.api_key))
            .header(CONTENT_TYPE, "application/xml")
            .body(payload)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if response.status() != StatusCode::CREATED {
            return Err(api_error(response).await);
        }

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(atom::entry_id_from_location)
            .ok_or_else(|| {
                Error::Core(hatena_md_core::Error::MalformedResponse(
                    "create response carries no entry location".to_string(),
                ))
            })
    }

    pub async fn update_entry(
        &self,
        entry_id: &str,
        title: &str,
        body: &str,
        categories: &[String],
        draft: bool,
    ) -> Result<(), Error> {
        let payload = atom::build_entry_xml(
            &self.credentials.hatena_id,
            title,
            body,
            categories,
            draft,
        );

        let response = self
            .http
            .put(format!("{}/entry/{}", self.atom_endpoint(), entry_id))
            .basic_auth(&self.credentials.hatena_id, Some(&self.credentials.api_key))
            .header(CONTENT_TYPE, "application/xml")
            .body(payload)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    pub async fn get_entry(&self, entry_id: &str) -> Result<Entry, Error> {
        let response = self
            .http
            .get(format!("{}/entry/{}", self.atom_endpoint(), entry_id))
            .basic_auth(&self.credentials.hatena_id, Some(&self.credentials.api_key))
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(api_error(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let mut entry = atom::parse_entry(&body)?;
        // The request id is authoritative; the <id> tag may be absent.
        entry.id = Some(entry_id.to_string());
        Ok(entry)
    }

    pub async fn list_entries(&self, limit: Option<usize>) -> Result<Vec<EntrySummary>, Error> {
        let response = self
            .http
            .get(format!("{}/entry", self.atom_endpoint()))
            .basic_auth(&self.credentials.hatena_id, Some(&self.credentials.api_key))
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(api_error(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let mut entries = atom::parse_feed(&body)?;
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }

    /// Upload one image to Fotolife; returns the `[f:id:...]` embed token.
    pub async fn upload_image(&self, path: &Path) -> Result<String, Error> {
        let bytes = std::fs::read(path)
            .map_err(|e| Error::FileNotFound(format!("{}: {e}", path.display())))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let payload = atom::build_upload_xml(
            &file_name,
            mime_for_path(path),
            &STANDARD.encode(&bytes),
        );

        let nonce: [u8; 16] = rand::random();
        let created = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let header = wsse::header(
            &self.credentials.hatena_id,
            &self.credentials.api_key,
            &nonce,
            &created,
        );

        let response = self
            .http
            .post(FOTOLIFE_ENDPOINT)
            .header(CONTENT_TYPE, "application/xml")
            .header("X-WSSE", header)
            .body(payload)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if response.status() != StatusCode::CREATED {
            return Err(api_error(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(atom::parse_upload_response(&body)?)
    }
}

impl ImageUploader for HatenaClient {
    async fn upload(&self, path: &Path) -> Result<String, Error> {
        self.upload_image(path).await
    }
}

async fn api_error(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Error::Api { status, body }
}

fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("a/b.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("x.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_endpoint_is_derived_from_credentials() {
        let client = HatenaClient::new(Credentials {
            hatena_id: "someone".to_string(),
            blog_id: "someone.hatenablog.com".to_string(),
            api_key: "key".to_string(),
        })
        .unwrap();
        assert_eq!(
            client.atom_endpoint(),
            "https://blog.hatena.ne.jp/someone/someone.hatenablog.com/atom"
        );
    }
}
