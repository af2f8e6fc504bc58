//! services/api/src/adapters/media.rs
//!
//! Object-storage implementation of the `MediaStore` port. Uploaded
//! images (student photos, event posters) are PUT to an S3-compatible
//! bucket endpoint; the returned URL is what gets persisted.

use async_trait::async_trait;

use placement_core::ports::{MediaStore, PortError, PortResult};

/// An adapter that implements the `MediaStore` port against a bucket
/// exposed over HTTP.
#[derive(Clone)]
pub struct BucketMediaStore {
    client: reqwest::Client,
    bucket_url: String,
}

impl BucketMediaStore {
    pub fn new(bucket_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            bucket_url: bucket_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MediaStore for BucketMediaStore {
    async fn store_image(&self, key: &str, content_type: &str, data: &[u8]) -> PortResult<String> {
        let url = format!("{}/{}", self.bucket_url, key);
        self.client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("media upload failed: {}", e)))?
            .error_for_status()
            .map_err(|e| PortError::Unexpected(format!("media upload rejected: {}", e)))?;
        Ok(url)
    }
}
