//! Presigned uploads straight to object storage.
//!
//! The file never passes through the backend: the backend signs a
//! short-lived `PUT` URL and the client sends the bytes there itself. The
//! bearer token is deliberately not forwarded to the storage host.

use reqwest::header::CONTENT_TYPE;
use tracing::{error, info};

use crate::ApiClient;
use crate::error::ApiError;
use crate::types::UploadOptions;

const SSE_HEADER: &str = "x-amz-server-side-encryption";

impl ApiClient {
    /// Upload `bytes` under `key`: presign, then `PUT` to the returned URL.
    ///
    /// Returns the object key the backend assigned (the requested key when
    /// the presign response does not echo one).
    ///
    /// # Errors
    ///
    /// Returns any presign error, or `ApiError::Upload` with the storage
    /// endpoint's status and body when the `PUT` is rejected.
    pub async fn upload(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
        options: UploadOptions,
    ) -> Result<String, ApiError> {
        let target = self.presign(key, content_type).await?;
        let size = bytes.len();

        let mut req = self
            .http()
            .put(&target.url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes);
        if options.server_side_encryption {
            req = req.header(SSE_HEADER, "AES256");
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(status = status.as_u16(), key = %key, "presigned upload rejected");
            return Err(ApiError::Upload {
                status: status.as_u16(),
                body,
            });
        }

        let stored = target.key.unwrap_or_else(|| key.to_owned());
        info!(key = %stored, bytes = size, "upload complete");
        Ok(stored)
    }
}
