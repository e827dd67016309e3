//! Upload service seam and interpretation of the CDN's JSON reply.

use std::future::Future;

use serde::Deserialize;

use crate::error::UploadError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub url: String,
    pub public_id: Option<String>,
}

/// Sends a locally picked file to the image CDN.
pub trait UploadService {
    fn upload(
        &self,
        local_uri: &str,
        folder: &str,
    ) -> impl Future<Output = Result<UploadedImage, UploadError>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub secure_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, alias = "publicId")]
    pub public_id: Option<String>,
    #[serde(default)]
    pub error: Option<RemoteError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RemoteError {
    #[serde(default)]
    pub message: String,
}

impl UploadResponse {
    pub fn parse(body: &str) -> Result<Self, UploadError> {
        serde_json::from_str(body).map_err(|err| UploadError::InvalidResponse(err.to_string()))
    }

    /// A reply counts as success only without an `error` and with a
    /// non-empty `secure_url` (preferred) or `url`.
    pub fn into_uploaded(self) -> Result<UploadedImage, UploadError> {
        if let Some(error) = self.error {
            tracing::debug!(target: "vayal::upload", message = %error.message, "upload rejected");
            return Err(UploadError::Rejected(error.message));
        }

        let url = self
            .secure_url
            .filter(|url| !url.trim().is_empty())
            .or(self.url.filter(|url| !url.trim().is_empty()))
            .ok_or(UploadError::MissingUrl)?;

        Ok(UploadedImage {
            url,
            public_id: self.public_id.filter(|id| !id.is_empty()),
        })
    }
}

pub fn interpret_response(body: &str) -> Result<UploadedImage, UploadError> {
    UploadResponse::parse(body)?.into_uploaded()
}
