use std::path::PathBuf;

use image::ImageFormat;
use serde::{Deserialize, Serialize};

use crate::models::{DataUriError, EncodedImage};

/// A user-selected file, as the webview hands it over.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ImageSource {
    /// Read by the file input or the camera-input element.
    Picked {
        #[serde(rename = "fileName")]
        file_name: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
        #[serde(rename = "dataUri")]
        data_uri: String,
    },
    /// Dropped onto the window.
    Path { path: PathBuf },
}

#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("'{0}' is not an image type")]
    InvalidType(String),
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    DataUri(#[from] DataUriError),
    #[error("file is empty")]
    Empty,
    #[error("decode task failed: {0}")]
    Task(String),
}

impl ImageSource {
    pub fn display_name(&self) -> String {
        match self {
            ImageSource::Picked { file_name, .. } => file_name.clone(),
            ImageSource::Path { path } => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }

    /// Declared type for picked files; derived from the extension for paths.
    pub fn mime_type(&self) -> Option<String> {
        match self {
            ImageSource::Picked { mime_type, .. } => {
                Some(mime_type.trim().to_ascii_lowercase()).filter(|mime| !mime.is_empty())
            }
            ImageSource::Path { path } => ImageFormat::from_path(path)
                .ok()
                .map(|format| format.to_mime_type().to_string()),
        }
    }

    /// Returns the image MIME type, or the offending type when it is not one.
    pub fn validate(&self) -> Result<String, AcquireError> {
        match self.mime_type() {
            Some(mime) if mime.starts_with("image/") => Ok(mime),
            Some(mime) => Err(AcquireError::InvalidType(mime)),
            None => Err(AcquireError::InvalidType("unknown".into())),
        }
    }

    /// Buffers the whole file. Call [`ImageSource::validate`] first.
    pub async fn load(&self, mime_type: &str) -> Result<EncodedImage, AcquireError> {
        let bytes: Vec<u8> = match self {
            ImageSource::Picked { data_uri, .. } => {
                let data_uri = data_uri.clone();
                let decoded = tokio::task::spawn_blocking(move || EncodedImage::from_data_uri(&data_uri))
                    .await
                    .map_err(|err| AcquireError::Task(err.to_string()))??;
                decoded.bytes().to_vec()
            }
            ImageSource::Path { path } => {
                tokio::fs::read(path).await.map_err(|source| AcquireError::Read {
                    path: path.clone(),
                    source,
                })?
            }
        };

        if bytes.is_empty() {
            return Err(AcquireError::Empty);
        }
        Ok(EncodedImage::new(mime_type, bytes))
    }
}
