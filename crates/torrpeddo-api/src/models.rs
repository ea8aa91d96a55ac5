//! Request and response bodies for the HTTP API.

use serde::{Deserialize, Serialize};

/// RFC 9457 problem document returned for every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    /// Problem type URI.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short human-readable summary.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Occurrence-specific explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// `POST /api/add-magnet` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddMagnetRequest {
    /// Magnet URI.
    #[serde(default)]
    pub magnet_url: Option<String>,
}

/// `POST /api/upload-torrent` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadMetainfoRequest {
    /// Base64-encoded metainfo document.
    #[serde(default)]
    pub metainfo: Option<String>,
}

/// `POST /api/config` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigUpdateRequest {
    /// New default save directory.
    #[serde(default)]
    pub download_dir: Option<String>,
}

/// `POST /api/open-folder` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenFolderRequest {
    /// Transfer identifier.
    #[serde(default)]
    pub info_hash: Option<String>,
}

/// Response for successful additions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddedResponse {
    /// Always `true`.
    pub success: bool,
    /// Identifier of the added (or already tracked) transfer.
    pub info_hash: String,
}

/// Generic acknowledgement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuccessResponse {
    /// Whether the operation took effect.
    pub success: bool,
}

/// Current configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigResponse {
    /// Default save directory.
    pub download_dir: String,
}

/// Response to a configuration update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigUpdatedResponse {
    /// Always `true`.
    pub success: bool,
    /// Directory now in effect.
    pub download_dir: String,
}

/// Response to an open-folder request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpenFolderResponse {
    /// Always `true`.
    pub success: bool,
    /// Folder handed to the desktop launcher.
    pub path: String,
}

/// Liveness payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// `ok` while the process serves requests.
    pub status: String,
    /// Build revision.
    pub build: String,
    /// Transfers currently tracked.
    pub tracked_transfers: i64,
    /// Registrations the engine refused since start.
    pub registration_failures_total: u64,
}
