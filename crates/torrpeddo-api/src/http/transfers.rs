//! Transfer and configuration handlers.
//!
//! Handlers are thin: parse the body, call the coordinator, map the result to a wire shape.
//! Identifiers that do not parse are answered exactly like unknown identifiers.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path as AxumPath, State},
};
use base64::{Engine as _, engine::general_purpose};
use torrpeddo_core::{StatusRecord, TransferId};
use tracing::info;

use crate::http::constants::MAX_METAINFO_BYTES;
use crate::http::errors::ApiError;
use crate::models::{
    AddMagnetRequest, AddedResponse, ConfigResponse, ConfigUpdateRequest, ConfigUpdatedResponse,
    OpenFolderRequest, OpenFolderResponse, SuccessResponse, UploadMetainfoRequest,
};
use crate::state::{ApiState, parse_identifier};

pub(crate) async fn list_status(State(state): State<Arc<ApiState>>) -> Json<Vec<StatusRecord>> {
    Json(state.transfers.inspector().list_status().await)
}

pub(crate) async fn add_magnet(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<AddMagnetRequest>,
) -> Result<Json<AddedResponse>, ApiError> {
    let uri = request
        .magnet_url
        .filter(|uri| !uri.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("No magnet URL provided"))?;
    let id = state.transfers.workflow().add_magnet(&uri).await?;
    info!(transfer_id = %id, "magnet accepted");
    Ok(Json(added(id)))
}

pub(crate) async fn upload_metainfo(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<UploadMetainfoRequest>,
) -> Result<Json<AddedResponse>, ApiError> {
    let encoded = request
        .metainfo
        .filter(|payload| !payload.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("No metainfo provided"))?;
    let payload = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| ApiError::bad_request("metainfo must be base64"))?;
    if payload.len() > MAX_METAINFO_BYTES {
        return Err(ApiError::bad_request(format!(
            "metainfo exceeds {MAX_METAINFO_BYTES} bytes"
        )));
    }
    let id = state.transfers.workflow().add_metainfo(&payload).await?;
    info!(transfer_id = %id, bytes = payload.len(), "metainfo accepted");
    Ok(Json(added(id)))
}

pub(crate) async fn get_config(State(state): State<Arc<ApiState>>) -> Json<ConfigResponse> {
    let directory = state.transfers.inspector().directory().await;
    Json(ConfigResponse {
        download_dir: directory.display().to_string(),
    })
}

pub(crate) async fn set_config(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ConfigUpdateRequest>,
) -> Result<Json<ConfigUpdatedResponse>, ApiError> {
    let directory = request
        .download_dir
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| ApiError::bad_request("Invalid directory"))?;
    state.transfers.workflow().set_directory(&directory).await?;
    Ok(Json(ConfigUpdatedResponse {
        success: true,
        download_dir: directory.display().to_string(),
    }))
}

pub(crate) async fn remove_transfer(
    State(state): State<Arc<ApiState>>,
    AxumPath(info_hash): AxumPath<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id = known_identifier(&info_hash)?;
    state.transfers.workflow().remove(id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub(crate) async fn delete_transfer(
    State(state): State<Arc<ApiState>>,
    AxumPath(info_hash): AxumPath<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id = known_identifier(&info_hash)?;
    state.transfers.workflow().delete_with_files(id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub(crate) async fn pause_transfer(
    State(state): State<Arc<ApiState>>,
    AxumPath(info_hash): AxumPath<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id = known_identifier(&info_hash)?;
    state.transfers.workflow().pause(id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub(crate) async fn resume_transfer(
    State(state): State<Arc<ApiState>>,
    AxumPath(info_hash): AxumPath<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id = known_identifier(&info_hash)?;
    state.transfers.workflow().resume(id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub(crate) async fn cancel_transfer(
    State(state): State<Arc<ApiState>>,
    AxumPath(info_hash): AxumPath<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id = known_identifier(&info_hash)?;
    state.transfers.workflow().cancel(id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub(crate) async fn open_folder(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<OpenFolderRequest>,
) -> Result<Json<OpenFolderResponse>, ApiError> {
    let raw = request
        .info_hash
        .ok_or_else(|| ApiError::bad_request("No info_hash provided"))?;
    let id = known_identifier(&raw)?;
    let folder = state.transfers.workflow().open_folder(id).await?;
    Ok(Json(OpenFolderResponse {
        success: true,
        path: folder.display().to_string(),
    }))
}

fn known_identifier(raw: &str) -> Result<TransferId, ApiError> {
    parse_identifier(raw).ok_or_else(|| ApiError::not_found("transfer not found"))
}

fn added(id: TransferId) -> AddedResponse {
    AddedResponse {
        success: true,
        info_hash: id.to_hex(),
    }
}
