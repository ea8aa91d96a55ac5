use std::path::Path;

use anyhow::anyhow;
use base64::{Engine as _, engine::general_purpose};
use torrpeddo_api::models::{
    AddMagnetRequest, AddedResponse, HealthResponse, OpenFolderRequest, OpenFolderResponse,
    SuccessResponse, UploadMetainfoRequest,
};
use torrpeddo_core::{StatusRecord, TransferId};

use crate::cli::{AddArgs, OutputFormat, TransferArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_health, render_status_list};

/// Per-transfer actions exposed by the HTTP front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransferAction {
    Pause,
    Resume,
    Cancel,
    Remove,
    Delete,
}

impl TransferAction {
    const fn route(self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Cancel => "cancel",
            Self::Remove => "remove",
            Self::Delete => "delete",
        }
    }

    const fn uses_delete_method(self) -> bool {
        matches!(self, Self::Remove | Self::Delete)
    }

    const fn past_tense(self) -> &'static str {
        match self {
            Self::Pause => "paused",
            Self::Resume => "resumed",
            Self::Cancel => "cancelled",
            Self::Remove => "removed",
            Self::Delete => "removed; data deletion scheduled",
        }
    }
}

pub(crate) async fn handle_status(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let path = "/api/status";
    let url = ctx.endpoint(path)?;
    let records: Vec<StatusRecord> = ctx.send_json(path, ctx.client.get(url)).await?;
    render_status_list(&records, format)
}

pub(crate) async fn handle_health(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let path = "/health";
    let url = ctx.endpoint(path)?;
    let health: HealthResponse = ctx.send_json(path, ctx.client.get(url)).await?;
    render_health(&health, format)
}

pub(crate) async fn handle_add(ctx: &AppContext, args: AddArgs) -> CliResult<()> {
    let source = args.source.trim();
    if source.is_empty() {
        return Err(CliError::validation("source must not be empty"));
    }

    let added: AddedResponse = if source.starts_with("magnet:") {
        let path = "/api/add-magnet";
        let url = ctx.endpoint(path)?;
        let request = AddMagnetRequest {
            magnet_url: Some(source.to_string()),
        };
        ctx.send_json(path, ctx.client.post(url).json(&request))
            .await?
    } else {
        let file = Path::new(source);
        let bytes = std::fs::read(file).map_err(|err| {
            CliError::failure(anyhow!(
                "failed to read torrent file '{}': {err}",
                file.display()
            ))
        })?;
        let path = "/api/upload-torrent";
        let url = ctx.endpoint(path)?;
        let request = UploadMetainfoRequest {
            metainfo: Some(general_purpose::STANDARD.encode(&bytes)),
        };
        ctx.send_json(path, ctx.client.post(url).json(&request))
            .await?
    };
    println!("Transfer added (info_hash: {})", added.info_hash);
    Ok(())
}

pub(crate) async fn handle_transfer_action(
    ctx: &AppContext,
    action: TransferAction,
    args: TransferArgs,
) -> CliResult<()> {
    let id = parse_id(&args.info_hash)?;
    let path = format!("/api/{}/{id}", action.route());
    let url = ctx.endpoint(&path)?;
    let request = if action.uses_delete_method() {
        ctx.client.delete(url)
    } else {
        ctx.client.post(url)
    };
    let response: SuccessResponse = ctx.send_json(&path, request).await?;
    if !response.success {
        return Err(CliError::failure(anyhow!("server did not apply {}", action.route())));
    }
    println!("Transfer {} ({id})", action.past_tense());
    Ok(())
}

pub(crate) async fn handle_open_folder(ctx: &AppContext, args: TransferArgs) -> CliResult<()> {
    let id = parse_id(&args.info_hash)?;
    let path = "/api/open-folder";
    let url = ctx.endpoint(path)?;
    let request = OpenFolderRequest {
        info_hash: Some(id.to_hex()),
    };
    let opened: OpenFolderResponse = ctx
        .send_json(path, ctx.client.post(url).json(&request))
        .await?;
    println!("Opened {}", opened.path);
    Ok(())
}

fn parse_id(raw: &str) -> CliResult<TransferId> {
    raw.trim()
        .parse()
        .map_err(|_| CliError::validation("info hash must be 40 hexadecimal characters"))
}
