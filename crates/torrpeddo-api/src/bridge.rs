//! Line-delimited JSON command front-end.
//!
//! Each input line is `{"id": .., "command": "..", "args": {..}}`. Each reply is one line,
//! `{"id": .., "data": ..}` on success or `{"id": .., "error": ".."}` otherwise. Lines that
//! are not JSON are answered with `"id": null`; any other malformed request keeps its `id`.
//! The loop ends at end of input.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use torrpeddo_core::{TransferError, TransferId, TransferResult};

use crate::error::{ApiServerError, ApiServerResult};
use crate::state::{TransferHandles, parse_identifier};

#[derive(Debug, Deserialize)]
struct BridgeRequest {
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    args: Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct BridgeReply {
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl BridgeReply {
    fn from_result(id: Value, result: Result<Value, String>) -> Self {
        match result {
            Ok(data) => Self {
                id,
                data: Some(data),
                error: None,
            },
            Err(error) => Self {
                id,
                data: None,
                error: Some(error),
            },
        }
    }
}

/// Serve the command protocol on the process's stdin and stdout.
///
/// # Errors
///
/// Returns [`ApiServerError::Bridge`] when stdin or stdout fails.
pub async fn serve_stdio(transfers: TransferHandles) -> ApiServerResult<()> {
    serve_lines(
        &transfers,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}

/// Answer every request line from `reader` on `writer` until end of input.
///
/// # Errors
///
/// Returns [`ApiServerError::Bridge`] when reading or writing the stream fails.
pub async fn serve_lines<R, W>(
    transfers: &TransferHandles,
    reader: R,
    mut writer: W,
) -> ApiServerResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.map_err(bridge_error)? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = answer(transfers, &line).await;
        let mut encoded = serde_json::to_vec(&reply)
            .map_err(|err| bridge_error(io::Error::other(err)))?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await.map_err(bridge_error)?;
        writer.flush().await.map_err(bridge_error)?;
    }
    info!("command stream closed");
    Ok(())
}

async fn answer(transfers: &TransferHandles, line: &str) -> BridgeReply {
    let mut document: Value = match serde_json::from_str(line) {
        Ok(document) => document,
        Err(err) => {
            warn!(error = %err, "unparseable command line");
            return BridgeReply::from_result(Value::Null, Err(format!("invalid request: {err}")));
        }
    };
    let id = document
        .as_object_mut()
        .and_then(|fields| fields.remove("id"))
        .unwrap_or(Value::Null);
    let request: BridgeRequest = match serde_json::from_value(document) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "malformed command");
            return BridgeReply::from_result(id, Err(format!("invalid request: {err}")));
        }
    };
    let command = request.command.unwrap_or_default();
    debug!(%command, "bridge command");
    let result = dispatch(transfers, &command, &request.args).await;
    if let Err(error) = &result {
        warn!(%command, %error, "bridge command failed");
    }
    BridgeReply::from_result(id, result)
}

async fn dispatch(
    transfers: &TransferHandles,
    command: &str,
    args: &Map<String, Value>,
) -> Result<Value, String> {
    let workflow = transfers.workflow();
    match command {
        "get_status" => serde_json::to_value(transfers.inspector().list_status().await)
            .map_err(|err| err.to_string()),
        "get_config" => {
            let directory = transfers.inspector().directory().await;
            Ok(json!({ "download_dir": directory.display().to_string() }))
        }
        "set_config" => {
            let success = match string_arg(args, "download_dir") {
                Some(dir) => workflow.set_directory(&PathBuf::from(dir)).await.is_ok(),
                None => false,
            };
            Ok(json!({ "success": success }))
        }
        "add_magnet" => {
            let uri = string_arg(args, "magnet_url").ok_or("No magnet URL provided")?;
            let id = workflow.add_magnet(uri).await.map_err(describe)?;
            Ok(added(id))
        }
        "add_torrent_file" => {
            let path = string_arg(args, "filepath").ok_or("No file path provided")?;
            let payload = match tokio::fs::read(path).await {
                Ok(payload) => payload,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    return Ok(json!({ "success": false, "error": "File not found" }));
                }
                Err(err) => return Err(format!("could not read {path}: {err}")),
            };
            let id = workflow.add_metainfo(&payload).await.map_err(describe)?;
            Ok(added(id))
        }
        "remove_torrent" => Ok(outcome(with_id(args, |id| workflow.remove(id)).await)),
        "delete_torrent_and_files" => Ok(outcome(
            with_id(args, |id| workflow.delete_with_files(id)).await,
        )),
        "pause_torrent" => Ok(outcome(with_id(args, |id| workflow.pause(id)).await)),
        "resume_torrent" => Ok(outcome(with_id(args, |id| workflow.resume(id)).await)),
        "cancel_torrent" => Ok(outcome(with_id(args, |id| workflow.cancel(id)).await)),
        "open_folder" => {
            let result = match identifier(args) {
                Ok(id) => workflow.open_folder(id).await,
                Err(err) => Err(err),
            };
            Ok(match result {
                Ok(folder) => json!({ "success": true, "message": folder.display().to_string() }),
                Err(err) => json!({ "success": false, "message": describe(err) }),
            })
        }
        "" => Err("Unknown command".to_string()),
        other => Err(format!("Unknown command: {other}")),
    }
}

/// Run a lifecycle call for the `info_hash` argument. Unparseable identifiers are unknown.
async fn with_id<F, Fut>(args: &Map<String, Value>, call: F) -> TransferResult<()>
where
    F: FnOnce(TransferId) -> Fut,
    Fut: Future<Output = TransferResult<()>>,
{
    call(identifier(args)?).await
}

fn identifier(args: &Map<String, Value>) -> TransferResult<TransferId> {
    string_arg(args, "info_hash")
        .and_then(parse_identifier)
        .ok_or_else(|| TransferError::NotFound {
            id: TransferId::from_bytes([0; 20]),
        })
}

fn outcome(result: TransferResult<()>) -> Value {
    let success = match result {
        Ok(()) => true,
        Err(err) => {
            debug!(error = %err, "lifecycle command rejected");
            false
        }
    };
    json!({ "success": success })
}

fn added(id: TransferId) -> Value {
    json!({ "success": true, "info_hash": id.to_hex() })
}

fn describe(err: TransferError) -> String {
    match err {
        TransferError::MalformedDescriptor { input, reason } => {
            format!("malformed {input}: {reason}")
        }
        TransferError::PathMissing { path } => format!("Path does not exist: {}", path.display()),
        TransferError::LauncherUnavailable { launcher } => {
            format!("{launcher} not found on this system")
        }
        other => other.to_string(),
    }
}

fn string_arg<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}

const fn bridge_error(source: io::Error) -> ApiServerError {
    ApiServerError::Bridge { source }
}
