use torrpeddo_api::models::{ConfigResponse, ConfigUpdateRequest, ConfigUpdatedResponse};

use crate::cli::{ConfigSetArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::render_config;

const CONFIG_PATH: &str = "/api/config";

pub(crate) async fn handle_config_get(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let url = ctx.endpoint(CONFIG_PATH)?;
    let config: ConfigResponse = ctx.send_json(CONFIG_PATH, ctx.client.get(url)).await?;
    render_config(&config, format)
}

pub(crate) async fn handle_config_set(ctx: &AppContext, args: ConfigSetArgs) -> CliResult<()> {
    let download_dir = args
        .download_dir
        .to_str()
        .ok_or_else(|| CliError::validation("download directory must be valid UTF-8"))?
        .to_string();
    let url = ctx.endpoint(CONFIG_PATH)?;
    let request = ConfigUpdateRequest {
        download_dir: Some(download_dir),
    };
    let updated: ConfigUpdatedResponse = ctx
        .send_json(CONFIG_PATH, ctx.client.post(url).json(&request))
        .await?;
    println!("Download directory set to {}", updated.download_dir);
    Ok(())
}
