//! Media upload command — `atelier upload`.

use std::path::PathBuf;

use anyhow::{Result, bail};
use console::style;

use atelier::api::{ApiClient, validate};
use atelier::config::Config;
use atelier::sync::MediaKind;

pub async fn cmd_upload(config: &Config, file: PathBuf, kind: &str) -> Result<()> {
    let kind: MediaKind = match kind.parse() {
        Ok(kind) => kind,
        Err(message) => bail!("{}", message),
    };
    let size = validate::check_media_size(&file, kind)?;
    println!("Uploading {} ({} bytes)...", file.display(), size);

    let api = ApiClient::from_config(config);
    let media = api.upload_media(&file, kind).await?;
    println!("{} {}", style("Uploaded:").green().bold(), media.url);
    Ok(())
}
