//! Local draft relay command — `atelier relay`.

use anyhow::Result;

use atelier::relay::{RelayConfig, start_relay};

pub async fn cmd_relay(port: u16, token: Option<String>, dev: bool) -> Result<()> {
    start_relay(RelayConfig {
        port,
        token,
        dev_mode: dev,
    })
    .await
}
