//! Live draft presence monitor — `atelier watch`.
//!
//! Joins a proto's draft channel and prints peers' in-progress comment rows
//! as they change, with the connection status indicator on state changes.

use anyhow::{Result, bail};
use console::style;

use atelier::api::ApiClient;
use atelier::config::Config;
use atelier::sync::{
    ConnectionState, DraftRow, DraftSession, MediaKind, SessionConfig, SessionEvent,
};

pub async fn cmd_watch(config: &Config, proto_id: i64) -> Result<()> {
    if config.user_id.is_empty() {
        bail!("No user id configured. Set ATELIER_USER_ID or user_id in atelier.toml");
    }

    let api = ApiClient::from_config(config);
    let mut handle = DraftSession::spawn(SessionConfig::from_config(config, proto_id), api);
    let mut state_rx = handle.watch_state();

    handle.connect().await?;
    println!(
        "Watching comment drafts for proto {} — press Ctrl+C to leave",
        style(proto_id).bold()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = state_rx.changed() => {
                match changed {
                    Ok(()) => print_status(*state_rx.borrow_and_update()),
                    Err(_) => break,
                }
            }
            event = handle.next_event() => {
                match event {
                    Some(event) => print_event(event),
                    None => break,
                }
            }
        }
    }

    // Intentional close (code 1000); drain until the loop confirms exit.
    let _ = handle.shutdown().await;
    while handle.next_event().await.is_some() {}
    Ok(())
}

fn print_status(state: ConnectionState) {
    let label = match state {
        ConnectionState::Connected => style(state.label()).green(),
        ConnectionState::Connecting => style(state.label()).yellow(),
        ConnectionState::Disconnected => style(state.label()).red(),
    };
    println!("[{}]", label);
}

fn print_event(event: SessionEvent) {
    match event {
        SessionEvent::RowsChanged(rows) => print_rows(&rows),
        SessionEvent::UploadFailed { kind, message, .. } => {
            println!(
                "{} {} upload failed: {}",
                style("!").red().bold(),
                kind.label(),
                message
            );
        }
    }
}

fn print_rows(rows: &[DraftRow]) {
    println!("{}", style("── draft rows ──────────────────────").dim());
    for row in rows {
        if row.is_blank() {
            continue;
        }
        let mut line = String::new();
        let author = if row.author.is_empty() {
            "(no author)"
        } else {
            row.author.as_str()
        };
        line.push_str(author);
        if !row.comment.is_empty() {
            line.push_str(&format!(" | {}", row.comment));
        }
        if !row.interpreted_comment.is_empty() {
            line.push_str(&format!(" | interpreted: {}", row.interpreted_comment));
        }
        for kind in [MediaKind::Image, MediaKind::Video] {
            let slot = row.slot(kind);
            if slot.uploading {
                line.push_str(&format!(" [{} uploading…]", kind.label()));
            } else if let Some(url) = slot.uploaded_url.as_deref() {
                line.push_str(&format!(" [{}: {}]", kind.label(), url));
            } else if slot.preview_url.is_some() {
                line.push_str(&format!(" [{} preview]", kind.label()));
            }
        }
        let marker = if row.persisted {
            style("✓").green()
        } else {
            style("✎").yellow()
        };
        println!("{} {}", marker, line);
    }
}
