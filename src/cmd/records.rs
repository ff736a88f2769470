//! Read-only listing commands over the tracker API — `atelier cycles`,
//! `atelier comments`.

use anyhow::Result;
use console::style;

use atelier::api::ApiClient;
use atelier::api::records::PageQuery;
use atelier::config::Config;

pub async fn cmd_cycles(config: &Config) -> Result<()> {
    let api = ApiClient::from_config(config);
    let page = api.list_cycles(PageQuery::default()).await?;

    if page.items.is_empty() {
        println!("No development cycles found");
        return Ok(());
    }
    println!(
        "{}",
        style(format!(
            "{:<6} {:<28} {:<10} {}",
            "ID", "NAME", "SEASON", "STATUS"
        ))
        .bold()
    );
    for cycle in &page.items {
        println!(
            "{:<6} {:<28} {:<10} {}",
            cycle.id,
            cycle.name,
            cycle.season,
            cycle.status.as_str()
        );
    }
    println!("page {} · {} total", page.page, page.total);
    Ok(())
}

pub async fn cmd_comments(config: &Config, proto_id: i64) -> Result<()> {
    let api = ApiClient::from_config(config);
    let comments = api.list_comments(proto_id).await?;

    if comments.is_empty() {
        println!("No comments on proto {}", proto_id);
        return Ok(());
    }
    for comment in &comments {
        let mut line = format!("{} — {}", style(&comment.author).bold(), comment.comment);
        if !comment.interpreted_comment.is_empty() {
            line.push_str(&format!(" (interpreted: {})", comment.interpreted_comment));
        }
        if comment.image_url.is_some() {
            line.push_str(" [photo]");
        }
        if comment.video_url.is_some() {
            line.push_str(" [video]");
        }
        println!("{}", line);
    }
    Ok(())
}
