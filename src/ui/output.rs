//! Text rendering of command outcomes

use std::path::Path;

use owo_colors::OwoColorize;

use crate::post::{format_timestamp, Post};
use crate::ui::{theme, Icons};

/// Title, id, both timestamps, then the body
pub fn post_detail(post: &Post) {
    let t = theme();
    println!();
    println!("━ {} ━", post.title.style(t.title));
    println!("  {} {}", "id:".style(t.field), post.id);
    println!("  {} {}", "created:".style(t.field), format_timestamp(&post.created_at).style(t.timestamp));
    println!("  {} {}", "updated:".style(t.field), format_timestamp(&post.updated_at).style(t.timestamp));
    println!();
    println!("{}", post.content);
}

pub fn post_created(post: &Post) {
    println!("{} {} {}", Icons::NEW, "Created post".style(theme().done), post.id);
    post_detail(post);
}

pub fn post_updated(post: &Post) {
    println!("{} {} {}", Icons::MOD, "Updated post".style(theme().done), post.id);
    post_detail(post);
}

pub fn post_deleted(id: i64) {
    println!("{} {} {}", Icons::DEL, "Deleted post".style(theme().done), id);
}

pub fn post_missing(id: i64) {
    println!("{} {}", Icons::EMPTY, format!("No post with id {id}.").style(theme().notice));
}

pub fn no_posts() {
    println!("{} {}", Icons::EMPTY, "No posts yet.".style(theme().notice));
}

/// An edit without --title or --content
pub fn nothing_to_change() {
    eprintln!(
        "{} {}",
        Icons::WARN,
        "Nothing to change: pass --title and/or --content".style(theme().notice)
    );
}

pub fn init_summary(config_path: &Path, database: &Path) {
    let t = theme();
    println!("{} {}", Icons::ROCKET, "Initialized blog database".style(t.title));
    println!("  {} {}", "config:".style(t.field), config_path.display());
    println!("  {} {}", "database:".style(t.field), database.display());
    println!("{} {}", Icons::CHECK, "Ready".style(t.done));
}

pub fn stats_heading(database: &Path) {
    println!("{} {} ({})", Icons::STATS, "blogdb statistics".style(theme().title), database.display());
}
