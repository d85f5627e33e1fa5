use tabled::{settings::Style, Table, Tabled};

use crate::post::{format_timestamp, Post};

/// Longest title shown in a listing before it is cut
const TITLE_WIDTH: usize = 40;

#[derive(Tabled)]
pub struct PostRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Created")]
    pub created_at: String,
    #[tabled(rename = "Updated")]
    pub updated_at: String,
}

impl From<&Post> for PostRow {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            title: truncate(&post.title, TITLE_WIDTH),
            created_at: format_timestamp(&post.created_at),
            updated_at: format_timestamp(&post.updated_at),
        }
    }
}

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub fn posts_table(posts: &[Post]) -> String {
    if posts.is_empty() {
        return String::new();
    }

    let rows: Vec<PostRow> = posts.iter().map(PostRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    if stats.is_empty() {
        return String::new();
    }

    let rows: Vec<TableRow> = stats
        .iter()
        .map(|(label, value)| TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
