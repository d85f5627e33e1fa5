pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    init_summary, no_posts, nothing_to_change, post_created, post_deleted, post_detail, post_missing, post_updated,
    stats_heading,
};
pub use table::{posts_table, stats_table};
pub use theme::{theme, Theme};
