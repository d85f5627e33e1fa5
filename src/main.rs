//! blogdb CLI - manage the posts of a blog database

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use blogdb::config::{BlogConfig, DEFAULT_CONFIG_FILE};
use blogdb::ui;
use blogdb::{Engine, NewPost, Post, PostChanges};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "blogdb")]
#[command(version)]
#[command(about = "Blog post storage backed by a local SQLite file")]
#[command(long_about = r#"
blogdb owns the posts table of a blog application:
  • One SQLite file (blog.db in the working directory by default)
  • Store-managed ids and created/updated timestamps
  • Every command runs in its own session and commits explicitly

Example usage:
  blogdb init
  blogdb create --title "Hello" --content "World"
  blogdb edit --id 1 --title "Hello2"
  blogdb list --format json
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Trace every SQL statement (shown with --verbose)
    #[arg(long, global = true)]
    echo: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file and create the database
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Create a post
    Create {
        #[arg(short, long)]
        title: String,

        #[arg(long)]
        content: String,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a single post
    Show {
        #[arg(short, long)]
        id: i64,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Change the title and/or content of a post
    Edit {
        #[arg(short, long)]
        id: i64,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a post
    Delete {
        #[arg(short, long)]
        id: i64,
    },

    /// List all posts
    List {
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show statistics about the database
    Stats {
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = BlogConfig::load(cli.config.as_deref())?.with_overrides(cli.database.as_deref(), cli.echo);

    match cli.command {
        Commands::Init { force } => run_init(cli.config, &config, force)?,

        Commands::Create { title, content, format } => {
            let engine = open_engine(&config)?;
            let post = engine.with_session(|session| -> anyhow::Result<Post> {
                let post = session.create(&NewPost::new(title, content))?;
                session.commit()?;
                Ok(post)
            })?;

            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&post)?);
            } else {
                ui::post_created(&post);
            }
        }

        Commands::Show { id, format } => {
            let engine = open_engine(&config)?;
            let post = engine.with_session(|session| session.get(id))?;

            match (post, format) {
                (Some(post), OutputFormat::Json) => println!("{}", serde_json::to_string_pretty(&post)?),
                (None, OutputFormat::Json) => println!("null"),
                (Some(post), OutputFormat::Text) => ui::post_detail(&post),
                (None, OutputFormat::Text) => ui::post_missing(id),
            }
        }

        Commands::Edit { id, title, content, format } => {
            let changes = PostChanges { title, content };
            if changes.is_empty() {
                ui::nothing_to_change();
                return Ok(());
            }

            let engine = open_engine(&config)?;

            let post = engine.with_session(|session| -> anyhow::Result<Option<Post>> {
                let post = session.update(id, &changes)?;
                session.commit()?;
                Ok(post)
            })?;

            match (post, format) {
                (Some(post), OutputFormat::Json) => println!("{}", serde_json::to_string_pretty(&post)?),
                (None, OutputFormat::Json) => println!("null"),
                (Some(post), OutputFormat::Text) => ui::post_updated(&post),
                (None, OutputFormat::Text) => ui::post_missing(id),
            }
        }

        Commands::Delete { id } => {
            let engine = open_engine(&config)?;
            let removed = engine.with_session(|session| -> anyhow::Result<bool> {
                let removed = session.delete(id)?;
                session.commit()?;
                Ok(removed)
            })?;

            if removed {
                ui::post_deleted(id);
            } else {
                ui::post_missing(id);
            }
        }

        Commands::List { format } => {
            let engine = open_engine(&config)?;
            let posts = engine.with_session(|session| session.list())?;

            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&posts)?);
            } else if posts.is_empty() {
                ui::no_posts();
            } else {
                println!("{}", ui::posts_table(&posts));
            }
        }

        Commands::Stats { format } => {
            let engine = open_engine(&config)?;
            let posts = engine.with_session(|session| session.count())?;
            let size = std::fs::metadata(engine.path())
                .with_context(|| format!("cannot stat database {}", engine.path().display()))?
                .len();

            if format == OutputFormat::Json {
                let data = serde_json::json!({
                    "database": engine.path().display().to_string(),
                    "posts": posts,
                    "size_bytes": size,
                });
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                let posts = posts.to_string();
                let size = format!("{} bytes", size);
                ui::stats_heading(engine.path());
                println!(
                    "{}",
                    ui::stats_table(&[("Posts", posts.as_str()), ("File size", size.as_str())])
                );
            }
        }
    }

    Ok(())
}

fn run_init(config_path: Option<PathBuf>, config: &BlogConfig, force: bool) -> anyhow::Result<()> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    config.save(&config_path, force)?;
    let engine = open_engine(config)?;

    ui::init_summary(&config_path, engine.path());
    Ok(())
}

/// A store that cannot be opened is fatal for every command
fn open_engine(config: &BlogConfig) -> anyhow::Result<Engine> {
    Engine::open(config.storage())
        .with_context(|| format!("cannot open database {}", config.database))
}
