use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "blogdesk", version, about = "Read and publish articles on a blog store")]
pub struct Cli {
    /// Article store base URL. Defaults to `BLOGDESK_API_BASE` or
    /// `http://localhost:3001`.
    #[arg(long, global = true)]
    pub api_base: Option<String>,
    /// HTTP timeout in seconds. Defaults to `BLOGDESK_HTTP_TIMEOUT_SECONDS`
    /// or 30.
    #[arg(long, global = true)]
    pub timeout_seconds: Option<u64>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// GET /blogs
    List {
        /// Print the collection as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show one article; the first one when no id is given.
    Read {
        /// Article id.
        id: Option<u64>,
        /// Print the article as JSON.
        #[arg(long)]
        json: bool,
    },
    /// POST /blogs
    Create {
        /// Article title.
        #[arg(long)]
        title: String,
        /// Brief description shown in the list.
        #[arg(long)]
        description: String,
        /// Comma-separated categories, e.g. "FINANCE, TECH".
        #[arg(long)]
        category: String,
        /// Cover image URL.
        #[arg(long)]
        cover_image: String,
        /// Article body; paragraphs separated by a blank line.
        #[arg(long, conflicts_with = "content_file")]
        content: Option<String>,
        /// Read the article body from a file.
        #[arg(long)]
        content_file: Option<PathBuf>,
        /// Print the created article as JSON.
        #[arg(long)]
        json: bool,
    },
}
