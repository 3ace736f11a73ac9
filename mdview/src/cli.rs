//! Command-line interface definitions for mdview

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI structure for the mdview application
#[derive(Parser)]
#[command(name = "mdview")]
#[command(version)]
#[command(about = "Markdown document viewer", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to mdview.toml in the working directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for mdview
#[derive(Subcommand)]
pub enum Commands {
    /// Render a Markdown file into a standalone HTML document
    Render {
        /// Markdown file to render
        file: PathBuf,

        /// Output HTML file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Confine the process to the document's repository before rendering
        #[arg(long)]
        sandbox: bool,
    },

    /// Show how a link inside a document would be handled
    Resolve {
        /// Link as written in the document (e.g. ../b.md#usage)
        link: String,

        /// Document containing the link
        #[arg(long, value_name = "FILE")]
        from: PathBuf,
    },

    /// Navigate documents interactively from standard input
    Browse {
        /// Markdown file to open first
        file: PathBuf,
    },
}
