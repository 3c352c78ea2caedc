use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

/// Terminal front end for a PDF reader server.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the reader server
    #[arg(short, long, env = "READER_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    pub server: String,

    /// PDF file to select on start
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}
