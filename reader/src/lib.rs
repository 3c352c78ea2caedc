pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod page;
pub mod render;

pub use client::{ReaderBackend, ReaderClient};
pub use error::{RequestError, ValidationError};
pub use models::*;
pub use page::{Intent, PageController, SelectedFile, UiState, View};
pub use render::TerminalView;
