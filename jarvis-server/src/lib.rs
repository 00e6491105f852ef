//! `jarvis-server` serves the Jarvis chat UI and its JSON API.
//! Questions are answered by a [`jarvis_rag::Assistant`] built once at start-up.

pub mod error;
pub mod questions;
pub mod server;

pub use error::ApiError;
pub use questions::example_questions;
pub use server::{AppState, ServerConfig, app_router, run_server};
