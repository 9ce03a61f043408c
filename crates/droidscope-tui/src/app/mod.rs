//! Application state and actions

mod action;
mod state;

pub use action::{Action, PromptKind};
pub use state::{AppState, FilterCache, TailStatus, UiState};
