//! TUI components for droidscope
//!
//! This crate provides the terminal user interface for the log viewer,
//! including state management, keybindings, event handling, and UI
//! components.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState, PromptKind, TailStatus, UiState};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::HelpOverlay;
pub use ui::screens::LogViewerScreen;
pub use ui::Theme;
