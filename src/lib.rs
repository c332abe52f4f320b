// NutriSage - Pantry-driven nutrition assistant
//
// This is the library crate containing the core business logic and data
// structures. The binary crate (main.rs) provides the interactive entry
// point.

pub mod config;
pub mod logging;
pub mod models;
pub mod services;
pub mod session;
pub mod state;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{Language, Recipe, SessionState, UserConfig, UserProfile, View};
pub use services::{AdvisorError, GeminiClient, NutritionAdvisor};
pub use session::SessionController;
pub use state::{SessionManager, StateChange};
pub use storage::Store;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
