//! Services module - Collaborator contract with the generative-AI service.
//!
//! This module contains the advisor seam and its production implementation.
//! The services are **framework-agnostic** and have no dependencies on the
//! session or presentation layers, making them testable and reusable.
//!
//! # Components
//!
//! - [`NutritionAdvisor`]: The logical operations the application needs from
//!   the external service: recipe generation, ingredient identification,
//!   compatibility analysis, recovery advice and per-food condition checks.
//!
//! - [`GeminiClient`]: Implementation against the Google Generative
//!   Language REST API. Handles:
//!   - Prompt construction (exclusion clauses, profile constraints,
//!     language instructions)
//!   - JSON response parsing with markdown-fence stripping
//!   - Parallel per-recipe image generation (fan-out, tolerant of
//!     individual failures)
//!
//! # Design Philosophy
//!
//! - **Lenient at the edge**: malformed model output degrades to an empty
//!   sequence or `None`, never an error
//! - **Async**: all operations use tokio for non-blocking I/O
//! - **Testable**: the session layer is generic over [`NutritionAdvisor`],
//!   so tests substitute a scripted mock

pub mod advisor;
pub mod gemini;

pub use advisor::{AdvisorError, NutritionAdvisor};
pub use gemini::GeminiClient;
