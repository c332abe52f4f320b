//! Data model module
//!
//! Contains the domain types shared across the application:
//! - [`domain`]: recipes, nutrition, compatibility and recovery shapes
//! - [`app_state`]: the session state owned by the state manager
//! - [`config`]: YAML settings shapes

pub mod app_state;
pub mod config;
pub mod domain;

pub use app_state::{
    MAX_COVER_IMAGE_BYTES, MAX_SCAN_IMAGE_BYTES, QueryState, SessionState, View,
};
pub use config::{NutriSettings, UserConfig};
pub use domain::{
    BeneficialPairing, CompatibilityResult, FoodAdvice, FoodConditionAnalysis, FoodStatus,
    HarmfulPairing, HealthRecommendation, Language, MacroNutrients, MicroNutrient, Recipe,
    SafetyCheck, Severity, UserProfile,
};
