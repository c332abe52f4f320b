use crate::models::domain::{
    CompatibilityResult, FoodConditionAnalysis, HealthRecommendation, Language, Recipe,
    UserProfile,
};
use thiserror::Error;

/// Errors that can occur while talking to the generative-AI service
#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// The collaborator contract with the generative-AI service.
///
/// The session layer depends only on this trait; the production
/// implementation is [`crate::services::gemini::GeminiClient`] and tests
/// substitute a scripted mock. Malformed model output is not an error at
/// this boundary: sequence-shaped operations yield an empty sequence and
/// object-shaped operations yield `None`.
#[allow(async_fn_in_trait)]
pub trait NutritionAdvisor: Send + Sync {
    /// Generate recipes from the pantry, honoring the profile exclusions
    /// and skipping any recipe name already displayed.
    async fn generate_recipes(
        &self,
        pantry: &[String],
        profile: &UserProfile,
        excluded_names: &[String],
        language: Language,
    ) -> Result<Vec<Recipe>, AdvisorError>;

    /// Identify raw food ingredients visible in a photo.
    async fn identify_ingredients(&self, image_bytes: &[u8]) -> Result<Vec<String>, AdvisorError>;

    /// Look up synergistic and contraindicated pairings for a food.
    async fn analyze_compatibility(
        &self,
        food: &str,
        language: Language,
    ) -> Result<Option<CompatibilityResult>, AdvisorError>;

    /// Look up a condition-targeted dietary recommendation.
    async fn recovery_advice(
        &self,
        condition: &str,
        language: Language,
    ) -> Result<Option<HealthRecommendation>, AdvisorError>;

    /// Check whether a single food suits a single condition.
    async fn check_food_for_condition(
        &self,
        condition: &str,
        food: &str,
        language: Language,
    ) -> Result<Option<FoodConditionAnalysis>, AdvisorError>;
}
