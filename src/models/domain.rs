use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Severity of a food-compatibility conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

/// Suitability verdict for a specific food under a specific condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoodStatus {
    Recommended,
    Safe,
    Caution,
    Avoid,
}

impl fmt::Display for FoodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoodStatus::Recommended => write!(f, "Recommended"),
            FoodStatus::Safe => write!(f, "Safe"),
            FoodStatus::Caution => write!(f, "Caution"),
            FoodStatus::Avoid => write!(f, "Avoid"),
        }
    }
}

/// Active display language for all generated content.
///
/// Changing the language re-issues every visible query so that displayed
/// content is regenerated in the new language (see
/// [`crate::session::SessionController::set_language`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }

    /// Instruction appended to every prompt so the model answers in the
    /// active language.
    pub fn response_instruction(&self) -> &'static str {
        match self {
            Language::En => "Respond in English.",
            Language::Zh => "Respond in Simplified Chinese (zh-CN).",
        }
    }
}

/// Estimated macronutrients per serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MacroNutrients {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

/// A single micronutrient estimate with its daily-value percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicroNutrient {
    pub name: String,
    pub amount: String,
    /// Daily Value percentage
    pub dv: f64,
}

/// Biochemical interaction check across a recipe's combined ingredients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SafetyCheck {
    pub has_conflict: bool,
    #[serde(default)]
    pub conflicting_ingredients: Vec<String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub scientific_explanation: String,
    #[serde(default)]
    pub severity: Severity,
}

/// A recipe, either generated by the advisor or authored by the user.
///
/// Generated recipes live only in transient session state unless the user
/// saves them into the cookbook; user-created recipes are persisted
/// immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub description: String,
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub missing_ingredients: Vec<String>,
    pub instructions: Vec<String>,
    #[serde(default)]
    pub macros: MacroNutrients,
    #[serde(default)]
    pub micros: Vec<MicroNutrient>,
    #[serde(default)]
    pub safety_check: SafetyCheck,
    /// 0-100 estimate of how well the recipe uses available pantry items.
    pub match_score: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Data URL of an illustrative image, when one could be generated or
    /// was uploaded by the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_user_created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servings: Option<String>,
}

impl Recipe {
    /// Build a user-authored recipe from form input.
    ///
    /// The id is a millisecond timestamp, nutrition is left empty, and the
    /// match score is pinned to 100 since the user picked the ingredients
    /// themselves. Blank ingredient and instruction rows are dropped.
    pub fn user_created(
        name: String,
        description: String,
        servings: Option<String>,
        ingredients: Vec<String>,
        instructions: Vec<String>,
        image: Option<String>,
    ) -> Self {
        let id = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default()
            .to_string();

        let description = if description.trim().is_empty() {
            "User created recipe".to_string()
        } else {
            description
        };

        Self {
            id,
            name,
            description,
            ingredients: ingredients
                .into_iter()
                .filter(|i| !i.trim().is_empty())
                .collect(),
            missing_ingredients: Vec::new(),
            instructions: instructions
                .into_iter()
                .filter(|i| !i.trim().is_empty())
                .collect(),
            macros: MacroNutrients::default(),
            micros: Vec::new(),
            safety_check: SafetyCheck::default(),
            match_score: 100,
            tags: vec!["My Recipe".to_string()],
            image,
            is_user_created: true,
            servings,
        }
    }
}

/// Dietary exclusions declared by the user.
///
/// Allergies are hard exclusions for generation; dislikes are soft. The
/// model does not deduplicate entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UserProfile {
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub dislikes: Vec<String>,
}

/// A synergistic food pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeneficialPairing {
    pub pair: String,
    pub reason: String,
}

/// A contraindicated food pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmfulPairing {
    pub pair: String,
    pub reason: String,
    #[serde(default)]
    pub severity: Severity,
}

/// Synergies and contraindications for a named food.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityResult {
    pub food: String,
    #[serde(default)]
    pub beneficial: Vec<BeneficialPairing>,
    #[serde(default)]
    pub harmful: Vec<HarmfulPairing>,
}

/// A food recommended for or against a condition, with the clinical reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodAdvice {
    pub food: String,
    pub reason: String,
}

/// Condition-targeted dietary recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecommendation {
    pub condition: String,
    #[serde(default)]
    pub eat: Vec<FoodAdvice>,
    #[serde(default)]
    pub avoid: Vec<FoodAdvice>,
    #[serde(default)]
    pub lifestyle_tips: Vec<String>,
}

/// Verdict on whether a single food suits a single condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodConditionAnalysis {
    pub food: String,
    pub condition: String,
    pub status: FoodStatus,
    pub reason: String,
}
