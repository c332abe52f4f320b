use crate::models::NutriSettings;
use crate::models::domain::{
    CompatibilityResult, FoodConditionAnalysis, HealthRecommendation, Language, Recipe,
    UserProfile,
};
use crate::services::advisor::{AdvisorError, NutritionAdvisor};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::env;
use tokio::task::JoinSet;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

// --- Wire shapes for the generateContent endpoint ---

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, if any.
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|p| p.text.as_deref())
    }

    /// Inline image data of the first candidate, if any.
    fn first_inline_image(&self) -> Option<&InlineData> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|p| p.inline_data.as_ref())
    }
}

/// Client for the Google Generative Language REST API
///
/// Implements [`NutritionAdvisor`] with one text model for recipe,
/// compatibility and recovery generation and a separate image model for
/// per-recipe cover photos. The credential is read from the environment on
/// every call so a key set after startup is picked up.
///
/// Model output is requested as JSON but defensively stripped of markdown
/// code fences before parsing, since models occasionally wrap payloads
/// despite the mime-type hint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    api_key_var: String,
    text_model: String,
    image_model: String,
    recipe_images: bool,

    /// Regex for stripping ```json / ``` fences from model output
    fence_pattern: Regex,
}

impl GeminiClient {
    pub fn new(settings: &NutriSettings) -> Self {
        Self {
            http: Client::new(),
            api_key_var: settings.api_key_var.clone(),
            text_model: settings.text_model.clone(),
            image_model: settings.image_model.clone(),
            recipe_images: settings.recipe_images,
            fence_pattern: Regex::new(r"```(?:json)?").expect("Invalid fence regex"),
        }
    }

    fn api_key(&self) -> Result<String, AdvisorError> {
        env::var(&self.api_key_var)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AdvisorError::MissingApiKey(self.api_key_var.clone()))
    }

    /// Remove markdown code fences and surrounding whitespace.
    fn strip_fences(&self, text: &str) -> String {
        self.fence_pattern.replace_all(text, "").trim().to_string()
    }

    /// Parse an object-shaped payload, yielding None on malformed content.
    fn parse_object<T: DeserializeOwned>(&self, text: &str) -> Option<T> {
        match serde_json::from_str(&self.strip_fences(text)) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Failed to parse model response: {}", e);
                None
            }
        }
    }

    /// Parse a sequence-shaped payload, yielding an empty sequence on
    /// malformed content.
    fn parse_sequence<T: DeserializeOwned>(&self, text: &str) -> Vec<T> {
        match serde_json::from_str(&self.strip_fences(text)) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!("Failed to parse model response: {}", e);
                Vec::new()
            }
        }
    }

    async fn generate_content(
        &self,
        model: &str,
        parts: Vec<Part>,
        json_response: bool,
    ) -> Result<GenerateContentResponse, AdvisorError> {
        let api_key = self.api_key()?;
        let url = format!("{}/{}:generateContent", API_BASE, model);

        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config: json_response.then(|| GenerationConfig {
                response_mime_type: "application/json".to_string(),
            }),
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json::<GenerateContentResponse>().await?)
        } else {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            Err(AdvisorError::Api { status, body })
        }
    }

    async fn prompt_text(&self, prompt: String) -> Result<GenerateContentResponse, AdvisorError> {
        self.generate_content(
            &self.text_model,
            vec![Part {
                text: Some(prompt),
                inline_data: None,
            }],
            true,
        )
        .await
    }

    /// Generate an illustrative cover photo for a recipe.
    ///
    /// Absence on any failure; a missing image never fails the batch and
    /// the caller falls back to a placeholder.
    pub async fn generate_recipe_image(&self, recipe_name: &str) -> Option<String> {
        if self.api_key().is_err() {
            return None;
        }

        let prompt = format!(
            "Professional food photography of {}, appetizing, high resolution, \
             studio lighting, clean background, 4k.",
            recipe_name
        );

        let result = self
            .generate_content(
                &self.image_model,
                vec![Part {
                    text: Some(prompt),
                    inline_data: None,
                }],
                false,
            )
            .await;

        match result {
            Ok(response) => response
                .first_inline_image()
                .map(|img| format!("data:{};base64,{}", img.mime_type, img.data)),
            Err(e) => {
                tracing::warn!("Failed to generate image for {}: {}", recipe_name, e);
                None
            }
        }
    }

    /// Fetch cover photos for a batch of recipes, all in parallel.
    ///
    /// Waits for every attempt before returning; failed attempts leave
    /// that recipe's image unset.
    async fn attach_images(&self, recipes: &mut [Recipe]) {
        let mut tasks = JoinSet::new();
        for (idx, recipe) in recipes.iter().enumerate() {
            let client = self.clone();
            let name = recipe.name.clone();
            tasks.spawn(async move { (idx, client.generate_recipe_image(&name).await) });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Ok((idx, image)) = joined {
                recipes[idx].image = image;
            }
        }
    }

    fn recipe_prompt(
        pantry: &[String],
        profile: &UserProfile,
        excluded_names: &[String],
        language: Language,
    ) -> String {
        let exclusion_clause = if excluded_names.is_empty() {
            String::new()
        } else {
            format!(
                "IMPORTANT: Do NOT generate these recipes as they are already displayed: {}.\n\n",
                excluded_names.join(", ")
            )
        };

        let allergies = if profile.allergies.is_empty() {
            "None".to_string()
        } else {
            profile.allergies.join(", ")
        };
        let dislikes = if profile.dislikes.is_empty() {
            "None".to_string()
        } else {
            profile.dislikes.join(", ")
        };

        format!(
            "You are an expert Clinical Nutritionist and Chef.\n\
             User has the following ingredients in their pantry: {pantry}.\n\n\
             User Constraints:\n\
             - Allergies (MUST EXCLUDE): {allergies}\n\
             - Dislikes (Avoid): {dislikes}\n\n\
             {exclusion_clause}\
             Task:\n\
             1. Generate 3 distinct recipes that utilize the pantry ingredients.\n\
             2. Rank them by \"matchScore\" (how many pantry ingredients they use).\n\
             3. Perform a \"Food Compatibility Safety Check\". Identify if any combined \
             ingredients have negative biochemical interactions (e.g., Iron absorption \
             inhibition, high oxalate/calcium conflicts).\n\
             4. Provide estimated Macros and Micros.\n\
             5. {lang}\n\n\
             Return ONLY a JSON array with the following schema per recipe:\n\
             {{\n\
             \"id\": \"unique_string\",\n\
             \"name\": \"Recipe Name\",\n\
             \"description\": \"Short appetizing description\",\n\
             \"ingredients\": [\"list of strings\"],\n\
             \"missingIngredients\": [\"list of strings (ingredients user needs but doesn't have)\"],\n\
             \"instructions\": [\"step 1\", \"step 2\"],\n\
             \"macros\": {{ \"calories\": number, \"protein\": number, \"carbs\": number, \"fats\": number }},\n\
             \"micros\": [{{ \"name\": \"Vitamin A\", \"amount\": \"100mcg\", \"dv\": 15 }}],\n\
             \"safetyCheck\": {{\n\
             \"hasConflict\": boolean,\n\
             \"conflictingIngredients\": [\"ing1\", \"ing2\"],\n\
             \"reason\": \"Short warning title\",\n\
             \"scientificExplanation\": \"Detailed clinical explanation of the interaction\",\n\
             \"severity\": \"low\" | \"medium\" | \"high\"\n\
             }},\n\
             \"matchScore\": number (0-100 integer),\n\
             \"tags\": [\"Low Carb\", \"High Protein\", etc]\n\
             }}",
            pantry = pantry.join(", "),
            allergies = allergies,
            dislikes = dislikes,
            exclusion_clause = exclusion_clause,
            lang = language.response_instruction(),
        )
    }
}

impl NutritionAdvisor for GeminiClient {
    async fn generate_recipes(
        &self,
        pantry: &[String],
        profile: &UserProfile,
        excluded_names: &[String],
        language: Language,
    ) -> Result<Vec<Recipe>, AdvisorError> {
        let prompt = Self::recipe_prompt(pantry, profile, excluded_names, language);
        let response = self.prompt_text(prompt).await?;

        let mut recipes: Vec<Recipe> = response
            .first_text()
            .map(|text| self.parse_sequence(text))
            .unwrap_or_default();

        if self.recipe_images && !recipes.is_empty() {
            self.attach_images(&mut recipes).await;
        }

        tracing::info!("Generated {} recipes", recipes.len());
        Ok(recipes)
    }

    async fn identify_ingredients(&self, image_bytes: &[u8]) -> Result<Vec<String>, AdvisorError> {
        let prompt = "Analyze this image and identify the raw food ingredients visible \
                      (e.g., vegetables, fruits, packaged goods, meats).\n\
                      Return ONLY a JSON array of strings containing the names of the \
                      identified ingredients.\n\
                      Example output: [\"Spinach\", \"Tomatoes\", \"Eggs\", \"Pasta\"]\n\
                      Do not include explanations or markdown formatting outside the JSON.\n\
                      Identify ingredients in English.";

        let parts = vec![
            Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: "image/jpeg".to_string(),
                    data: BASE64.encode(image_bytes),
                }),
            },
            Part {
                text: Some(prompt.to_string()),
                inline_data: None,
            },
        ];

        let response = self.generate_content(&self.text_model, parts, true).await?;

        Ok(response
            .first_text()
            .map(|text| self.parse_sequence(text))
            .unwrap_or_default())
    }

    async fn analyze_compatibility(
        &self,
        food: &str,
        language: Language,
    ) -> Result<Option<CompatibilityResult>, AdvisorError> {
        let prompt = format!(
            "You are a specialized Clinical Nutritionist focusing on Food Synergy and \
             Contraindications.\n\
             Analyze the food item: \"{food}\".\n\n\
             Task:\n\
             1. Identify a comprehensive list (aim for 10-15 items) of BIOCHEMICALLY \
             BENEFICIAL (Synergistic) food pairings. E.g., Vitamin C sources + Non-heme \
             Iron. Prioritize the most potent synergies.\n\
             2. Identify a comprehensive list (aim for 10-20 items) of INCOMPATIBLE or \
             CONTRAINDICATED food pairings. E.g., High Calcium + Iron, or specific \
             digestion speed conflicts causing bloating. Prioritize the most common or \
             severe conflicts. BE EXHAUSTIVE with contraindications.\n\
             3. {lang}\n\n\
             Return ONLY a JSON object:\n\
             {{\n\
             \"food\": \"{food}\",\n\
             \"beneficial\": [\n\
             {{ \"pair\": \"Food Name\", \"reason\": \"Scientific explanation of synergy\" }}\n\
             ],\n\
             \"harmful\": [\n\
             {{ \"pair\": \"Food Name\", \"reason\": \"Scientific explanation of conflict\", \
             \"severity\": \"low\" | \"medium\" | \"high\" }}\n\
             ]\n\
             }}",
            food = food,
            lang = language.response_instruction(),
        );

        let response = self.prompt_text(prompt).await?;
        Ok(response.first_text().and_then(|text| self.parse_object(text)))
    }

    async fn recovery_advice(
        &self,
        condition: &str,
        language: Language,
    ) -> Result<Option<HealthRecommendation>, AdvisorError> {
        let prompt = format!(
            "You are a Clinical Nutritionist specializing in recovery and symptom \
             management.\n\
             The user has the following condition(s) or symptom(s): \"{condition}\".\n\n\
             Task:\n\
             1. List 4 specific foods/ingredients that are HIGHLY BENEFICIAL for recovery \
             or soothing symptoms. Consider ALL mentioned conditions (e.g. if \"flu and \
             cough\", consider both). Explain why scientifically.\n\
             2. List 4 specific foods/ingredients that should be AVOIDED/CONTRAINDICATED \
             because they might aggravate symptoms or inflammation. Explain why.\n\
             3. Provide 3 short clinical lifestyle tips for this specific health \
             situation.\n\
             4. {lang}\n\n\
             Return ONLY a JSON object:\n\
             {{\n\
             \"condition\": \"{condition}\",\n\
             \"eat\": [\n\
             {{ \"food\": \"Name\", \"reason\": \"Explanation of benefit\" }}\n\
             ],\n\
             \"avoid\": [\n\
             {{ \"food\": \"Name\", \"reason\": \"Explanation of risk\" }}\n\
             ],\n\
             \"lifestyleTips\": [\"Tip 1\", \"Tip 2\", \"Tip 3\"]\n\
             }}",
            condition = condition,
            lang = language.response_instruction(),
        );

        let response = self.prompt_text(prompt).await?;
        Ok(response.first_text().and_then(|text| self.parse_object(text)))
    }

    async fn check_food_for_condition(
        &self,
        condition: &str,
        food: &str,
        language: Language,
    ) -> Result<Option<FoodConditionAnalysis>, AdvisorError> {
        let prompt = format!(
            "As a Clinical Nutritionist, analyze if \"{food}\" is suitable for someone \
             with \"{condition}\".\n\n\
             Determine status:\n\
             - 'Recommended': Helps recovery.\n\
             - 'Safe': Neutral, can eat.\n\
             - 'Caution': Eat in moderation or specific preparation.\n\
             - 'Avoid': Worsens symptoms or inflammation.\n\n\
             Provide a short, clinical reason (max 1 sentence).\n\
             {lang}\n\n\
             Return ONLY JSON:\n\
             {{\n\
             \"food\": \"{food}\",\n\
             \"condition\": \"{condition}\",\n\
             \"status\": \"Recommended\" | \"Safe\" | \"Caution\" | \"Avoid\",\n\
             \"reason\": \"Explanation string\"\n\
             }}",
            food = food,
            condition = condition,
            lang = language.response_instruction(),
        );

        let response = self.prompt_text(prompt).await?;
        Ok(response.first_text().and_then(|text| self.parse_object(text)))
    }
}
