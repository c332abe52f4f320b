use serde::{Deserialize, Serialize};

/// User configuration from NutriSage Config.yaml
///
/// Contains user-specific settings and storage paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(rename = "NutriSage_Settings")]
    pub settings: NutriSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutriSettings {
    /// Default display language at startup ("en" or "zh")
    #[serde(rename = "Language", default = "default_language")]
    pub language: String,

    /// Directory holding the persisted pantry, profile and cookbook entries
    #[serde(rename = "Data Directory", default = "default_data_dir")]
    pub data_dir: String,

    /// Environment variable holding the API credential
    #[serde(rename = "API Key Variable", default = "default_api_key_var")]
    pub api_key_var: String,

    /// Text-generation model name
    #[serde(rename = "Text Model", default = "default_text_model")]
    pub text_model: String,

    /// Image-generation model name
    #[serde(rename = "Image Model", default = "default_image_model")]
    pub image_model: String,

    /// Generate a cover image per recipe after generation
    #[serde(rename = "Recipe Images", default = "default_recipe_images")]
    pub recipe_images: bool,

    #[serde(rename = "Debug Mode", default)]
    pub debug_mode: bool,
}

impl Default for NutriSettings {
    fn default() -> Self {
        Self {
            language: default_language(),
            data_dir: default_data_dir(),
            api_key_var: default_api_key_var(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            recipe_images: default_recipe_images(),
            debug_mode: false,
        }
    }
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            settings: NutriSettings::default(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_data_dir() -> String {
    "NutriSage Data".to_string()
}

fn default_api_key_var() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_text_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_image_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_recipe_images() -> bool {
    true
}
