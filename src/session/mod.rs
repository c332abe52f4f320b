// Session controller module
//
// The SessionController coordinates between:
// - SessionManager (session state + change events)
// - Store (best-effort persistence of pantry/profile/cookbook)
// - NutritionAdvisor (the external generative-AI service)
//
// It owns the reactive rules: every mutation of a persisted collection is
// mirrored to storage, and a language change re-issues the last query of
// every surface that currently shows a result.

use crate::models::domain::{FoodConditionAnalysis, Language, Recipe, UserProfile};
use crate::models::{MAX_COVER_IMAGE_BYTES, MAX_SCAN_IMAGE_BYTES, View};
use crate::services::NutritionAdvisor;
use crate::state::{SessionManager, StateChange};
use crate::storage::{PANTRY_KEY, PROFILE_KEY, Store, USER_RECIPES_KEY};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::sync::Arc;

// User-facing messages. Collaborator error detail is never surfaced; it
// only reaches the log.
const MSG_SCAN_IMAGE_TOO_LARGE: &str = "Image is too large. Maximum size is 10MB.";
const MSG_COVER_IMAGE_TOO_LARGE: &str = "Image is too large. Maximum size is 5MB.";
const MSG_NO_INGREDIENTS: &str = "Could not identify any ingredients in the image.";
const MSG_SCAN_FAILED: &str = "Failed to analyze image. Please try again.";
const MSG_GENERATE_FAILED: &str =
    "Unable to generate recipes. Please ensure API Key is configured and try again.";
const MSG_SAFETY_NO_DATA: &str = "Could not analyze food data.";
const MSG_RECOVERY_NO_DATA: &str = "Could not generate advice.";
const MSG_ENGINE_ERROR: &str = "An error occurred connecting to the engine.";
const MSG_RECIPE_NAME_REQUIRED: &str = "Recipe name is required.";

/// Orchestrates session state, persistence and advisor requests.
///
/// Generic over the advisor so tests can script collaborator behavior.
/// All mutation goes through the [`SessionManager`]; the controller then
/// maps the emitted [`StateChange`] events of persisted collections to
/// storage writes.
pub struct SessionController<A: NutritionAdvisor> {
    state: Arc<SessionManager>,
    store: Store,
    advisor: A,
}

impl<A: NutritionAdvisor> SessionController<A> {
    pub fn new(state: Arc<SessionManager>, store: Store, advisor: A) -> Self {
        Self {
            state,
            store,
            advisor,
        }
    }

    /// Shared session manager, for subscribing to change events.
    pub fn state(&self) -> &Arc<SessionManager> {
        &self.state
    }

    /// Fill session state from storage at startup.
    ///
    /// Load failures have already degraded to defaults inside the store,
    /// so this cannot fail. Nothing is written back here.
    pub fn load_persisted(&self) {
        let pantry: Vec<String> = self.store.load_or_default(PANTRY_KEY);
        let profile: UserProfile = self.store.load_or_default(PROFILE_KEY);
        let user_recipes: Vec<Recipe> = self.store.load_or_default(USER_RECIPES_KEY);

        tracing::info!(
            "Loaded persisted state: {} pantry items, {} allergies, {} saved recipes",
            pantry.len(),
            profile.allergies.len(),
            user_recipes.len()
        );

        self.state.update(|state| {
            state.pantry = pantry.into_iter().collect();
            state.profile = profile;
            state.user_recipes = user_recipes;
        });
    }

    /// Mirror mutated persisted collections to storage.
    fn persist(&self, changes: &[StateChange]) {
        for change in changes {
            match change {
                StateChange::PantryChanged { .. } => {
                    let pantry: Vec<String> =
                        self.state.read(|s| s.pantry.iter().cloned().collect());
                    self.store.save(PANTRY_KEY, &pantry);
                }
                StateChange::ProfileChanged => {
                    let profile = self.state.read(|s| s.profile.clone());
                    self.store.save(PROFILE_KEY, &profile);
                }
                StateChange::CookbookChanged { .. } => {
                    let recipes = self.state.read(|s| s.user_recipes.clone());
                    self.store.save(USER_RECIPES_KEY, &recipes);
                }
                _ => {}
            }
        }
    }

    // --- Pantry & profile ---

    /// Add a pantry item. Blank input and exact duplicates are no-ops.
    pub fn add_pantry_item(&self, item: &str) {
        let item = item.trim();
        if item.is_empty() {
            return;
        }
        let changes = self.state.add_pantry_item(item.to_string());
        self.persist(&changes);
    }

    pub fn remove_pantry_item(&self, item: &str) {
        let changes = self.state.remove_pantry_item(item);
        self.persist(&changes);
    }

    pub fn set_profile(&self, profile: UserProfile) {
        let changes = self.state.set_profile(profile);
        self.persist(&changes);
    }

    /// Identify ingredients from a photo and add the new ones.
    ///
    /// Oversized uploads are rejected before any request is made. Failures
    /// surface as a static message on the kitchen banner.
    pub async fn scan_pantry_photo(&self, image_bytes: &[u8]) {
        self.set_kitchen_error(None);

        if image_bytes.len() > MAX_SCAN_IMAGE_BYTES {
            self.set_kitchen_error(Some(MSG_SCAN_IMAGE_TOO_LARGE));
            return;
        }

        match self.advisor.identify_ingredients(image_bytes).await {
            Ok(detected) if !detected.is_empty() => {
                tracing::info!("Scan identified {} ingredients", detected.len());
                let changes = self.state.extend_pantry(detected);
                self.persist(&changes);
            }
            Ok(_) => {
                self.set_kitchen_error(Some(MSG_NO_INGREDIENTS));
            }
            Err(e) => {
                tracing::error!("Ingredient scan failed: {}", e);
                self.set_kitchen_error(Some(MSG_SCAN_FAILED));
            }
        }
    }

    fn set_kitchen_error(&self, message: Option<&str>) {
        self.state.update(|state| {
            state.kitchen_error = message.map(String::from);
        });
    }

    // --- Recipe generation ---

    /// Generate a fresh recipe list from the current pantry and profile.
    ///
    /// Success replaces the displayed list; failure raises the static
    /// kitchen banner and the call never replaces the list.
    pub async fn generate_recipes(&self) {
        let (pantry, profile, language) = self.state.read(|s| {
            (
                s.pantry.iter().cloned().collect::<Vec<String>>(),
                s.profile.clone(),
                s.language,
            )
        });

        self.state.begin_generation();

        // Fresh generation excludes nothing
        match self
            .advisor
            .generate_recipes(&pantry, &profile, &[], language)
            .await
        {
            Ok(recipes) => {
                self.state.finish_generation(Ok(recipes));
            }
            Err(e) => {
                tracing::error!("Recipe generation failed: {}", e);
                self.state
                    .finish_generation(Err(MSG_GENERATE_FAILED.to_string()));
            }
        }
    }

    /// Request additional recipes, excluding every name already displayed.
    ///
    /// Soft failure: the displayed list stays unchanged and no user-facing
    /// error is raised.
    pub async fn load_more(&self) {
        let (pantry, profile, excluded, language) = self.state.read(|s| {
            (
                s.pantry.iter().cloned().collect::<Vec<String>>(),
                s.profile.clone(),
                s.displayed_recipe_names(),
                s.language,
            )
        });

        self.state.begin_load_more();

        match self
            .advisor
            .generate_recipes(&pantry, &profile, &excluded, language)
            .await
        {
            Ok(batch) => {
                self.state.finish_load_more(Some(batch));
            }
            Err(e) => {
                tracing::warn!("Failed to load more recipes: {}", e);
                self.state.finish_load_more(None);
            }
        }
    }

    // --- Lookup surfaces ---

    /// Run a compatibility lookup. Empty queries are a silent no-op.
    pub async fn safety_search(&self, query: &str) {
        if self.state.begin_safety_search(query).is_none() {
            return;
        }

        let language = self.state.read(|s| s.language);
        match self.advisor.analyze_compatibility(query, language).await {
            Ok(Some(result)) => {
                self.state.complete_safety(result);
            }
            Ok(None) => {
                self.state.fail_safety(MSG_SAFETY_NO_DATA);
            }
            Err(e) => {
                tracing::error!("Compatibility lookup failed: {}", e);
                self.state.fail_safety(MSG_ENGINE_ERROR);
            }
        }
    }

    /// Run a recovery-protocol lookup. Empty queries are a silent no-op.
    pub async fn recovery_search(&self, query: &str) {
        if self.state.begin_recovery_search(query).is_none() {
            return;
        }

        let language = self.state.read(|s| s.language);
        match self.advisor.recovery_advice(query, language).await {
            Ok(Some(result)) => {
                self.state.complete_recovery(result);
            }
            Ok(None) => {
                self.state.fail_recovery(MSG_RECOVERY_NO_DATA);
            }
            Err(e) => {
                tracing::error!("Recovery lookup failed: {}", e);
                self.state.fail_recovery(MSG_ENGINE_ERROR);
            }
        }
    }

    /// Check a single food against the condition of the displayed recovery
    /// result.
    ///
    /// The verdict goes back to the caller rather than into session state,
    /// so it does not participate in the language refresh. Returns None
    /// when the food is blank, no recovery result is displayed, or the
    /// lookup fails.
    pub async fn check_food(&self, food: &str) -> Option<FoodConditionAnalysis> {
        if food.trim().is_empty() {
            return None;
        }

        let condition = self
            .state
            .read(|s| s.recovery.result.as_ref().map(|r| r.condition.clone()))?;

        let language = self.state.read(|s| s.language);
        match self
            .advisor
            .check_food_for_condition(&condition, food, language)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Food check failed: {}", e);
                None
            }
        }
    }

    // --- Cookbook ---

    /// Create and persist a user-authored recipe from form input.
    ///
    /// Returns the stored recipe, or a user-facing message when the name
    /// is blank or the cover photo exceeds its ceiling (checked before any
    /// other work).
    pub fn create_user_recipe(
        &self,
        name: &str,
        description: &str,
        servings: Option<String>,
        ingredients: Vec<String>,
        instructions: Vec<String>,
        cover_photo: Option<Vec<u8>>,
    ) -> Result<Recipe, &'static str> {
        if name.trim().is_empty() {
            return Err(MSG_RECIPE_NAME_REQUIRED);
        }

        let image = match cover_photo {
            Some(bytes) if bytes.len() > MAX_COVER_IMAGE_BYTES => {
                return Err(MSG_COVER_IMAGE_TOO_LARGE);
            }
            Some(bytes) => Some(format!("data:image/jpeg;base64,{}", BASE64.encode(bytes))),
            None => None,
        };

        let recipe = Recipe::user_created(
            name.to_string(),
            description.to_string(),
            servings,
            ingredients,
            instructions,
            image,
        );

        let changes = self.state.add_user_recipe(recipe.clone());
        self.persist(&changes);
        Ok(recipe)
    }

    /// Copy a displayed generated recipe into the persisted cookbook.
    pub fn save_generated_recipe(&self, id: &str) -> bool {
        let recipe = self
            .state
            .read(|s| s.recipes.iter().find(|r| r.id == id).cloned());

        match recipe {
            Some(recipe) => {
                let changes = self.state.add_user_recipe(recipe);
                self.persist(&changes);
                true
            }
            None => false,
        }
    }

    /// Delete a cookbook recipe by id. Declining the confirmation leaves
    /// the collection unchanged.
    pub fn delete_user_recipe(&self, id: &str, confirmed: bool) -> bool {
        if !confirmed {
            return false;
        }

        let changes = self.state.delete_user_recipe(id);
        let removed = !changes.is_empty();
        if removed {
            self.persist(&changes);
        }
        removed
    }

    // --- Presentation ---

    pub fn set_view(&self, view: View) {
        self.state.set_view(view);
    }

    /// Open the detail overlay for a displayed or saved recipe.
    pub fn open_recipe(&self, id: &str) -> bool {
        let recipe = self.state.read(|s| {
            s.recipes
                .iter()
                .chain(s.user_recipes.iter())
                .find(|r| r.id == id)
                .cloned()
        });

        match recipe {
            Some(recipe) => {
                self.state.open_recipe(recipe);
                true
            }
            None => false,
        }
    }

    pub fn close_recipe(&self) {
        self.state.close_recipe();
    }

    // --- Language refresh ---

    /// Switch the display language and regenerate all visible content.
    ///
    /// For each surface currently holding a populated result and not
    /// already loading, the last query is re-issued through the normal
    /// path so the collaborator answers in the new language. Surfaces with
    /// no result are left untouched; setting the same language again does
    /// nothing.
    pub async fn set_language(&self, language: Language) {
        let changes = self.state.set_language(language);
        let changed = changes
            .iter()
            .any(|c| matches!(c, StateChange::LanguageChanged { .. }));
        if !changed {
            return;
        }

        tracing::info!("Language changed to {}, refreshing visible content", language.code());
        self.refresh_visible_surfaces().await;
    }

    async fn refresh_visible_surfaces(&self) {
        let (has_recipes, generating, safety_query, recovery_query) = self.state.read(|s| {
            (
                !s.recipes.is_empty(),
                s.is_generating,
                s.safety.is_populated().then(|| s.safety.query.clone()),
                s.recovery.is_populated().then(|| s.recovery.query.clone()),
            )
        });

        if has_recipes && !generating {
            self.generate_recipes().await;
        }

        if let Some(query) = safety_query {
            self.safety_search(&query).await;
        }

        if let Some(query) = recovery_query {
            self.recovery_search(&query).await;
        }
    }
}
