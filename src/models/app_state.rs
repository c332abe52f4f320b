use crate::models::domain::{
    CompatibilityResult, HealthRecommendation, Language, Recipe, UserProfile,
};
use indexmap::IndexSet;

/// Upload ceiling for pantry-scan photos (10 MiB).
///
/// Enforced before any advisor request is made; oversized uploads are a
/// validation rejection, not a transport failure.
pub const MAX_SCAN_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Upload ceiling for user-recipe cover photos (5 MiB).
pub const MAX_COVER_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Top-level panels. Exactly one is active at a time; the recipe-detail
/// overlay is tracked separately and can be open over any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Kitchen,
    Cookbook,
    Safety,
    Recovery,
}

/// Uniform state for one asynchronous lookup surface.
///
/// Used identically for the compatibility check and the recovery protocol
/// so that search handling and the language-refresh rule stay symmetric.
///
/// Invariant: `loading` is never true while `result` or `error` is set;
/// a fresh search clears both before entering the loading state.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<R> {
    pub query: String,
    pub result: Option<R>,
    pub loading: bool,
    pub error: Option<String>,
}

// Manual impl: the idle state needs no `R: Default`, since `result`
// starts as None.
impl<R> Default for QueryState<R> {
    fn default() -> Self {
        Self {
            query: String::new(),
            result: None,
            loading: false,
            error: None,
        }
    }
}

impl<R> QueryState<R> {
    /// Enter the loading state for `query`, discarding any previous result
    /// or error so no stale content flashes while the request is in flight.
    pub fn begin(&mut self, query: String) {
        self.query = query;
        self.result = None;
        self.error = None;
        self.loading = true;
    }

    /// Resolve the in-flight lookup with a result.
    pub fn complete(&mut self, result: R) {
        self.result = Some(result);
        self.error = None;
        self.loading = false;
    }

    /// Resolve the in-flight lookup with a user-facing error message.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.result = None;
        self.error = Some(message.into());
        self.loading = false;
    }

    /// True when a result is currently displayed for a non-empty query and
    /// no request is outstanding. This is the language-refresh predicate.
    pub fn is_populated(&self) -> bool {
        self.result.is_some() && !self.query.is_empty() && !self.loading
    }
}

/// Single source of truth for the session.
///
/// # Thread Safety
///
/// `SessionState` is wrapped in `Arc<RwLock<SessionState>>` by
/// [`crate::state::SessionManager`]. Never access it directly - always go
/// through the manager:
/// - [`read()`](crate::state::SessionManager::read) for read-only access
/// - [`update()`](crate::state::SessionManager::update) for mutations with
///   automatic change events
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    // Persisted collections
    pub pantry: IndexSet<String>,
    pub profile: UserProfile,
    pub user_recipes: Vec<Recipe>,

    // Transient generation state
    pub recipes: Vec<Recipe>,
    pub is_generating: bool,
    pub is_loading_more: bool,
    pub kitchen_error: Option<String>,

    // Lookup surfaces
    pub safety: QueryState<CompatibilityResult>,
    pub recovery: QueryState<HealthRecommendation>,

    // Presentation
    pub view: View,
    pub selected_recipe: Option<Recipe>,
    pub language: Language,
}

impl SessionState {
    /// Add a pantry item. Re-adding a present item is a no-op.
    ///
    /// Returns true when the item was actually inserted.
    pub fn add_pantry_item(&mut self, item: String) -> bool {
        self.pantry.insert(item)
    }

    /// Remove a pantry item by exact match. Returns true when removed.
    pub fn remove_pantry_item(&mut self, item: &str) -> bool {
        self.pantry.shift_remove(item)
    }

    /// Add scanned ingredients, keeping only items not already present.
    ///
    /// Returns how many new items were added.
    pub fn extend_pantry<I: IntoIterator<Item = String>>(&mut self, items: I) -> usize {
        items
            .into_iter()
            .filter(|item| self.pantry.insert(item.clone()))
            .count()
    }

    /// Names of all currently displayed generated recipes, used to exclude
    /// duplicates from a load-more request.
    pub fn displayed_recipe_names(&self) -> Vec<String> {
        self.recipes.iter().map(|r| r.name.clone()).collect()
    }

    /// Append newly generated recipes, dropping any whose name is already
    /// displayed.
    pub fn append_recipes(&mut self, batch: Vec<Recipe>) -> usize {
        let mut added = 0;
        for recipe in batch {
            if !self.recipes.iter().any(|r| r.name == recipe.name) {
                self.recipes.push(recipe);
                added += 1;
            }
        }
        added
    }

    /// Remove a user recipe by id. Returns true when one was removed.
    pub fn remove_user_recipe(&mut self, id: &str) -> bool {
        let before = self.user_recipes.len();
        self.user_recipes.retain(|r| r.id != id);
        self.user_recipes.len() != before
    }
}
