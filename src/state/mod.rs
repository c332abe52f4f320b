// State management module
//
// This module provides the SessionManager which wraps SessionState with
// thread-safe access using Arc<RwLock<T>> and emits change events so that
// persistence and presentation can react without polling.

use crate::models::domain::{
    CompatibilityResult, HealthRecommendation, Language, Recipe, UserProfile,
};
use crate::models::{SessionState, View};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when session state is modified
///
/// Each event names the slice of state that changed. The controller maps
/// the persisted slices (pantry, profile, cookbook) to storage writes.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// Pantry contents changed
    PantryChanged { count: usize },

    /// Allergies or dislikes changed
    ProfileChanged,

    /// The persisted user-recipe collection changed
    CookbookChanged { count: usize },

    /// The transient generated-recipe list changed
    RecipesChanged { count: usize },

    /// A generation or load-more request started or finished
    GenerationStateChanged { generating: bool, loading_more: bool },

    /// The kitchen error banner changed
    KitchenErrorChanged { message: Option<String> },

    /// The compatibility lookup surface transitioned
    SafetyStateChanged { loading: bool, populated: bool },

    /// The recovery lookup surface transitioned
    RecoveryStateChanged { loading: bool, populated: bool },

    /// The active panel changed
    ViewChanged { view: View },

    /// The recipe-detail overlay opened or closed
    OverlayChanged { open: bool },

    /// The active display language changed
    LanguageChanged { language: Language },
}

/// Thread-safe session manager with event emission
///
/// This is the central state management component that:
/// - Provides thread-safe access to [`SessionState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// # Usage
///
/// Always use `SessionManager` instead of accessing [`SessionState`]
/// directly:
/// - [`read()`](Self::read) for reading state without holding locks
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
///
/// # Related Types
///
/// - [`crate::models::SessionState`]: The underlying state structure
/// - [`StateChange`]: Event types emitted on state mutations
/// - [`crate::session::SessionController`]: Primary consumer, wires state to
///   storage and the advisor
pub struct SessionManager {
    /// The session state protected by RwLock for thread-safe access
    state: Arc<RwLock<SessionState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl SessionManager {
    /// Create a new SessionManager with default state
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            state_tx,
        }
    }

    /// Get a read-only snapshot of the current state
    ///
    /// This clones the entire state, so it's safe to use without holding
    /// locks. For checking individual fields, prefer `read()` with a closure.
    pub fn snapshot(&self) -> SessionState {
        self.state.read().unwrap().clone()
    }

    /// Execute a function with read access to the state
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SessionState) -> R,
    {
        let state = self.state.read().unwrap();
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// This is the primary way to modify state. It:
    /// 1. Captures the old state
    /// 2. Applies the update function
    /// 3. Detects what changed
    /// 4. Emits appropriate events
    ///
    /// # Returns
    /// A vector of StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut SessionState),
    {
        let mut state = self.state.write().unwrap();
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    ///
    /// Returns a receiver that will get notified of all future state
    /// changes. Multiple subscribers can listen simultaneously.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    /// Detect what changed between two states and generate events
    fn detect_changes(old: &SessionState, new: &SessionState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.pantry != new.pantry {
            changes.push(StateChange::PantryChanged {
                count: new.pantry.len(),
            });
        }

        if old.profile != new.profile {
            changes.push(StateChange::ProfileChanged);
        }

        if old.user_recipes != new.user_recipes {
            changes.push(StateChange::CookbookChanged {
                count: new.user_recipes.len(),
            });
        }

        if old.recipes != new.recipes {
            changes.push(StateChange::RecipesChanged {
                count: new.recipes.len(),
            });
        }

        if old.is_generating != new.is_generating || old.is_loading_more != new.is_loading_more {
            changes.push(StateChange::GenerationStateChanged {
                generating: new.is_generating,
                loading_more: new.is_loading_more,
            });
        }

        if old.kitchen_error != new.kitchen_error {
            changes.push(StateChange::KitchenErrorChanged {
                message: new.kitchen_error.clone(),
            });
        }

        if old.safety != new.safety {
            changes.push(StateChange::SafetyStateChanged {
                loading: new.safety.loading,
                populated: new.safety.result.is_some(),
            });
        }

        if old.recovery != new.recovery {
            changes.push(StateChange::RecoveryStateChanged {
                loading: new.recovery.loading,
                populated: new.recovery.result.is_some(),
            });
        }

        if old.view != new.view {
            changes.push(StateChange::ViewChanged { view: new.view });
        }

        if old.selected_recipe != new.selected_recipe {
            changes.push(StateChange::OverlayChanged {
                open: new.selected_recipe.is_some(),
            });
        }

        if old.language != new.language {
            changes.push(StateChange::LanguageChanged {
                language: new.language,
            });
        }

        changes
    }

    // Convenience methods for common state updates

    /// Add a pantry item; re-adding a present item emits no events.
    pub fn add_pantry_item(&self, item: String) -> Vec<StateChange> {
        self.update(|state| {
            state.add_pantry_item(item);
        })
    }

    /// Remove a pantry item by exact match.
    pub fn remove_pantry_item(&self, item: &str) -> Vec<StateChange> {
        self.update(|state| {
            state.remove_pantry_item(item);
        })
    }

    /// Add scanned ingredients that are not already present.
    pub fn extend_pantry(&self, items: Vec<String>) -> Vec<StateChange> {
        self.update(|state| {
            state.extend_pantry(items);
        })
    }

    /// Replace the dietary profile.
    pub fn set_profile(&self, profile: UserProfile) -> Vec<StateChange> {
        self.update(|state| {
            state.profile = profile;
        })
    }

    /// Append a recipe to the persisted cookbook.
    pub fn add_user_recipe(&self, recipe: Recipe) -> Vec<StateChange> {
        self.update(|state| {
            state.user_recipes.push(recipe);
        })
    }

    /// Remove a cookbook recipe by id.
    pub fn delete_user_recipe(&self, id: &str) -> Vec<StateChange> {
        self.update(|state| {
            state.remove_user_recipe(id);
        })
    }

    /// Mark a fresh generation as in flight and clear the error banner.
    pub fn begin_generation(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.is_generating = true;
            state.kitchen_error = None;
        })
    }

    /// Resolve a fresh generation. The displayed list is only replaced on
    /// success; failure raises the error banner and leaves the list as-is.
    pub fn finish_generation(&self, outcome: Result<Vec<Recipe>, String>) -> Vec<StateChange> {
        self.update(|state| {
            match outcome {
                Ok(recipes) => state.recipes = recipes,
                Err(message) => state.kitchen_error = Some(message),
            }
            state.is_generating = false;
        })
    }

    /// Mark a load-more request as in flight.
    pub fn begin_load_more(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.is_loading_more = true;
        })
    }

    /// Resolve a load-more request. `None` means a soft failure: the list
    /// stays unchanged and no error is surfaced.
    pub fn finish_load_more(&self, batch: Option<Vec<Recipe>>) -> Vec<StateChange> {
        self.update(|state| {
            if let Some(batch) = batch {
                state.append_recipes(batch);
            }
            state.is_loading_more = false;
        })
    }

    /// Start a compatibility lookup. Empty or whitespace-only queries are
    /// rejected with no state transition.
    ///
    /// Returns the emitted events, or None when the query was rejected.
    pub fn begin_safety_search(&self, query: &str) -> Option<Vec<StateChange>> {
        if query.trim().is_empty() {
            return None;
        }
        Some(self.update(|state| {
            state.safety.begin(query.to_string());
        }))
    }

    pub fn complete_safety(&self, result: CompatibilityResult) -> Vec<StateChange> {
        self.update(|state| {
            state.safety.complete(result);
        })
    }

    pub fn fail_safety(&self, message: impl Into<String>) -> Vec<StateChange> {
        let message = message.into();
        self.update(|state| {
            state.safety.fail(message);
        })
    }

    /// Start a recovery lookup. Empty or whitespace-only queries are
    /// rejected with no state transition.
    pub fn begin_recovery_search(&self, query: &str) -> Option<Vec<StateChange>> {
        if query.trim().is_empty() {
            return None;
        }
        Some(self.update(|state| {
            state.recovery.begin(query.to_string());
        }))
    }

    pub fn complete_recovery(&self, result: HealthRecommendation) -> Vec<StateChange> {
        self.update(|state| {
            state.recovery.complete(result);
        })
    }

    pub fn fail_recovery(&self, message: impl Into<String>) -> Vec<StateChange> {
        let message = message.into();
        self.update(|state| {
            state.recovery.fail(message);
        })
    }

    /// Select the active panel.
    pub fn set_view(&self, view: View) -> Vec<StateChange> {
        self.update(|state| {
            state.view = view;
        })
    }

    /// Open the recipe-detail overlay over the current panel.
    pub fn open_recipe(&self, recipe: Recipe) -> Vec<StateChange> {
        self.update(|state| {
            state.selected_recipe = Some(recipe);
        })
    }

    /// Close the recipe-detail overlay.
    pub fn close_recipe(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.selected_recipe = None;
        })
    }

    /// Switch the active display language.
    pub fn set_language(&self, language: Language) -> Vec<StateChange> {
        self.update(|state| {
            state.language = language;
        })
    }

    /// Get an Arc reference to the state for use in worker tasks
    pub fn state_arc(&self) -> Arc<RwLock<SessionState>> {
        Arc::clone(&self.state)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make SessionManager cloneable for sharing across tasks
impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
