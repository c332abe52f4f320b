// Integration tests for the session controller
//
// These exercise the full path from controller operation through state
// transitions, change events and persistence, with a scripted advisor in
// place of the real service.

use camino::Utf8PathBuf;
use nutrisage::models::domain::{
    BeneficialPairing, CompatibilityResult, FoodAdvice, FoodConditionAnalysis, FoodStatus,
    HealthRecommendation, Language, Recipe, UserProfile,
};
use nutrisage::services::{AdvisorError, NutritionAdvisor};
use nutrisage::state::{SessionManager, StateChange};
use nutrisage::storage::Store;
use nutrisage::SessionController;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Advisor whose responses are scripted per operation.
///
/// Each call pops the next scripted outcome for that operation, or a
/// benign empty outcome when the script is exhausted. Requests are
/// recorded so tests can assert what was asked.
#[derive(Default)]
struct ScriptedAdvisor {
    recipe_batches: Mutex<VecDeque<Result<Vec<Recipe>, AdvisorError>>>,
    scans: Mutex<VecDeque<Result<Vec<String>, AdvisorError>>>,
    compatibility: Mutex<VecDeque<Result<Option<CompatibilityResult>, AdvisorError>>>,
    recovery: Mutex<VecDeque<Result<Option<HealthRecommendation>, AdvisorError>>>,
    food_checks: Mutex<VecDeque<Result<Option<FoodConditionAnalysis>, AdvisorError>>>,

    recipe_requests: Mutex<Vec<(Vec<String>, Vec<String>, Language)>>,
    compatibility_requests: Mutex<Vec<(String, Language)>>,
    recovery_requests: Mutex<Vec<(String, Language)>>,
}

impl ScriptedAdvisor {
    fn script_recipes(&self, outcome: Result<Vec<Recipe>, AdvisorError>) {
        self.recipe_batches.lock().unwrap().push_back(outcome);
    }

    fn script_scan(&self, outcome: Result<Vec<String>, AdvisorError>) {
        self.scans.lock().unwrap().push_back(outcome);
    }

    fn script_compatibility(&self, outcome: Result<Option<CompatibilityResult>, AdvisorError>) {
        self.compatibility.lock().unwrap().push_back(outcome);
    }

    fn script_recovery(&self, outcome: Result<Option<HealthRecommendation>, AdvisorError>) {
        self.recovery.lock().unwrap().push_back(outcome);
    }

    fn script_food_check(&self, outcome: Result<Option<FoodConditionAnalysis>, AdvisorError>) {
        self.food_checks.lock().unwrap().push_back(outcome);
    }

    fn recipe_requests(&self) -> Vec<(Vec<String>, Vec<String>, Language)> {
        self.recipe_requests.lock().unwrap().clone()
    }

    fn compatibility_requests(&self) -> Vec<(String, Language)> {
        self.compatibility_requests.lock().unwrap().clone()
    }

    fn recovery_requests(&self) -> Vec<(String, Language)> {
        self.recovery_requests.lock().unwrap().clone()
    }
}

/// Handle sharing one [`ScriptedAdvisor`] between a controller and the
/// test body. A plain `Arc` cannot carry the trait impl here, so the
/// handle is its own type and delegates.
#[derive(Clone)]
struct SharedAdvisor(Arc<ScriptedAdvisor>);

impl NutritionAdvisor for SharedAdvisor {
    async fn generate_recipes(
        &self,
        pantry: &[String],
        _profile: &UserProfile,
        excluded_names: &[String],
        language: Language,
    ) -> Result<Vec<Recipe>, AdvisorError> {
        self.0.recipe_requests.lock().unwrap().push((
            pantry.to_vec(),
            excluded_names.to_vec(),
            language,
        ));
        self.0
            .recipe_batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(vec![]))
    }

    async fn identify_ingredients(&self, _image_bytes: &[u8]) -> Result<Vec<String>, AdvisorError> {
        self.0
            .scans
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(vec![]))
    }

    async fn analyze_compatibility(
        &self,
        food: &str,
        language: Language,
    ) -> Result<Option<CompatibilityResult>, AdvisorError> {
        self.0
            .compatibility_requests
            .lock()
            .unwrap()
            .push((food.to_string(), language));
        self.0
            .compatibility
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }

    async fn recovery_advice(
        &self,
        condition: &str,
        language: Language,
    ) -> Result<Option<HealthRecommendation>, AdvisorError> {
        self.0
            .recovery_requests
            .lock()
            .unwrap()
            .push((condition.to_string(), language));
        self.0
            .recovery
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }

    async fn check_food_for_condition(
        &self,
        _condition: &str,
        _food: &str,
        _language: Language,
    ) -> Result<Option<FoodConditionAnalysis>, AdvisorError> {
        self.0
            .food_checks
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }
}

fn advisor_error() -> AdvisorError {
    AdvisorError::MissingApiKey("GEMINI_API_KEY".to_string())
}

fn recipe(name: &str, match_score: u8) -> Recipe {
    Recipe {
        id: name.to_lowercase(),
        name: name.to_string(),
        description: String::new(),
        ingredients: vec![],
        missing_ingredients: vec![],
        instructions: vec![],
        macros: Default::default(),
        micros: vec![],
        safety_check: Default::default(),
        match_score,
        tags: vec![],
        image: None,
        is_user_created: false,
        servings: None,
    }
}

fn compatibility(food: &str) -> CompatibilityResult {
    CompatibilityResult {
        food: food.to_string(),
        beneficial: vec![BeneficialPairing {
            pair: "oats".to_string(),
            reason: "calcium absorption".to_string(),
        }],
        harmful: vec![],
    }
}

fn recommendation(condition: &str) -> HealthRecommendation {
    HealthRecommendation {
        condition: condition.to_string(),
        eat: vec![FoodAdvice {
            food: "ginger".to_string(),
            reason: "anti-inflammatory".to_string(),
        }],
        avoid: vec![],
        lifestyle_tips: vec!["rest".to_string()],
    }
}

struct Harness {
    controller: SessionController<SharedAdvisor>,
    advisor: Arc<ScriptedAdvisor>,
    data_dir: Utf8PathBuf,
    _temp_dir: TempDir,
}

fn harness() -> Harness {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    let advisor = Arc::new(ScriptedAdvisor::default());
    let controller = SessionController::new(
        Arc::new(SessionManager::new()),
        Store::new(&data_dir).unwrap(),
        SharedAdvisor(advisor.clone()),
    );
    Harness {
        controller,
        advisor,
        data_dir,
        _temp_dir: temp_dir,
    }
}

/// Build a second controller over the same data directory, as a fresh
/// process start would.
fn reopen(h: &Harness) -> SessionController<SharedAdvisor> {
    let controller = SessionController::new(
        Arc::new(SessionManager::new()),
        Store::new(&h.data_dir).unwrap(),
        SharedAdvisor(h.advisor.clone()),
    );
    controller.load_persisted();
    controller
}

#[tokio::test]
async fn test_pantry_survives_restart() {
    let h = harness();
    h.controller.add_pantry_item("eggs");
    h.controller.add_pantry_item("spinach");
    h.controller.add_pantry_item("eggs");
    h.controller.remove_pantry_item("spinach");

    let reopened = reopen(&h);
    let items: Vec<String> = reopened
        .state()
        .read(|s| s.pantry.iter().cloned().collect());
    assert_eq!(items, ["eggs"]);
}

#[tokio::test]
async fn test_profile_survives_restart() {
    let h = harness();
    h.controller.set_profile(UserProfile {
        allergies: vec!["peanuts".to_string()],
        dislikes: vec!["cilantro".to_string()],
    });

    let reopened = reopen(&h);
    let profile = reopened.state().read(|s| s.profile.clone());
    assert_eq!(profile.allergies, ["peanuts"]);
    assert_eq!(profile.dislikes, ["cilantro"]);
}

#[tokio::test]
async fn test_cookbook_save_and_delete_round_trip() {
    let h = harness();
    let saved = h
        .controller
        .create_user_recipe(
            "Oat Bowl",
            "",
            Some("2".to_string()),
            vec!["Oats".to_string()],
            vec!["Mix".to_string()],
            None,
        )
        .unwrap();

    let reopened = reopen(&h);
    let names: Vec<String> = reopened
        .state()
        .read(|s| s.user_recipes.iter().map(|r| r.name.clone()).collect());
    assert_eq!(names, ["Oat Bowl"]);

    // Declined confirmation leaves the collection untouched
    assert!(!reopened.delete_user_recipe(&saved.id, false));
    assert_eq!(reopened.state().read(|s| s.user_recipes.len()), 1);

    assert!(reopened.delete_user_recipe(&saved.id, true));

    let reopened_again = reopen(&h);
    assert!(reopened_again.state().read(|s| s.user_recipes.is_empty()));
}

#[tokio::test]
async fn test_generation_events_never_pair_loading_with_outcome() {
    let h = harness();
    h.advisor.script_recipes(Ok(vec![recipe("A", 90)]));

    let mut rx = h.controller.state().subscribe();
    h.controller.generate_recipes().await;

    let mut saw_start = false;
    let mut saw_finish = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            StateChange::GenerationStateChanged {
                generating: true, ..
            } => {
                saw_start = true;
                // No recipes or error may have landed before this point
                assert!(!saw_finish);
            }
            StateChange::GenerationStateChanged {
                generating: false, ..
            } => saw_finish = true,
            _ => {}
        }
    }
    assert!(saw_start && saw_finish);
    assert!(!h.controller.state().read(|s| s.is_generating));
}

#[tokio::test]
async fn test_generate_uses_pantry_and_scores_stay_in_range() {
    let h = harness();
    h.controller.add_pantry_item("eggs");
    h.controller.add_pantry_item("spinach");
    h.advisor
        .script_recipes(Ok(vec![recipe("Omelette", 95), recipe("Salad", 70)]));

    h.controller.generate_recipes().await;

    let requests = h.advisor.recipe_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, ["eggs", "spinach"]);
    assert!(requests[0].1.is_empty());

    let recipes = h.controller.state().read(|s| s.recipes.clone());
    assert_eq!(recipes.len(), 2);
    assert!(recipes.iter().all(|r| r.match_score <= 100));
}

#[tokio::test]
async fn test_generation_failure_raises_banner_and_keeps_list() {
    let h = harness();
    h.advisor.script_recipes(Ok(vec![recipe("A", 90)]));
    h.controller.generate_recipes().await;

    h.advisor.script_recipes(Err(advisor_error()));
    h.controller.generate_recipes().await;

    let state = h.controller.state().snapshot();
    assert_eq!(state.displayed_recipe_names(), ["A"]);
    assert_eq!(
        state.kitchen_error.as_deref(),
        Some("Unable to generate recipes. Please ensure API Key is configured and try again.")
    );
    assert!(!state.is_generating);
}

#[tokio::test]
async fn test_load_more_appends_and_excludes_displayed_names() {
    let h = harness();
    h.advisor
        .script_recipes(Ok(vec![recipe("A", 90), recipe("B", 80)]));
    h.controller.generate_recipes().await;

    h.advisor.script_recipes(Ok(vec![recipe("C", 60)]));
    h.controller.load_more().await;

    assert_eq!(
        h.controller.state().read(|s| s.displayed_recipe_names()),
        ["A", "B", "C"]
    );

    let requests = h.advisor.recipe_requests();
    assert_eq!(requests[1].1, ["A", "B"]);
}

#[tokio::test]
async fn test_load_more_failure_is_silent() {
    let h = harness();
    h.advisor
        .script_recipes(Ok(vec![recipe("A", 90), recipe("B", 80)]));
    h.controller.generate_recipes().await;

    h.advisor.script_recipes(Err(advisor_error()));
    h.controller.load_more().await;

    let state = h.controller.state().snapshot();
    assert_eq!(state.displayed_recipe_names(), ["A", "B"]);
    assert!(state.kitchen_error.is_none());
    assert!(!state.is_loading_more);
}

#[tokio::test]
async fn test_scan_adds_only_new_ingredients() {
    let h = harness();
    h.controller.add_pantry_item("eggs");
    h.advisor
        .script_scan(Ok(vec!["eggs".to_string(), "tomato".to_string()]));

    h.controller.scan_pantry_photo(&[0u8; 16]).await;

    let items: Vec<String> = h
        .controller
        .state()
        .read(|s| s.pantry.iter().cloned().collect());
    assert_eq!(items, ["eggs", "tomato"]);
    assert!(h.controller.state().read(|s| s.kitchen_error.is_none()));
}

#[tokio::test]
async fn test_scan_with_no_ingredients_reports_it() {
    let h = harness();
    h.advisor.script_scan(Ok(vec![]));

    h.controller.scan_pantry_photo(&[0u8; 16]).await;

    assert_eq!(
        h.controller.state().read(|s| s.kitchen_error.clone()),
        Some("Could not identify any ingredients in the image.".to_string())
    );
}

#[tokio::test]
async fn test_safety_search_lifecycle() {
    let h = harness();
    h.advisor.script_compatibility(Ok(Some(compatibility("milk"))));

    h.controller.safety_search("milk").await;

    let safety = h.controller.state().read(|s| s.safety.clone());
    assert!(safety.is_populated());
    assert_eq!(safety.query, "milk");
    assert_eq!(safety.result.unwrap().food, "milk");
}

#[tokio::test]
async fn test_safety_search_missing_data_and_failure_messages() {
    let h = harness();

    h.advisor.script_compatibility(Ok(None));
    h.controller.safety_search("milk").await;
    assert_eq!(
        h.controller.state().read(|s| s.safety.error.clone()),
        Some("Could not analyze food data.".to_string())
    );

    h.advisor.script_compatibility(Err(advisor_error()));
    h.controller.safety_search("milk").await;
    assert_eq!(
        h.controller.state().read(|s| s.safety.error.clone()),
        Some("An error occurred connecting to the engine.".to_string())
    );
}

#[tokio::test]
async fn test_empty_queries_are_silent_noops() {
    let h = harness();

    h.controller.safety_search("").await;
    h.controller.safety_search("   ").await;
    h.controller.recovery_search("\t").await;

    assert!(h.advisor.compatibility_requests().is_empty());
    assert!(h.advisor.recovery_requests().is_empty());

    let state = h.controller.state().snapshot();
    assert!(!state.safety.loading && state.safety.result.is_none());
    assert!(!state.recovery.loading && state.recovery.result.is_none());
}

#[tokio::test]
async fn test_language_change_reissues_populated_search() {
    let h = harness();
    h.advisor.script_compatibility(Ok(Some(compatibility("milk"))));
    h.controller.safety_search("milk").await;

    h.advisor.script_compatibility(Ok(Some(compatibility("milk"))));
    h.controller.set_language(Language::Zh).await;

    let requests = h.advisor.compatibility_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], ("milk".to_string(), Language::En));
    assert_eq!(requests[1], ("milk".to_string(), Language::Zh));

    // Recovery was never populated, so it was not refreshed
    assert!(h.advisor.recovery_requests().is_empty());
    // Nor was recipe generation, since the list is empty
    assert!(h.advisor.recipe_requests().is_empty());
}

#[tokio::test]
async fn test_language_change_without_results_issues_nothing() {
    let h = harness();
    h.controller.set_language(Language::Zh).await;

    assert!(h.advisor.compatibility_requests().is_empty());
    assert!(h.advisor.recovery_requests().is_empty());
    assert!(h.advisor.recipe_requests().is_empty());
    assert_eq!(
        h.controller.state().read(|s| s.language),
        Language::Zh
    );
}

#[tokio::test]
async fn test_language_change_regenerates_displayed_recipes() {
    let h = harness();
    h.advisor.script_recipes(Ok(vec![recipe("A", 90)]));
    h.controller.generate_recipes().await;

    h.advisor.script_recipes(Ok(vec![recipe("B", 85)]));
    h.controller.set_language(Language::Zh).await;

    let requests = h.advisor.recipe_requests();
    assert_eq!(requests.len(), 2);
    // The refresh is a fresh generation: nothing excluded, new language
    assert!(requests[1].1.is_empty());
    assert_eq!(requests[1].2, Language::Zh);

    // The displayed list was replaced, not appended to
    assert_eq!(
        h.controller.state().read(|s| s.displayed_recipe_names()),
        ["B"]
    );
}

#[tokio::test]
async fn test_same_language_is_a_noop() {
    let h = harness();
    h.advisor.script_compatibility(Ok(Some(compatibility("milk"))));
    h.controller.safety_search("milk").await;

    h.controller.set_language(Language::En).await;

    assert_eq!(h.advisor.compatibility_requests().len(), 1);
}

#[tokio::test]
async fn test_recovery_search_and_food_check() {
    let h = harness();
    h.advisor.script_recovery(Ok(Some(recommendation("flu"))));
    h.controller.recovery_search("flu").await;

    let recovery = h.controller.state().read(|s| s.recovery.clone());
    assert!(recovery.is_populated());
    assert_eq!(recovery.result.unwrap().eat[0].food, "ginger");

    h.advisor.script_food_check(Ok(Some(FoodConditionAnalysis {
        food: "ginger".to_string(),
        condition: "flu".to_string(),
        status: FoodStatus::Recommended,
        reason: "Anti-inflammatory.".to_string(),
    })));

    let verdict = h.controller.check_food("ginger").await.unwrap();
    assert_eq!(verdict.status, FoodStatus::Recommended);
}

#[tokio::test]
async fn test_food_check_needs_a_displayed_recommendation() {
    let h = harness();
    h.advisor.script_food_check(Ok(Some(FoodConditionAnalysis {
        food: "ginger".to_string(),
        condition: "flu".to_string(),
        status: FoodStatus::Safe,
        reason: String::new(),
    })));

    // No recovery result is displayed, so the check never runs
    assert!(h.controller.check_food("ginger").await.is_none());
}

#[tokio::test]
async fn test_saving_generated_recipe_into_cookbook() {
    let h = harness();
    h.advisor.script_recipes(Ok(vec![recipe("Omelette", 95)]));
    h.controller.generate_recipes().await;

    assert!(h.controller.save_generated_recipe("omelette"));
    assert!(!h.controller.save_generated_recipe("no-such-id"));

    let reopened = reopen(&h);
    let names: Vec<String> = reopened
        .state()
        .read(|s| s.user_recipes.iter().map(|r| r.name.clone()).collect());
    assert_eq!(names, ["Omelette"]);
}
