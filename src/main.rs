//! NutriSage - Pantry-driven nutrition assistant
//!
//! Main entry point for the interactive console application.
//!
//! # Overview
//!
//! This binary crate provides a line-oriented frontend for the session
//! core. It initializes:
//! - Logging infrastructure (file rotation + console output)
//! - Tokio async runtime (4 worker threads for advisor requests)
//! - Session management ([`SessionManager`])
//! - Configuration loading ([`ConfigManager`])
//! - Persistence ([`Store`]) and the advisor client ([`GeminiClient`])
//!
//! # Execution Flow
//!
//! 1. Load YAML configuration from NutriSage Data/
//! 2. Initialize logging → logs/nutrisage.<date>
//! 3. Create tokio runtime with 4 worker threads
//! 4. Create SessionManager (Arc<RwLock<SessionState>>) and load the
//!    persisted pantry, profile and cookbook
//! 5. Run the command loop (blocks until quit or end of input)
//! 6. Shutdown tokio runtime with 5s timeout
//!
//! # Configuration Files
//!
//! Expected in `NutriSage Data/`:
//! - `NutriSage Config.yaml`: Language, data directory, API key source,
//!   model selection (created with defaults when missing)

use anyhow::Result;
use nutrisage::models::View;
use nutrisage::{
    APP_NAME, ConfigManager, GeminiClient, Language, NutritionAdvisor, Recipe, SessionController,
    SessionManager, Store, UserProfile, VERSION,
};
use std::io::{BufRead, Write};
use std::sync::Arc;

fn main() -> Result<()> {
    // Configuration decides the log level, so load it before logging setup
    let config_manager = ConfigManager::new("NutriSage Data")?;
    let user_config = config_manager.load_user_config()?;
    let settings = user_config.settings.clone();

    // Held until exit so the non-blocking file writer keeps flushing
    let _guard = nutrisage::logging::setup_logging("logs", "nutrisage", settings.debug_mode, false)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    tracing::info!(
        "Configuration: language={}, data_dir={}, text_model={}",
        settings.language,
        settings.data_dir,
        settings.text_model
    );

    // Create tokio runtime for advisor requests and image fan-out
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(4)
        .thread_name("nutrisage-worker")
        .build()?;

    let state = Arc::new(SessionManager::new());
    if settings.language == "zh" {
        state.set_language(Language::Zh);
    }

    let store = Store::new(settings.data_dir.as_str())?;
    let advisor = GeminiClient::new(&settings);
    let controller = SessionController::new(state, store, advisor);
    controller.load_persisted();

    println!("{} v{} - type 'help' for commands", APP_NAME, VERSION);

    runtime.block_on(command_loop(&controller))?;

    tracing::info!("Shutting down");
    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    Ok(())
}

/// Read commands from stdin until quit or end of input.
async fn command_loop<A: NutritionAdvisor>(controller: &SessionController<A>) -> Result<()> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = match line.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "help" => print_help(),
            "quit" | "exit" => break,

            "pantry" => {
                for item in controller.state().read(|s| {
                    s.pantry.iter().cloned().collect::<Vec<String>>()
                }) {
                    println!("  {}", item);
                }
            }
            "add" => controller.add_pantry_item(rest),
            "rm" => controller.remove_pantry_item(rest),

            "allergy" | "dislike" => {
                let items: Vec<String> = rest
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
                let mut profile = controller.state().read(|s| s.profile.clone());
                if command == "allergy" {
                    profile.allergies = items;
                } else {
                    profile.dislikes = items;
                }
                controller.set_profile(profile);
            }
            "profile" => {
                let UserProfile { allergies, dislikes } =
                    controller.state().read(|s| s.profile.clone());
                println!("  allergies: {}", allergies.join(", "));
                println!("  dislikes:  {}", dislikes.join(", "));
            }

            "generate" => {
                controller.set_view(View::Kitchen);
                controller.generate_recipes().await;
                report_kitchen(controller);
            }
            "more" => {
                controller.load_more().await;
                report_kitchen(controller);
            }
            "recipes" => {
                for recipe in controller.state().read(|s| s.recipes.clone()) {
                    print_recipe_line(&recipe);
                }
            }
            "open" => {
                if !controller.open_recipe(rest) {
                    println!("  no recipe with id {}", rest);
                } else if let Some(recipe) =
                    controller.state().read(|s| s.selected_recipe.clone())
                {
                    print_recipe_detail(&recipe);
                }
            }
            "close" => controller.close_recipe(),
            "keep" => {
                if controller.save_generated_recipe(rest) {
                    println!("  saved to cookbook");
                } else {
                    println!("  no displayed recipe with id {}", rest);
                }
            }

            "cookbook" => {
                controller.set_view(View::Cookbook);
                for recipe in controller.state().read(|s| s.user_recipes.clone()) {
                    print_recipe_line(&recipe);
                }
            }
            "delete" => {
                let confirmed = confirm(&mut lines, "Delete this recipe? [y/N] ")?;
                if controller.delete_user_recipe(rest, confirmed) {
                    println!("  deleted");
                } else {
                    println!("  nothing deleted");
                }
            }

            "safety" => {
                controller.set_view(View::Safety);
                controller.safety_search(rest).await;
                report_safety(controller);
            }
            "recovery" => {
                controller.set_view(View::Recovery);
                controller.recovery_search(rest).await;
                report_recovery(controller);
            }
            "checkfood" => match controller.check_food(rest).await {
                Some(analysis) => {
                    println!("  {}: {} - {}", analysis.food, analysis.status, analysis.reason);
                }
                None => println!("  no verdict (search a condition first)"),
            },

            "lang" => match rest {
                "en" => controller.set_language(Language::En).await,
                "zh" => controller.set_language(Language::Zh).await,
                _ => println!("  usage: lang en|zh"),
            },

            _ => println!("  unknown command, type 'help'"),
        }
    }

    Ok(())
}

fn confirm<B: BufRead>(lines: &mut std::io::Lines<B>, prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(line?.trim().eq_ignore_ascii_case("y")),
        None => Ok(false),
    }
}

fn report_kitchen<A: NutritionAdvisor>(controller: &SessionController<A>) {
    let (recipes, error) = controller
        .state()
        .read(|s| (s.recipes.clone(), s.kitchen_error.clone()));

    if let Some(message) = error {
        println!("  error: {}", message);
        return;
    }
    for recipe in recipes {
        print_recipe_line(&recipe);
    }
}

fn report_safety<A: NutritionAdvisor>(controller: &SessionController<A>) {
    let safety = controller.state().read(|s| s.safety.clone());
    if let Some(message) = safety.error {
        println!("  error: {}", message);
        return;
    }
    if let Some(result) = safety.result {
        println!("  {} pairs well with:", result.food);
        for pairing in &result.beneficial {
            println!("    + {} ({})", pairing.pair, pairing.reason);
        }
        println!("  avoid combining with:");
        for pairing in &result.harmful {
            println!("    - {} [{:?}] ({})", pairing.pair, pairing.severity, pairing.reason);
        }
    }
}

fn report_recovery<A: NutritionAdvisor>(controller: &SessionController<A>) {
    let recovery = controller.state().read(|s| s.recovery.clone());
    if let Some(message) = recovery.error {
        println!("  error: {}", message);
        return;
    }
    if let Some(result) = recovery.result {
        println!("  for {}:", result.condition);
        for advice in &result.eat {
            println!("    eat {} - {}", advice.food, advice.reason);
        }
        for advice in &result.avoid {
            println!("    avoid {} - {}", advice.food, advice.reason);
        }
        for tip in &result.lifestyle_tips {
            println!("    tip: {}", tip);
        }
    }
}

fn print_recipe_line(recipe: &Recipe) {
    println!(
        "  [{}] {} (match {}%)",
        recipe.id, recipe.name, recipe.match_score
    );
}

fn print_recipe_detail(recipe: &Recipe) {
    println!("  {} - {}", recipe.name, recipe.description);
    println!("  ingredients:");
    for ingredient in &recipe.ingredients {
        println!("    {}", ingredient);
    }
    if !recipe.missing_ingredients.is_empty() {
        println!("  missing: {}", recipe.missing_ingredients.join(", "));
    }
    println!("  steps:");
    for (i, step) in recipe.instructions.iter().enumerate() {
        println!("    {}. {}", i + 1, step);
    }
    println!(
        "  macros: {} kcal, {}g protein, {}g carbs, {}g fat",
        recipe.macros.calories, recipe.macros.protein, recipe.macros.carbs, recipe.macros.fats
    );
}

fn print_help() {
    println!("  pantry | add <item> | rm <item>");
    println!("  profile | allergy <a,b,..> | dislike <a,b,..>");
    println!("  generate | more | recipes | open <id> | close | keep <id>");
    println!("  cookbook | delete <id>");
    println!("  safety <food> | recovery <condition> | checkfood <food>");
    println!("  lang en|zh | quit");
}
