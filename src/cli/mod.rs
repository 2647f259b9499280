//! CLI subcommands: recipe execute/inputs/validate, version, completions.

use crate::core::resolver::{self, InputCollector, Resolution};
use crate::core::types::{ExecutableRecipe, Recipe};
use crate::core::{fetcher, handoff, parser};
use crate::journal::eventlog::RunLog;
use crate::prompt::{Ask, TerminalAsk};
use crate::ui;
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "osdd",
    version = ui::version(),
    about = "OpenSDD CLI for accessing OpenSDD flows",
    long_about = "osdd is a command-line interface for OpenSDD.\nFor more information, visit: https://opensdd.ai"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Commands handling OpenSDD recipes
    #[command(subcommand, visible_alias = "specs")]
    Recipe(RecipeCommands),

    /// Display the version of osdd
    Version,

    /// Print shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum RecipeCommands {
    /// Execute a recipe by its ID, prompting for the inputs it declares
    Execute {
        #[command(flatten)]
        source: RecipeArgs,

        /// Name of the IDE (used when the recipe does not name one)
        #[arg(short, long, env = "OSDD_IDE")]
        ide: String,

        /// Write the generation context here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Append resolution events (names only, never answers) to this JSONL file
        #[arg(long)]
        event_log: Option<PathBuf>,
    },

    /// List the inputs a recipe will ask for, without prompting
    Inputs {
        #[command(flatten)]
        source: RecipeArgs,
    },

    /// Check a recipe's structure without prompting
    Validate {
        #[command(flatten)]
        source: RecipeArgs,
    },
}

/// Where to load a recipe from.
#[derive(Args, Debug, Clone)]
pub struct RecipeArgs {
    /// Recipe ID
    pub recipe_id: String,

    /// Path to a local recipe file (YAML or JSON). When set, the recipe ID is ignored.
    #[arg(short = 'f', long)]
    pub recipe_file: Option<PathBuf>,

    /// Directory of recipes, looked up by ID
    #[arg(long, env = "OSDD_RECIPES_DIR", default_value = "recipes")]
    pub recipes_dir: PathBuf,
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands, cancel: &CancellationToken) -> Result<(), String> {
    match cmd {
        Commands::Recipe(RecipeCommands::Execute {
            source,
            ide,
            output,
            event_log,
        }) => cmd_execute(&source, &ide, output.as_deref(), event_log.as_deref(), cancel),
        Commands::Recipe(RecipeCommands::Inputs { source }) => cmd_inputs(&source),
        Commands::Recipe(RecipeCommands::Validate { source }) => cmd_validate(&source),
        Commands::Version => cmd_version(),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "osdd", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Load the recipe document: local file when given, otherwise the registry.
fn load_recipe(args: &RecipeArgs) -> Result<ExecutableRecipe, String> {
    if let Some(file) = &args.recipe_file {
        match std::fs::metadata(file) {
            Ok(meta) if meta.is_dir() => {
                return Err(format!("recipe file {} is a directory", file.display()))
            }
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "failed to access recipe file {}: {}",
                    file.display(),
                    e
                ))
            }
        }
        debug!(path = %file.display(), "loading recipe file");
        return parser::load_recipe_file(file);
    }

    let registry = fetcher::LocalRegistry::new(&args.recipes_dir);
    fetcher::RecipeFetcher::fetch(&registry, &args.recipe_id)
}

fn cmd_execute(
    source: &RecipeArgs,
    ide: &str,
    output: Option<&Path>,
    event_log: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<(), String> {
    eprintln!("{}", ui::logo());

    let doc = load_recipe(source)?;
    let ask = TerminalAsk::new().map_err(|e| format!("cannot open terminal prompt: {}", e))?;
    execute_with(doc, ask, ide, output, event_log, cancel)
}

/// Resolve inputs through `ask`, then hand the generation context off.
fn execute_with<A: Ask>(
    mut doc: ExecutableRecipe,
    ask: A,
    ide: &str,
    output: Option<&Path>,
    event_log: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<(), String> {
    let empty = Recipe::default();
    let recipe = doc.recipe.as_ref().unwrap_or(&empty);
    let name = recipe.display_name().to_string();

    let log = event_log.map(RunLog::new);
    if let Some(log) = &log {
        log.started(&name)?;
    }

    let mut collector = InputCollector::new(ask);
    let resolution = collector.request(cancel, recipe);

    if let Some(log) = &log {
        log.finished(&resolution)?;
    }

    eprintln!();
    eprint!("{}", launch_summary(&name, &resolution));
    if let Some(e) = resolution.error {
        return Err(e.to_string());
    }

    handoff::apply_ide_default(&mut doc, ide);
    let ide_type = doc
        .entry_point
        .as_ref()
        .map(|ep| ep.ide_type.as_str())
        .unwrap_or_default();
    eprintln!("IDE: {}", ide_type);

    match output {
        Some(path) => {
            eprintln!("Storing into {}", path.display());
            handoff::write(path, &resolution.answers, &doc)?;
        }
        None => {
            let json = handoff::render(&resolution.answers, &doc)?;
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json).map_err(|e| format!("write error: {}", e))?;
        }
    }
    Ok(())
}

/// Names collected and skipped. Values are not shown.
fn launch_summary(recipe: &str, resolution: &Resolution) -> String {
    let mut out = format!(
        "Collected {} input(s) for {}",
        resolution.answers.len(),
        recipe
    );
    if resolution.answers.is_empty() {
        out.push_str(".\n");
    } else {
        out.push_str(":\n");
        for name in resolution.answers.keys() {
            out.push_str(&format!("  {}\n", name));
        }
    }

    let skipped: Vec<&str> = resolution
        .prompted
        .iter()
        .filter(|p| p.skipped && !resolution.answers.contains_key(&p.name))
        .map(|p| p.name.as_str())
        .collect();
    if !skipped.is_empty() {
        out.push_str(&format!(
            "Skipped {} optional input(s): {}\n",
            skipped.len(),
            skipped.join(", ")
        ));
    }
    out
}

fn cmd_inputs(source: &RecipeArgs) -> Result<(), String> {
    let doc = load_recipe(source)?;
    print!("{}", render_inputs(&doc));
    Ok(())
}

/// The prompt plan: every question in order, with its location.
fn render_inputs(doc: &ExecutableRecipe) -> String {
    let empty = Recipe::default();
    let recipe = doc.recipe.as_ref().unwrap_or(&empty);
    let sources = resolver::user_input_sources(recipe);
    let params = resolver::collect_parameters(recipe);

    let mut out = format!("Inputs for {} ({}):\n", recipe.display_name(), params.len());
    if params.is_empty() {
        out.push_str("  (none)\n");
        return out;
    }

    let mut n = 0;
    let mut seen_later: HashSet<&str> = HashSet::new();
    let mut overridden = vec![false; params.len()];
    for (idx, p) in params.iter().enumerate().rev() {
        overridden[idx] = !seen_later.insert(p.name.as_str());
    }

    for source in &sources {
        for p in &source.source.entries {
            let kind = if p.optional { "optional" } else { "required" };
            out.push_str(&format!("  {}. {} ({})", n + 1, resolver::prompt_label(p), kind));
            if overridden[n] {
                out.push_str(" [overridden by a later answer]");
            }
            out.push_str(&format!("  <- {}\n", source));
            n += 1;
        }
    }
    out
}

fn cmd_validate(source: &RecipeArgs) -> Result<(), String> {
    let doc = load_recipe(source)?;
    let errors = parser::validate_recipe(&doc);

    if errors.is_empty() {
        let empty = Recipe::default();
        let recipe = doc.recipe.as_ref().unwrap_or(&empty);
        println!(
            "OK: {} ({} context entries, {} inputs)",
            recipe.display_name(),
            recipe.context.as_ref().map_or(0, |c| c.entries.len()),
            resolver::collect_parameters(recipe).len()
        );
        Ok(())
    } else {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        Err(format!("{} validation error(s)", errors.len()))
    }
}

fn cmd_version() -> Result<(), String> {
    println!("{}", ui::logo());
    for line in ui::version_lines() {
        println!("{}", line);
    }
    Ok(())
}
