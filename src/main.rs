use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use flowpad_config::{Settings, SettingsPatch};
use flowpad_engine::{RunOutcome, Simulator, SimulatorConfig};
use flowpad_generate::{GenerateRequest, HttpGenerator, generate_into};
use flowpad_store::{AppState, MemoryBackend, Store};
use flowpad_templates::{Catalog, TemplateCatalog};

/// flowpad - design, validate and simulate agent workflows
#[derive(Parser)]
#[command(name = "flowpad")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.flowpad)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Check a workflow export for structural problems
  Validate {
    /// Path to the workflow export (JSON)
    workflow_file: PathBuf,
  },

  /// Simulate a workflow run and print the execution log
  Run {
    /// Path to the workflow export (JSON)
    workflow_file: PathBuf,

    /// Seed for reproducible delays and failures
    #[arg(long)]
    seed: Option<u64>,

    /// Probability that a node fails, between 0 and 1
    #[arg(long, value_parser = parse_failure_rate)]
    failure_rate: Option<f64>,

    /// Run all nodes concurrently
    #[arg(long)]
    parallel: bool,

    /// Write the resulting export to FILE (default name from the workflow)
    #[arg(long, value_name = "FILE")]
    out: Option<Option<PathBuf>>,
  },

  /// Browse the built-in templates
  Templates {
    #[command(subcommand)]
    action: TemplatesAction,
  },

  /// Generate a workflow from a text description
  Generate {
    description: String,

    /// URL of the generation endpoint
    #[arg(long)]
    endpoint: String,

    /// Write the generated export to FILE instead of stdout
    #[arg(long, value_name = "FILE")]
    out: Option<Option<PathBuf>>,
  },
}

#[derive(Subcommand)]
enum TemplatesAction {
  /// List templates, optionally filtered
  List {
    #[arg(long)]
    category: Option<String>,

    /// Case-insensitive text search
    #[arg(long)]
    search: Option<String>,
  },

  /// Print a template as a workflow export
  Export {
    id: String,

    /// Write the export to FILE instead of stdout
    #[arg(long, value_name = "FILE")]
    out: Option<Option<PathBuf>>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".flowpad"),
  };
  let settings = load_settings(&data_dir)?;
  init_tracing(&settings);

  let rt = tokio::runtime::Runtime::new()?;
  match cli.command {
    Some(Commands::Validate { workflow_file }) => validate_workflow(&workflow_file, settings),
    Some(Commands::Run {
      workflow_file,
      seed,
      failure_rate,
      parallel,
      out,
    }) => {
      let options = RunOptions {
        seed,
        failure_rate,
        parallel,
        out,
      };
      rt.block_on(run_workflow(&workflow_file, settings, options))
    }
    Some(Commands::Templates { action }) => match action {
      TemplatesAction::List { category, search } => {
        list_templates(category.as_deref(), search.as_deref())
      }
      TemplatesAction::Export { id, out } => export_template(&id, out, settings),
    },
    Some(Commands::Generate {
      description,
      endpoint,
      out,
    }) => rt.block_on(generate_workflow(description, &endpoint, out, settings)),
    None => {
      println!("flowpad - use --help to see available commands");
      Ok(())
    }
  }
}

/// Read `settings.json` from the data directory. A missing file means defaults.
fn load_settings(data_dir: &Path) -> Result<Settings> {
  let path = data_dir.join("settings.json");
  if !path.exists() {
    return Ok(Settings::default());
  }
  let json = std::fs::read_to_string(&path)
    .with_context(|| format!("failed to read settings: {}", path.display()))?;
  Settings::from_json(&json).with_context(|| format!("failed to parse settings: {}", path.display()))
}

fn init_tracing(settings: &Settings) {
  let default = format!("flowpad={0},warn", settings.log_level.as_filter());
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

fn new_store(settings: Settings) -> Store {
  Store::new(AppState::new(settings), Arc::new(MemoryBackend::new()))
}

fn import_file(store: &Store, workflow_file: &Path) -> Result<()> {
  let json = std::fs::read_to_string(workflow_file)
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;
  store
    .import_json(&json)
    .with_context(|| format!("failed to import workflow file: {}", workflow_file.display()))
}

/// Print the export, or write it when `--out` was given. A bare `--out`
/// names the file after the workflow.
fn write_export(store: &Store, out: Option<Option<PathBuf>>) -> Result<()> {
  let export = store.export();
  let json = export.to_json_pretty().context("failed to serialize workflow")?;
  match out {
    Some(path) => {
      let path = path.unwrap_or_else(|| PathBuf::from(export.file_name()));
      std::fs::write(&path, json)
        .with_context(|| format!("failed to write export: {}", path.display()))?;
      info!(path = %path.display(), "export written");
      eprintln!("Wrote {}", path.display());
    }
    None => println!("{}", json),
  }
  Ok(())
}

fn print_log(store: &Store) {
  store.read(|state| {
    for entry in &state.execution_logs {
      match &entry.node_id {
        Some(node_id) => eprintln!("[{}] {} ({})", entry.level, entry.message, node_id),
        None => eprintln!("[{}] {}", entry.level, entry.message),
      }
    }
  });
}

fn validate_workflow(workflow_file: &Path, settings: Settings) -> Result<()> {
  let store = new_store(settings);
  import_file(&store, workflow_file)?;

  let report = store.validate();
  info!(valid = report.is_valid, errors = report.errors.len(), "workflow validated");
  println!("{}", serde_json::to_string_pretty(&report)?);
  if !report.is_valid {
    bail!("workflow has {} validation error(s)", report.errors.len());
  }
  Ok(())
}

struct RunOptions {
  seed: Option<u64>,
  failure_rate: Option<f64>,
  parallel: bool,
  out: Option<Option<PathBuf>>,
}

async fn run_workflow(workflow_file: &Path, settings: Settings, options: RunOptions) -> Result<()> {
  let store = new_store(settings);
  import_file(&store, workflow_file)?;
  if options.parallel {
    store.update_settings(SettingsPatch {
      parallel_execution: Some(true),
      ..SettingsPatch::default()
    });
  }

  let mut config = SimulatorConfig::default();
  if let Some(rate) = options.failure_rate {
    config.failure_rate = rate;
  }
  let simulator = match options.seed {
    Some(seed) => Simulator::seeded(config, seed),
    None => Simulator::from_entropy(config),
  };

  // Ctrl-C stops the run the same way the stop button does.
  let cancel = CancellationToken::new();
  let interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      interrupt.cancel();
    }
  });

  info!(file = %workflow_file.display(), seed = ?options.seed, "running workflow");
  let outcome = simulator.run(&store, &cancel).await;
  print_log(&store);

  if options.out.is_some() {
    write_export(&store, options.out)?;
  }

  if outcome != RunOutcome::Completed {
    warn!(outcome = ?outcome, "workflow run did not complete");
  }
  match outcome {
    RunOutcome::Completed => Ok(()),
    RunOutcome::Invalid(errors) => bail!("workflow is invalid: {}", errors.join(", ")),
    RunOutcome::Failed { node_id } => bail!("workflow failed at node {}", node_id),
    RunOutcome::TimedOut => bail!("workflow timed out"),
    RunOutcome::Stopped => bail!("workflow run was interrupted"),
    RunOutcome::AlreadyRunning => bail!("workflow is already running"),
  }
}

fn list_templates(category: Option<&str>, search: Option<&str>) -> Result<()> {
  let catalog = Catalog::builtin().context("failed to load built-in templates")?;

  let mut templates = match search {
    Some(query) => catalog.search(query),
    None => catalog.all().iter().collect(),
  };
  if let Some(category) = category {
    templates.retain(|t| t.category == category);
  }

  for template in templates {
    println!(
      "{:<32} {:<18} {:>2} nodes  {}",
      template.id,
      template.category,
      template.node_count(),
      template.name
    );
  }
  Ok(())
}

fn export_template(id: &str, out: Option<Option<PathBuf>>, settings: Settings) -> Result<()> {
  let catalog = Catalog::builtin().context("failed to load built-in templates")?;
  let store = Store::new(
    AppState::new(settings).with_templates(catalog.into_templates()),
    Arc::new(MemoryBackend::new()),
  );
  store
    .load_template_by_id(id)
    .with_context(|| format!("failed to load template '{}'", id))?;
  write_export(&store, out)
}

async fn generate_workflow(
  description: String,
  endpoint: &str,
  out: Option<Option<PathBuf>>,
  settings: Settings,
) -> Result<()> {
  let generator = HttpGenerator::new(endpoint)
    .with_context(|| format!("invalid generation endpoint: {}", endpoint))?;
  let store = new_store(settings);

  info!(endpoint = %generator.endpoint(), "generating workflow");
  let generated = generate_into(&store, &generator, &GenerateRequest::new(description)).await;
  print_log(&store);
  if let Err(e) = &generated {
    warn!(error = %e, "workflow generation failed");
  }
  generated.context("workflow generation failed")?;

  write_export(&store, out)
}

fn parse_failure_rate(raw: &str) -> Result<f64, String> {
  let rate: f64 = raw.parse().map_err(|_| format!("`{}` is not a number", raw))?;
  if (0.0..=1.0).contains(&rate) {
    Ok(rate)
  } else {
    Err(format!("failure rate must be between 0 and 1, got {}", raw))
  }
}
