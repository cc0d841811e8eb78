//! cvar-grid - CVaR value iteration on grid worlds
//!
//! The main entry point for cvar-grid, handling:
//! - Solving a configured grid world and saving the value function
//! - Querying CVaR values and illustrative paths from a saved solution
//! - Monte-Carlo evaluation of risk-averse policies
//! - Configuration inspection and validation

use cg_common::{OutputFormat, State, SCHEMA_VERSION};
use cg_config::validate::{validate_rollout, validate_solver};
use cg_config::{
    list_presets, load_config, ConfigOptions, LoadedConfig, PresetName, RolloutConfig,
};
use cg_core::error::{Error, Result};
use cg_core::exit_codes::ExitCode;
use cg_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogFormat, LogLevel, Stage,
};
use cg_core::persist::{load_snapshot, save_snapshot, Snapshot};
use cg_core::policy::PolicyKind;
use cg_core::rollout::{evaluate_policy, sweep_policies, SWEEP_ALPHAS};
use cg_core::{Environment, GridWorld, ValueFunction, ValueIteration};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

/// cvar-grid - risk-averse planning with CVaR value iteration
#[derive(Parser)]
#[command(name = "cvar-grid")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to a config file (overrides CVAR_GRID_CONFIG and the XDG config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Built-in configuration preset (corridor, cliff, large)
    #[arg(long, global = true, conflicts_with = "config")]
    preset: Option<PresetName>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    quiet: u8,

    /// Log format on stderr (human or json)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run value iteration and save the solved value function
    Solve(SolveArgs),

    /// CVaR at a risk level, for one cell or the whole grid
    Cvar(CvarArgs),

    /// Most probable path of the time-consistent policy
    Path(PathArgs),

    /// Monte-Carlo evaluation of a policy
    Evaluate(EvaluateArgs),

    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct SolveArgs {
    /// Where to write the solution snapshot
    #[arg(long)]
    out: PathBuf,

    /// Override the sweep cap
    #[arg(long)]
    max_iters: Option<usize>,

    /// Back up cells on all cores
    #[arg(long)]
    parallel: bool,
}

#[derive(Args, Debug)]
struct CvarArgs {
    /// Solution snapshot written by `solve`
    #[arg(long)]
    input: PathBuf,

    /// Risk level in (0, 1]
    #[arg(long)]
    alpha: f64,

    /// Cell row (requires --col)
    #[arg(long, requires = "col")]
    row: Option<usize>,

    /// Cell column (requires --row)
    #[arg(long, requires = "row")]
    col: Option<usize>,
}

#[derive(Args, Debug)]
struct PathArgs {
    /// Solution snapshot written by `solve`
    #[arg(long)]
    input: PathBuf,

    /// Initial risk level in (0, 1]
    #[arg(long)]
    alpha: f64,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// Solution snapshot written by `solve`
    #[arg(long)]
    input: PathBuf,

    /// Initial risk level in (0, 1]
    #[arg(long, required_unless_present = "sweep")]
    alpha: Option<f64>,

    /// Policy to roll out
    #[arg(long, value_enum, default_value_t = PolicyKind::TimeConsistent)]
    policy: PolicyKind,

    /// Compare both policies over the standard risk levels instead
    #[arg(long, conflicts_with = "alpha")]
    sweep: bool,

    /// Total episodes (split across workers)
    #[arg(long)]
    episodes: Option<usize>,

    /// Number of rollout workers
    #[arg(long)]
    workers: Option<usize>,

    /// Base RNG seed; worker w uses seed + w
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the resolved configuration
    Show,

    /// Validate a config file (or the resolved configuration)
    Validate {
        /// Config file to validate
        path: Option<PathBuf>,
    },

    /// List built-in presets
    Presets,
}

fn main() {
    let cli = Cli::parse();

    let level = LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet);
    let log_config = LogConfig::from_env(level, cli.global.log_format);
    init_logging(&log_config);

    let run_id = generate_run_id();
    info!(event = event_names::RUN_STARTED, %run_id, "cvar-grid started");

    let outcome = match &cli.command {
        Commands::Solve(args) => run_solve(&cli.global, &run_id, args),
        Commands::Cvar(args) => run_cvar(&cli.global, &run_id, args),
        Commands::Path(args) => run_path(&cli.global, &run_id, args),
        Commands::Evaluate(args) => run_evaluate(&cli.global, &run_id, args),
        Commands::Config(args) => run_config(&cli.global, &run_id, args),
    };

    let exit_code = match outcome {
        Ok(code) => code,
        Err(err) => output_error(&cli.global, &run_id, &err),
    };
    info!(
        event = event_names::RUN_FINISHED,
        %run_id,
        exit_code = exit_code.as_i32(),
        "cvar-grid finished"
    );
    std::process::exit(exit_code.as_i32());
}

fn config_options(global: &GlobalOpts) -> ConfigOptions {
    ConfigOptions {
        config_path: global.config.clone(),
        preset: global.preset,
    }
}

fn load(global: &GlobalOpts) -> Result<LoadedConfig> {
    let loaded = load_config(&config_options(global))?;
    info!(
        event = event_names::CONFIG_LOADED,
        stage = %Stage::Init,
        source = %loaded.source,
        path = ?loaded.path,
        "configuration loaded"
    );
    Ok(loaded)
}

/// Common envelope for JSON responses.
fn envelope(run_id: &str, command: &str) -> serde_json::Value {
    serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "run_id": run_id,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "command": command,
    })
}

fn print_json(mut base: serde_json::Value, body: serde_json::Value) {
    if let (Some(base), serde_json::Value::Object(body)) = (base.as_object_mut(), body) {
        base.extend(body);
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&base).unwrap_or_else(|_| base.to_string())
    );
}

fn run_solve(global: &GlobalOpts, run_id: &str, args: &SolveArgs) -> Result<ExitCode> {
    let LoadedConfig {
        mut config,
        source,
        path,
    } = load(global)?;
    if let Some(max_iters) = args.max_iters {
        config.solver.max_iters = max_iters;
    }
    config.solver.parallel |= args.parallel;
    validate_solver(&config.solver)?;

    let world = GridWorld::new(config.world.clone());
    let (vf, outcome) = ValueIteration::new(world, config.solver.clone()).run()?;
    let start = vf.env().initial_state();
    let expected = vf.expected_value(start)?;
    let worst = vf.worst_case_value(start)?;

    let snapshot = Snapshot::from_run(config, source, path.as_deref(), vf, outcome.clone());
    save_snapshot(&args.out, &snapshot)?;

    match global.format {
        OutputFormat::Json => print_json(
            envelope(run_id, "solve"),
            serde_json::json!({
                "out": args.out.display().to_string(),
                "config_hash": snapshot.config_snapshot.config_hash,
                "outcome": outcome,
                "initial_state": start,
                "expected_value": expected,
                "worst_case_value": worst,
            }),
        ),
        OutputFormat::Human => {
            println!(
                "Solved {}x{} grid: {} after {} sweeps",
                snapshot.grid.height(),
                snapshot.grid.width(),
                outcome.status,
                outcome.sweeps
            );
            if let Some(dev) = outcome.last_deviation {
                println!("Last deviation: {:.3e}", dev);
            }
            println!(
                "Atoms: {} total ({} inserted)",
                outcome.total_atoms, outcome.inserted_atoms
            );
            println!("Start {}: expected {:.4}, worst case {:.4}", start, expected, worst);
            println!("Saved to {}", args.out.display());
        }
    }

    Ok(if outcome.converged() {
        ExitCode::Clean
    } else {
        ExitCode::Capped
    })
}

fn run_cvar(global: &GlobalOpts, run_id: &str, args: &CvarArgs) -> Result<ExitCode> {
    let snapshot = load_snapshot(&args.input)?;
    let vf = snapshot.value_function()?;

    if let (Some(row), Some(col)) = (args.row, args.col) {
        let state = State::new(row, col);
        let cvar = vf.cvar_at(state, args.alpha)?;
        let (action, _) = vf.next_action(state, args.alpha)?;
        match global.format {
            OutputFormat::Json => print_json(
                envelope(run_id, "cvar"),
                serde_json::json!({
                    "alpha": args.alpha,
                    "state": state,
                    "cvar": cvar,
                    "action": action,
                }),
            ),
            OutputFormat::Human => {
                println!("CVaR_{} at {} = {:.6} (best action {})", args.alpha, state, cvar, action)
            }
        }
        return Ok(ExitCode::Clean);
    }

    let map = vf.cvar_map(args.alpha)?;
    match global.format {
        OutputFormat::Json => print_json(
            envelope(run_id, "cvar"),
            serde_json::json!({
                "alpha": args.alpha,
                "height": map.len(),
                "width": map.first().map_or(0, Vec::len),
                "cvar": map,
            }),
        ),
        OutputFormat::Human => {
            println!("CVaR_{} by cell (row 0 first):", args.alpha);
            for row in &map {
                let line: Vec<String> = row
                    .iter()
                    .map(|v| match v {
                        Some(v) => format!("{:>8.3}", v),
                        None => format!("{:>8}", "#"),
                    })
                    .collect();
                println!("{}", line.join(" "));
            }
        }
    }
    Ok(ExitCode::Clean)
}

fn run_path(global: &GlobalOpts, run_id: &str, args: &PathArgs) -> Result<ExitCode> {
    let snapshot = load_snapshot(&args.input)?;
    let vf = snapshot.value_function()?;
    let path = vf.optimal_path(args.alpha)?;

    match global.format {
        OutputFormat::Json => print_json(
            envelope(run_id, "path"),
            serde_json::json!({
                "alpha": args.alpha,
                "steps": path.len() - 1,
                "path": path,
            }),
        ),
        OutputFormat::Human => {
            let cells: Vec<String> = path.iter().map(State::to_string).collect();
            println!("{} steps: {}", path.len() - 1, cells.join(" -> "));
        }
    }
    Ok(ExitCode::Clean)
}

fn run_evaluate(global: &GlobalOpts, run_id: &str, args: &EvaluateArgs) -> Result<ExitCode> {
    let snapshot = load_snapshot(&args.input)?;
    let mut rollout = snapshot.config.rollout.clone();
    if let Some(episodes) = args.episodes {
        rollout.episodes = episodes;
    }
    if let Some(workers) = args.workers {
        rollout.workers = workers;
    }
    if let Some(seed) = args.seed {
        rollout.seed = seed;
    }
    validate_rollout(&rollout)?;

    let vf = snapshot.value_function()?;
    let alpha = match args.alpha {
        Some(alpha) if !args.sweep => alpha,
        _ => return run_sweep(global, run_id, &vf, &rollout),
    };
    let stats = evaluate_policy(&vf, args.policy, alpha, &rollout)?;
    let predicted = vf.cvar_at(vf.env().initial_state(), alpha)?;

    match global.format {
        OutputFormat::Json => print_json(
            envelope(run_id, "evaluate"),
            serde_json::json!({
                "stats": stats,
                "predicted_cvar": predicted,
                "horizon": rollout.horizon,
                "seed": rollout.seed,
                "workers": rollout.workers,
            }),
        ),
        OutputFormat::Human => {
            println!(
                "Policy {} at alpha {} over {} episodes",
                stats.policy, stats.alpha, stats.episodes
            );
            println!("  mean  {:>10.4}", stats.mean);
            println!("  VaR   {:>10.4}", stats.var);
            println!("  CVaR  {:>10.4} (value function: {:.4})", stats.cvar, predicted);
        }
    }
    Ok(ExitCode::Clean)
}

/// Both policies over [`SWEEP_ALPHAS`], next to the value function's own
/// CVaR at the initial state.
fn run_sweep(
    global: &GlobalOpts,
    run_id: &str,
    vf: &ValueFunction<GridWorld>,
    rollout: &RolloutConfig,
) -> Result<ExitCode> {
    let start = vf.env().initial_state();
    let predicted = SWEEP_ALPHAS
        .iter()
        .map(|&alpha| vf.cvar_at(start, alpha))
        .collect::<Result<Vec<f64>>>()?;
    let table = sweep_policies(vf, &PolicyKind::ALL, &SWEEP_ALPHAS, rollout)?;

    match global.format {
        OutputFormat::Json => print_json(
            envelope(run_id, "evaluate"),
            serde_json::json!({
                "alphas": SWEEP_ALPHAS,
                "predicted_cvar": predicted,
                "sweep": table,
                "horizon": rollout.horizon,
                "seed": rollout.seed,
                "workers": rollout.workers,
            }),
        ),
        OutputFormat::Human => {
            print!("{:<16}", "alpha");
            for alpha in SWEEP_ALPHAS {
                print!(" {:>9}", alpha);
            }
            println!();
            print!("{:<16}", "value function");
            for cvar in &predicted {
                print!(" {:>9.4}", cvar);
            }
            println!();
            for row in table.chunks(SWEEP_ALPHAS.len()) {
                let name = row.first().map(|s| s.policy.as_str()).unwrap_or_default();
                print!("{:<16}", name);
                for stats in row {
                    print!(" {:>9.4}", stats.cvar);
                }
                println!();
            }
        }
    }
    Ok(ExitCode::Clean)
}

fn run_config(global: &GlobalOpts, run_id: &str, args: &ConfigArgs) -> Result<ExitCode> {
    match &args.command {
        ConfigCommands::Show => {
            let loaded = load(global)?;
            let snapshot = loaded.snapshot();
            match global.format {
                OutputFormat::Json => print_json(
                    envelope(run_id, "config show"),
                    serde_json::json!({
                        "source": {
                            "kind": snapshot.source,
                            "path": snapshot.path,
                            "hash": snapshot.config_hash,
                        },
                        "config": loaded.config,
                    }),
                ),
                OutputFormat::Human => {
                    println!("# cvar-grid config show");
                    println!();
                    match &loaded.path {
                        Some(path) => println!("Source: {} ({})", loaded.source, path.display()),
                        None => println!("Source: {}", loaded.source),
                    }
                    println!("Hash: {}", snapshot.config_hash);
                    println!();
                    println!("{}", loaded.config.to_json_pretty()?);
                }
            }
        }
        ConfigCommands::Validate { path } => {
            let options = ConfigOptions {
                config_path: path.clone().or_else(|| global.config.clone()),
                preset: global.preset,
            };
            let loaded = load_config(&options)?;
            match global.format {
                OutputFormat::Json => print_json(
                    envelope(run_id, "config validate"),
                    serde_json::json!({
                        "status": "valid",
                        "source": loaded.source.to_string(),
                        "path": loaded.path.as_ref().map(|p| p.display().to_string()),
                    }),
                ),
                OutputFormat::Human => match &loaded.path {
                    Some(path) => println!("Valid: {}", path.display()),
                    None => println!("Valid: {}", loaded.source),
                },
            }
        }
        ConfigCommands::Presets => {
            let presets = list_presets();
            match global.format {
                OutputFormat::Json => print_json(
                    envelope(run_id, "config presets"),
                    serde_json::json!({ "presets": presets }),
                ),
                OutputFormat::Human => {
                    for preset in &presets {
                        println!(
                            "{:<10} {:>3}x{:<3} p={:<5} {}",
                            preset.name.as_str(),
                            preset.height,
                            preset.width,
                            preset.random_action_p,
                            preset.description
                        );
                    }
                }
            }
        }
    }
    Ok(ExitCode::Clean)
}

/// Report an error on stderr in the requested format.
fn output_error(global: &GlobalOpts, run_id: &str, err: &Error) -> ExitCode {
    let exit_code = ExitCode::for_error(err);
    error!(
        event = event_names::INTERNAL_ERROR,
        %run_id,
        code = err.code(),
        category = %err.category(),
        "{}",
        err
    );

    match global.format {
        OutputFormat::Json => {
            let mut response = envelope(run_id, "error");
            if let Some(obj) = response.as_object_mut() {
                obj.insert("status".to_string(), serde_json::json!("error"));
                obj.insert("exit_code".to_string(), serde_json::json!(exit_code.code_name()));
                obj.insert("error".to_string(), err.to_json());
            }
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&response).unwrap_or_else(|_| response.to_string())
            );
        }
        OutputFormat::Human => {
            eprintln!("Error: {}", err);
        }
    }
    exit_code
}
