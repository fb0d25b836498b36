//! KellyLab CLI: Monte Carlo simulation, stress tests and position sizing.
//!
//! Commands:
//! - `simulate`: run the full Monte Carlo batch, print the summary, export artifacts
//! - `stress`: run the standard stress scenarios and print the comparison table
//! - `sizing`: print the position-sizing table and expected tier distribution
//! - `analyze`: sizing, worked examples, simulation and stress tests in one run,
//!   ending with a graded recommendation
//! - `plan`: print the fixed-horizon trading plan and its projection
//! - `init-config`: write a TOML settings file with every default filled in

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use kellylab_runner::batch::{progress_stride, run_batch, BatchOptions, BatchProgress};
use kellylab_runner::analysis::run_full_analysis;
use kellylab_runner::export::{
    save_analysis, save_plan, save_simulation, save_sizing, save_stress, PlanExport,
    SimulationExport, SizingExport, SIZING_PROJECTION_TRADES,
};
use kellylab_runner::plan::PlanGenerator;
use kellylab_runner::report::{
    examples_report, plan_report, recommendation_report, simulation_summary, sizing_report,
    stress_table,
};
use kellylab_runner::sizing::PositionSizingCalculator;
use kellylab_runner::stress::{run_stress_tests, standard_scenarios, STRESS_SIMULATIONS};
use kellylab_runner::AnalysisSettings;

#[derive(Parser)]
#[command(
    name = "kellylab",
    about = "KellyLab CLI: tier-aware Kelly sizing and Monte Carlo risk analysis"
)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of the settings file.
#[derive(Args, Debug, Clone, Default)]
struct SimulationOverrides {
    /// Path to a TOML settings file. Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of trajectories.
    #[arg(long)]
    simulations: Option<usize>,

    /// Trades per trajectory.
    #[arg(long)]
    trades: Option<usize>,

    /// Initial capital.
    #[arg(long)]
    capital: Option<f64>,

    /// Master seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Size every trade from initial capital.
    #[arg(long, default_value_t = false)]
    no_compounding: bool,

    /// Worker threads. Defaults to all cores.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Monte Carlo batch and export results.
    Simulate {
        #[command(flatten)]
        overrides: SimulationOverrides,

        /// Output directory for simulation_results.json and sample_equity.csv.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Skip writing artifacts.
        #[arg(long, default_value_t = false)]
        no_export: bool,
    },
    /// Run the standard stress scenarios.
    Stress {
        #[command(flatten)]
        overrides: SimulationOverrides,

        /// Output directory for stress_results.json.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Print the position-sizing table.
    Sizing {
        /// Path to a TOML settings file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Portfolio capital.
        #[arg(long)]
        capital: Option<f64>,

        /// Trades in the expected-distribution projection.
        #[arg(long, default_value_t = SIZING_PROJECTION_TRADES)]
        trades: usize,

        /// Output directory for position_sizing.json.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Run sizing, simulation and stress tests together and grade the result.
    Analyze {
        #[command(flatten)]
        overrides: SimulationOverrides,

        /// Output directory for every artifact.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Skip writing artifacts.
        #[arg(long, default_value_t = false)]
        no_export: bool,
    },
    /// Print the fixed-horizon trading plan.
    Plan {
        /// Path to a TOML settings file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Starting capital.
        #[arg(long)]
        capital: Option<f64>,

        /// Plan length in days.
        #[arg(long)]
        days: Option<usize>,

        /// Trades per day.
        #[arg(long)]
        trades_per_day: Option<usize>,

        /// Output directory for trading_plan.json.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Write a settings file populated with defaults.
    InitConfig {
        /// Destination path.
        #[arg(long, default_value = "kellylab.toml")]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Simulate {
            overrides,
            output_dir,
            no_export,
        } => run_simulate(&overrides, &output_dir, no_export),
        Commands::Stress {
            overrides,
            output_dir,
        } => run_stress(&overrides, output_dir.as_deref()),
        Commands::Sizing {
            config,
            capital,
            trades,
            output_dir,
        } => run_sizing(config.as_deref(), capital, trades, output_dir.as_deref()),
        Commands::Analyze {
            overrides,
            output_dir,
            no_export,
        } => run_analyze(&overrides, &output_dir, no_export),
        Commands::Plan {
            config,
            capital,
            days,
            trades_per_day,
            output_dir,
        } => run_plan(
            config.as_deref(),
            PlanOverrides {
                capital,
                days,
                trades_per_day,
            },
            output_dir.as_deref(),
        ),
        Commands::InitConfig { path, force } => run_init_config(&path, force),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "kellylab_runner={default_level},kellylab={default_level},warn"
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(path: Option<&Path>) -> Result<AnalysisSettings> {
    match path {
        Some(path) => AnalysisSettings::from_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display())),
        None => Ok(AnalysisSettings::default()),
    }
}

/// Load the settings file and apply CLI overrides, revalidating afterwards.
fn resolve_settings(overrides: &SimulationOverrides, default_simulations: Option<usize>) -> Result<AnalysisSettings> {
    let mut settings = load_settings(overrides.config.as_deref())?;
    let sim = &mut settings.simulation;

    if let Some(m) = overrides.simulations.or(default_simulations) {
        sim.num_simulations = m;
    }
    if let Some(n) = overrides.trades {
        sim.num_trades = n;
    }
    if let Some(c) = overrides.capital {
        sim.initial_capital = c;
    }
    if let Some(seed) = overrides.seed {
        sim.master_seed = seed;
    }
    if overrides.no_compounding {
        sim.use_compounding = false;
    }

    settings.validate().context("invalid configuration after overrides")?;
    Ok(settings)
}

/// Every tenth batch callback, plus the final one.
fn is_log_point(p: BatchProgress) -> bool {
    let step = progress_stride(p.total) * 10;
    p.completed % step == 0 || p.completed == p.total
}

fn progress_logger(label: &'static str) -> impl Fn(BatchProgress) + Sync {
    move |p: BatchProgress| {
        if is_log_point(p) {
            info!(completed = p.completed, total = p.total, "{label}");
        }
    }
}

fn run_simulate(overrides: &SimulationOverrides, output_dir: &Path, no_export: bool) -> Result<()> {
    let settings = resolve_settings(overrides, None)?;
    let progress = progress_logger("simulating");
    let options = BatchOptions::default()
        .with_threads(overrides.threads)
        .with_progress(&progress);

    let outcome = run_batch(&settings.stats, &settings.simulation, &options)?;

    println!(
        "{}",
        simulation_summary(
            &outcome.analysis,
            settings.simulation.initial_capital,
            Some(&outcome.diagnostics),
        )
    );
    println!("Completed in {:.2}s", outcome.elapsed.as_secs_f64());

    if !no_export {
        let export = SimulationExport::new(&settings.stats, &settings.simulation, &outcome);
        let artifacts = save_simulation(&export, output_dir)?;
        println!("Results exported to: {}", artifacts.results_json.display());
        println!("Sample curves exported to: {}", artifacts.samples_csv.display());
    }
    Ok(())
}

fn run_stress(overrides: &SimulationOverrides, output_dir: Option<&Path>) -> Result<()> {
    let settings = resolve_settings(overrides, Some(STRESS_SIMULATIONS))?;
    let scenarios = standard_scenarios(
        &settings.stats,
        &settings.simulation,
        settings.simulation.num_simulations,
    );
    let options = BatchOptions::default().with_threads(overrides.threads);

    let outcomes = run_stress_tests(&scenarios, &options)?;
    println!("{}", stress_table(&outcomes));

    if let Some(dir) = output_dir {
        let path = save_stress(&outcomes, dir)?;
        println!("Stress results exported to: {}", path.display());
    }
    Ok(())
}

fn run_sizing(
    config: Option<&Path>,
    capital: Option<f64>,
    trades: usize,
    output_dir: Option<&Path>,
) -> Result<()> {
    if trades == 0 {
        bail!("--trades must be at least 1");
    }
    let mut settings = load_settings(config)?;
    if let Some(capital) = capital {
        settings.portfolio.total_capital = capital;
    }

    let calculator = PositionSizingCalculator::new(settings.portfolio)?;
    let distribution = calculator.expected_distribution(trades);
    println!("{}", sizing_report(&calculator, &distribution));

    if let Some(dir) = output_dir {
        let path = save_sizing(&SizingExport::new(&calculator, trades), dir)?;
        println!("Position sizing table exported to: {}", path.display());
    }
    Ok(())
}

fn run_analyze(overrides: &SimulationOverrides, output_dir: &Path, no_export: bool) -> Result<()> {
    let settings = resolve_settings(overrides, None)?;
    let progress = progress_logger("simulating");
    let options = BatchOptions::default()
        .with_threads(overrides.threads)
        .with_progress(&progress);

    let analysis = run_full_analysis(&settings, &options)?;

    println!("{}", sizing_report(&analysis.calculator, &analysis.distribution));
    println!("{}", examples_report(&analysis.examples));
    println!(
        "{}",
        simulation_summary(
            &analysis.simulation.analysis,
            settings.simulation.initial_capital,
            Some(&analysis.simulation.diagnostics),
        )
    );
    println!("{}", stress_table(&analysis.stress));
    println!("{}", recommendation_report(&analysis.recommendation));

    if !no_export {
        let artifacts = save_analysis(&analysis, &settings.stats, &settings.simulation, output_dir)?;
        println!("Summary exported to: {}", artifacts.summary_json.display());
        println!("Simulation exported to: {}", artifacts.simulation.results_json.display());
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
struct PlanOverrides {
    capital: Option<f64>,
    days: Option<usize>,
    trades_per_day: Option<usize>,
}

fn build_plan_generator(config: Option<&Path>, overrides: PlanOverrides) -> Result<PlanGenerator> {
    let mut plan = load_settings(config)?.plan;
    if let Some(capital) = overrides.capital {
        plan.starting_capital = capital;
    }
    if let Some(days) = overrides.days {
        plan.days = days;
    }
    if let Some(n) = overrides.trades_per_day {
        plan.trades_per_day = n;
    }
    PlanGenerator::new(plan).context("invalid plan configuration")
}

fn run_plan(config: Option<&Path>, overrides: PlanOverrides, output_dir: Option<&Path>) -> Result<()> {
    let generator = build_plan_generator(config, overrides)?;
    let plan = generator.generate();
    println!("{}", plan_report(&plan));

    if let Some(dir) = output_dir {
        let path = save_plan(&PlanExport::new(generator.config(), &plan), dir)?;
        println!("Trading plan exported to: {}", path.display());
    }
    Ok(())
}

fn run_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    let text = AnalysisSettings::default().to_toml_string()?;
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Default settings written to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn overrides_replace_file_values() {
        let overrides = SimulationOverrides {
            simulations: Some(25),
            trades: Some(10),
            capital: Some(5_000.0),
            seed: Some(9),
            no_compounding: true,
            ..Default::default()
        };
        let settings = resolve_settings(&overrides, Some(STRESS_SIMULATIONS)).unwrap();
        assert_eq!(settings.simulation.num_simulations, 25);
        assert_eq!(settings.simulation.num_trades, 10);
        assert_eq!(settings.simulation.initial_capital, 5_000.0);
        assert_eq!(settings.simulation.master_seed, 9);
        assert!(!settings.simulation.use_compounding);
    }

    #[test]
    fn stress_default_applies_without_explicit_count() {
        let settings = resolve_settings(&SimulationOverrides::default(), Some(STRESS_SIMULATIONS)).unwrap();
        assert_eq!(settings.simulation.num_simulations, STRESS_SIMULATIONS);
    }

    #[test]
    fn progress_logs_roughly_every_tenth_of_the_batch() {
        for total in [7, 100, 1_234, 10_000, 99_999] {
            let stride = progress_stride(total);
            let logged = (1..=total)
                .filter(|done| done % stride == 0 || *done == total)
                .filter(|&completed| is_log_point(BatchProgress { completed, total }))
                .count();
            assert!((10..=12).contains(&logged) || total < 10, "total {total}: {logged} logs");
            assert!(is_log_point(BatchProgress { completed: total, total }));
        }
    }

    #[test]
    fn plan_overrides_apply_and_validate() {
        let generator = build_plan_generator(
            None,
            PlanOverrides {
                capital: Some(500.0),
                days: Some(10),
                trades_per_day: None,
            },
        )
        .unwrap();
        assert_eq!(generator.config().starting_capital, 500.0);
        assert_eq!(generator.config().total_trades(), 50);

        let zero_days = PlanOverrides {
            days: Some(0),
            ..Default::default()
        };
        assert!(build_plan_generator(None, zero_days).is_err());
    }

    #[test]
    fn parses_analyze_and_plan_commands() {
        let cli = Cli::try_parse_from(["kellylab", "analyze", "--simulations", "200", "--no-export"]).unwrap();
        match cli.command {
            Commands::Analyze {
                overrides, no_export, ..
            } => {
                assert_eq!(overrides.simulations, Some(200));
                assert!(no_export);
            }
            _ => panic!("expected analyze"),
        }

        let cli = Cli::try_parse_from(["kellylab", "plan", "--capital", "250", "--trades-per-day", "3"]).unwrap();
        match cli.command {
            Commands::Plan {
                capital,
                trades_per_day,
                ..
            } => {
                assert_eq!(capital, Some(250.0));
                assert_eq!(trades_per_day, Some(3));
            }
            _ => panic!("expected plan"),
        }
    }

    #[test]
    fn invalid_override_is_rejected() {
        let overrides = SimulationOverrides {
            capital: Some(0.0),
            ..Default::default()
        };
        assert!(resolve_settings(&overrides, None).is_err());
    }

    #[test]
    fn parses_simulate_flags() {
        let cli = Cli::try_parse_from([
            "kellylab",
            "simulate",
            "--simulations",
            "100",
            "--no-compounding",
            "--threads",
            "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate { overrides, .. } => {
                assert_eq!(overrides.simulations, Some(100));
                assert!(overrides.no_compounding);
                assert_eq!(overrides.threads, Some(2));
            }
            _ => panic!("expected simulate"),
        }
    }
}
