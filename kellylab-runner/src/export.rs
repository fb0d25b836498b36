//! Export: JSON and CSV artifacts for simulation, stress and sizing runs.
//!
//! Provides:
//! - **JSON**: full simulation document with schema versioning
//! - **CSV**: sample equity/drawdown curves in long format for charting tools
//! - **JSON**: stress-scenario table and position-sizing table
//! - **JSON**: trading plan, and the recommendation of a full analysis
//!
//! Persisted simulation documents carry a `schema_version`; newer versions
//! are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kellylab_core::{SimulationConfig, StrategyStats};

use crate::aggregation::AggregateAnalysis;
use crate::analysis::{FullAnalysis, Recommendation};
use crate::batch::{BatchOutcome, SampleTrajectory, WinRateDiagnostics};
use crate::plan::{PlanConfig, TradingPlan};
use crate::sizing::{
    ExampleResult, PortfolioConfig, PortfolioDistribution, PositionSizingCalculator, SizingRow,
};
use crate::stress::StressOutcome;

pub const SCHEMA_VERSION: u32 = 1;

pub const SIMULATION_FILE: &str = "simulation_results.json";
pub const SAMPLE_EQUITY_FILE: &str = "sample_equity.csv";
pub const STRESS_FILE: &str = "stress_results.json";
pub const SIZING_FILE: &str = "position_sizing.json";
pub const PLAN_FILE: &str = "trading_plan.json";
pub const ANALYSIS_FILE: &str = "analysis_summary.json";

/// Trades projected in the exported expected distribution.
pub const SIZING_PROJECTION_TRADES: usize = 100;

/// Everything needed to reproduce and chart one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationExport {
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    pub stats: StrategyStats,
    pub config: SimulationConfig,
    pub analysis: AggregateAnalysis,
    pub diagnostics: WinRateDiagnostics,
    pub samples: Vec<SampleTrajectory>,
}

impl SimulationExport {
    pub fn new(stats: &StrategyStats, config: &SimulationConfig, outcome: &BatchOutcome) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            stats: stats.clone(),
            config: config.clone(),
            analysis: outcome.analysis.clone(),
            diagnostics: outcome.diagnostics,
            samples: outcome.samples.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingExport {
    pub schema_version: u32,
    pub portfolio_capital: f64,
    pub sizing_table: Vec<SizingRow>,
    pub expected_distribution: PortfolioDistribution,
    pub configuration: PortfolioConfig,
}

impl SizingExport {
    pub fn new(calculator: &PositionSizingCalculator, projected_trades: usize) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            portfolio_capital: calculator.config().total_capital,
            sizing_table: calculator.sizing_table(),
            expected_distribution: calculator.expected_distribution(projected_trades),
            configuration: calculator.config().clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanExport {
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    pub configuration: PlanConfig,
    pub plan: TradingPlan,
}

impl PlanExport {
    pub fn new(config: &PlanConfig, plan: &TradingPlan) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            configuration: config.clone(),
            plan: plan.clone(),
        }
    }
}

/// Headline document of a full analysis; the detailed artifacts sit beside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisExport {
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    pub recommendation: Recommendation,
    pub examples: Vec<ExampleResult>,
    pub stress: Vec<StressOutcome>,
}

impl AnalysisExport {
    pub fn new(analysis: &FullAnalysis) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            recommendation: analysis.recommendation,
            examples: analysis.examples.clone(),
            stress: analysis.stress.clone(),
        }
    }
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(export: &SimulationExport) -> Result<String> {
    serde_json::to_string_pretty(export).context("failed to serialize simulation results to JSON")
}

/// Deserialize a simulation document, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<SimulationExport> {
    let export: SimulationExport =
        serde_json::from_str(json).context("failed to deserialize simulation results from JSON")?;
    if export.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            export.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(export)
}

pub fn export_stress_json(outcomes: &[StressOutcome]) -> Result<String> {
    serde_json::to_string_pretty(outcomes).context("failed to serialize stress results to JSON")
}

pub fn export_sizing_json(export: &SizingExport) -> Result<String> {
    serde_json::to_string_pretty(export).context("failed to serialize sizing table to JSON")
}

pub fn export_plan_json(export: &PlanExport) -> Result<String> {
    serde_json::to_string_pretty(export).context("failed to serialize trading plan to JSON")
}

pub fn export_analysis_json(export: &AnalysisExport) -> Result<String> {
    serde_json::to_string_pretty(export).context("failed to serialize analysis summary to JSON")
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Sample curves in long format.
///
/// Columns: trajectory, trade_index, equity, drawdown_pct
pub fn export_samples_csv(samples: &[SampleTrajectory]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["trajectory", "trade_index", "equity", "drawdown_pct"])?;
    for sample in samples {
        for (i, (equity, dd)) in sample
            .equity_curve
            .iter()
            .zip(&sample.drawdown_curve)
            .enumerate()
        {
            wtr.write_record([
                &sample.index.to_string(),
                &i.to_string(),
                &format!("{:.2}", equity),
                &format!("{:.4}", dd),
            ])?;
        }
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact files ─────────────────────────────────────────────────

/// Paths written by [`save_simulation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationArtifacts {
    pub results_json: PathBuf,
    pub samples_csv: PathBuf,
}

/// Write `simulation_results.json` and `sample_equity.csv` under `output_dir`,
/// creating it if needed.
pub fn save_simulation(export: &SimulationExport, output_dir: &Path) -> Result<SimulationArtifacts> {
    ensure_dir(output_dir)?;
    let results_json = output_dir.join(SIMULATION_FILE);
    write_file(&results_json, &export_json(export)?)?;
    let samples_csv = output_dir.join(SAMPLE_EQUITY_FILE);
    write_file(&samples_csv, &export_samples_csv(&export.samples)?)?;
    Ok(SimulationArtifacts {
        results_json,
        samples_csv,
    })
}

/// Load a simulation document written by [`save_simulation`].
pub fn load_simulation(output_dir: &Path) -> Result<SimulationExport> {
    let path = output_dir.join(SIMULATION_FILE);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

pub fn save_stress(outcomes: &[StressOutcome], output_dir: &Path) -> Result<PathBuf> {
    ensure_dir(output_dir)?;
    let path = output_dir.join(STRESS_FILE);
    write_file(&path, &export_stress_json(outcomes)?)?;
    Ok(path)
}

pub fn save_sizing(export: &SizingExport, output_dir: &Path) -> Result<PathBuf> {
    ensure_dir(output_dir)?;
    let path = output_dir.join(SIZING_FILE);
    write_file(&path, &export_sizing_json(export)?)?;
    Ok(path)
}

pub fn save_plan(export: &PlanExport, output_dir: &Path) -> Result<PathBuf> {
    ensure_dir(output_dir)?;
    let path = output_dir.join(PLAN_FILE);
    write_file(&path, &export_plan_json(export)?)?;
    Ok(path)
}

/// Paths written by [`save_analysis`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisArtifacts {
    pub summary_json: PathBuf,
    pub sizing_json: PathBuf,
    pub simulation: SimulationArtifacts,
    pub stress_json: PathBuf,
}

/// Write every artifact of a full analysis under `output_dir`.
pub fn save_analysis(
    analysis: &FullAnalysis,
    stats: &StrategyStats,
    config: &SimulationConfig,
    output_dir: &Path,
) -> Result<AnalysisArtifacts> {
    ensure_dir(output_dir)?;
    let sizing_json = save_sizing(
        &SizingExport::new(&analysis.calculator, analysis.distribution.total_trades),
        output_dir,
    )?;
    let simulation = save_simulation(
        &SimulationExport::new(stats, config, &analysis.simulation),
        output_dir,
    )?;
    let stress_json = save_stress(&analysis.stress, output_dir)?;
    let summary_json = output_dir.join(ANALYSIS_FILE);
    write_file(&summary_json, &export_analysis_json(&AnalysisExport::new(analysis))?)?;
    Ok(AnalysisArtifacts {
        summary_json,
        sizing_json,
        simulation,
        stress_json,
    })
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output dir: {}", dir.display()))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
