//! Fixed-horizon trading plan: per-tier sizing, trade allocation by tier and
//! strategy, and a deterministic outcome projection.
//!
//! Sizing here is more aggressive than the Monte Carlo engine: Kelly ×
//! aggression, capped at a share of capital, with a recommended
//! leverage per tier and margin = size / leverage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use kellylab_core::config::DISTRIBUTION_TOLERANCE;
use kellylab_core::{ConfidenceTier, ConfigError, TierTable};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid plan configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("plan needs at least one day and one trade per day")]
    EmptyHorizon,
    #[error("plan needs at least one strategy")]
    NoStrategies,
    #[error("strategy shares sum to {sum}, expected 1 within 1e-6")]
    StrategyMixSum { sum: f64 },
    #[error("recommended leverage for {tier} must be >= 1, got {value}")]
    InvalidLeverage { tier: ConfidenceTier, value: f64 },
    #[error("reference position size must be > 0, got {0}")]
    NonPositiveReference(f64),
}

/// A named strategy and its share of trades within every tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyShare {
    pub name: String,
    pub share: f64,
}

impl StrategyShare {
    pub fn new(name: impl Into<String>, share: f64) -> Self {
        Self {
            name: name.into(),
            share,
        }
    }
}

/// Conditions under which trading should pause.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HaltRules {
    /// Percent of capital lost in one day.
    pub max_daily_loss_pct: f64,
    /// Minimum win rate over the trailing window.
    pub min_win_rate: f64,
    pub win_rate_window: usize,
    pub max_losing_days: usize,
    /// Percent below the running peak.
    pub max_drawdown_pct: f64,
}

impl Default for HaltRules {
    fn default() -> Self {
        Self {
            max_daily_loss_pct: 10.0,
            min_win_rate: 0.40,
            win_rate_window: 25,
            max_losing_days: 3,
            max_drawdown_pct: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub starting_capital: f64,
    pub days: usize,
    pub trades_per_day: usize,
    /// Share of trades per tier.
    pub confidence_mix: TierTable<f64>,
    pub strategies: Vec<StrategyShare>,
    pub kelly_fractions: TierTable<f64>,
    /// Multiplier on the Kelly fraction.
    pub aggression: f64,
    /// Cap on a single position as a fraction of capital.
    pub max_single_position_pct: f64,
    pub recommended_leverage: TierTable<f64>,
    /// Stop distance as a fraction of the position.
    pub stop_loss_pct: f64,
    /// Cap on total exposure as a multiple of capital.
    pub max_total_exposure: f64,
    pub win_rates: TierTable<f64>,
    /// Historical average PnL per trade, earned at `reference_position_size`.
    pub pnl_per_trade: TierTable<f64>,
    pub reference_position_size: f64,
    /// Fraction of the expected PnL kept in the conservative projection.
    pub conservative_factor: f64,
    pub halt: HaltRules,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            starting_capital: 100.0,
            days: 30,
            trades_per_day: 5,
            confidence_mix: TierTable::new(0.68, 0.32, 0.0),
            strategies: vec![
                StrategyShare::new("Q-Pulse", 0.75),
                StrategyShare::new("Q-Trend", 0.23),
                StrategyShare::new("Q-Mean-Rev", 0.02),
            ],
            kelly_fractions: TierTable::new(0.146, 0.110, 0.055),
            aggression: 1.5,
            max_single_position_pct: 0.50,
            recommended_leverage: TierTable::new(10.0, 5.0, 2.0),
            stop_loss_pct: 0.02,
            max_total_exposure: 2.0,
            win_rates: TierTable::new(0.625, 0.50, 0.45),
            pnl_per_trade: TierTable::new(3.91, 1.12, 0.0),
            reference_position_size: 146.0,
            conservative_factor: 0.70,
            halt: HaltRules::default(),
        }
    }
}

impl PlanConfig {
    pub fn total_trades(&self) -> usize {
        self.days * self.trades_per_day
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if !self.starting_capital.is_finite() || self.starting_capital <= 0.0 {
            return Err(ConfigError::NonPositiveCapital(self.starting_capital).into());
        }
        if self.total_trades() == 0 {
            return Err(PlanError::EmptyHorizon);
        }
        for (tier, p) in self.confidence_mix.iter() {
            if !p.is_finite() || !(0.0..=1.0).contains(p) {
                return Err(ConfigError::InvalidProbability {
                    field: "plan.confidence_mix",
                    tier,
                    value: *p,
                }
                .into());
            }
        }
        let sum = self.confidence_mix.sum();
        if (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE {
            return Err(ConfigError::DistributionSum { sum }.into());
        }
        if self.strategies.is_empty() {
            return Err(PlanError::NoStrategies);
        }
        let sum: f64 = self.strategies.iter().map(|s| s.share).sum();
        if self.strategies.iter().any(|s| !s.share.is_finite() || s.share < 0.0)
            || (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE
        {
            return Err(PlanError::StrategyMixSum { sum });
        }
        for (tier, p) in self.win_rates.iter() {
            if !p.is_finite() || !(0.0..=1.0).contains(p) {
                return Err(ConfigError::InvalidProbability {
                    field: "plan.win_rates",
                    tier,
                    value: *p,
                }
                .into());
            }
        }
        for (tier, leverage) in self.recommended_leverage.iter() {
            if !leverage.is_finite() || *leverage < 1.0 {
                return Err(PlanError::InvalidLeverage {
                    tier,
                    value: *leverage,
                });
            }
        }
        for (_, k) in self.kelly_fractions.iter() {
            if !k.is_finite() || *k < 0.0 {
                return Err(ConfigError::InvalidFraction {
                    field: "plan.kelly_fractions",
                    value: *k,
                }
                .into());
            }
        }
        let fractions = [
            ("plan.aggression", self.aggression),
            ("plan.max_single_position_pct", self.max_single_position_pct),
            ("plan.stop_loss_pct", self.stop_loss_pct),
            ("plan.max_total_exposure", self.max_total_exposure),
            ("plan.conservative_factor", self.conservative_factor),
        ];
        for (field, value) in fractions {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidFraction { field, value }.into());
            }
        }
        if !self.reference_position_size.is_finite() || self.reference_position_size <= 0.0 {
            return Err(PlanError::NonPositiveReference(self.reference_position_size));
        }
        Ok(())
    }
}

/// Sizing of one tier at the starting capital.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanPosition {
    pub tier: ConfidenceTier,
    pub position_size: f64,
    pub leverage: f64,
    pub margin_required: f64,
    /// Percent.
    pub stop_loss_pct: f64,
    pub risk_amount: f64,
    /// Percent of capital.
    pub risk_pct_of_capital: f64,
    /// Aggression-adjusted Kelly fraction, percent.
    pub kelly_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyCount {
    pub strategy: String,
    pub count: usize,
}

/// Trades of one tier split across strategies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTrades {
    pub total: usize,
    pub by_strategy: Vec<StrategyCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanProjection {
    pub total_trades: usize,
    pub expected_wins: usize,
    pub expected_losses: usize,
    /// Percent.
    pub expected_win_rate: f64,
    pub expected_pnl: f64,
    pub conservative_pnl: f64,
    pub expected_final_capital: f64,
    /// Percent, from the conservative PnL.
    pub expected_roi: f64,
    pub avg_pnl_per_trade: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Percent.
    pub stop_loss_pct: f64,
    pub recommended_leverage: TierTable<f64>,
    pub max_single_position: f64,
    pub max_total_exposure: f64,
    pub halt: HaltRules,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingPlan {
    pub starting_capital: f64,
    pub days: usize,
    pub trades_per_day: usize,
    pub positions: Vec<PlanPosition>,
    pub distribution: TierTable<TierTrades>,
    pub projection: PlanProjection,
    pub risk: RiskLimits,
}

#[derive(Debug, Clone)]
pub struct PlanGenerator {
    config: PlanConfig,
}

impl PlanGenerator {
    pub fn new(config: PlanConfig) -> Result<Self, PlanError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PlanConfig {
        &self.config
    }

    /// Size a position for `tier` at `capital`.
    pub fn position(&self, tier: ConfidenceTier, capital: f64) -> PlanPosition {
        let cfg = &self.config;
        let kelly = cfg.kelly_fractions.get(tier) * cfg.aggression;
        let position_size = (capital * kelly).min(capital * cfg.max_single_position_pct);
        let leverage = *cfg.recommended_leverage.get(tier);
        let risk_amount = position_size * cfg.stop_loss_pct;
        PlanPosition {
            tier,
            position_size,
            leverage,
            margin_required: position_size / leverage,
            stop_loss_pct: cfg.stop_loss_pct * 100.0,
            risk_amount,
            risk_pct_of_capital: risk_amount / capital * 100.0,
            kelly_pct: kelly * 100.0,
        }
    }

    /// Tier counts are floored; the last tier with a positive share takes the
    /// remainder. Within a tier, every strategy but the last is floored and
    /// the last takes the remainder.
    pub fn trade_distribution(&self) -> TierTable<TierTrades> {
        let cfg = &self.config;
        let total = cfg.total_trades();
        let mut counts = cfg
            .confidence_mix
            .map(|share| (total as f64 * share).floor() as usize);
        let assigned: usize = counts.iter().map(|(_, c)| *c).sum();
        if let Some(last) = ConfidenceTier::ALL
            .into_iter()
            .rev()
            .find(|tier| *cfg.confidence_mix.get(*tier) > 0.0)
        {
            *counts.get_mut(last) += total.saturating_sub(assigned);
        }
        counts.map(|&count| self.split_by_strategy(count))
    }

    fn split_by_strategy(&self, total: usize) -> TierTrades {
        let strategies = &self.config.strategies;
        let mut remaining = total;
        let by_strategy = strategies
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let count = if i + 1 == strategies.len() {
                    remaining
                } else {
                    ((total as f64 * s.share).floor() as usize).min(remaining)
                };
                remaining -= count;
                StrategyCount {
                    strategy: s.name.clone(),
                    count,
                }
            })
            .collect();
        TierTrades { total, by_strategy }
    }

    /// Expected outcome of the plan from historical per-trade PnL.
    ///
    /// Historical PnL is rescaled by the HIGH-tier plan position relative to
    /// the reference position it was earned at.
    pub fn project(&self, distribution: &TierTable<TierTrades>) -> PlanProjection {
        let cfg = &self.config;
        let total_trades = cfg.total_trades();
        let high_size = cfg.starting_capital * cfg.kelly_fractions.high * cfg.aggression;
        let position_scale = high_size / cfg.reference_position_size;

        let counts = distribution.map(|t| t.total as f64);
        let expected_pnl = counts.weighted_by(&cfg.pnl_per_trade) * position_scale;
        let conservative_pnl = expected_pnl * cfg.conservative_factor;
        let expected_final_capital = cfg.starting_capital + conservative_pnl;

        let expected_wins = (counts.weighted_by(&cfg.win_rates).floor() as usize).min(total_trades);
        let expected_losses = total_trades - expected_wins;

        PlanProjection {
            total_trades,
            expected_wins,
            expected_losses,
            expected_win_rate: expected_wins as f64 / total_trades as f64 * 100.0,
            expected_pnl,
            conservative_pnl,
            expected_final_capital,
            expected_roi: conservative_pnl / cfg.starting_capital * 100.0,
            avg_pnl_per_trade: expected_pnl / total_trades as f64,
        }
    }

    /// Build the full plan at the starting capital. Tiers with no share of
    /// trades get no sizing row.
    pub fn generate(&self) -> TradingPlan {
        let cfg = &self.config;
        let positions = ConfidenceTier::ALL
            .into_iter()
            .filter(|tier| *cfg.confidence_mix.get(*tier) > 0.0)
            .map(|tier| self.position(tier, cfg.starting_capital))
            .collect();
        let distribution = self.trade_distribution();
        let projection = self.project(&distribution);

        TradingPlan {
            starting_capital: cfg.starting_capital,
            days: cfg.days,
            trades_per_day: cfg.trades_per_day,
            positions,
            distribution,
            projection,
            risk: RiskLimits {
                stop_loss_pct: cfg.stop_loss_pct * 100.0,
                recommended_leverage: cfg.recommended_leverage,
                max_single_position: cfg.starting_capital * cfg.max_single_position_pct,
                max_total_exposure: cfg.starting_capital * cfg.max_total_exposure,
                halt: cfg.halt,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> PlanGenerator {
        PlanGenerator::new(PlanConfig::default()).unwrap()
    }

    fn counts(trades: &TierTrades) -> Vec<usize> {
        trades.by_strategy.iter().map(|s| s.count).collect()
    }

    #[test]
    fn high_tier_position_uses_aggressive_kelly() {
        let pos = generator().position(ConfidenceTier::High, 100.0);
        assert!((pos.position_size - 21.9).abs() < 1e-9);
        assert_eq!(pos.leverage, 10.0);
        assert!((pos.margin_required - 2.19).abs() < 1e-9);
        assert!((pos.risk_amount - 0.438).abs() < 1e-9);
        assert!((pos.risk_pct_of_capital - 0.438).abs() < 1e-9);
        assert!((pos.kelly_pct - 21.9).abs() < 1e-9);
    }

    #[test]
    fn single_position_cap_binds_for_large_kelly() {
        let planner = PlanGenerator::new(PlanConfig {
            kelly_fractions: TierTable::splat(0.5),
            ..Default::default()
        })
        .unwrap();
        let pos = planner.position(ConfidenceTier::Medium, 100.0);
        assert!((pos.position_size - 50.0).abs() < 1e-9);
    }

    #[test]
    fn distribution_splits_by_tier_then_strategy() {
        let dist = generator().trade_distribution();
        assert_eq!(dist.high.total, 102);
        assert_eq!(counts(&dist.high), vec![76, 23, 3]);
        assert_eq!(dist.medium.total, 48);
        assert_eq!(counts(&dist.medium), vec![36, 11, 1]);
        assert_eq!(dist.low.total, 0);
        assert_eq!(counts(&dist.low), vec![0, 0, 0]);
    }

    #[test]
    fn remainder_goes_to_last_tier_with_a_share() {
        let planner = PlanGenerator::new(PlanConfig {
            days: 1,
            trades_per_day: 7,
            confidence_mix: TierTable::new(0.5, 0.5, 0.0),
            ..Default::default()
        })
        .unwrap();
        let dist = planner.trade_distribution();
        assert_eq!(dist.high.total, 3);
        assert_eq!(dist.medium.total, 4);
        assert_eq!(dist.low.total, 0);
    }

    #[test]
    fn projection_scales_historical_pnl_and_applies_haircut() {
        let planner = generator();
        let proj = planner.project(&planner.trade_distribution());
        // Scale 21.9 / 146 = 0.15; (102 × 3.91 + 48 × 1.12) × 0.15 = 67.887.
        assert_eq!(proj.total_trades, 150);
        assert!((proj.expected_pnl - 67.887).abs() < 1e-9);
        assert!((proj.conservative_pnl - 47.5209).abs() < 1e-9);
        assert!((proj.expected_final_capital - 147.5209).abs() < 1e-9);
        assert!((proj.expected_roi - 47.5209).abs() < 1e-9);
        // 102 × 0.625 + 48 × 0.5 = 87.75 → 87 wins.
        assert_eq!(proj.expected_wins, 87);
        assert_eq!(proj.expected_losses, 63);
        assert!((proj.expected_win_rate - 58.0).abs() < 1e-9);
        assert!((proj.avg_pnl_per_trade - 67.887 / 150.0).abs() < 1e-12);
    }

    #[test]
    fn generated_plan_sizes_only_active_tiers() {
        let plan = generator().generate();
        let tiers: Vec<_> = plan.positions.iter().map(|p| p.tier).collect();
        assert_eq!(tiers, vec![ConfidenceTier::High, ConfidenceTier::Medium]);
        assert!((plan.risk.max_single_position - 50.0).abs() < 1e-9);
        assert!((plan.risk.max_total_exposure - 200.0).abs() < 1e-9);
        assert_eq!(plan.risk.halt.win_rate_window, 25);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let empty = PlanConfig {
            days: 0,
            ..Default::default()
        };
        assert!(matches!(PlanGenerator::new(empty), Err(PlanError::EmptyHorizon)));

        let bad_mix = PlanConfig {
            strategies: vec![StrategyShare::new("Only", 0.9)],
            ..Default::default()
        };
        assert!(matches!(
            PlanGenerator::new(bad_mix),
            Err(PlanError::StrategyMixSum { .. })
        ));

        let bad_leverage = PlanConfig {
            recommended_leverage: TierTable::new(10.0, 0.5, 2.0),
            ..Default::default()
        };
        assert!(matches!(
            PlanGenerator::new(bad_leverage),
            Err(PlanError::InvalidLeverage {
                tier: ConfidenceTier::Medium,
                ..
            })
        ));
    }
}
