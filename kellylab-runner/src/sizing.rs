//! Standalone position-sizing calculator for a multi-position portfolio.
//!
//! Layers portfolio constraints over the core Kelly sizer: correlation
//! haircut, total-exposure cap, margin sufficiency, and stop-loss risk.
//! Worked trade examples turn a decision into units and a stop price.

use serde::{Deserialize, Serialize};

use kellylab_core::config::DISTRIBUTION_TOLERANCE;
use kellylab_core::{ConfidenceTier, ConfigError, PositionSizer, TierTable};

/// Leverage columns of the sizing table.
pub const LEVERAGE_OPTIONS: [f64; 4] = [1.0, 2.0, 5.0, 10.0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    pub total_capital: f64,
    pub kelly_fractions: TierTable<f64>,
    /// Historical share of trades per tier.
    pub distribution: TierTable<f64>,
    /// Cap on a single position as a fraction of capital.
    pub max_position_pct: f64,
    /// Cap on the sum of open positions as a fraction of capital.
    pub max_total_exposure_pct: f64,
    /// Haircut applied to positions correlated with open ones.
    pub correlation_reduction_pct: f64,
    /// Initial margin as a fraction of notional (0.05 → 20x max leverage).
    pub margin_requirement_pct: f64,
    /// Stop distance as a fraction of the position.
    pub stop_loss_pct: f64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            total_capital: 1000.0,
            kelly_fractions: TierTable::new(0.146, 0.110, 0.055),
            distribution: TierTable::new(0.67, 0.31, 0.02),
            max_position_pct: 0.20,
            max_total_exposure_pct: 1.50,
            correlation_reduction_pct: 0.30,
            margin_requirement_pct: 0.05,
            stop_loss_pct: 0.02,
        }
    }
}

impl PortfolioConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.total_capital.is_finite() || self.total_capital <= 0.0 {
            return Err(ConfigError::NonPositiveCapital(self.total_capital));
        }
        let sum = self.distribution.sum();
        if (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE {
            return Err(ConfigError::DistributionSum { sum });
        }
        for (tier, p) in self.distribution.iter() {
            if !p.is_finite() || !(0.0..=1.0).contains(p) {
                return Err(ConfigError::InvalidProbability {
                    field: "portfolio.distribution",
                    tier,
                    value: *p,
                });
            }
        }
        for (_, k) in self.kelly_fractions.iter() {
            if !k.is_finite() || *k < 0.0 {
                return Err(ConfigError::InvalidFraction {
                    field: "portfolio.kelly_fractions",
                    value: *k,
                });
            }
        }
        let fractions = [
            ("max_position_pct", self.max_position_pct),
            ("max_total_exposure_pct", self.max_total_exposure_pct),
            ("margin_requirement_pct", self.margin_requirement_pct),
            ("stop_loss_pct", self.stop_loss_pct),
        ];
        for (field, value) in fractions {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidFraction { field, value });
            }
        }
        if !(0.0..=1.0).contains(&self.correlation_reduction_pct) {
            return Err(ConfigError::InvalidFraction {
                field: "correlation_reduction_pct",
                value: self.correlation_reduction_pct,
            });
        }
        Ok(())
    }
}

/// Inputs for one sizing request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionRequest {
    pub tier: ConfidenceTier,
    pub leverage: f64,
    /// Notional already deployed across open positions.
    pub current_exposure: f64,
    pub is_correlated: bool,
}

impl PositionRequest {
    pub fn new(tier: ConfidenceTier) -> Self {
        Self {
            tier,
            leverage: 1.0,
            current_exposure: 0.0,
            is_correlated: false,
        }
    }

    pub fn with_leverage(mut self, leverage: f64) -> Self {
        self.leverage = leverage;
        self
    }

    pub fn with_exposure(mut self, current_exposure: f64) -> Self {
        self.current_exposure = current_exposure;
        self
    }

    pub fn correlated(mut self, is_correlated: bool) -> Self {
        self.is_correlated = is_correlated;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MaxExposureReached,
    InsufficientMargin,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::MaxExposureReached => write!(f, "maximum total exposure reached"),
            RejectReason::InsufficientMargin => {
                write!(f, "insufficient capital for margin requirement")
            }
        }
    }
}

/// An accepted position with its risk figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionPlan {
    pub tier: ConfidenceTier,
    pub base_kelly_size: f64,
    pub position_size: f64,
    pub margin_required: f64,
    pub leverage: f64,
    /// Percent.
    pub stop_loss_pct: f64,
    pub risk_amount: f64,
    /// Percent of total capital.
    pub risk_pct_of_capital: f64,
    pub correlation_adjusted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum PositionDecision {
    Allowed(PositionPlan),
    Rejected {
        reason: RejectReason,
        position_size: f64,
        margin_required: f64,
        leverage: f64,
    },
}

impl PositionDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PositionDecision::Allowed(_))
    }

    pub fn plan(&self) -> Option<&PositionPlan> {
        match self {
            PositionDecision::Allowed(plan) => Some(plan),
            PositionDecision::Rejected { .. } => None,
        }
    }
}

/// One row of the sizing table: a tier across every leverage option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingRow {
    pub tier: ConfidenceTier,
    pub by_leverage: Vec<(f64, PositionDecision)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierAllocation {
    pub count: usize,
    /// Percent of trades.
    pub percentage: f64,
    pub position_size: f64,
    pub total_capital: f64,
}

/// Expected deployment over a number of trades at the historical tier mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioDistribution {
    pub total_trades: usize,
    pub tiers: TierTable<TierAllocation>,
    pub avg_position_size: f64,
    pub total_capital_deployed: f64,
}

impl PortfolioDistribution {
    /// Total deployed capital relative to the portfolio.
    pub fn turnover(&self, total_capital: f64) -> f64 {
        self.total_capital_deployed / total_capital
    }
}

/// A hypothetical trade to size: a request plus the instrument's entry price.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeExample {
    pub name: String,
    pub request: PositionRequest,
    pub entry_price: f64,
}

impl TradeExample {
    pub fn new(name: impl Into<String>, request: PositionRequest, entry_price: f64) -> Self {
        Self {
            name: name.into(),
            request,
            entry_price,
        }
    }
}

/// Sizing outcome of a [`TradeExample`].
///
/// `quantity` and `stop_loss_price` are present only for allowed positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleResult {
    pub name: String,
    pub tier: ConfidenceTier,
    pub entry_price: f64,
    pub decision: PositionDecision,
    pub quantity: Option<f64>,
    pub stop_loss_price: Option<f64>,
}

/// Four reference trades: unlevered, 2x, 5x, and one correlated with an open position.
pub fn standard_examples() -> Vec<TradeExample> {
    vec![
        TradeExample::new(
            "High confidence BTC long (no leverage)",
            PositionRequest::new(ConfidenceTier::High),
            45_000.0,
        ),
        TradeExample::new(
            "Medium confidence ETH short (2x leverage)",
            PositionRequest::new(ConfidenceTier::Medium).with_leverage(2.0),
            2_500.0,
        ),
        TradeExample::new(
            "High confidence SOL long (5x leverage)",
            PositionRequest::new(ConfidenceTier::High).with_leverage(5.0),
            100.0,
        ),
        TradeExample::new(
            "High confidence DeFi token (correlated with open ETH position)",
            PositionRequest::new(ConfidenceTier::High).correlated(true),
            50.0,
        ),
    ]
}

#[derive(Debug, Clone)]
pub struct PositionSizingCalculator {
    config: PortfolioConfig,
    sizer: PositionSizer,
}

impl PositionSizingCalculator {
    pub fn new(config: PortfolioConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let sizer = PositionSizer::new(config.kelly_fractions, config.max_position_pct);
        Ok(Self { config, sizer })
    }

    pub fn config(&self) -> &PortfolioConfig {
        &self.config
    }

    /// Kelly size on total capital, capped by the single-position limit.
    pub fn base_position_size(&self, tier: ConfidenceTier) -> f64 {
        self.sizer.size(self.config.total_capital, tier)
    }

    pub fn margin_requirement(&self, position_size: f64, leverage: f64) -> f64 {
        position_size * self.config.margin_requirement_pct / leverage
    }

    pub fn evaluate(&self, request: PositionRequest) -> PositionDecision {
        let cfg = &self.config;
        let base_size = self.base_position_size(request.tier);

        let adjusted = if request.is_correlated {
            base_size * (1.0 - cfg.correlation_reduction_pct)
        } else {
            base_size
        };

        let remaining = cfg.total_capital * cfg.max_total_exposure_pct - request.current_exposure;
        if remaining <= 0.0 {
            return PositionDecision::Rejected {
                reason: RejectReason::MaxExposureReached,
                position_size: 0.0,
                margin_required: 0.0,
                leverage: request.leverage,
            };
        }
        let position_size = adjusted.min(remaining);

        let margin_required = self.margin_requirement(position_size, request.leverage);
        if margin_required > cfg.total_capital {
            return PositionDecision::Rejected {
                reason: RejectReason::InsufficientMargin,
                position_size,
                margin_required,
                leverage: request.leverage,
            };
        }

        let risk_amount = position_size * cfg.stop_loss_pct;
        PositionDecision::Allowed(PositionPlan {
            tier: request.tier,
            base_kelly_size: base_size,
            position_size,
            margin_required,
            leverage: request.leverage,
            stop_loss_pct: cfg.stop_loss_pct * 100.0,
            risk_amount,
            risk_pct_of_capital: risk_amount / cfg.total_capital * 100.0,
            correlation_adjusted: request.is_correlated,
        })
    }

    /// Size an example trade and express it in units with a long-side stop price.
    pub fn worked_example(&self, example: &TradeExample) -> ExampleResult {
        let decision = self.evaluate(example.request);
        let (quantity, stop_loss_price) = match decision.plan() {
            Some(plan) if example.entry_price > 0.0 => (
                Some(plan.position_size / example.entry_price),
                Some(example.entry_price * (1.0 - plan.stop_loss_pct / 100.0)),
            ),
            _ => (None, None),
        };
        ExampleResult {
            name: example.name.clone(),
            tier: example.request.tier,
            entry_price: example.entry_price,
            decision,
            quantity,
            stop_loss_price,
        }
    }

    pub fn worked_examples(&self, examples: &[TradeExample]) -> Vec<ExampleResult> {
        examples.iter().map(|ex| self.worked_example(ex)).collect()
    }

    /// Every tier at every leverage option, no open exposure, uncorrelated.
    pub fn sizing_table(&self) -> Vec<SizingRow> {
        ConfidenceTier::ALL
            .into_iter()
            .map(|tier| SizingRow {
                tier,
                by_leverage: LEVERAGE_OPTIONS
                    .into_iter()
                    .map(|leverage| {
                        let request = PositionRequest::new(tier).with_leverage(leverage);
                        (leverage, self.evaluate(request))
                    })
                    .collect(),
            })
            .collect()
    }

    /// Counts floor-rounded for HIGH and MEDIUM; LOW takes the remainder.
    pub fn expected_distribution(&self, num_trades: usize) -> PortfolioDistribution {
        let dist = &self.config.distribution;
        let high = (num_trades as f64 * dist.high).floor() as usize;
        let medium = (num_trades as f64 * dist.medium).floor() as usize;
        let low = num_trades.saturating_sub(high + medium);
        let counts = TierTable::new(high, medium, low);

        let allocation = |tier: ConfidenceTier| {
            let count = *counts.get(tier);
            let position_size = self.base_position_size(tier);
            TierAllocation {
                count,
                percentage: dist.get(tier) * 100.0,
                position_size,
                total_capital: count as f64 * position_size,
            }
        };
        let tiers = TierTable::new(
            allocation(ConfidenceTier::High),
            allocation(ConfidenceTier::Medium),
            allocation(ConfidenceTier::Low),
        );
        let total_capital_deployed: f64 = tiers.iter().map(|(_, a)| a.total_capital).sum();
        let avg_position_size = if num_trades > 0 {
            total_capital_deployed / num_trades as f64
        } else {
            0.0
        };

        PortfolioDistribution {
            total_trades: num_trades,
            tiers,
            avg_position_size,
            total_capital_deployed,
        }
    }
}
