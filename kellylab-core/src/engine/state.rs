//! Mutable per-trajectory state and the trajectory result record.

use serde::{Deserialize, Serialize};

use crate::statistics::{annualized_sharpe, drawdown_pct_curve, TRADES_PER_YEAR};

/// Lifecycle of one trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrajectoryStatus {
    Running,
    /// Capital reached zero; remaining trades were not simulated.
    Ruined,
    /// All N trades executed without ruin.
    Completed,
}

/// Outcome of one simulated path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryResult {
    pub final_capital: f64,
    pub total_pnl: f64,
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,
    pub longest_win_streak: usize,
    pub longest_loss_streak: usize,
    pub total_wins: usize,
    pub total_losses: usize,
    pub actual_win_rate: f64,
    pub sharpe_ratio: f64,
    /// Gross profit / gross loss; `f64::INFINITY` when gross loss is zero.
    pub profit_factor: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub status: TrajectoryStatus,
    /// Running capital: C₀ followed by one entry per executed trade.
    pub equity_curve: Vec<f64>,
    /// Drawdown percentage for each equity curve entry.
    pub drawdown_curve: Vec<f64>,
}

impl TrajectoryResult {
    pub fn trades_executed(&self) -> usize {
        self.total_wins + self.total_losses
    }

    pub fn is_ruined(&self) -> bool {
        self.status == TrajectoryStatus::Ruined
    }

    pub fn has_finite_profit_factor(&self) -> bool {
        self.profit_factor.is_finite()
    }

    /// Release the per-trade curves, keeping every scalar metric.
    pub fn discard_curves(&mut self) {
        self.equity_curve = Vec::new();
        self.drawdown_curve = Vec::new();
    }
}

/// Bookkeeping that evolves trade-by-trade inside one trajectory.
#[derive(Debug, Clone)]
pub struct TrajectoryState {
    initial_capital: f64,
    capital: f64,
    peak: f64,
    max_drawdown: f64,
    wins: usize,
    losses: usize,
    current_streak: usize,
    last_won: Option<bool>,
    longest_win_streak: usize,
    longest_loss_streak: usize,
    gross_profit: f64,
    gross_loss: f64,
    returns: Vec<f64>,
    equity_curve: Vec<f64>,
    status: TrajectoryStatus,
}

impl TrajectoryState {
    pub fn new(initial_capital: f64, planned_trades: usize) -> Self {
        let mut equity_curve = Vec::with_capacity(planned_trades + 1);
        equity_curve.push(initial_capital);
        Self {
            initial_capital,
            capital: initial_capital,
            peak: initial_capital,
            max_drawdown: 0.0,
            wins: 0,
            losses: 0,
            current_streak: 0,
            last_won: None,
            longest_win_streak: 0,
            longest_loss_streak: 0,
            gross_profit: 0.0,
            gross_loss: 0.0,
            returns: Vec::with_capacity(planned_trades),
            equity_curve,
            status: TrajectoryStatus::Running,
        }
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn status(&self) -> TrajectoryStatus {
        self.status
    }

    /// Fold one executed trade into the state.
    ///
    /// Returns the status after the trade. Once `Ruined`, further calls are
    /// ignored and nothing is appended.
    pub fn apply_trade(&mut self, trade_pnl: f64, is_winner: bool) -> TrajectoryStatus {
        if self.status != TrajectoryStatus::Running {
            return self.status;
        }

        let previous = self.capital;
        let mut capital = previous + trade_pnl;

        // Return and gross figures use the trade as drawn, before any clamp.
        self.returns.push(trade_pnl / previous);
        if trade_pnl > 0.0 {
            self.gross_profit += trade_pnl;
        } else if trade_pnl < 0.0 {
            self.gross_loss += -trade_pnl;
        }

        if is_winner {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        if self.last_won == Some(is_winner) {
            self.current_streak += 1;
        } else {
            self.current_streak = 1;
        }
        self.last_won = Some(is_winner);
        if is_winner {
            self.longest_win_streak = self.longest_win_streak.max(self.current_streak);
        } else {
            self.longest_loss_streak = self.longest_loss_streak.max(self.current_streak);
        }

        if capital <= 0.0 {
            capital = 0.0;
            self.status = TrajectoryStatus::Ruined;
        }
        self.capital = capital;
        self.equity_curve.push(capital);

        if capital > self.peak {
            self.peak = capital;
        }
        self.max_drawdown = self.max_drawdown.max(self.peak - capital);

        self.status
    }

    /// Close the trajectory and compute the derived metrics.
    pub fn finish(mut self) -> TrajectoryResult {
        if self.status == TrajectoryStatus::Running {
            self.status = TrajectoryStatus::Completed;
        }

        let trades = self.wins + self.losses;
        let actual_win_rate = if trades > 0 {
            self.wins as f64 / trades as f64
        } else {
            0.0
        };
        let max_drawdown_pct = if self.peak > 0.0 {
            self.max_drawdown / self.peak * 100.0
        } else {
            100.0
        };
        let profit_factor = if self.gross_loss > 0.0 {
            self.gross_profit / self.gross_loss
        } else {
            f64::INFINITY
        };
        let drawdown_curve = drawdown_pct_curve(&self.equity_curve);

        TrajectoryResult {
            final_capital: self.capital,
            total_pnl: self.capital - self.initial_capital,
            max_drawdown: self.max_drawdown,
            max_drawdown_pct,
            longest_win_streak: self.longest_win_streak,
            longest_loss_streak: self.longest_loss_streak,
            total_wins: self.wins,
            total_losses: self.losses,
            actual_win_rate,
            sharpe_ratio: annualized_sharpe(&self.returns, TRADES_PER_YEAR),
            profit_factor,
            gross_profit: self.gross_profit,
            gross_loss: self.gross_loss,
            status: self.status,
            equity_curve: self.equity_curve,
            drawdown_curve,
        }
    }
}
