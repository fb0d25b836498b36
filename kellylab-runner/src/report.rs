//! Plain-text reports for the terminal.

use crate::aggregation::{AggregateAnalysis, MetricSummary};
use crate::analysis::Recommendation;
use crate::batch::WinRateDiagnostics;
use crate::plan::TradingPlan;
use crate::sizing::{ExampleResult, PortfolioDistribution, PositionDecision, PositionSizingCalculator};
use crate::stress::StressOutcome;

const RULE_WIDTH: usize = 80;

fn rule(out: &mut String, ch: char) {
    out.extend(std::iter::repeat(ch).take(RULE_WIDTH));
    out.push('\n');
}

fn write_percentiles(out: &mut String, summary: &MetricSummary, unit: &str, prefix: &str) {
    out.push_str("  Percentiles:\n");
    for (rank, value) in summary.percentiles.iter() {
        out.push_str(&format!("    {:>2}th:     {prefix}{value:>12.2}{unit}\n", rank as u32));
    }
}

fn write_money_block(out: &mut String, title: &str, summary: &MetricSummary) {
    out.push_str(&format!("{title}\n"));
    out.push_str(&format!("  Mean:       ${:>12.2}\n", summary.mean));
    out.push_str(&format!("  Median:     ${:>12.2}\n", summary.median));
    out.push_str(&format!("  Std Dev:    ${:>12.2}\n", summary.std));
    out.push_str(&format!("  Min:        ${:>12.2}\n", summary.min));
    out.push_str(&format!("  Max:        ${:>12.2}\n", summary.max));
    write_percentiles(out, summary, "", "$");
    out.push('\n');
}

/// Summary of one batch: capital, PnL, drawdown, performance and risk.
pub fn simulation_summary(
    analysis: &AggregateAnalysis,
    initial_capital: f64,
    diagnostics: Option<&WinRateDiagnostics>,
) -> String {
    let mut out = String::with_capacity(4096);
    rule(&mut out, '=');
    out.push_str("MONTE CARLO SIMULATION RESULTS\n");
    rule(&mut out, '=');
    out.push_str(&format!("Trajectories: {}\n\n", analysis.num_trajectories));

    write_money_block(
        &mut out,
        &format!("FINAL CAPITAL (Starting: ${initial_capital:.2})"),
        &analysis.final_capital,
    );
    write_money_block(&mut out, "TOTAL PnL", &analysis.total_pnl);

    let dd = &analysis.max_drawdown_pct;
    out.push_str("MAX DRAWDOWN\n");
    out.push_str(&format!("  Mean:       {:>12.2}%\n", dd.mean));
    out.push_str(&format!("  Median:     {:>12.2}%\n", dd.median));
    out.push_str(&format!("  Worst:      {:>12.2}%\n", dd.max));
    write_percentiles(&mut out, dd, "%", "");
    out.push('\n');

    out.push_str("PERFORMANCE METRICS\n");
    out.push_str(&format!("  Avg Win Rate:           {:>6.2}%\n", analysis.win_rate.mean * 100.0));
    out.push_str(&format!("  Avg Sharpe Ratio:       {:>6.2}\n", analysis.sharpe_ratio.mean));
    match analysis.profit_factor.mean {
        Some(pf) => {
            out.push_str(&format!("  Avg Profit Factor:      {pf:>6.2}x\n"));
        }
        None => out.push_str("  Avg Profit Factor:         n/a (no losing trades)\n"),
    }
    if analysis.profit_factor.infinite_count > 0 {
        out.push_str(&format!(
            "  Paths without losses:   {:>6}\n",
            analysis.profit_factor.infinite_count
        ));
    }
    out.push('\n');

    out.push_str("RISK METRICS\n");
    out.push_str(&format!("  Probability of Profit:  {:>6.2}%\n", analysis.probability_of_profit));
    out.push_str(&format!("  Probability of Ruin:    {:>6.2}%\n", analysis.probability_of_ruin));
    out.push_str(&format!("  Wiped-out paths:        {:>6}\n", analysis.ruined_count));
    out.push_str(&format!(
        "  Max Loss Streak (avg):  {:>6.1} trades\n",
        analysis.longest_loss_streak.mean
    ));
    out.push_str(&format!(
        "  Max Loss Streak (95th): {:>6.0} trades\n",
        analysis.longest_loss_streak.percentiles.p95
    ));

    if let Some(d) = diagnostics.filter(|d| d.is_material()) {
        out.push('\n');
        out.push_str(&format!(
            "NOTE: outcome model expects {:.2}% wins, historical stats {:.2}% ({:+.2} pts)\n",
            d.model_expected_win_rate * 100.0,
            d.stats_expected_win_rate * 100.0,
            d.win_rate_divergence * 100.0
        ));
    }
    rule(&mut out, '=');
    out
}

/// One line per stress scenario.
pub fn stress_table(outcomes: &[StressOutcome]) -> String {
    let mut out = String::with_capacity(1024);
    rule(&mut out, '=');
    out.push_str("STRESS TEST SCENARIOS\n");
    rule(&mut out, '=');
    out.push_str(&format!(
        "{:<32} {:>12} {:>12} {:>9} {:>8} {:>8}\n",
        "Scenario", "Median Cap", "Median PnL", "Med DD%", "P(prof)", "P(ruin)"
    ));
    rule(&mut out, '-');
    for o in outcomes {
        out.push_str(&format!(
            "{:<32} {:>12.2} {:>12.2} {:>8.2}% {:>7.1}% {:>7.1}%\n",
            o.name,
            o.median_final_capital,
            o.median_pnl,
            o.median_max_drawdown_pct,
            o.probability_of_profit,
            o.probability_of_ruin
        ));
    }
    rule(&mut out, '=');
    out
}

/// Sizing table across tiers and leverage, followed by the expected distribution.
pub fn sizing_report(calculator: &PositionSizingCalculator, distribution: &PortfolioDistribution) -> String {
    let capital = calculator.config().total_capital;
    let mut out = String::with_capacity(4096);
    rule(&mut out, '=');
    out.push_str(&format!("POSITION SIZING TABLE - ${capital:.2} Portfolio\n"));
    rule(&mut out, '=');

    for row in calculator.sizing_table() {
        out.push_str(&format!("\n{} CONFIDENCE\n", row.tier));
        rule(&mut out, '-');
        out.push_str(&format!(
            "{:<10} {:<15} {:<15} {:<12} {:<10} {:<12}\n",
            "Leverage", "Position Size", "Margin Req", "Risk ($)", "Risk %", "Stop Loss %"
        ));
        for (leverage, decision) in &row.by_leverage {
            let label = format!("{leverage}x");
            match decision {
                PositionDecision::Allowed(plan) => {
                    out.push_str(&format!(
                        "{:<10} ${:<14.2} ${:<14.2} ${:<11.2} {:<9.2}% {:<11.2}%\n",
                        label,
                        plan.position_size,
                        plan.margin_required,
                        plan.risk_amount,
                        plan.risk_pct_of_capital,
                        plan.stop_loss_pct
                    ));
                }
                PositionDecision::Rejected { reason, .. } => {
                    out.push_str(&format!("{label:<10} NOT ALLOWED - {reason}\n"));
                }
            }
        }
    }

    out.push('\n');
    rule(&mut out, '=');
    out.push_str(&format!(
        "EXPECTED PORTFOLIO DISTRIBUTION OVER {} TRADES\n",
        distribution.total_trades
    ));
    rule(&mut out, '=');
    out.push_str(&format!(
        "{:<12} {:<12} {:<12} {:<15} {:<15}\n",
        "Confidence", "# Trades", "% of Total", "Position Size", "Total Capital"
    ));
    for (tier, alloc) in distribution.tiers.iter() {
        out.push_str(&format!(
            "{:<12} {:<12} {:<11.1}% ${:<14.2} ${:<14.2}\n",
            tier.as_str(),
            alloc.count,
            alloc.percentage,
            alloc.position_size,
            alloc.total_capital
        ));
    }
    rule(&mut out, '-');
    out.push_str(&format!("Average Position Size: ${:.2}\n", distribution.avg_position_size));
    out.push_str(&format!("Capital Turnover: {:.2}x\n", distribution.turnover(capital)));
    out
}

/// Worked trades: units, margin and stop price for each allowed example.
pub fn examples_report(examples: &[ExampleResult]) -> String {
    let mut out = String::with_capacity(2048);
    rule(&mut out, '=');
    out.push_str("PRACTICAL TRADING EXAMPLES\n");
    rule(&mut out, '=');
    for ex in examples {
        out.push_str(&format!("\n{}\n", ex.name));
        rule(&mut out, '-');
        match (&ex.decision, ex.quantity, ex.stop_loss_price) {
            (PositionDecision::Allowed(plan), Some(quantity), Some(stop_price)) => {
                out.push_str(&format!("  Confidence Level:     {}\n", ex.tier));
                out.push_str(&format!("  Leverage:             {}x\n", plan.leverage));
                out.push_str(&format!("  Entry Price:          ${:.2}\n", ex.entry_price));
                out.push_str(&format!("  Position Size:        ${:.2}\n", plan.position_size));
                out.push_str(&format!("  Margin Required:      ${:.2}\n", plan.margin_required));
                out.push_str(&format!("  Quantity:             {quantity:.4} units\n"));
                out.push_str(&format!("  Stop Loss:            {:.1}%\n", plan.stop_loss_pct));
                out.push_str(&format!("  Stop Loss Price:      ${stop_price:.2}\n"));
                out.push_str(&format!("  Risk Amount:          ${:.2}\n", plan.risk_amount));
                out.push_str(&format!("  Risk % of Portfolio:  {:.2}%\n", plan.risk_pct_of_capital));
            }
            (PositionDecision::Rejected { reason, .. }, _, _) => {
                out.push_str(&format!("  NOT ALLOWED - {reason}\n"));
            }
            (PositionDecision::Allowed(_), _, _) => {
                out.push_str("  Entry price must be positive to size in units\n");
            }
        }
    }
    rule(&mut out, '=');
    out
}

/// Fixed-horizon plan: sizing per tier, trade allocation, projection and limits.
pub fn plan_report(plan: &TradingPlan) -> String {
    let mut out = String::with_capacity(4096);
    rule(&mut out, '=');
    out.push_str(&format!(
        "{}-DAY TRADING PLAN - ${:.2} PORTFOLIO ({} trades/day)\n",
        plan.days, plan.starting_capital, plan.trades_per_day
    ));
    rule(&mut out, '=');

    out.push_str("POSITION SIZING BY CONFIDENCE\n");
    out.push_str(&format!(
        "{:<12} {:<12} {:<10} {:<10} {:<10} {:<8}\n",
        "Confidence", "Position", "Leverage", "Margin", "Risk $", "Risk %"
    ));
    rule(&mut out, '-');
    for pos in &plan.positions {
        out.push_str(&format!(
            "{:<12} ${:<11.2} {:<9}x ${:<9.2} ${:<9.2} {:<7.2}%\n",
            pos.tier.as_str(),
            pos.position_size,
            pos.leverage,
            pos.margin_required,
            pos.risk_amount,
            pos.risk_pct_of_capital
        ));
    }
    out.push('\n');

    out.push_str(&format!(
        "TRADE DISTRIBUTION ({} total trades)\n",
        plan.projection.total_trades
    ));
    rule(&mut out, '-');
    for (tier, trades) in plan.distribution.iter() {
        if trades.total == 0 {
            continue;
        }
        let split: Vec<String> = trades
            .by_strategy
            .iter()
            .map(|s| format!("{} {}", s.strategy, s.count))
            .collect();
        out.push_str(&format!(
            "{:<12} {:>4}  ({})\n",
            tier.as_str(),
            trades.total,
            split.join(", ")
        ));
    }
    out.push('\n');

    let proj = &plan.projection;
    out.push_str("EXPECTED OUTCOMES\n");
    rule(&mut out, '-');
    out.push_str(&format!("  Starting Capital:        ${:.2}\n", plan.starting_capital));
    out.push_str(&format!("  Expected Final Capital:  ${:.2}\n", proj.expected_final_capital));
    out.push_str(&format!("  Expected Profit:         ${:.2}\n", proj.conservative_pnl));
    out.push_str(&format!("  Expected ROI:            {:.1}%\n", proj.expected_roi));
    out.push_str(&format!("  Expected Win Rate:       {:.1}%\n", proj.expected_win_rate));
    out.push_str(&format!("  Expected Wins / Losses:  {} / {}\n", proj.expected_wins, proj.expected_losses));
    out.push_str(&format!("  Avg Profit per Trade:    ${:.2}\n", proj.avg_pnl_per_trade));
    out.push('\n');

    let risk = &plan.risk;
    out.push_str("RISK MANAGEMENT RULES\n");
    rule(&mut out, '-');
    out.push_str(&format!("  Stop Loss:               {:.1}% on every trade\n", risk.stop_loss_pct));
    for (tier, leverage) in risk.recommended_leverage.iter() {
        out.push_str(&format!("  Max Leverage ({:<6}):    {leverage}x\n", tier.as_str()));
    }
    out.push_str(&format!("  Max Single Position:     ${:.2}\n", risk.max_single_position));
    out.push_str(&format!("  Max Total Exposure:      ${:.2}\n", risk.max_total_exposure));
    out.push_str("  HALT TRADING IF:\n");
    out.push_str(&format!(
        "    - Daily loss exceeds {:.0}% of capital\n",
        risk.halt.max_daily_loss_pct
    ));
    out.push_str(&format!(
        "    - Win rate drops below {:.0}% over last {} trades\n",
        risk.halt.min_win_rate * 100.0,
        risk.halt.win_rate_window
    ));
    out.push_str(&format!(
        "    - {} consecutive days of losses\n",
        risk.halt.max_losing_days
    ));
    out.push_str(&format!(
        "    - Total drawdown exceeds {:.0}%\n",
        risk.halt.max_drawdown_pct
    ));
    rule(&mut out, '=');
    out
}

/// Median-case outcome, risk, per-tier sizing and the graded outlook.
pub fn recommendation_report(rec: &Recommendation) -> String {
    let mut out = String::with_capacity(2048);
    rule(&mut out, '=');
    out.push_str("FINAL SUMMARY AND RECOMMENDATIONS\n");
    rule(&mut out, '=');
    out.push_str("EXPECTED OUTCOMES (Median Case)\n");
    out.push_str(&format!("  Starting Capital:      ${:.2}\n", rec.starting_capital));
    out.push_str(&format!("  Expected Final:        ${:.2}\n", rec.median_final_capital));
    out.push_str(&format!("  Expected Profit:       ${:.2}\n", rec.median_pnl));
    out.push_str(&format!("  Expected ROI:          {:.1}%\n", rec.roi_pct));
    out.push('\n');
    out.push_str("RISK ASSESSMENT\n");
    out.push_str(&format!("  Expected Max Drawdown: {:.1}%\n", rec.median_max_drawdown_pct));
    out.push_str(&format!("  Worst Case DD (95th):  {:.1}%\n", rec.p95_max_drawdown_pct));
    out.push_str(&format!("  Probability of Profit: {:.1}%\n", rec.probability_of_profit));
    out.push_str(&format!("  Loss Streaks (avg):    {:.0} trades\n", rec.avg_longest_loss_streak));
    out.push('\n');
    out.push_str("POSITION SIZING\n");
    for (tier, size) in rec.base_positions.iter() {
        out.push_str(&format!("  {:<7} Confidence:    ${size:.2} per trade\n", tier.as_str()));
    }
    out.push('\n');
    out.push_str("OUTLOOK\n");
    out.push_str(&format!("  {}: {:.0}% median ROI\n", rec.outlook.label(), rec.roi_pct));
    out.push_str(&format!(
        "  {}: {:.1}% median drawdown\n",
        rec.risk.label(),
        rec.median_max_drawdown_pct
    ));
    rule(&mut out, '=');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::AggregationEngine;
    use crate::analysis::{DrawdownRisk, RoiOutlook};
    use crate::plan::{PlanConfig, PlanGenerator};
    use crate::sizing::{standard_examples, PortfolioConfig};
    use kellylab_core::TrajectoryState;

    fn analysis() -> AggregateAnalysis {
        let results: Vec<_> = [50.0, -20.0, 10.0]
            .iter()
            .map(|&pnl| {
                let mut state = TrajectoryState::new(1000.0, 1);
                state.apply_trade(pnl, pnl > 0.0);
                state.finish()
            })
            .collect();
        AggregationEngine::new(1000.0).unwrap().analyze(&results).unwrap()
    }

    #[test]
    fn summary_lists_every_section() {
        let text = simulation_summary(&analysis(), 1000.0, None);
        for heading in ["FINAL CAPITAL", "TOTAL PnL", "MAX DRAWDOWN", "PERFORMANCE METRICS", "RISK METRICS"] {
            assert!(text.contains(heading), "missing {heading}");
        }
        assert!(text.contains("99th"));
        assert!(!text.contains("NOTE:"));
    }

    #[test]
    fn summary_notes_material_divergence() {
        let diagnostics = WinRateDiagnostics {
            stats_expected_win_rate: 0.543,
            model_expected_win_rate: 0.58275,
            win_rate_divergence: 0.03975,
        };
        let text = simulation_summary(&analysis(), 1000.0, Some(&diagnostics));
        assert!(text.contains("NOTE:"));
    }

    #[test]
    fn stress_table_has_a_row_per_scenario() {
        let outcomes = vec![
            StressOutcome {
                name: "Baseline".into(),
                median_final_capital: 1500.0,
                median_pnl: 500.0,
                median_max_drawdown_pct: 12.5,
                probability_of_profit: 90.0,
                probability_of_ruin: 1.0,
            },
            StressOutcome {
                name: "Full Kelly (Aggressive)".into(),
                median_final_capital: 900.0,
                median_pnl: -100.0,
                median_max_drawdown_pct: 60.0,
                probability_of_profit: 40.0,
                probability_of_ruin: 30.0,
            },
        ];
        let text = stress_table(&outcomes);
        assert!(text.contains("Baseline"));
        assert!(text.contains("Full Kelly (Aggressive)"));
    }

    #[test]
    fn every_summary_line_is_terminated() {
        let text = simulation_summary(&analysis(), 1000.0, None);
        assert!(text.ends_with('\n'));
        assert!(text.contains("Trajectories: 3\n\n"));
        assert!(text.contains("  Wiped-out paths:             0\n"));
    }

    #[test]
    fn examples_report_shows_units_and_stop_price() {
        let calc = PositionSizingCalculator::new(PortfolioConfig::default()).unwrap();
        let text = examples_report(&calc.worked_examples(&standard_examples()));
        assert!(text.contains("Quantity:             0.0032 units"));
        assert!(text.contains("Stop Loss Price:      $44100.00"));
        assert!(text.contains("correlated with open ETH position"));
    }

    #[test]
    fn plan_report_lists_projection_and_halt_rules() {
        let plan = PlanGenerator::new(PlanConfig::default()).unwrap().generate();
        let text = plan_report(&plan);
        assert!(text.starts_with(&"=".repeat(80)));
        assert!(text.contains("30-DAY TRADING PLAN - $100.00 PORTFOLIO"));
        assert!(text.contains("Q-Pulse 76"));
        assert!(text.contains("Expected Wins / Losses:  87 / 63"));
        assert!(text.contains("over last 25 trades"));
        assert!(!text.contains("LOW          "));
    }

    #[test]
    fn recommendation_report_prints_grades() {
        let rec = Recommendation {
            starting_capital: 1000.0,
            median_final_capital: 1600.0,
            median_pnl: 600.0,
            roi_pct: 60.0,
            median_max_drawdown_pct: 18.0,
            p95_max_drawdown_pct: 35.0,
            probability_of_profit: 92.0,
            avg_longest_loss_streak: 6.2,
            base_positions: kellylab_core::TierTable::new(146.0, 110.0, 55.0),
            outlook: RoiOutlook::from_roi_pct(60.0),
            risk: DrawdownRisk::from_drawdown_pct(18.0),
        };
        let text = recommendation_report(&rec);
        assert!(text.contains("GOOD: 60% median ROI"));
        assert!(text.contains("MODERATE RISK: 18.0% median drawdown"));
        assert!(text.contains("$146.00 per trade"));
    }

    #[test]
    fn sizing_report_renders_all_tiers() {
        let calc = PositionSizingCalculator::new(PortfolioConfig::default()).unwrap();
        let text = sizing_report(&calc, &calc.expected_distribution(100));
        for tier in ["HIGH", "MEDIUM", "LOW"] {
            assert!(text.contains(&format!("{tier} CONFIDENCE")));
        }
        assert!(text.contains("10x"));
        assert!(text.contains("Capital Turnover"));
    }
}
