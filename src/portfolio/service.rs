use std::collections::BTreeMap;

use super::models::{
    BreakdownEntry, DebtOverview, GoalProgress, InvestmentPerformance, LoanStatus,
    PortfolioOverview, RepaymentPriority, SavingsBand,
};
use crate::models::{Goal, Investment, Loan};

/// Loans above this annual rate (percent) are flagged for early repayment.
pub const HIGH_INTEREST_THRESHOLD: f64 = 10.0;
const HIGH_PRIORITY_THRESHOLD: f64 = 15.0;

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

/// Chart label for a backend key: first letter upper-cased, first `_` as a space.
///
/// ```
/// assert_eq!(finsight::portfolio::chart_label("mutual_fund"), "Mutual fund");
/// assert_eq!(finsight::portfolio::chart_label("food"), "Food");
/// ```
pub fn chart_label(key: &str) -> String {
    let mut chars = key.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let rest = chars.as_str().replacen('_', " ", 1);
    first.to_uppercase().chain(rest.chars()).collect()
}

/// Chart entries from a key/value map, largest value first.
pub fn breakdown(map: &BTreeMap<String, f64>) -> Vec<BreakdownEntry> {
    let mut entries: Vec<BreakdownEntry> = map
        .iter()
        .map(|(key, value)| BreakdownEntry {
            key: key.clone(),
            label: chart_label(key),
            value: *value,
        })
        .collect();
    entries.sort_by(|a, b| b.value.total_cmp(&a.value));
    entries
}

pub fn investment_performance(investment: &Investment) -> InvestmentPerformance {
    let current_value = investment.current_value();
    let gain = current_value - investment.amount;
    InvestmentPerformance {
        id: investment.id.clone(),
        name: investment.name.clone(),
        kind: investment.kind,
        invested: investment.amount,
        current_value,
        gain,
        gain_percent: percent_of(gain, investment.amount),
    }
}

pub fn portfolio_overview(investments: &[Investment]) -> PortfolioOverview {
    let holdings: Vec<_> = investments.iter().map(investment_performance).collect();
    let total_invested: f64 = holdings.iter().map(|h| h.invested).sum();
    let total_current_value: f64 = holdings.iter().map(|h| h.current_value).sum();
    let total_gain = total_current_value - total_invested;

    let mut by_type = BTreeMap::new();
    for holding in &holdings {
        *by_type
            .entry(holding.kind.as_str().to_string())
            .or_insert(0.0) += holding.current_value;
    }

    PortfolioOverview {
        total_invested,
        total_current_value,
        total_gain,
        gain_percent: percent_of(total_gain, total_invested),
        by_type: breakdown(&by_type),
        holdings,
    }
}

pub fn repayment_priority(interest_rate: f64) -> RepaymentPriority {
    if interest_rate > HIGH_PRIORITY_THRESHOLD {
        RepaymentPriority::High
    } else if interest_rate > HIGH_INTEREST_THRESHOLD {
        RepaymentPriority::Medium
    } else {
        RepaymentPriority::Low
    }
}

pub fn loan_status(loan: &Loan) -> LoanStatus {
    let repaid_percent = if loan.amount == 0.0 || loan.outstanding == 0.0 {
        0.0
    } else {
        percent_of(loan.amount - loan.outstanding, loan.amount)
    };
    let months_remaining = match loan.emi {
        Some(emi) if emi > 0.0 && loan.outstanding > 0.0 => {
            let months = (loan.outstanding / emi).ceil();
            (months <= f64::from(u32::MAX)).then_some(months as u32)
        }
        _ => None,
    };
    LoanStatus {
        id: loan.id.clone(),
        kind: loan.kind,
        bank_name: loan.bank_name.clone(),
        amount: loan.amount,
        outstanding: loan.outstanding,
        interest_rate: loan.interest_rate,
        emi: loan.emi,
        repaid_percent,
        months_remaining,
        priority: repayment_priority(loan.interest_rate),
    }
}

pub fn debt_overview(loans: &[Loan]) -> DebtOverview {
    let statuses: Vec<_> = loans.iter().map(loan_status).collect();
    let total_amount: f64 = loans.iter().map(|l| l.amount).sum();
    let total_outstanding: f64 = loans.iter().map(|l| l.outstanding).sum();
    let total_emi: f64 = loans.iter().filter_map(|l| l.emi).sum();
    let weighted_sum: f64 = loans.iter().map(|l| l.interest_rate * l.outstanding).sum();
    let weighted_interest_rate = if total_outstanding == 0.0 {
        0.0
    } else {
        weighted_sum / total_outstanding
    };

    let mut by_type = BTreeMap::new();
    for loan in loans {
        *by_type
            .entry(loan.kind.as_str().to_string())
            .or_insert(0.0) += loan.outstanding;
    }

    let mut high_interest: Vec<_> = statuses
        .iter()
        .filter(|s| s.interest_rate > HIGH_INTEREST_THRESHOLD)
        .cloned()
        .collect();
    high_interest.sort_by(|a, b| b.interest_rate.total_cmp(&a.interest_rate));

    DebtOverview {
        total_amount,
        total_outstanding,
        total_emi,
        weighted_interest_rate,
        repaid_percent: percent_of(total_amount - total_outstanding, total_amount),
        by_type: breakdown(&by_type),
        high_interest,
        loans: statuses,
    }
}

pub fn goal_progress(goal: &Goal) -> GoalProgress {
    GoalProgress {
        id: goal.id.clone(),
        name: goal.name.clone(),
        target_amount: goal.target_amount,
        current_amount: goal.current_amount,
        progress_percent: percent_of(goal.current_amount, goal.target_amount),
    }
}

pub fn savings_band(savings_rate: f64) -> SavingsBand {
    if savings_rate < 0.0 {
        SavingsBand::Negative
    } else if savings_rate < 10.0 {
        SavingsBand::Low
    } else if savings_rate < 20.0 {
        SavingsBand::Moderate
    } else {
        SavingsBand::Healthy
    }
}
