//! Display formatting for amounts and percentages shown by the CLI.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::DisplayConfig;

fn group_int_digits(int_part: &str) -> String {
    let mut out = String::with_capacity(int_part.len() + int_part.len() / 3);
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        out.push(ch);
        let remaining = len.saturating_sub(i + 1);
        if remaining > 0 && remaining % 3 == 0 {
            out.push(',');
        }
    }
    out
}

fn pad_fraction_to_dp(s: &str, dp: u32) -> String {
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
    if dp == 0 {
        return int_part.to_string();
    }

    let mut frac: String = frac_part.chars().take(dp as usize).collect();
    while frac.len() < dp as usize {
        frac.push('0');
    }
    format!("{int_part}.{frac}")
}

fn group_number_string(s: &str) -> String {
    match s.split_once('.') {
        Some((int_part, frac)) if !frac.is_empty() => {
            format!("{}.{frac}", group_int_digits(int_part))
        }
        Some((int_part, _)) => group_int_digits(int_part),
        None => group_int_digits(s),
    }
}

/// Format a decimal amount according to the display options.
///
/// The sign always precedes the currency symbol (`-₹1,200`).
pub fn format_amount(value: Decimal, display: &DisplayConfig) -> String {
    let rounded = match display.currency_decimals {
        Some(dp) => value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
        None => value,
    };

    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let mut s = rounded.abs().normalize().to_string();
    if display.currency_fixed_decimals {
        if let Some(dp) = display.currency_decimals {
            s = pad_fraction_to_dp(&s, dp);
        }
    }
    if display.currency_grouping {
        s = group_number_string(&s);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if let Some(sym) = &display.currency_symbol {
        out.push_str(sym);
    }
    out.push_str(&s);
    out
}

/// Format a wire amount (JSON number). Non-finite values render as `n/a`.
pub fn format_currency(value: f64, display: &DisplayConfig) -> String {
    match Decimal::from_f64(value) {
        Some(d) => format_amount(d, display),
        None => "n/a".to_string(),
    }
}

/// Format a percentage with a fixed number of decimals, e.g. `+12.50%`.
pub fn format_percent(value: f64, decimals: usize, signed: bool) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    if signed && value >= 0.0 {
        format!("+{value:.decimals$}%")
    } else {
        format!("{value:.decimals$}%")
    }
}
