use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::date::deserialize_opt_date;
use super::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentType {
    Sip,
    MutualFund,
    Stocks,
    Bonds,
    #[serde(alias = "fixed_deposit")]
    Fd,
    Ppf,
    Epf,
    Nps,
    Crypto,
    Etf,
    RealEstate,
    #[serde(other)]
    Other,
}

impl InvestmentType {
    pub const ALL: [InvestmentType; 12] = [
        Self::Sip,
        Self::MutualFund,
        Self::Stocks,
        Self::Bonds,
        Self::Fd,
        Self::Ppf,
        Self::Epf,
        Self::Nps,
        Self::Crypto,
        Self::Etf,
        Self::RealEstate,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sip => "sip",
            Self::MutualFund => "mutual_fund",
            Self::Stocks => "stocks",
            Self::Bonds => "bonds",
            Self::Fd => "fd",
            Self::Ppf => "ppf",
            Self::Epf => "epf",
            Self::Nps => "nps",
            Self::Crypto => "crypto",
            Self::Etf => "etf",
            Self::RealEstate => "real_estate",
            Self::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Sip => "SIP",
            Self::MutualFund => "Mutual Fund",
            Self::Stocks => "Stocks",
            Self::Bonds => "Bonds",
            Self::Fd => "Fixed Deposit",
            Self::Ppf => "PPF",
            Self::Epf => "EPF",
            Self::Nps => "NPS",
            Self::Crypto => "Cryptocurrency",
            Self::Etf => "ETF",
            Self::RealEstate => "Real Estate",
            Self::Other => "Other",
        }
    }
}

impl std::str::FromStr for InvestmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        if needle == "fixed_deposit" {
            return Ok(Self::Fd);
        }
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| format!("unknown investment type: {s}"))
    }
}

/// A holding as returned by `/finance/investments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    #[serde(rename = "_id", alias = "id")]
    pub id: Id,
    #[serde(rename = "type")]
    pub kind: InvestmentType,
    pub name: String,
    /// Invested principal.
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Investment {
    /// Current market value; falls back to the invested amount when the backend has none.
    pub fn current_value(&self) -> f64 {
        self.current_value.unwrap_or(self.amount)
    }
}

/// Body for creating or replacing an investment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentInput {
    #[serde(rename = "type")]
    pub kind: InvestmentType,
    pub name: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
