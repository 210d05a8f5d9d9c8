use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::date::deserialize_opt_date;
use super::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanType {
    HomeLoan,
    CarLoan,
    PersonalLoan,
    EducationLoan,
    BusinessLoan,
    CreditCard,
    #[serde(other)]
    Other,
}

impl LoanType {
    pub const ALL: [LoanType; 7] = [
        Self::HomeLoan,
        Self::CarLoan,
        Self::PersonalLoan,
        Self::EducationLoan,
        Self::BusinessLoan,
        Self::CreditCard,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HomeLoan => "home_loan",
            Self::CarLoan => "car_loan",
            Self::PersonalLoan => "personal_loan",
            Self::EducationLoan => "education_loan",
            Self::BusinessLoan => "business_loan",
            Self::CreditCard => "credit_card",
            Self::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::HomeLoan => "Home Loan",
            Self::CarLoan => "Car Loan",
            Self::PersonalLoan => "Personal Loan",
            Self::EducationLoan => "Education Loan",
            Self::BusinessLoan => "Business Loan",
            Self::CreditCard => "Credit Card",
            Self::Other => "Other",
        }
    }
}

impl std::str::FromStr for LoanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| format!("unknown loan type: {s}"))
    }
}

/// A liability as returned by `/finance/loans`.
///
/// `outstanding <= amount` is expected but not checked client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    #[serde(rename = "_id", alias = "id")]
    pub id: Id,
    #[serde(rename = "type")]
    pub kind: LoanType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    /// Sanctioned principal.
    #[serde(alias = "principal")]
    pub amount: f64,
    #[serde(default)]
    pub outstanding: f64,
    /// Annual rate in percent.
    #[serde(default)]
    pub interest_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenure_months: Option<u32>,
    #[serde(
        default,
        alias = "start_date",
        deserialize_with = "deserialize_opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body for creating or replacing a loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanInput {
    #[serde(rename = "type")]
    pub kind: LoanType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    pub amount: f64,
    pub outstanding: f64,
    pub interest_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenure_months: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
