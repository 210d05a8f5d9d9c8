//! Goals, insurance policies and budgets. The dashboard only keeps goals in its
//! store; the other two are reachable through the API client.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::date::deserialize_opt_date;
use super::Id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    #[serde(rename = "_id", alias = "id")]
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalInput {
    pub name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insurance {
    #[serde(rename = "_id", alias = "id")]
    pub id: Id,
    /// Policy kind as sent by the backend, e.g. `term_insurance`.
    #[serde(rename = "type")]
    pub kind: String,
    pub policy_name: String,
    #[serde(default)]
    pub coverage_amount: f64,
    #[serde(default)]
    pub premium: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium_frequency: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub policy_start: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub policy_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceInput {
    #[serde(rename = "type")]
    pub kind: String,
    pub policy_name: String,
    pub coverage_amount: f64,
    pub premium: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium_frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_end: Option<NaiveDate>,
}

/// A monthly budget; `month` is `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(rename = "_id", alias = "id")]
    pub id: Id,
    pub month: String,
    #[serde(default)]
    pub total_budget: f64,
    #[serde(default)]
    pub category_budgets: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings_target: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetInput {
    pub month: String,
    pub total_budget: f64,
    #[serde(default)]
    pub category_budgets: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings_target: Option<f64>,
}
