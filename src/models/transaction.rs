use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::date::deserialize_opt_date;
use super::Id;

/// A spending record from `/finance/expenses`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(rename = "_id", alias = "id")]
    pub id: Id,
    pub category: String,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseInput {
    pub category: String,
    pub amount: f64,
    pub description: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
}

/// An income record from `/finance/income`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    #[serde(rename = "_id", alias = "id")]
    pub id: Id,
    pub source: String,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeInput {
    pub source: String,
    pub amount: f64,
    pub description: String,
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expense_without_description_parses() {
        let expense: Expense = serde_json::from_str(
            r#"{"_id": "e1", "category": "food", "amount": 500, "date": "2024-01-01"}"#,
        )
        .unwrap();
        assert_eq!(expense.category, "food");
        assert_eq!(expense.description, "");
        assert_eq!(expense.date, NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn income_accepts_plain_id() {
        let income: Income = serde_json::from_str(
            r#"{"id": "i1", "source": "Primary Salary", "amount": 120000}"#,
        )
        .unwrap();
        assert_eq!(income.id.as_str(), "i1");
        assert_eq!(income.date, None);
    }
}
