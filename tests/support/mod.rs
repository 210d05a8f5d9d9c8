#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use finsight::api::{ApiError, ApiResult, FinanceBackend};
use finsight::models::{
    Expense, ExpenseAnalytics, ExpenseInput, FinancialSummary, Goal, Id, Income, IncomeInput,
    Investment, InvestmentAnalytics, InvestmentInput, InvestmentType, Loan, LoanInput, LoanType,
};
use finsight::notify::NotificationRelay;
use finsight::store::{DashboardStore, StoreOptions};

#[derive(Debug, Default, Clone)]
pub struct BackendData {
    pub summary: FinancialSummary,
    pub investments: Vec<Investment>,
    pub loans: Vec<Loan>,
    pub expenses: Vec<Expense>,
    pub income: Vec<Income>,
    pub expense_analytics: ExpenseAnalytics,
    pub investment_analytics: InvestmentAnalytics,
    pub goals: Vec<Goal>,
}

/// In-process backend with scripted latency and failures per call name
/// (`"summary"`, `"investments"`, `"create_expense"`, ...).
#[derive(Default)]
pub struct ScriptedBackend {
    data: Mutex<BackendData>,
    delays: Mutex<HashMap<&'static str, Duration>>,
    failures: Mutex<HashMap<&'static str, ApiError>>,
    calls: Mutex<Vec<&'static str>>,
    next_id: AtomicU64,
}

impl ScriptedBackend {
    pub fn new(data: BackendData) -> Arc<Self> {
        Arc::new(Self {
            data: Mutex::new(data),
            ..Default::default()
        })
    }

    pub fn delay(&self, call: &'static str, by: Duration) {
        self.delays.lock().unwrap().insert(call, by);
    }

    pub fn fail(&self, call: &'static str, err: ApiError) {
        self.failures.lock().unwrap().insert(call, err);
    }

    pub fn heal(&self, call: &'static str) {
        self.failures.lock().unwrap().remove(call);
    }

    pub fn update(&self, f: impl FnOnce(&mut BackendData)) {
        f(&mut *self.data.lock().unwrap());
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
    }

    async fn enter(&self, call: &'static str) -> ApiResult<()> {
        self.calls.lock().unwrap().push(call);
        let delay = self.delays.lock().unwrap().get(call).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failures.lock().unwrap().get(call) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn new_id(&self, prefix: &str) -> Id {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Id::new(format!("{prefix}-{n}"))
    }

    fn read<T>(&self, f: impl FnOnce(&BackendData) -> T) -> T {
        f(&*self.data.lock().unwrap())
    }
}

#[async_trait]
impl FinanceBackend for ScriptedBackend {
    async fn summary(&self) -> ApiResult<FinancialSummary> {
        self.enter("summary").await?;
        Ok(self.read(|d| d.summary.clone()))
    }

    async fn investments(&self) -> ApiResult<Vec<Investment>> {
        self.enter("investments").await?;
        Ok(self.read(|d| d.investments.clone()))
    }

    async fn loans(&self) -> ApiResult<Vec<Loan>> {
        self.enter("loans").await?;
        Ok(self.read(|d| d.loans.clone()))
    }

    async fn recent_expenses(&self, limit: usize) -> ApiResult<Vec<Expense>> {
        self.enter("recent_expenses").await?;
        Ok(self.read(|d| d.expenses.iter().take(limit).cloned().collect()))
    }

    async fn recent_income(&self, limit: usize) -> ApiResult<Vec<Income>> {
        self.enter("recent_income").await?;
        Ok(self.read(|d| d.income.iter().take(limit).cloned().collect()))
    }

    async fn expense_analytics(&self, _months: u32) -> ApiResult<ExpenseAnalytics> {
        self.enter("expense_analytics").await?;
        Ok(self.read(|d| d.expense_analytics.clone()))
    }

    async fn investment_analytics(&self) -> ApiResult<InvestmentAnalytics> {
        self.enter("investment_analytics").await?;
        Ok(self.read(|d| d.investment_analytics.clone()))
    }

    async fn goals(&self, limit: usize) -> ApiResult<Vec<Goal>> {
        self.enter("goals").await?;
        Ok(self.read(|d| d.goals.iter().take(limit).cloned().collect()))
    }

    async fn create_investment(&self, input: &InvestmentInput) -> ApiResult<Investment> {
        self.enter("create_investment").await?;
        let created = Investment {
            id: self.new_id("inv"),
            kind: input.kind,
            name: input.name.clone(),
            amount: input.amount,
            current_value: input.current_value,
            date: Some(input.date),
            goal: input.goal.clone(),
            description: input.description.clone(),
        };
        self.update(|d| d.investments.push(created.clone()));
        Ok(created)
    }

    async fn update_investment(&self, id: &Id, input: &InvestmentInput) -> ApiResult<Investment> {
        self.enter("update_investment").await?;
        let updated = Investment {
            id: id.clone(),
            kind: input.kind,
            name: input.name.clone(),
            amount: input.amount,
            current_value: input.current_value,
            date: Some(input.date),
            goal: input.goal.clone(),
            description: input.description.clone(),
        };
        self.update(|d| {
            if let Some(slot) = d.investments.iter_mut().find(|i| &i.id == id) {
                *slot = updated.clone();
            }
        });
        Ok(updated)
    }

    async fn delete_investment(&self, id: &Id) -> ApiResult<()> {
        self.enter("delete_investment").await?;
        self.update(|d| d.investments.retain(|i| &i.id != id));
        Ok(())
    }

    async fn create_loan(&self, input: &LoanInput) -> ApiResult<Loan> {
        self.enter("create_loan").await?;
        let created = loan_from_input(self.new_id("loan"), input);
        self.update(|d| d.loans.push(created.clone()));
        Ok(created)
    }

    async fn update_loan(&self, id: &Id, input: &LoanInput) -> ApiResult<Loan> {
        self.enter("update_loan").await?;
        Ok(loan_from_input(id.clone(), input))
    }

    async fn delete_loan(&self, id: &Id) -> ApiResult<()> {
        self.enter("delete_loan").await?;
        self.update(|d| d.loans.retain(|l| &l.id != id));
        Ok(())
    }

    async fn create_expense(&self, input: &ExpenseInput) -> ApiResult<Expense> {
        self.enter("create_expense").await?;
        let created = Expense {
            id: self.new_id("exp"),
            category: input.category.clone(),
            amount: input.amount,
            description: input.description.clone(),
            date: Some(input.date),
            merchant: input.merchant.clone(),
        };
        self.update(|d| d.expenses.insert(0, created.clone()));
        Ok(created)
    }

    async fn create_income(&self, input: &IncomeInput) -> ApiResult<Income> {
        self.enter("create_income").await?;
        let created = Income {
            id: self.new_id("inc"),
            source: input.source.clone(),
            amount: input.amount,
            description: input.description.clone(),
            date: Some(input.date),
        };
        self.update(|d| d.income.insert(0, created.clone()));
        Ok(created)
    }
}

fn loan_from_input(id: Id, input: &LoanInput) -> Loan {
    Loan {
        id,
        kind: input.kind,
        bank_name: input.bank_name.clone(),
        amount: input.amount,
        outstanding: input.outstanding,
        interest_rate: input.interest_rate,
        emi: input.emi,
        tenure_months: input.tenure_months,
        date: input.date,
        description: input.description.clone(),
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn summary(net_worth: f64) -> FinancialSummary {
    FinancialSummary {
        net_worth,
        total_income: 120_000.0,
        total_expenses: 80_000.0,
        total_investments: 250_000.0,
        total_loans: None,
        savings_rate: 33.3,
        monthly_cash_flow: 40_000.0,
    }
}

pub fn investment(id: &str, amount: f64) -> Investment {
    Investment {
        id: Id::new(id),
        kind: InvestmentType::Stocks,
        name: format!("Holding {id}"),
        amount,
        current_value: Some(amount * 1.1),
        date: Some(date(2024, 1, 15)),
        goal: None,
        description: None,
    }
}

pub fn loan(id: &str, outstanding: f64, rate: f64) -> Loan {
    Loan {
        id: Id::new(id),
        kind: LoanType::PersonalLoan,
        bank_name: Some("Bank".to_string()),
        amount: outstanding * 2.0,
        outstanding,
        interest_rate: rate,
        emi: Some(5_000.0),
        tenure_months: Some(36),
        date: None,
        description: None,
    }
}

pub fn expense(id: &str, amount: f64) -> Expense {
    Expense {
        id: Id::new(id),
        category: "food".to_string(),
        amount,
        description: String::new(),
        date: Some(date(2024, 1, 1)),
        merchant: None,
    }
}

pub fn expense_input(amount: f64) -> ExpenseInput {
    ExpenseInput {
        category: "food".to_string(),
        amount,
        description: "Groceries".to_string(),
        date: date(2024, 1, 1),
        merchant: None,
    }
}

pub fn investment_input(name: &str, amount: f64) -> InvestmentInput {
    InvestmentInput {
        kind: InvestmentType::MutualFund,
        name: name.to_string(),
        amount,
        current_value: None,
        date: date(2024, 2, 1),
        goal: None,
        description: None,
    }
}

pub fn populated() -> BackendData {
    BackendData {
        summary: summary(500_000.0),
        investments: vec![investment("i1", 100_000.0), investment("i2", 50_000.0)],
        loans: vec![loan("l1", 200_000.0, 12.5)],
        expenses: (1..=12).map(|n| expense(&format!("e{n}"), 100.0 * n as f64)).collect(),
        income: Vec::new(),
        expense_analytics: ExpenseAnalytics::default(),
        investment_analytics: InvestmentAnalytics::default(),
        goals: Vec::new(),
    }
}

pub fn store_for(backend: Arc<ScriptedBackend>) -> (DashboardStore, NotificationRelay) {
    let relay = NotificationRelay::default();
    let store = DashboardStore::with_options(backend, relay.clone(), StoreOptions::default());
    (store, relay)
}
