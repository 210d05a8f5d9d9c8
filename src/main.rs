use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use dialoguer::{Input, Password};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use finsight::api::ListQuery;
use finsight::app::App;
use finsight::boundary::{ViewBoundary, ViewError};
use finsight::chat::SendOutcome;
use finsight::config::{default_config_path, Config, DisplayConfig};
use finsight::format::{format_currency, format_percent};
use finsight::models::{
    ExpenseInput, Id, IncomeInput, InvestmentInput, InvestmentType, LoanInput, LoanType,
    ProfileUpdate, RegisterRequest,
};
use finsight::notify::{Notification, NotificationEvent};
use finsight::portfolio::{
    chart_label, debt_overview, portfolio_overview, BreakdownEntry, DashboardFigures,
};
use finsight::session::{SessionEvent, SESSION_EXPIRED_MESSAGE};
use finsight::store::{DashboardState, FetchOrigin};

fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    finsight::duration::parse_duration(s).map_err(|e| e.to_string())
}

#[derive(Parser)]
#[command(name = "finsight")]
#[command(about = "Personal finance dashboard client")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Override the API base URL
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and save the session
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Forget the saved session
    Logout,
    /// Show or update the profile
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Load the dashboard and print the overview
    Summary,
    /// Manage investments
    #[command(subcommand)]
    Investments(InvestmentsCommand),
    /// Manage loans
    #[command(subcommand)]
    Loans(LoansCommand),
    /// Record expenses
    #[command(subcommand)]
    Expense(ExpenseCommand),
    /// Record income
    #[command(subcommand)]
    Income(IncomeCommand),
    /// Print analytics charts
    Analytics {
        /// Months of history
        #[arg(long, default_value_t = 6)]
        months: u32,
    },
    /// Talk to the finance assistant
    Chat {
        /// Send a single message instead of starting a conversation
        message: Option<String>,
    },
    /// Keep the dashboard fresh in the background
    ///
    /// Reads host events from stdin, one per line: show, hide, online,
    /// offline, refresh, quit.
    Watch {
        /// Override the refresh interval
        #[arg(long, value_parser = parse_duration_arg)]
        interval: Option<Duration>,
        /// Skip the immediate load on start
        #[arg(long)]
        no_fetch_on_start: bool,
    },
    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
enum InvestmentsCommand {
    List,
    Add(InvestmentArgs),
    Update {
        id: String,
        #[command(flatten)]
        fields: InvestmentArgs,
    },
    Delete {
        id: String,
    },
}

#[derive(Args)]
struct InvestmentArgs {
    /// sip, mutual_fund, stocks, bonds, fd, ppf, epf, nps, crypto, etf, real_estate
    #[arg(long = "type")]
    kind: InvestmentType,
    #[arg(long)]
    name: String,
    #[arg(long)]
    amount: f64,
    #[arg(long)]
    current_value: Option<f64>,
    /// Defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    goal: Option<String>,
    #[arg(long)]
    description: Option<String>,
}

impl From<InvestmentArgs> for InvestmentInput {
    fn from(args: InvestmentArgs) -> Self {
        Self {
            kind: args.kind,
            name: args.name,
            amount: args.amount,
            current_value: args.current_value,
            date: args.date.unwrap_or_else(today),
            goal: args.goal,
            description: args.description,
        }
    }
}

#[derive(Subcommand)]
enum LoansCommand {
    List,
    Add(LoanArgs),
    Update {
        id: String,
        #[command(flatten)]
        fields: LoanArgs,
    },
    Delete {
        id: String,
    },
}

#[derive(Args)]
struct LoanArgs {
    /// home_loan, car_loan, personal_loan, education_loan, business_loan, credit_card
    #[arg(long = "type")]
    kind: LoanType,
    #[arg(long)]
    bank_name: Option<String>,
    #[arg(long)]
    amount: f64,
    #[arg(long)]
    outstanding: f64,
    /// Annual rate in percent
    #[arg(long)]
    interest_rate: f64,
    #[arg(long)]
    emi: Option<f64>,
    #[arg(long)]
    tenure_months: Option<u32>,
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    description: Option<String>,
}

impl From<LoanArgs> for LoanInput {
    fn from(args: LoanArgs) -> Self {
        Self {
            kind: args.kind,
            bank_name: args.bank_name,
            amount: args.amount,
            outstanding: args.outstanding,
            interest_rate: args.interest_rate,
            emi: args.emi,
            tenure_months: args.tenure_months,
            date: args.date,
            description: args.description,
        }
    }
}

#[derive(Subcommand)]
enum ExpenseCommand {
    Add {
        #[arg(long)]
        category: String,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        merchant: Option<String>,
    },
}

#[derive(Subcommand)]
enum IncomeCommand {
    Add {
        #[arg(long)]
        source: String,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_notification(notification: &Notification) {
    eprintln!("[{}] {}", notification.severity, notification.message);
}

fn require_session(app: &App) -> Result<()> {
    if !app.session().is_signed_in() {
        bail!("Not logged in. Run `finsight login` first.");
    }
    Ok(())
}

fn prompt(label: &str, given: Option<String>) -> Result<String> {
    match given {
        Some(value) => Ok(value),
        None => Input::<String>::new()
            .with_prompt(label)
            .interact_text()
            .with_context(|| format!("Failed to read {label}")),
    }
}

fn prompt_password(confirm: bool) -> Result<SecretString> {
    let mut password = Password::new().with_prompt("Password");
    if confirm {
        password = password.with_confirmation("Confirm password", "Passwords do not match");
    }
    let value = password.interact().context("Failed to read password")?;
    Ok(SecretString::from(value))
}

fn render_bars(entries: &[BreakdownEntry], display: &DisplayConfig) -> Result<String, ViewError> {
    const WIDTH: f64 = 30.0;
    if entries.is_empty() {
        return Ok("  (no data)".to_string());
    }
    if let Some(bad) = entries.iter().find(|e| !e.value.is_finite()) {
        return Err(ViewError::InvalidData(format!("{} is not a number", bad.label)));
    }
    let max = entries.iter().map(|e| e.value).fold(0.0_f64, f64::max);
    let label_width = entries.iter().map(|e| e.label.len()).max().unwrap_or(0);
    let lines: Vec<String> = entries
        .iter()
        .map(|entry| {
            let filled = if max > 0.0 {
                (entry.value / max * WIDTH).round() as usize
            } else {
                0
            };
            format!(
                "  {:<label_width$}  {:<30}  {}",
                entry.label,
                "#".repeat(filled),
                format_currency(entry.value, display),
            )
        })
        .collect();
    Ok(lines.join("\n"))
}

fn print_chart(
    boundary: &mut ViewBoundary,
    title: &str,
    entries: &[BreakdownEntry],
    display: &DisplayConfig,
) {
    println!("{title}");
    let rendered = boundary.render(|| render_bars(entries, display));
    println!("{}", rendered.into_text());
}

fn print_dashboard(state: &DashboardState, display: &DisplayConfig) {
    let figures = DashboardFigures::from_state(state);
    if let Some(summary) = &state.summary {
        println!("Net worth:        {}", format_currency(summary.net_worth, display));
        println!("Total income:     {}", format_currency(summary.total_income, display));
        println!("Total expenses:   {}", format_currency(summary.total_expenses, display));
        println!("Investments:      {}", format_currency(summary.total_investments, display));
        if let Some(total_loans) = summary.total_loans {
            println!("Loans:            {}", format_currency(total_loans, display));
        }
        println!("Monthly cash flow: {}", format_currency(summary.monthly_cash_flow, display));
        if let Some(band) = figures.savings_band {
            println!(
                "Savings rate:     {} ({})",
                format_percent(summary.savings_rate, 1, false),
                band.label()
            );
        }
    }

    let portfolio = &figures.portfolio;
    println!(
        "Portfolio:        {} invested, {} now ({})",
        format_currency(portfolio.total_invested, display),
        format_currency(portfolio.total_current_value, display),
        format_percent(portfolio.gain_percent, 2, true)
    );
    let debt = &figures.debt;
    if !state.loans.is_empty() {
        println!(
            "Debt:             {} outstanding at {} avg, EMI {}",
            format_currency(debt.total_outstanding, display),
            format_percent(debt.weighted_interest_rate, 2, false),
            format_currency(debt.total_emi, display)
        );
    }

    if !figures.goals.is_empty() {
        println!("\nGoals");
        for goal in &figures.goals {
            println!(
                "  {:<24} {:>7}  {} / {}",
                goal.name,
                format_percent(goal.display_percent(), 1, false),
                format_currency(goal.current_amount, display),
                format_currency(goal.target_amount, display)
            );
        }
    }

    if !state.recent_expenses.is_empty() {
        println!("\nRecent expenses");
        for expense in &state.recent_expenses {
            let date = expense
                .date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {date:<10}  {:<16} {}",
                chart_label(&expense.category),
                format_currency(expense.amount, display)
            );
        }
    }

    if let Some(error) = &state.error {
        println!("\n{error}");
    }
}

async fn run(cli: Cli, app: &App) -> Result<()> {
    let display = app.config().display.clone();
    match cli.command {
        Command::Login { email } => {
            let email = prompt("Email", email)?;
            let password = prompt_password(false)?;
            let user = app.login(&email, &password).await?;
            println!("Logged in as {} <{}>", user.name, user.email);
        }
        Command::Register { email, name, phone } => {
            let request = RegisterRequest {
                email: prompt("Email", email)?,
                name: prompt("Full name", name)?,
                phone,
                password: prompt_password(true)?.expose_secret().to_string(),
            };
            let user = app.register(&request).await?;
            println!("Registered and logged in as {} <{}>", user.name, user.email);
        }
        Command::Logout => {
            app.logout().await?;
            println!("Logged out");
        }
        Command::Profile { name, phone } => {
            require_session(app)?;
            let user = if name.is_some() || phone.is_some() {
                app.update_profile(&ProfileUpdate { name, phone }).await?
            } else {
                app.profile().await?
            };
            print_json(&user)?;
        }
        Command::Summary => {
            require_session(app)?;
            let report = app.store().fetch_all(FetchOrigin::User).await?;
            for (slice, err) in &report.failed {
                tracing::debug!(slice = %slice, error = %err, "Slice unavailable");
            }
            print_dashboard(&app.store().snapshot(), &display);
        }
        Command::Investments(cmd) => {
            require_session(app)?;
            let store = app.store();
            match cmd {
                InvestmentsCommand::List => {
                    let investments = app.client().list_investments(&ListQuery::default()).await?;
                    print_json(&portfolio_overview(&investments))?;
                }
                InvestmentsCommand::Add(args) => {
                    let created = store.add_investment(&args.into()).await?;
                    print_json(&created)?;
                }
                InvestmentsCommand::Update { id, fields } => {
                    let updated = store.update_investment(&Id::new(id), &fields.into()).await?;
                    print_json(&updated)?;
                }
                InvestmentsCommand::Delete { id } => {
                    store.delete_investment(&Id::new(id)).await?;
                }
            }
        }
        Command::Loans(cmd) => {
            require_session(app)?;
            let store = app.store();
            match cmd {
                LoansCommand::List => {
                    let loans = app.client().list_loans(&ListQuery::default()).await?;
                    print_json(&debt_overview(&loans))?;
                }
                LoansCommand::Add(args) => {
                    let created = store.add_loan(&args.into()).await?;
                    print_json(&created)?;
                }
                LoansCommand::Update { id, fields } => {
                    let updated = store.update_loan(&Id::new(id), &fields.into()).await?;
                    print_json(&updated)?;
                }
                LoansCommand::Delete { id } => {
                    store.delete_loan(&Id::new(id)).await?;
                }
            }
        }
        Command::Expense(ExpenseCommand::Add {
            category,
            amount,
            description,
            date,
            merchant,
        }) => {
            require_session(app)?;
            let input = ExpenseInput {
                category,
                amount,
                description,
                date: date.unwrap_or_else(today),
                merchant,
            };
            print_json(&app.store().add_expense(&input).await?)?;
        }
        Command::Income(IncomeCommand::Add {
            source,
            amount,
            description,
            date,
        }) => {
            require_session(app)?;
            let input = IncomeInput {
                source,
                amount,
                description,
                date: date.unwrap_or_else(today),
            };
            print_json(&app.store().add_income(&input).await?)?;
        }
        Command::Analytics { months } => {
            require_session(app)?;
            let client = app.client();
            let (expenses, investments, comparison) = tokio::join!(
                client.expense_analytics(Some(months)),
                client.investment_analytics(),
                client.monthly_comparison(Some(months)),
            );

            let mut expense_chart = ViewBoundary::new("expense-breakdown");
            let mut portfolio_chart = ViewBoundary::new("portfolio-breakdown");
            if let Ok(expenses) = expenses {
                let entries = finsight::portfolio::breakdown(&expenses.category_breakdown);
                print_chart(&mut expense_chart, "Expenses by category", &entries, &display);
            }
            if let Ok(investments) = investments {
                let entries = finsight::portfolio::breakdown(&investments.portfolio_breakdown);
                print_chart(&mut portfolio_chart, "\nPortfolio by type", &entries, &display);
                println!(
                    "  Growth: {}",
                    format_percent(investments.growth_rate, 2, true)
                );
            }
            if let Ok(comparison) = comparison {
                println!("\nMonthly comparison");
                for month in &comparison {
                    println!(
                        "  {:<8} income {}  expenses {}  saved {}",
                        month.label(),
                        format_currency(month.income, &display),
                        format_currency(month.expenses, &display),
                        format_percent(month.savings_rate(), 1, false)
                    );
                }
            }
        }
        Command::Chat { message } => {
            require_session(app)?;
            let chat = app.chat();
            if let Some(message) = message {
                if let SendOutcome::Replied(reply) = chat.send(&message).await {
                    println!("{}", reply.text);
                }
                return Ok(());
            }

            for message in chat.transcript() {
                println!("assistant> {}", message.text);
            }
            let suggestions = chat.suggestions().await;
            if !suggestions.is_empty() {
                println!("\nTry asking:");
                for suggestion in &suggestions {
                    println!("  - {suggestion}");
                }
            }

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                if matches!(line.trim(), "quit" | "exit") {
                    break;
                }
                match chat.send(&line).await {
                    SendOutcome::Replied(reply) => {
                        println!("assistant> {}", reply.text);
                        for suggestion in &reply.suggestions {
                            println!("  - {suggestion}");
                        }
                    }
                    SendOutcome::Ignored | SendOutcome::Busy => {}
                }
                if app.session().is_expired() {
                    break;
                }
            }
        }
        Command::Watch {
            interval,
            no_fetch_on_start,
        } => {
            require_session(app)?;
            watch(app, interval, !no_fetch_on_start).await?;
        }
        Command::Config => {
            println!("Config file: {}", cli.config.display());
            print_json(app.config())?;
        }
    }
    Ok(())
}

async fn watch(app: &App, interval: Option<Duration>, fetch_on_start: bool) -> Result<()> {
    let display = app.config().display.clone();
    let mut controller = app.refresh_controller().with_fetch_on_start(fetch_on_start);
    if let Some(interval) = interval {
        controller = controller.with_interval(interval);
    }
    let handle = controller.spawn();

    let mut notifications = app.relay().subscribe();
    let mut session_events = app.session().subscribe();
    let mut state = app.store().subscribe();
    let mut last_shown = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "show" => { handle.visibility_changed(true); }
                    "hide" => { handle.visibility_changed(false); }
                    "online" => { handle.online(); }
                    "offline" => { handle.offline(); }
                    "refresh" => { handle.refresh_now(); }
                    "quit" | "exit" => break,
                    "" => {}
                    other => eprintln!("Unknown event: {other}"),
                }
            }
            event = notifications.recv() => match event {
                Ok(NotificationEvent::Added(notification)) => print_notification(&notification),
                Ok(NotificationEvent::Removed(_)) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
            event = session_events.recv() => {
                if matches!(event, Ok(SessionEvent::Expired | SessionEvent::SignedOut)) {
                    break;
                }
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = state.borrow_and_update().clone();
                if !snapshot.is_loading() && snapshot.last_updated != last_shown {
                    last_shown = snapshot.last_updated;
                    println!();
                    print_dashboard(&snapshot, &display);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown().await;
    app.shutdown();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(cli.log_json.then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .json()
        }))
        .with((!cli.log_json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();

    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?
        .with_env_overrides()
        .with_api_url_override(cli.api_url.clone());
    let app = App::open(config).await?;
    let watching = matches!(cli.command, Command::Watch { .. });

    let result = run(cli, &app).await;

    if !watching {
        for notification in app.relay().active() {
            print_notification(&notification);
        }
    }
    if app.session().is_expired() {
        eprintln!("{SESSION_EXPIRED_MESSAGE} Run `finsight login`.");
        return Ok(ExitCode::from(2));
    }
    result.map(|()| ExitCode::SUCCESS)
}
