//! Dashboard aggregation: per-category budget rows, account summaries, the
//! budget summary triple and the helpers that turn dashboard edits into
//! ledger entries.
//!
//! `available` is cumulative from the first entry through the window end,
//! so unspent money rolls into the next month and overspending carries as a
//! negative balance. `budgeted` and `activity` are scoped to the window.
//!
//! Every function here is pure over a [`Ledger`] borrow.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    ACCOUNT_TRANSFER, AVAILABLE_TO_BUDGET, BALANCE_ADJUSTMENT, BudgetTransaction, EngineError,
    Ledger, Money, ResultEngine, ReportWindow, STARTING_BALANCE, Transaction, TransactionStatus,
    diagnostics::{self, Diagnostic, EntryRef},
};

/// Budgeted, activity and available amounts of one category or group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CategoryAmounts {
    pub budgeted: Money,
    pub activity: Money,
    pub available: Money,
}

impl std::ops::AddAssign for CategoryAmounts {
    fn add_assign(&mut self, rhs: Self) {
        self.budgeted += rhs.budgeted;
        self.activity += rhs.activity;
        self.available += rhs.available;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BudgetRow {
    /// Element-wise sum of the category rows that follow it.
    Group {
        name: String,
        amounts: CategoryAmounts,
    },
    Category {
        name: String,
        group: String,
        amounts: CategoryAmounts,
        monthly_budget: Option<Money>,
        goal: Option<Money>,
        /// Available as a percentage of the goal, else of the monthly budget.
        progress: Option<i64>,
    },
}

impl BudgetRow {
    pub fn name(&self) -> &str {
        match self {
            Self::Group { name, .. } | Self::Category { name, .. } => name,
        }
    }

    pub fn amounts(&self) -> CategoryAmounts {
        match self {
            Self::Group { amounts, .. } | Self::Category { amounts, .. } => *amounts,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group { .. })
    }
}

/// Amounts for every category name referenced by the ledger, fixed
/// pseudo-categories included. Unknown names are kept too; callers pick the
/// names they list.
pub fn category_amounts(
    ledger: &Ledger,
    window: &ReportWindow,
) -> HashMap<String, CategoryAmounts> {
    let mut out: HashMap<String, CategoryAmounts> = HashMap::new();

    for tx in ledger.transactions().iter() {
        if !window.reaches(tx.date) {
            continue;
        }
        let entry = out.entry(tx.category.clone()).or_default();
        entry.available += tx.amount;
        if window.contains(tx.date) {
            entry.activity += tx.amount;
        }
    }

    for tx in ledger.budget_transactions().iter() {
        if !window.reaches(tx.date) {
            continue;
        }
        let windowed = window.contains(tx.date);
        for (name, delta) in [(&tx.from_category, -tx.amount), (&tx.to_category, tx.amount)] {
            let entry = out.entry(name.clone()).or_default();
            entry.available += delta;
            if windowed {
                entry.budgeted += delta;
            }
        }
    }

    out
}

/// Group rows, each followed by its visible member categories. Groups with
/// no visible member are left out.
pub fn budget_rows(ledger: &Ledger, window: &ReportWindow) -> Vec<BudgetRow> {
    let amounts = category_amounts(ledger, window);
    let mut rows = Vec::new();

    for group in ledger.category_groups() {
        let members: Vec<BudgetRow> = ledger
            .user_categories()
            .iter()
            .filter(|category| category.group == group.id && !category.hidden)
            .map(|category| {
                let amounts = amounts.get(&category.name).copied().unwrap_or_default();
                BudgetRow::Category {
                    name: category.name.clone(),
                    group: group.name.clone(),
                    progress: progress(amounts.available, category.goal, category.monthly_budget),
                    monthly_budget: category.monthly_budget,
                    goal: category.goal,
                    amounts,
                }
            })
            .collect();

        if members.is_empty() {
            continue;
        }

        let mut total = CategoryAmounts::default();
        for member in &members {
            total += member.amounts();
        }
        rows.push(BudgetRow::Group {
            name: group.name.clone(),
            amounts: total,
        });
        rows.extend(members);
    }

    rows
}

fn progress(available: Money, goal: Option<Money>, monthly: Option<Money>) -> Option<i64> {
    let target = goal
        .filter(|g| !g.is_zero())
        .or_else(|| monthly.filter(|m| !m.is_zero()))?;
    Some(round_percent(available.minor(), target.minor()))
}

/// `round(n / d * 100)`, halves rounded up.
fn round_percent(n: i64, d: i64) -> i64 {
    let (n, d) = if d < 0 {
        (-(n as i128), -(d as i128))
    } else {
        (n as i128, d as i128)
    };
    let rounded = (2 * n * 100 + d).div_euclid(2 * d);
    i64::try_from(rounded).unwrap_or(if rounded > 0 { i64::MAX } else { i64::MIN })
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub name: String,
    /// All-time sum of the account's transactions.
    pub balance: Money,
    pub last_transaction: Option<NaiveDate>,
}

pub fn account_summaries(ledger: &Ledger) -> Vec<AccountSummary> {
    ledger
        .accounts()
        .iter()
        .map(|account| {
            let mut balance = Money::ZERO;
            let mut last_transaction: Option<NaiveDate> = None;
            for tx in ledger
                .transactions()
                .iter()
                .filter(|tx| tx.account == account.name)
            {
                balance += tx.amount;
                last_transaction = last_transaction.max(Some(tx.date));
            }
            AccountSummary {
                name: account.name.clone(),
                balance,
                last_transaction,
            }
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BudgetSummary {
    /// Money still waiting for a category, cumulative through window end.
    pub to_budget: Money,
    /// Negative spending in the window (a negative number).
    pub spent: Money,
    /// Allocated from "available to budget" in the window.
    pub budgeted: Money,
}

pub fn budget_summary(ledger: &Ledger, window: &ReportWindow) -> BudgetSummary {
    let mut inflow = Money::ZERO;
    let mut outflow = Money::ZERO;
    let mut spent = Money::ZERO;

    for record in ledger.transactions().records() {
        let tx = record.value();
        if !window.reaches(tx.date) {
            continue;
        }

        if tx.amount.is_positive() && counts_as_income(ledger, record.key(), tx) {
            inflow += tx.amount;
        }
        if tx.amount.is_negative()
            && (tx.category == AVAILABLE_TO_BUDGET || tx.category == BALANCE_ADJUSTMENT)
        {
            outflow += tx.amount;
        }
        if window.contains(tx.date)
            && tx.amount.is_negative()
            && tx.category != ACCOUNT_TRANSFER
            && tx.category != STARTING_BALANCE
            && tx.category != AVAILABLE_TO_BUDGET
        {
            spent += tx.amount;
        }
    }

    let mut to_pool = Money::ZERO;
    let mut from_pool = Money::ZERO;
    let mut budgeted = Money::ZERO;
    for tx in ledger.budget_transactions().iter() {
        if !window.reaches(tx.date) {
            continue;
        }
        if tx.to_category == AVAILABLE_TO_BUDGET {
            to_pool += tx.amount;
        }
        if tx.from_category == AVAILABLE_TO_BUDGET {
            from_pool += tx.amount;
            if window.contains(tx.date) {
                budgeted += tx.amount;
            }
        }
    }

    BudgetSummary {
        to_budget: inflow + to_pool + outflow - from_pool,
        spent,
        budgeted,
    }
}

fn counts_as_income(ledger: &Ledger, key: crate::EntryKey, tx: &Transaction) -> bool {
    if tx.category == AVAILABLE_TO_BUDGET || tx.category == STARTING_BALANCE {
        return true;
    }
    if tx.category != BALANCE_ADJUSTMENT {
        return false;
    }
    // Hidden accounts are left out as well; kept as-is pending product input.
    match ledger.account(&tx.account) {
        Some(account) => !account.is_credit_card && !account.is_hidden,
        None => {
            diagnostics::report(&Diagnostic::UnknownAccount {
                entry: EntryRef::Transaction(key),
                name: tx.account.clone(),
            });
            false
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    ToMonthlyAmount,
    MonthlyAmount,
    CompleteGoal,
    CoverOverspending,
}

impl SuggestionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::ToMonthlyAmount => "To monthly amount",
            Self::MonthlyAmount => "Monthly amount",
            Self::CompleteGoal => "Complete goal",
            Self::CoverOverspending => "Cover overspending",
        }
    }
}

/// A proposed new `budgeted` value for a category row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub amount: Money,
}

/// Quick-fill values for a category row. Group rows get none.
pub fn suggestions(row: &BudgetRow) -> Vec<Suggestion> {
    let BudgetRow::Category {
        amounts,
        monthly_budget,
        goal,
        ..
    } = row
    else {
        return Vec::new();
    };
    let CategoryAmounts {
        budgeted,
        available,
        ..
    } = *amounts;

    let mut out = Vec::new();
    if budgeted.is_zero() {
        if let Some(monthly) = monthly_budget.filter(|m| !m.is_zero()) {
            if available < monthly && !available.is_zero() {
                out.push(Suggestion {
                    kind: SuggestionKind::ToMonthlyAmount,
                    amount: monthly - available,
                });
            }
            out.push(Suggestion {
                kind: SuggestionKind::MonthlyAmount,
                amount: monthly,
            });
        }
        if let Some(goal) = goal.filter(|g| !g.is_zero())
            && available < goal
        {
            out.push(Suggestion {
                kind: SuggestionKind::CompleteGoal,
                amount: goal - available,
            });
        }
    } else if available.is_negative() {
        out.push(Suggestion {
            kind: SuggestionKind::CoverOverspending,
            amount: budgeted - available,
        });
    }
    out
}

fn user_category(ledger: &Ledger, name: &str) -> ResultEngine<()> {
    match ledger.category(name) {
        Some(category) if !category.is_fixed() => Ok(()),
        Some(_) => Err(EngineError::InvalidId(format!(
            "{name} is a fixed category"
        ))),
        None => Err(EngineError::KeyNotFound(format!("category {name}"))),
    }
}

/// The transfer that makes `category`'s windowed `budgeted` equal `amount`.
/// `None` when nothing has to move.
pub fn set_budgeted(
    ledger: &Ledger,
    category: &str,
    window: &ReportWindow,
    amount: Money,
    date: NaiveDate,
) -> ResultEngine<Option<BudgetTransaction>> {
    user_category(ledger, category)?;
    let current = category_amounts(ledger, window)
        .get(category)
        .map(|amounts| amounts.budgeted)
        .unwrap_or_default();
    let delta = amount - current;

    if delta.is_zero() {
        return Ok(None);
    }
    let tx = if delta.is_positive() {
        BudgetTransaction::new(date, delta, AVAILABLE_TO_BUDGET, category)?
    } else {
        BudgetTransaction::new(date, -delta, category, AVAILABLE_TO_BUDGET)?
    };
    Ok(Some(tx))
}

/// Moves `amount` of allocation from one category (or the pool) to another.
pub fn move_between_categories(
    ledger: &Ledger,
    from: &str,
    to: &str,
    amount: Money,
    date: NaiveDate,
) -> ResultEngine<BudgetTransaction> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(
            "amount must be greater than zero".to_string(),
        ));
    }
    if from == to {
        return Err(EngineError::InvalidId(
            "source and destination must differ".to_string(),
        ));
    }
    for name in [from, to] {
        if !ledger.is_known_category(name) {
            return Err(EngineError::KeyNotFound(format!("category {name}")));
        }
    }
    BudgetTransaction::new(date, amount, from, to)
}

/// The two settled "account transfer" legs moving `amount` between accounts.
pub fn transfer_between_accounts(
    ledger: &Ledger,
    from: &str,
    to: &str,
    amount: Money,
    date: NaiveDate,
    memo: &str,
) -> ResultEngine<[Transaction; 2]> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(
            "amount must be greater than zero".to_string(),
        ));
    }
    if from == to {
        return Err(EngineError::InvalidId(
            "source and destination must differ".to_string(),
        ));
    }
    for name in [from, to] {
        if !ledger.is_known_account(name) {
            return Err(EngineError::KeyNotFound(format!("account {name}")));
        }
    }
    let leg = |account: &str, amount: Money| {
        Transaction::new(date, amount, ACCOUNT_TRANSFER, account)
            .with_memo(memo)
            .with_status(TransactionStatus::Settled)
    };
    Ok([leg(from, -amount), leg(to, amount)])
}
