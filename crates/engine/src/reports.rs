//! Trend, account and spending reports.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{ACCOUNT_TRANSFER, Ledger, Money, Month, ReportWindow};

/// Categories zeroed out of the trend chart.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrendExclusions {
    excluded: BTreeSet<String>,
}

impl TrendExclusions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_excluded(&self, category: &str) -> bool {
        self.excluded.contains(category)
    }

    pub fn toggle(&mut self, category: &str) {
        if !self.excluded.remove(category) {
            self.excluded.insert(category.to_string());
        }
    }

    /// Suppresses every category but `category`. When `category` is already
    /// the only one shown, every category is shown again.
    pub fn isolate<'a>(&mut self, category: &str, all: impl IntoIterator<Item = &'a str>) {
        let all: Vec<&str> = all.into_iter().collect();
        let already_isolated = !self.is_excluded(category)
            && all
                .iter()
                .filter(|name| **name != category)
                .all(|name| self.is_excluded(name));

        if already_isolated {
            self.excluded.clear();
            return;
        }
        self.excluded = all
            .into_iter()
            .filter(|name| *name != category)
            .map(str::to_string)
            .collect();
    }
}

fn date_span(dates: impl Iterator<Item = NaiveDate>) -> Option<(NaiveDate, NaiveDate)> {
    dates.fold(None, |span, date| match span {
        None => Some((date, date)),
        Some((start, end)) => Some((start.min(date), end.max(date))),
    })
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TrendSeries {
    pub category: String,
    /// Outflow per month, as a positive amount.
    pub data: Vec<Money>,
    pub excluded: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TrendReport {
    pub months: Vec<Month>,
    /// `"January 2024"` per month.
    pub labels: Vec<String>,
    pub series: Vec<TrendSeries>,
}

/// Monthly spending per user category across the whole dataset span.
pub fn trend_report(ledger: &Ledger, exclusions: &TrendExclusions) -> TrendReport {
    let Some((start, end)) = date_span(ledger.transactions().iter().map(|tx| tx.date)) else {
        return TrendReport::default();
    };
    let months = Month::span(start, end);

    let mut spent: HashMap<(&str, Month), Money> = HashMap::new();
    for tx in ledger.transactions().iter() {
        if tx.amount.is_negative() {
            *spent
                .entry((tx.category.as_str(), Month::of(tx.date)))
                .or_default() += tx.amount;
        }
    }

    let series = ledger
        .user_categories()
        .iter()
        .map(|category| {
            let excluded = exclusions.is_excluded(&category.name);
            let data = months
                .iter()
                .map(|month| {
                    if excluded {
                        return Money::ZERO;
                    }
                    spent
                        .get(&(category.name.as_str(), *month))
                        .map(|amount| amount.abs())
                        .unwrap_or_default()
                })
                .collect();
            TrendSeries {
                category: category.name.clone(),
                data,
                excluded,
            }
        })
        .collect();

    TrendReport {
        labels: months.iter().map(|month| month.label()).collect(),
        months,
        series,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AccountReportPoint {
    pub month: Month,
    /// Positive, non-transfer.
    pub inflow: Money,
    /// Negative, non-transfer.
    pub outflow: Money,
    /// Net of every account-transfer leg.
    pub transferred: Money,
    /// Running balance seeded at zero before the first month.
    pub ending_balance: Money,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AccountReport {
    pub account: Option<String>,
    pub labels: Vec<String>,
    pub points: Vec<AccountReportPoint>,
}

/// Monthly flows of one account. Falls back to the first account when
/// `account` is `None`.
pub fn account_report(ledger: &Ledger, account: Option<&str>) -> AccountReport {
    let Some(account) = account.or_else(|| ledger.accounts().first().map(|a| a.name.as_str()))
    else {
        return AccountReport::default();
    };

    let txs: Vec<_> = ledger
        .transactions()
        .iter()
        .filter(|tx| tx.account == account)
        .collect();
    let Some((start, end)) = date_span(txs.iter().map(|tx| tx.date)) else {
        return AccountReport {
            account: Some(account.to_string()),
            ..Default::default()
        };
    };

    let mut balance = Money::ZERO;
    let points: Vec<AccountReportPoint> = Month::span(start, end)
        .into_iter()
        .map(|month| {
            let mut point = AccountReportPoint {
                month,
                inflow: Money::ZERO,
                outflow: Money::ZERO,
                transferred: Money::ZERO,
                ending_balance: Money::ZERO,
            };
            for tx in txs.iter().filter(|tx| month.contains(tx.date)) {
                if tx.category == ACCOUNT_TRANSFER {
                    point.transferred += tx.amount;
                } else if tx.amount.is_positive() {
                    point.inflow += tx.amount;
                } else {
                    point.outflow += tx.amount;
                }
                balance += tx.amount;
            }
            point.ending_balance = balance;
            point
        })
        .collect();

    AccountReport {
        account: Some(account.to_string()),
        labels: points.iter().map(|p| p.month.label()).collect(),
        points,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SpendingSlice {
    pub category: String,
    pub amount: Money,
}

/// Absolute outflow per reportable user category, largest first. `None`
/// covers every date.
pub fn spending_report(ledger: &Ledger, window: Option<&ReportWindow>) -> Vec<SpendingSlice> {
    let mut spent: HashMap<&str, Money> = HashMap::new();
    for tx in ledger.transactions().iter() {
        if tx.amount.is_negative() && window.is_none_or(|w| w.contains(tx.date)) {
            *spent.entry(tx.category.as_str()).or_default() += tx.amount;
        }
    }

    let mut slices: Vec<SpendingSlice> = ledger
        .user_categories()
        .iter()
        .filter(|category| category.reportable)
        .filter_map(|category| {
            let amount = spent.get(category.name.as_str())?.abs();
            (!amount.is_zero()).then(|| SpendingSlice {
                category: category.name.clone(),
                amount,
            })
        })
        .collect();
    slices.sort_by(|a, b| b.amount.cmp(&a.amount));
    slices
}
