//! Merge-by-identifier of a re-pulled snapshot into the local ledger.
//!
//! Re-pull is additive: entities that disappeared remotely are left alone,
//! since a delete of ours may still be in flight. Records with an unsynced
//! local change or a local write newer than the pull are skipped, and ids
//! deleted after the pull started are not brought back.

use std::fmt;

use engine::{Ledger, LedgerData, Upsert};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

impl MergeStats {
    fn record(&mut self, outcome: Upsert) {
        match outcome {
            Upsert::Inserted => self.inserted += 1,
            Upsert::Updated => self.updated += 1,
            Upsert::Unchanged => self.unchanged += 1,
            Upsert::Skipped => self.skipped += 1,
        }
    }

    /// `true` when the merge modified the ledger.
    pub fn changed(&self) -> bool {
        self.inserted + self.updated > 0
    }
}

impl fmt::Display for MergeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} updated, {} unchanged, {} skipped",
            self.inserted, self.updated, self.unchanged, self.skipped
        )
    }
}

/// Merges `data`, pulled when the ledger was at generation `pulled_at`.
pub fn merge_remote(ledger: &mut Ledger, data: LedgerData, pulled_at: u64) -> MergeStats {
    let mut stats = MergeStats::default();

    let mut anchor = None;
    for account in data.accounts {
        stats.record(ledger.merge_account(account, &mut anchor));
    }
    let mut anchor = None;
    for group in data.category_groups {
        stats.record(ledger.merge_category_group(group, &mut anchor));
    }
    let mut anchor = None;
    for category in data.categories {
        stats.record(ledger.merge_category(category, &mut anchor));
    }
    let mut anchor = None;
    for tx in data.transactions {
        stats.record(ledger.merge_transaction(tx, &mut anchor, pulled_at));
    }
    let mut anchor = None;
    for tx in data.budget_transactions {
        stats.record(ledger.merge_budget_transaction(tx, &mut anchor, pulled_at));
    }

    ledger.expire_tombstones(pulled_at);
    stats
}
