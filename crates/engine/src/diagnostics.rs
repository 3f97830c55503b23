//! Integrity problems found in ledger data.
//!
//! Aggregation never fails on bad references: an entry that cites an unknown
//! category or account contributes nothing to the affected rollup and is
//! reported here instead.

use std::fmt;

use crate::ledger::EntryKey;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    UnknownCategory { entry: EntryRef, name: String },
    UnknownAccount { entry: EntryRef, name: String },
}

/// How a diagnostic points back at the offending entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryRef {
    Transaction(EntryKey),
    BudgetTransaction(EntryKey),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCategory { entry, name } => {
                write!(f, "{entry} references unknown category \"{name}\"")
            }
            Self::UnknownAccount { entry, name } => {
                write!(f, "{entry} references unknown account \"{name}\"")
            }
        }
    }
}

impl fmt::Display for EntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transaction(key) => write!(f, "transaction #{}", key.get()),
            Self::BudgetTransaction(key) => write!(f, "budget transaction #{}", key.get()),
        }
    }
}

/// Emits a diagnostic on the log channel.
pub(crate) fn report(diagnostic: &Diagnostic) {
    tracing::warn!(target: "engine::diagnostics", "{diagnostic}");
}
