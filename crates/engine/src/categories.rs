//! Category registry.
//!
//! User categories come from the remote store and are partitioned by
//! [`CategoryGroup`]. Four fixed pseudo-categories always exist on top of
//! them; they take part in the aggregation math but are never listed, edited
//! or persisted remotely.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::Money;

pub const AVAILABLE_TO_BUDGET: &str = "Available to budget";
pub const ACCOUNT_TRANSFER: &str = "↕️ Account Transfer";
pub const BALANCE_ADJUSTMENT: &str = "🔢 Balance Adjustment";
pub const STARTING_BALANCE: &str = "➡️ Starting Balance";

/// Group name the fixed categories are filed under.
pub const PRESET_GROUP: &str = "Preset";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub id: String,
    pub name: String,
}

impl CategoryGroup {
    pub fn new(name: &str) -> Self {
        Self {
            id: name.to_string(),
            name: name.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Id of the owning [`CategoryGroup`].
    pub group: String,
    /// Non-reportable categories are left out of the spending report.
    pub reportable: bool,
    pub hidden: bool,
    /// Target recurring allocation.
    pub monthly_budget: Option<Money>,
    /// Target cumulative allocation.
    pub goal: Option<Money>,
}

impl Category {
    pub fn new(name: &str, group: &str) -> Self {
        Self {
            id: name.to_string(),
            name: name.to_string(),
            group: group.to_string(),
            reportable: true,
            hidden: false,
            monthly_budget: None,
            goal: None,
        }
    }

    /// Returns `true` for the four pseudo-categories.
    pub fn is_fixed(&self) -> bool {
        FixedCategory::from_name(&self.name).is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FixedCategory {
    /// The unallocated pool.
    AvailableToBudget,
    /// Inter-account move, net-zero across the two legs.
    AccountTransfer,
    /// Reconciliation corrections.
    BalanceAdjustment,
    /// Opening balances.
    StartingBalance,
}

impl FixedCategory {
    pub const ALL: [FixedCategory; 4] = [
        FixedCategory::AvailableToBudget,
        FixedCategory::AccountTransfer,
        FixedCategory::BalanceAdjustment,
        FixedCategory::StartingBalance,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::AvailableToBudget => AVAILABLE_TO_BUDGET,
            Self::AccountTransfer => ACCOUNT_TRANSFER,
            Self::BalanceAdjustment => BALANCE_ADJUSTMENT,
            Self::StartingBalance => STARTING_BALANCE,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|fixed| fixed.name() == name)
    }
}

static FIXED_CATEGORIES: LazyLock<Vec<Category>> = LazyLock::new(|| {
    FixedCategory::ALL
        .into_iter()
        .map(|fixed| Category {
            id: String::new(),
            name: fixed.name().to_string(),
            group: PRESET_GROUP.to_string(),
            reportable: false,
            hidden: false,
            monthly_budget: None,
            goal: None,
        })
        .collect()
});

/// The fixed pseudo-categories, in display order.
pub fn fixed_categories() -> &'static [Category] {
    &FIXED_CATEGORIES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_names_round_trip() {
        for fixed in FixedCategory::ALL {
            assert_eq!(FixedCategory::from_name(fixed.name()), Some(fixed));
        }
        assert_eq!(FixedCategory::from_name("Groceries"), None);
    }

    #[test]
    fn fixed_categories_are_not_reportable() {
        assert_eq!(fixed_categories().len(), 4);
        assert!(fixed_categories().iter().all(|c| !c.reportable && c.is_fixed()));
    }
}
