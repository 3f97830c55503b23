//! Accounts hold money; every transaction belongs to exactly one of them.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable id assigned by the remote store (the account name).
    pub id: String,
    pub name: String,
    pub is_credit_card: bool,
    pub is_hidden: bool,
}

impl Account {
    /// Bank/cash account whose id is its name.
    pub fn new(name: &str) -> Self {
        Self {
            id: name.to_string(),
            name: name.to_string(),
            is_credit_card: false,
            is_hidden: false,
        }
    }

    pub fn credit_card(name: &str) -> Self {
        Self {
            is_credit_card: true,
            ..Self::new(name)
        }
    }
}
