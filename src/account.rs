use crate::amount::Amount;
use indexmap::IndexMap;
use rust_decimal::Decimal;

use std::fmt;

pub const PATH_SEPARATOR: char = ':';

/// Per-commodity running totals. Amounts without commodity share one slot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Balance {
    amounts: IndexMap<Option<String>, Amount>,
}

impl Balance {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn credit(&mut self, amount: &Amount) {
        self.amounts
            .entry(amount.commodity.clone())
            .or_insert_with(|| Amount::zero(amount.commodity()))
            .add_quantity(amount);
    }

    pub fn get(&self, commodity: Option<&str>) -> Option<&Amount> {
        self.amounts.get(&commodity.map(str::to_string))
    }

    pub fn amounts(&self) -> impl Iterator<Item = &Amount> {
        self.amounts.values()
    }

    pub fn commodity_count(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_zero_within(&self, tolerance: Decimal) -> bool {
        self.amounts().all(|amount| amount.is_zero_within(tolerance))
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amounts: Vec<String> = self.amounts().map(|a| a.to_string()).collect();
        if amounts.is_empty() {
            write!(f, "0")
        } else {
            write!(f, "{}", amounts.join(", "))
        }
    }
}

/// A ledger category, identified by its full colon-delimited path.
#[derive(Clone, Debug, PartialEq)]
pub struct Account {
    path: String,
    balance: Balance,
}

impl Account {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            balance: Balance::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> Vec<&str> {
        self.path.split(PATH_SEPARATOR).collect()
    }

    /// Last path segment, `Checking` for `Assets:Checking`.
    pub fn name(&self) -> &str {
        self.path
            .rsplit(PATH_SEPARATOR)
            .next()
            .unwrap_or(&self.path)
    }

    pub fn parent_path(&self) -> Option<&str> {
        self.path
            .rfind(PATH_SEPARATOR)
            .map(|pos| &self.path[..pos])
    }

    pub fn depth(&self) -> usize {
        self.path.matches(PATH_SEPARATOR).count() + 1
    }

    pub fn balance(&self) -> &Balance {
        &self.balance
    }

    pub fn credit(&mut self, amount: &Amount) {
        self.balance.credit(amount);
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// Registry of every account referenced so far, keyed by path.
///
/// Accounts are created on first lookup and never removed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccountStore {
    accounts: IndexMap<String, Account>,
}

impl AccountStore {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn find_or_create(&mut self, path: &str) -> &mut Account {
        self.accounts
            .entry(path.to_string())
            .or_insert_with(|| Account::new(path))
    }

    pub fn get(&self, path: &str) -> Option<&Account> {
        self.accounts.get(path)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Accounts sitting directly below `parent` in the path hierarchy.
    pub fn children_of<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = &'a Account> + 'a {
        self.iter()
            .filter(move |account| account.parent_path() == Some(parent))
    }
}
