use crate::account::{Account, AccountStore};
use crate::entry::Entry;
use chrono::NaiveDate;

/// Committed entries, in commit order, and the accounts they touch.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    accounts: AccountStore,
    entries: Vec<Entry>,
}

impl Ledger {
    pub fn new() -> Ledger {
        Ledger {
            accounts: AccountStore::new(),
            entries: Vec::new(),
        }
    }

    /// Append a validated entry. With `compute_balances` its postings are
    /// credited to their accounts.
    pub fn commit(&mut self, entry: Entry, compute_balances: bool) {
        for txn in &entry.transactions {
            let account = self.accounts.find_or_create(&txn.account);
            if compute_balances {
                account.credit(&txn.cost);
            }
        }
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entries_on<'a>(&'a self, date: &'a NaiveDate) -> impl Iterator<Item = &'a Entry> + 'a {
        self.entries.iter().filter(move |entry| &entry.date == date)
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn accounts_mut(&mut self) -> &mut AccountStore {
        &mut self.accounts
    }

    pub fn account(&self, path: &str) -> Option<&Account> {
        self.accounts.get(path)
    }
}
