use crate::account::Balance;
use crate::amount::Amount;
use crate::error::LedgerError;
use crate::parser::{LedgerParser, Rule};
use crate::transaction::Transaction;

use chrono::NaiveDate;
use pest::iterators::Pair;
use pest::Parser;
use rust_decimal::Decimal;

use std::fmt;

/// A dated journal entry and its postings, in source order.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub date: NaiveDate,
    pub cleared: bool,
    pub code: Option<String>,
    pub description: String,
    pub transactions: Vec<Transaction>,
}

impl Entry {
    pub fn new(date: NaiveDate, description: &str) -> Self {
        Self {
            date,
            cleared: false,
            code: None,
            description: description.to_string(),
            transactions: Vec::new(),
        }
    }

    /// Parse an entry header line, `[YYYY/]MM/DD [* ][(CODE) ]DESCRIPTION`.
    /// `.` works as date separator too. `current_year` fills in a missing year.
    pub fn parse_header(line: &str, current_year: i32) -> Result<Entry, LedgerError> {
        let header = LedgerParser::parse(Rule::header, line)
            .map_err(|_| LedgerError::syntax(line, "malformed entry header"))?
            .next()
            .ok_or_else(|| LedgerError::syntax(line, "empty entry header"))?;

        let mut date = None;
        let mut cleared = false;
        let mut code = None;
        let mut description = "";
        for pair in header.into_inner() {
            match pair.as_rule() {
                Rule::date => date = Some(parse_date(pair, current_year, line)?),
                Rule::cleared => cleared = true,
                Rule::code => code = pair.into_inner().next().map(|c| c.as_str().to_string()),
                Rule::description => description = pair.as_str(),
                _ => {}
            }
        }

        let date = date.ok_or_else(|| LedgerError::syntax(line, "missing date"))?;
        let mut entry = Entry::new(date, description);
        entry.cleared = cleared;
        entry.code = code;
        Ok(entry)
    }

    pub fn first_cost(&self) -> Option<&Amount> {
        self.transactions.first().map(|txn| &txn.cost)
    }

    /// Sum of posting costs, one total per commodity.
    pub fn balance(&self) -> Balance {
        let mut balance = Balance::new();
        for txn in &self.transactions {
            balance.credit(&txn.cost);
        }
        balance
    }

    pub fn is_balanced(&self, tolerance: Decimal) -> bool {
        self.balance().is_zero_within(tolerance)
    }

    pub fn validate(&self, tolerance: Decimal, ending_line: usize) -> Result<(), LedgerError> {
        if self.is_balanced(tolerance) {
            return Ok(());
        }

        Err(LedgerError::Unbalanced {
            ending_line,
            entry: self.to_string(),
        })
    }
}

fn parse_date(token: Pair<Rule>, current_year: i32, line: &str) -> Result<NaiveDate, LedgerError> {
    let mut year = current_year;
    let mut month = 0;
    let mut day = 0;
    for part in token.into_inner() {
        let invalid = |_| LedgerError::syntax(line, format!("invalid date part `{}'", part.as_str()));
        match part.as_rule() {
            Rule::year => year = part.as_str().parse().map_err(invalid)?,
            Rule::month => month = part.as_str().parse().map_err(invalid)?,
            Rule::day => day = part.as_str().parse().map_err(invalid)?,
            _ => {}
        }
    }

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        LedgerError::syntax(line, format!("invalid date {}/{}/{}", year, month, day))
    })
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format("%Y/%m/%d"))?;
        if self.cleared {
            write!(f, " *")?;
        }
        if let Some(code) = &self.code {
            write!(f, " ({})", code)?;
        }
        write!(f, " {}", self.description)?;
        for txn in &self.transactions {
            write!(f, "\n{}", txn)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::amount::Amount;
    use crate::entry::Entry;
    use crate::error::LedgerError;
    use crate::transaction::Transaction;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use anyhow::{anyhow, Result};

    fn tolerance() -> Decimal {
        Decimal::new(1, 6)
    }

    #[test]
    fn parse_full_header() -> Result<()> {
        let entry = Entry::parse_header("2021/04/01 * (1042) Gubuk mang Engking", 1999)?;
        assert_eq!(
            entry.date,
            NaiveDate::from_ymd_opt(2021, 4, 1).ok_or(anyhow!("invalid date"))?
        );
        assert!(entry.cleared);
        assert_eq!(entry.code.as_deref(), Some("1042"));
        assert_eq!(entry.description, "Gubuk mang Engking");
        assert!(entry.transactions.is_empty());
        Ok(())
    }

    #[test]
    fn parse_header_without_year() -> Result<()> {
        let entry = Entry::parse_header("3.15   Coffee (large) * twice", 2020)?;
        assert_eq!(
            entry.date,
            NaiveDate::from_ymd_opt(2020, 3, 15).ok_or(anyhow!("invalid date"))?
        );
        assert!(!entry.cleared);
        assert_eq!(entry.code, None);
        assert_eq!(entry.description, "Coffee (large) * twice");
        Ok(())
    }

    #[test]
    fn marker_without_space_is_description() -> Result<()> {
        let entry = Entry::parse_header("3/15 *Coffee", 2020)?;
        assert!(!entry.cleared);
        assert_eq!(entry.description, "*Coffee");

        let entry = Entry::parse_header("3/15 (A1)Coffee", 2020)?;
        assert_eq!(entry.code, None);
        assert_eq!(entry.description, "(A1)Coffee");
        Ok(())
    }

    #[test]
    fn parse_wrong_header() {
        assert_eq!(
            Entry::parse_header("2021-04-01 Rent", 2021).unwrap_err(),
            LedgerError::syntax("2021-04-01 Rent", "malformed entry header")
        );
        assert!(Entry::parse_header("4/1", 2021).is_err());
        assert!(Entry::parse_header("4/1    ", 2021).is_err());
        assert_eq!(
            format!("{}", Entry::parse_header("2/30 Nope", 2021).unwrap_err()),
            "failed to parse `2/30 Nope': invalid date 2021/2/30"
        );
    }

    #[test]
    fn balanced_across_commodities() -> Result<()> {
        let mut entry = Entry::parse_header("2024/01/05 Exchange", 2024)?;
        entry.transactions = vec![
            Transaction::new("Assets:USD", Amount::parse("$100")?),
            Transaction::new("Assets:EUR", Amount::parse("90 EUR")?),
            Transaction::new("Equity:Exchange", Amount::parse("$-100")?),
            Transaction::new("Equity:Exchange", Amount::parse("-90 EUR")?),
        ];
        assert!(entry.is_balanced(tolerance()));
        assert_eq!(entry.validate(tolerance(), 9), Ok(()));
        Ok(())
    }

    #[test]
    fn unbalanced_entry_dump() -> Result<()> {
        let mut entry = Entry::parse_header("2024/01/05 * (7) Groceries", 2024)?;
        entry.transactions = vec![
            Transaction::new("Expenses:Food", Amount::parse("$20")?).with_note(Some("weekly")),
            Transaction::new("Assets:Cash", Amount::parse("$-19")?),
        ];

        assert!(!entry.is_balanced(tolerance()));
        assert_eq!(
            entry.validate(tolerance(), 12),
            Err(LedgerError::Unbalanced {
                ending_line: 12,
                entry: "2024/01/05 * (7) Groceries\n    Expenses:Food  $20  ; weekly\n    Assets:Cash  $-19"
                    .to_string(),
            })
        );
        Ok(())
    }

    #[test]
    fn tiny_remainder_is_tolerated() -> Result<()> {
        let mut entry = Entry::new(
            NaiveDate::from_ymd_opt(2024, 2, 1).ok_or(anyhow!("invalid date"))?,
            "Rounding",
        );
        entry.transactions = vec![
            Transaction::new("A", Amount::parse("1.0000001")?),
            Transaction::new("B", Amount::parse("-1")?),
        ];
        assert!(entry.is_balanced(tolerance()));
        Ok(())
    }
}
