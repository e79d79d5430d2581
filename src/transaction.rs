use crate::amount::Amount;
use crate::entry::Entry;
use crate::error::LedgerError;

use std::fmt;

/// One posting of an entry. `account` is the registry key of the target account.
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    pub account: String,
    pub cost: Amount,
    pub note: Option<String>,
}

impl Transaction {
    pub fn new(account: &str, cost: Amount) -> Self {
        Self {
            account: account.to_string(),
            cost,
            note: None,
        }
    }

    pub fn with_note(mut self, note: Option<&str>) -> Self {
        self.note = note.map(str::to_string);
        self
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "    {}  {}", self.account, self.cost)?;
        if let Some(note) = &self.note {
            write!(f, "  ; {}", note)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq)]
pub enum PostingCost<'l> {
    /// No amount given, the posting balances the entry's first posting.
    Implicit,
    Explicit(&'l str),
}

/// Posting line split into its fields, before any amount parsing or
/// account resolution.
#[derive(Debug, PartialEq)]
pub struct ParsedPosting<'l> {
    pub(crate) account: &'l str,
    pub(crate) cost: PostingCost<'l>,
    pub(crate) note: Option<&'l str>,
}

impl<'l> ParsedPosting<'l> {
    /// Split an indented line. The account ends at the first run of two or
    /// more spaces, so single spaces inside account names survive.
    ///
    /// Returns `None` for lines carrying only whitespace or a `;` comment.
    pub fn parse(line: &'l str) -> Option<ParsedPosting<'l>> {
        let body = line.trim();
        if body.is_empty() || body.starts_with(';') {
            return None;
        }

        let (account, rest) = match body.find("  ") {
            Some(pos) => (&body[..pos], body[pos..].trim_start()),
            None => (body, ""),
        };

        if rest.is_empty() || rest.starts_with(';') {
            return Some(ParsedPosting {
                account,
                cost: PostingCost::Implicit,
                note: note_text(rest),
            });
        }

        let posting = match rest.find(';') {
            Some(pos) => ParsedPosting {
                account,
                cost: PostingCost::Explicit(rest[..pos].trim_end()),
                note: note_text(&rest[pos..]),
            },
            None => ParsedPosting {
                account,
                cost: PostingCost::Explicit(rest),
                note: None,
            },
        };

        Some(posting)
    }

    pub fn account(&self) -> &'l str {
        self.account
    }
}

fn note_text(text: &str) -> Option<&str> {
    let note = text.trim_start_matches(|c: char| c == ';' || c.is_whitespace());
    (!note.is_empty()).then_some(note)
}

/// Extension point invoked after every posting lands in its entry.
///
/// Whatever postings the hook returns are appended to the same entry, right
/// after the posting that triggered it, and take part in balancing.
pub trait PostingHook {
    fn after_posting(
        &mut self,
        posting: &Transaction,
        entry: &Entry,
    ) -> Result<Vec<Transaction>, LedgerError>;
}

impl<F> PostingHook for F
where
    F: FnMut(&Transaction, &Entry) -> Result<Vec<Transaction>, LedgerError>,
{
    fn after_posting(
        &mut self,
        posting: &Transaction,
        entry: &Entry,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self(posting, entry)
    }
}

#[cfg(test)]
mod tests {
    use crate::amount::Amount;
    use crate::transaction::{ParsedPosting, PostingCost, Transaction};

    use anyhow::Result;

    #[test]
    fn parse_explicit_posting() {
        assert_eq!(
            ParsedPosting::parse("    Expenses:Dining  $20"),
            Some(ParsedPosting {
                account: "Expenses:Dining",
                cost: PostingCost::Explicit("$20"),
                note: None,
            })
        );
    }

    #[test]
    fn double_space_keeps_single_spaces_in_account() {
        assert_eq!(
            ParsedPosting::parse("  Dining Out  $20"),
            Some(ParsedPosting {
                account: "Dining Out",
                cost: PostingCost::Explicit("$20"),
                note: None,
            })
        );
        assert_eq!(
            ParsedPosting::parse("  Dining Out $20"),
            Some(ParsedPosting {
                account: "Dining Out $20",
                cost: PostingCost::Implicit,
                note: None,
            })
        );
    }

    #[test]
    fn parse_inline_note() {
        assert_eq!(
            ParsedPosting::parse("  Assets:Cash     -5 USD   ;  lunch with Bob "),
            Some(ParsedPosting {
                account: "Assets:Cash",
                cost: PostingCost::Explicit("-5 USD"),
                note: Some("lunch with Bob"),
            })
        );
    }

    #[test]
    fn parse_implicit_posting() {
        assert_eq!(
            ParsedPosting::parse("  Assets:Checking"),
            Some(ParsedPosting {
                account: "Assets:Checking",
                cost: PostingCost::Implicit,
                note: None,
            })
        );
        assert_eq!(
            ParsedPosting::parse("  Assets:Checking    ;; paid by card"),
            Some(ParsedPosting {
                account: "Assets:Checking",
                cost: PostingCost::Implicit,
                note: Some("paid by card"),
            })
        );
    }

    #[test]
    fn skip_blank_and_comment_lines() {
        assert_eq!(ParsedPosting::parse("      "), None);
        assert_eq!(ParsedPosting::parse("    ; just a remark"), None);
    }

    #[test]
    fn display_transaction() -> Result<()> {
        let txn = Transaction::new("Expenses:Food", Amount::parse("$4.50")?);
        assert_eq!(format!("{}", txn), "    Expenses:Food  $4.50");

        let txn = txn.with_note(Some("bagel"));
        assert_eq!(format!("{}", txn), "    Expenses:Food  $4.50  ; bagel");
        Ok(())
    }
}
