use crate::amount::Amount;
use crate::entry::Entry;
use crate::error::{Diagnostic, LedgerError, ParseFailure};
use crate::ledger::Ledger;
use crate::line::{self, LineKind};
use crate::transaction::{ParsedPosting, PostingCost, PostingHook, Transaction};

use anyhow::Result;
use chrono::{Datelike, Local};
use pest::Parser;
use rust_decimal::Decimal;
use tracing::{debug, error, trace, warn};

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Parser)]
#[grammar = "ledger.pest"]
pub struct LedgerParser;

/// Knobs for a single parse run.
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// Credit account balances with the postings of every committed entry.
    pub compute_balances: bool,
    /// Year for headers without one, until a `Y` directive says otherwise.
    /// Defaults to the current local year.
    pub year: Option<i32>,
    /// Largest per-commodity remainder an entry may leave and still balance.
    pub tolerance: Decimal,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            compute_balances: true,
            year: None,
            tolerance: Decimal::new(1, 6),
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn compute_balances(mut self, enabled: bool) -> Self {
        self.compute_balances = enabled;
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Result of a parse run that reached the end of its input.
#[derive(Debug)]
pub struct ParseOutcome {
    pub ledger: Ledger,
    pub diagnostics: Vec<Diagnostic>,
}

struct OpenEntry {
    entry: Entry,
    last_line: usize,
}

/// State of one pass over a journal: line counter, year context, the entry
/// under construction and everything committed so far.
pub struct ParseSession {
    options: ParseOptions,
    line: usize,
    current_year: i32,
    current: Option<OpenEntry>,
    ledger: Ledger,
    diagnostics: Vec<Diagnostic>,
    hooks: Vec<Box<dyn PostingHook>>,
}

impl ParseSession {
    pub fn new(options: ParseOptions) -> Self {
        let current_year = options.year.unwrap_or_else(|| Local::now().year());
        Self {
            options,
            line: 0,
            current_year,
            current: None,
            ledger: Ledger::new(),
            diagnostics: Vec::new(),
            hooks: Vec::new(),
        }
    }

    pub fn with_hook<H: PostingHook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    pub fn line_number(&self) -> usize {
        self.line
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Feed the next raw line. Only a fatal error is returned, everything
    /// else ends up in the diagnostics.
    pub fn process_line(&mut self, raw: &str) -> Result<(), LedgerError> {
        self.line += 1;
        let line = line::normalize(raw);

        match LineKind::classify(&line) {
            LineKind::Blank => {}
            LineKind::EntryHeader => self.header(&line, raw),
            LineKind::IndentedPosting => self.posting(&line, raw)?,
            LineKind::YearDirective => self.year_directive(&line, raw),
            LineKind::Unrecognized => trace!(line = self.line, "skipping `{}'", line),
        }

        Ok(())
    }

    /// Close the last entry and hand over the ledger.
    pub fn finish(mut self) -> ParseOutcome {
        self.finalize(self.line + 1);
        ParseOutcome {
            ledger: self.ledger,
            diagnostics: self.diagnostics,
        }
    }

    fn diagnose(&mut self, line: usize, error: LedgerError) {
        if error.is_fatal() {
            error!(line, "{}", error);
        } else {
            warn!(line, "{}", error);
        }
        self.diagnostics.push(Diagnostic { line, error });
    }

    fn header(&mut self, line: &str, raw: &str) {
        match Entry::parse_header(line, self.current_year) {
            Ok(entry) => {
                self.finalize(self.line);
                self.current = Some(OpenEntry {
                    entry,
                    last_line: self.line,
                });
            }
            // the open entry, if any, stays open
            Err(e) => self.diagnose(self.line, e.with_text(raw)),
        }
    }

    fn year_directive(&mut self, line: &str, raw: &str) {
        let year = LedgerParser::parse(Rule::year_directive, line)
            .ok()
            .and_then(|mut pairs| pairs.next())
            .and_then(|directive| directive.into_inner().next())
            .and_then(|year| year.as_str().parse::<i32>().ok());

        match year {
            Some(year) => {
                debug!(line = self.line, year, "current year changed");
                self.current_year = year;
            }
            None => {
                let error = LedgerError::syntax(raw, "malformed year directive");
                self.diagnose(self.line, error);
            }
        }
    }

    fn posting(&mut self, line: &str, raw: &str) -> Result<(), LedgerError> {
        let parsed = match ParsedPosting::parse(line) {
            Some(parsed) => parsed,
            None => return Ok(()),
        };

        let line_no = self.line;
        let open = match self.current.as_mut() {
            Some(open) => open,
            None => {
                self.diagnose(line_no, LedgerError::syntax(raw, "posting outside of an entry"));
                return Ok(());
            }
        };

        let cost = match parsed.cost {
            PostingCost::Implicit => match open.entry.first_cost() {
                Some(first) => -first,
                None => {
                    let fatal = LedgerError::MissingPriorTransaction {
                        account: parsed.account().to_string(),
                    };
                    self.diagnose(line_no, fatal.clone());
                    return Err(fatal);
                }
            },
            PostingCost::Explicit(text) => match Amount::parse(text) {
                Ok(amount) => amount,
                Err(e) => {
                    self.diagnose(line_no, e);
                    return Ok(());
                }
            },
        };

        self.ledger.accounts_mut().find_or_create(parsed.account());
        let posting = Transaction::new(parsed.account(), cost).with_note(parsed.note);
        open.entry.transactions.push(posting);
        open.last_line = line_no;

        let mut failures = Vec::new();
        let index = open.entry.transactions.len() - 1;
        for hook in self.hooks.iter_mut() {
            let extra = hook.after_posting(&open.entry.transactions[index], &open.entry);
            match extra {
                Ok(extra) => {
                    for txn in extra {
                        self.ledger.accounts_mut().find_or_create(&txn.account);
                        open.entry.transactions.push(txn);
                    }
                }
                Err(e) => failures.push(e),
            }
        }

        for e in failures {
            self.diagnose(line_no, e);
        }

        Ok(())
    }

    /// Validate the open entry; commit it when balanced, log and drop it
    /// otherwise. `boundary` is the line the next entry starts on.
    fn finalize(&mut self, boundary: usize) {
        let open = match self.current.take() {
            Some(open) => open,
            None => return,
        };

        match open.entry.validate(self.options.tolerance, open.last_line) {
            Ok(()) => {
                debug!(
                    line = open.last_line,
                    date = %open.entry.date,
                    "committing `{}'",
                    open.entry.description
                );
                self.ledger
                    .commit(open.entry, self.options.compute_balances);
            }
            Err(e) => self.diagnose(boundary, e),
        }
    }
}

/// Parse journal text held in memory.
pub fn parse(input: &str, options: &ParseOptions) -> Result<ParseOutcome, ParseFailure> {
    let mut session = ParseSession::new(options.clone());
    for line in input.lines() {
        feed(&mut session, line)?;
    }
    Ok(session.finish())
}

/// Parse a journal one line at a time from any buffered reader.
///
/// Lines need not be valid UTF-8; offending bytes are replaced with U+FFFD.
pub fn parse_reader<R: BufRead>(mut reader: R, options: &ParseOptions) -> Result<ParseOutcome> {
    let mut session = ParseSession::new(options.clone());
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let text = String::from_utf8_lossy(&buf);
        let line = text.as_ref();
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);
        feed(&mut session, line)?;
    }
    Ok(session.finish())
}

pub fn parse_file(path: &Path, options: &ParseOptions) -> Result<ParseOutcome> {
    let file = File::open(path)?;
    parse_reader(BufReader::new(file), options)
}

fn feed(session: &mut ParseSession, line: &str) -> Result<(), ParseFailure> {
    session.process_line(line).map_err(|error| ParseFailure {
        line: session.line_number(),
        error,
        diagnostics: session.diagnostics().to_vec(),
    })
}
