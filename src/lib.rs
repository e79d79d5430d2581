//! textledger - A plain text double-entry journal parser
//! ---
//!
//! Reads a line oriented journal of dated entries and indented postings,
//! checks that every entry balances in each commodity it touches, and builds
//! an in-memory [`Ledger`] with per-account running balances.
//!
//! ```text
//! Y 2024
//! 3/15 * (1042) Coffee
//!     Expenses:Dining Out  $4.50   ; flat white
//!     Assets:Checking
//! ```
//!

extern crate pest;
#[macro_use]
extern crate pest_derive;

/// Accounts, their balances and the path keyed registry holding them.
pub mod account;
pub mod amount;
pub mod entry;
pub mod error;
/// Ledger representation.
pub mod ledger;
pub mod line;

/// Our main parser entrypoints.
pub mod parser;

pub mod transaction;

pub use account::{Account, AccountStore, Balance};
pub use amount::{Amount, PriceDb};
pub use entry::Entry;
pub use error::{Diagnostic, LedgerError, ParseFailure};
pub use ledger::Ledger;
pub use parser::{parse, parse_file, parse_reader, ParseOptions, ParseOutcome, ParseSession};
pub use transaction::{PostingHook, Transaction};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a fmt subscriber so diagnostics show up on stderr. Honors
/// `RUST_LOG`, defaulting to `textledger=info`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::from_default_env()
            .add_directive("textledger=info".parse().expect("static directive"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
