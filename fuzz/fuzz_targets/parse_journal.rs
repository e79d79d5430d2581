#![no_main]

use libfuzzer_sys::fuzz_target;
use rust_decimal::Decimal;
use textledger::{parse, ParseOptions};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let options = ParseOptions::new().year(2000);
        if let Ok(outcome) = parse(input, &options) {
            for entry in outcome.ledger.entries() {
                assert!(entry.is_balanced(Decimal::new(1, 6)));
            }
        }
    }
});
