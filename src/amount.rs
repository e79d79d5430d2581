use crate::error::LedgerError;
use crate::parser::{LedgerParser, Rule};
use pest::Parser;
use rust_decimal::Decimal;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A decimal quantity, optionally tagged with a commodity symbol.
///
/// An amount without commodity is commodity-agnostic: it adopts the
/// commodity of whatever it gets accumulated into or converted to.
#[derive(Clone, Debug, PartialEq)]
pub struct Amount {
    pub(crate) quantity: Decimal,
    pub(crate) commodity: Option<String>,
}

impl Amount {
    pub fn new(quantity: Decimal, commodity: Option<&str>) -> Self {
        Self {
            quantity,
            commodity: commodity.map(str::to_string),
        }
    }

    pub fn zero(commodity: Option<&str>) -> Self {
        Self::new(Decimal::ZERO, commodity)
    }

    /// Parse amount text such as `$20`, `-$5`, `10 USD`, `1,200.50 EUR` or `42`.
    pub fn parse(text: &str) -> Result<Amount, LedgerError> {
        let mut pairs = LedgerParser::parse(Rule::amount, text)
            .map_err(|_| LedgerError::amount(text, "unrecognized amount syntax"))?;
        let form = pairs
            .next()
            .and_then(|amount| amount.into_inner().next())
            .ok_or_else(|| LedgerError::amount(text, "empty amount"))?;

        let mut negative = false;
        let mut commodity = None;
        let mut quantity = None;
        for pair in form.into_inner() {
            match pair.as_rule() {
                Rule::sign => negative = pair.as_str() == "-",
                Rule::commodity => commodity = Some(pair.as_str().trim_matches('"')),
                Rule::quantity => quantity = Some(pair.as_str()),
                _ => {}
            }
        }

        let digits = format!(
            "0{}",
            quantity
                .ok_or_else(|| LedgerError::amount(text, "missing quantity"))?
                .replace(',', "")
        );
        let mut quantity = Decimal::from_str(digits.trim_end_matches('.'))
            .map_err(|e| LedgerError::amount(text, e.to_string()))?;
        if negative {
            quantity = -quantity;
        }

        Ok(Amount::new(quantity, commodity))
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn commodity(&self) -> Option<&str> {
        self.commodity.as_deref()
    }

    pub fn negate(&mut self) {
        self.quantity = -self.quantity;
    }

    /// Add `other` into `self`.
    ///
    /// Amounts of differing known commodities are first converted to the
    /// commodity of `self` using `prices`.
    pub fn accumulate(&mut self, other: &Amount, prices: &PriceDb) -> Result<(), LedgerError> {
        match (&self.commodity, &other.commodity) {
            (Some(mine), Some(theirs)) if mine != theirs => {
                let converted = other.value(mine, prices)?;
                self.quantity = self.quantity.saturating_add(converted.quantity);
            }
            (None, Some(theirs)) => {
                self.commodity = Some(theirs.clone());
                self.quantity = self.quantity.saturating_add(other.quantity);
            }
            _ => self.quantity = self.quantity.saturating_add(other.quantity),
        }
        Ok(())
    }

    // Callers guarantee both sides share a commodity.
    pub(crate) fn add_quantity(&mut self, other: &Amount) {
        debug_assert_eq!(self.commodity, other.commodity);
        self.quantity = self.quantity.saturating_add(other.quantity);
    }

    /// Express this amount in `target`.
    pub fn value(&self, target: &str, prices: &PriceDb) -> Result<Amount, LedgerError> {
        match &self.commodity {
            None => Ok(Amount::new(self.quantity, Some(target))),
            Some(source) => prices
                .rate(source, target)
                .map(|rate| Amount::new(self.quantity.saturating_mul(rate), Some(target)))
                .ok_or_else(|| LedgerError::NoConversionRate {
                    from: source.clone(),
                    to: target.to_string(),
                }),
        }
    }

    pub fn is_zero_within(&self, tolerance: Decimal) -> bool {
        self.quantity.abs() <= tolerance
    }
}

impl std::ops::Neg for &Amount {
    type Output = Amount;

    fn neg(self) -> Self::Output {
        Amount {
            quantity: -self.quantity,
            commodity: self.commodity.clone(),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.commodity.as_deref() {
            None => write!(f, "{}", self.quantity),
            Some(symbol)
                if symbol.chars().count() == 1 && !symbol.chars().all(char::is_alphanumeric) =>
            {
                write!(f, "{}{}", symbol, self.quantity)
            }
            Some(symbol) => write!(f, "{} {}", self.quantity, symbol),
        }
    }
}

/// Known conversion rates between commodities.
#[derive(Clone, Debug, Default)]
pub struct PriceDb {
    rates: HashMap<(String, String), Decimal>,
}

impl PriceDb {
    pub fn new() -> Self {
        Default::default()
    }

    /// One unit of `from` is worth `rate` units of `to`.
    pub fn set_rate(&mut self, from: &str, to: &str, rate: Decimal) {
        self.rates
            .insert((from.to_string(), to.to_string()), rate);
    }

    pub fn rate(&self, from: &str, to: &str) -> Option<Decimal> {
        if from == to {
            return Some(Decimal::ONE);
        }

        if let Some(&rate) = self.rates.get(&(from.to_string(), to.to_string())) {
            return Some(rate);
        }

        self.rates
            .get(&(to.to_string(), from.to_string()))
            .and_then(|rate| Decimal::ONE.checked_div(*rate))
    }
}
