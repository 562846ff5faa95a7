//! # Assets
//!
//! Fixed-point token amounts tagged with their symbol.
//!
//! An `Asset` is `amount * 10^-precision` units of `symbol`. The textual form
//! is `"<amount> <CODE>"` with exactly `precision` fractional digits, e.g.
//! `10.0000 EOS`. Both serde and `FromStr` use that form.

use crate::errors::AssetError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest representable amount magnitude (`2^62 - 1`).
pub const MAX_ASSET_AMOUNT: i64 = (1i64 << 62) - 1;

/// Highest supported precision.
const MAX_PRECISION: u8 = 18;

/// Maximum length of a symbol code.
const MAX_CODE_LEN: usize = 7;

/// Token symbol: up to seven upper-case letters plus a decimal precision.
///
/// Packed into one `u64`: the low byte is the precision, the following bytes
/// hold the code characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol {
    raw: u64,
}

impl Symbol {
    /// `4,EOS`, the default ledger unit.
    pub const EOS: Symbol = Symbol {
        raw: 4 | ((b'E' as u64) << 8) | ((b'O' as u64) << 16) | ((b'S' as u64) << 24),
    };

    /// Builds a symbol from its code and precision.
    pub fn new(code: &str, precision: u8) -> Result<Self, AssetError> {
        if precision > MAX_PRECISION {
            return Err(AssetError::InvalidPrecision(precision));
        }
        if code.is_empty()
            || code.len() > MAX_CODE_LEN
            || !code.bytes().all(|b| b.is_ascii_uppercase())
        {
            return Err(AssetError::InvalidSymbol(code.to_string()));
        }
        let mut raw = u64::from(precision);
        for (i, b) in code.bytes().enumerate() {
            raw |= u64::from(b) << (8 * (i + 1));
        }
        Ok(Self { raw })
    }

    /// Number of fractional digits.
    #[must_use]
    pub fn precision(&self) -> u8 {
        (self.raw & 0xFF) as u8
    }

    /// Symbol code, e.g. `EOS`.
    #[must_use]
    pub fn code(&self) -> String {
        let mut code = String::with_capacity(MAX_CODE_LEN);
        let mut rest = self.raw >> 8;
        while rest != 0 {
            code.push((rest & 0xFF) as u8 as char);
            rest >>= 8;
        }
        code
    }

    fn scale(&self) -> i128 {
        10i128.pow(u32::from(self.precision()))
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision(), self.code())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision(), self.code())
    }
}

impl FromStr for Symbol {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (precision, code) = s
            .split_once(',')
            .ok_or_else(|| AssetError::InvalidSymbol(s.to_string()))?;
        let precision = precision
            .trim()
            .parse::<u8>()
            .map_err(|_| AssetError::InvalidSymbol(s.to_string()))?;
        Self::new(code.trim(), precision)
    }
}

impl TryFrom<String> for Symbol {
    type Error = AssetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.to_string()
    }
}

/// A signed fixed-point amount of a token.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Asset {
    /// Amount in the smallest unit of `symbol`.
    pub amount: i64,
    /// Token symbol.
    pub symbol: Symbol,
}

impl Asset {
    /// Builds an asset, rejecting amounts outside `±MAX_ASSET_AMOUNT`.
    pub fn new(amount: i64, symbol: Symbol) -> Result<Self, AssetError> {
        let asset = Self { amount, symbol };
        if asset.is_amount_within_range() {
            Ok(asset)
        } else {
            Err(AssetError::AmountOutOfRange)
        }
    }

    /// Zero of the given symbol.
    #[must_use]
    pub const fn zero(symbol: Symbol) -> Self {
        Self { amount: 0, symbol }
    }

    /// True if `|amount| <= MAX_ASSET_AMOUNT`.
    #[must_use]
    pub fn is_amount_within_range(&self) -> bool {
        (-MAX_ASSET_AMOUNT..=MAX_ASSET_AMOUNT).contains(&self.amount)
    }

    /// True if the amount is in range. Symbols are valid by construction.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_amount_within_range()
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount < 0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    fn same_symbol(&self, other: &Self) -> Result<(), AssetError> {
        if self.symbol == other.symbol {
            Ok(())
        } else {
            Err(AssetError::SymbolMismatch {
                left: self.symbol.to_string(),
                right: other.symbol.to_string(),
            })
        }
    }

    /// `self + other`, failing on symbol mismatch or range overflow.
    pub fn checked_add(self, other: Self) -> Result<Self, AssetError> {
        self.same_symbol(&other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(AssetError::Overflow)?;
        Self::new(amount, self.symbol).map_err(|_| AssetError::Overflow)
    }

    /// `self - other`, failing on symbol mismatch or range overflow.
    pub fn checked_sub(self, other: Self) -> Result<Self, AssetError> {
        self.same_symbol(&other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(AssetError::Overflow)?;
        Self::new(amount, self.symbol).map_err(|_| AssetError::Overflow)
    }

    /// Amount with the sign flipped.
    #[must_use]
    pub fn negated(self) -> Self {
        Self {
            amount: -self.amount,
            symbol: self.symbol,
        }
    }

    /// The larger of `self` and `other` (same symbol assumed by callers).
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        if other.amount > self.amount {
            other
        } else {
            self
        }
    }

    /// `self` floored at zero.
    #[must_use]
    pub fn floor_zero(self) -> Self {
        self.max(Self::zero(self.symbol))
    }

    /// `amount * rate`, truncated toward zero.
    #[must_use]
    pub fn mul_rate(self, rate: f64) -> Self {
        Self {
            amount: (self.amount as f64 * rate) as i64,
            symbol: self.symbol,
        }
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = usize::from(self.symbol.precision());
        let scale = self.symbol.scale();
        let magnitude = i128::from(self.amount).abs();
        let sign = if self.amount < 0 { "-" } else { "" };
        if precision == 0 {
            write!(f, "{sign}{magnitude} {}", self.symbol.code())
        } else {
            write!(
                f,
                "{sign}{}.{:0width$} {}",
                magnitude / scale,
                magnitude % scale,
                self.symbol.code(),
                width = precision
            )
        }
    }
}

impl FromStr for Asset {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = || AssetError::Parse(s.to_string());
        let (number, code) = s.trim().split_once(' ').ok_or_else(parse_err)?;
        let (negative, digits) = match number.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, number),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty()
            || !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
            || (digits.contains('.') && frac_part.is_empty())
        {
            return Err(parse_err());
        }
        let precision = u8::try_from(frac_part.len()).map_err(|_| parse_err())?;
        let symbol = Symbol::new(code.trim(), precision)?;

        let mut amount: i128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            amount = amount
                .checked_mul(10)
                .and_then(|a| a.checked_add(i128::from(b - b'0')))
                .ok_or(AssetError::AmountOutOfRange)?;
        }
        if negative {
            amount = -amount;
        }
        let amount = i64::try_from(amount).map_err(|_| AssetError::AmountOutOfRange)?;
        Self::new(amount, symbol)
    }
}

impl TryFrom<String> for Asset {
    type Error = AssetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Asset> for String {
    fn from(asset: Asset) -> Self {
        asset.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eos(amount: i64) -> Asset {
        Asset::new(amount, Symbol::EOS).unwrap()
    }

    #[test]
    fn test_eos_symbol_constant() {
        assert_eq!(Symbol::EOS, Symbol::new("EOS", 4).unwrap());
        assert_eq!(Symbol::EOS.code(), "EOS");
        assert_eq!(Symbol::EOS.precision(), 4);
        assert_eq!("4,EOS".parse::<Symbol>().unwrap(), Symbol::EOS);
    }

    #[test]
    fn test_symbol_rejects_bad_codes() {
        assert!(Symbol::new("eos", 4).is_err());
        assert!(Symbol::new("", 4).is_err());
        assert!(Symbol::new("TOOLONGX", 4).is_err());
        assert_eq!(Symbol::new("EOS", 19), Err(AssetError::InvalidPrecision(19)));
    }

    #[test]
    fn test_display() {
        assert_eq!(eos(100_000).to_string(), "10.0000 EOS");
        assert_eq!(eos(1).to_string(), "0.0001 EOS");
        assert_eq!(eos(-25_000).to_string(), "-2.5000 EOS");
        assert_eq!(eos(0).to_string(), "0.0000 EOS");
    }

    #[test]
    fn test_parse() {
        assert_eq!("10.0000 EOS".parse::<Asset>().unwrap(), eos(100_000));
        assert_eq!("-0.5000 EOS".parse::<Asset>().unwrap(), eos(-5_000));
        assert!("10.00 EOS".parse::<Asset>().unwrap().symbol != Symbol::EOS);
        assert!("10. EOS".parse::<Asset>().is_err());
        assert!("ten EOS".parse::<Asset>().is_err());
        assert!("10.0000".parse::<Asset>().is_err());
    }

    #[test]
    fn test_range_enforced() {
        assert!(Asset::new(MAX_ASSET_AMOUNT, Symbol::EOS).is_ok());
        assert_eq!(
            Asset::new(MAX_ASSET_AMOUNT + 1, Symbol::EOS),
            Err(AssetError::AmountOutOfRange)
        );
        assert_eq!(
            eos(MAX_ASSET_AMOUNT).checked_add(eos(1)),
            Err(AssetError::Overflow)
        );
    }

    #[test]
    fn test_arithmetic_requires_same_symbol() {
        let other = Asset::new(1, Symbol::new("TNT", 4).unwrap()).unwrap();
        assert!(matches!(
            eos(1).checked_add(other),
            Err(AssetError::SymbolMismatch { .. })
        ));
        assert_eq!(eos(5).checked_sub(eos(7)).unwrap(), eos(-2));
    }

    #[test]
    fn test_mul_rate_truncates() {
        assert_eq!(eos(100_000).mul_rate(0.2), eos(20_000));
        assert_eq!(eos(3).mul_rate(0.5), eos(1));
    }

    #[test]
    fn test_floor_zero() {
        assert_eq!(eos(-10).floor_zero(), eos(0));
        assert_eq!(eos(10).floor_zero(), eos(10));
    }

    #[test]
    fn test_serde_uses_text_form() {
        let json = serde_json::to_string(&eos(100_000)).unwrap();
        assert_eq!(json, "\"10.0000 EOS\"");
        let back: Asset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, eos(100_000));
    }
}
