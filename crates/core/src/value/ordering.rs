use std::cmp::Ordering;

use super::AttributeValue;

/// Orders two scalar values of the same type.
///
/// Strings and binaries compare bytewise, numbers numerically. Returns `None`
/// when the values are not comparable (different types, non-scalars, or a
/// number that does not parse).
///
/// Numbers are compared on their decimal digits, so integers beyond `f64`
/// precision keep their order.
pub fn compare_scalars(a: &AttributeValue, b: &AttributeValue) -> Option<Ordering> {
    match (a, b) {
        (AttributeValue::S(a), AttributeValue::S(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
        (AttributeValue::B(a), AttributeValue::B(b)) => Some(a.cmp(b)),
        (AttributeValue::N(a), AttributeValue::N(b)) => {
            Some(Decimal::parse(a)?.cmp(&Decimal::parse(b)?))
        }
        _ => None,
    }
}

/// Canonical text of a number: `1`, `1.0` and `1E+0` all map to the same string.
pub fn canonical_number(n: &str) -> Option<String> {
    let decimal = Decimal::parse(n)?;
    let sign = if decimal.negative { "-" } else { "" };
    Some(format!("{sign}0.{}e{}", decimal.digits, decimal.exponent))
}

/// A decimal number written as `0.<digits> * 10^exponent`.
///
/// `digits` carries no leading or trailing zeros; zero is the empty digit
/// string with exponent 0 and a positive sign.
#[derive(Debug, PartialEq, Eq)]
struct Decimal {
    negative: bool,
    digits: String,
    exponent: i64,
}

impl Decimal {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (negative, unsigned) = match raw.as_bytes().first()? {
            b'-' => (true, &raw[1..]),
            b'+' => (false, &raw[1..]),
            _ => (false, raw),
        };

        let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
            Some(at) => (&unsigned[..at], unsigned[at + 1..].parse::<i64>().ok()?),
            None => (unsigned, 0),
        };
        let (integer, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if integer.is_empty() && fraction.is_empty() {
            return None;
        }
        if !integer.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }

        let all = format!("{integer}{fraction}");
        let significant = all.trim_start_matches('0');
        let leading = (all.len() - significant.len()) as i64;
        let digits = significant.trim_end_matches('0');
        if digits.is_empty() {
            return Some(Self {
                negative: false,
                digits: String::new(),
                exponent: 0,
            });
        }

        let exponent = (integer.len() as i64)
            .checked_add(exponent)?
            .checked_sub(leading)?;
        Some(Self {
            negative,
            digits: digits.to_string(),
            exponent,
        })
    }

    fn cmp_magnitude(&self, other: &Self) -> Ordering {
        match (self.digits.is_empty(), other.digits.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            // Same exponent: digit strings without trailing zeros order lexically.
            (false, false) => self
                .exponent
                .cmp(&other.exponent)
                .then_with(|| self.digits.cmp(&other.digits)),
        }
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, false) => self.cmp_magnitude(other),
            (true, true) => other.cmp_magnitude(self),
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
        }
    }
}
