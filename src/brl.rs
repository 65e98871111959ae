use serde_with::DeserializeFromStr;
use thiserror::Error;

use std::{
    fmt::{Debug, Display},
    iter::Sum,
    ops::{Add, AddAssign, Sub},
    str::FromStr,
};

/// Represents an amount of money in BRL currency.
///
/// The amount is stored internally as an integer number of centavos, but the
/// [`Display`] implementation formats it for display as reais with
/// Brazilian-style separators: `R$ 1.234,56`.
///
/// Parsing accepts plain decimal strings as they appear in the CSV source
/// (`"1234.56"`, `"1234"`, `"-10.5"`). Anything else is a [`ParseBrlError`],
/// which the loader treats as a missing value.
#[derive(Clone, Copy, Default, DeserializeFromStr, Eq, PartialEq, Ord, PartialOrd)]
pub struct Brl(i64);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid monetary value: {0:?}")]
pub struct ParseBrlError(String);

impl Brl {
    #[must_use]
    pub const fn from_centavos(centavos: i64) -> Self {
        Self(centavos)
    }

    #[must_use]
    pub const fn centavos(self) -> i64 {
        self.0
    }
}

impl Debug for Brl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Brl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let centavos = self.0.abs();
        let whole = (centavos / 100).to_string();
        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(digit);
        }
        write!(f, "{sign}R$ {grouped},{:02}", centavos % 100)
    }
}

impl FromStr for Brl {
    type Err = ParseBrlError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let err = || ParseBrlError(s.to_string());
        let trimmed = s.trim();
        let (sign, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, trimmed),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (digits, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(err());
        }
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let reais: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| err())?
        };
        // Amounts are kept to centavo precision; a third decimal digit
        // rounds half-up.
        let centavos = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| err())? * 10,
            _ => {
                let cents: i64 = frac[..2].parse().map_err(|_| err())?;
                let round_up = frac.as_bytes().get(2).is_some_and(|d| *d >= b'5');
                cents + i64::from(round_up)
            }
        };
        Ok(Self(sign * (reais * 100 + centavos)))
    }
}

impl Add for Brl {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Brl {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Brl {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Brl {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_fn_parses_plain_decimal_amounts() {
        assert_eq!(Brl::from_str("1234.56").unwrap(), Brl::from_centavos(123_456));
        assert_eq!(Brl::from_str("1234").unwrap(), Brl::from_centavos(123_400));
        assert_eq!(Brl::from_str("0.5").unwrap(), Brl::from_centavos(50));
        assert_eq!(Brl::from_str(".25").unwrap(), Brl::from_centavos(25));
        assert_eq!(Brl::from_str("-10.25").unwrap(), Brl::from_centavos(-1_025));
        assert_eq!(Brl::from_str(" 99.90 ").unwrap(), Brl::from_centavos(9_990));
    }

    #[test]
    fn from_str_fn_rounds_third_decimal_digit_half_up() {
        assert_eq!(Brl::from_str("1.994").unwrap(), Brl::from_centavos(199));
        assert_eq!(Brl::from_str("1.995").unwrap(), Brl::from_centavos(200));
    }

    #[test]
    fn from_str_fn_rejects_non_numeric_input() {
        assert!(Brl::from_str("abc").is_err());
        assert!(Brl::from_str("").is_err());
        assert!(Brl::from_str("n/a").is_err());
        assert!(Brl::from_str("12.3x").is_err());
        assert!(Brl::from_str("-").is_err());
    }

    #[test]
    fn display_formats_with_brazilian_separators() {
        assert_eq!(Brl::from_centavos(123_456).to_string(), "R$ 1.234,56");
        assert_eq!(Brl::from_centavos(5).to_string(), "R$ 0,05");
        assert_eq!(Brl::from_centavos(100_000_000).to_string(), "R$ 1.000.000,00");
        assert_eq!(Brl::from_centavos(-9_990).to_string(), "-R$ 99,90");
    }

    #[test]
    fn arithmetic_is_exact_in_centavos() {
        let profit = Brl::from_str("100.00").unwrap() - Brl::from_str("40.00").unwrap();
        assert_eq!(profit, Brl::from_centavos(6_000));
        let total: Brl = [Brl::from_centavos(6_000), Brl::from_centavos(15_000)]
            .into_iter()
            .sum();
        assert_eq!(total.to_string(), "R$ 210,00");
    }
}
