use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Sub},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::EngineError;

const MILLION_MINOR: i64 = 1_000_000 * 100;
const THOUSAND_MINOR: i64 = 1_000 * 100;

/// Money amount in Thai baht represented as **integer satang** (1/100 THB).
///
/// Use this type for all monetary values in the engine (expense amounts,
/// budget caps, aggregates) to avoid floating-point drift.
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(123_450);
/// assert_eq!(amount.minor(), 123450);
/// assert_eq!(amount.to_string(), "฿1,234.50");
/// ```
///
/// Parsing from user input (accepts thousands separators; rejects > 2
/// decimals):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("1,234.5".parse::<Money>().unwrap().minor(), 123450);
/// assert_eq!("10".parse::<Money>().unwrap().minor(), 1000);
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);
    /// Largest amount a single expense, budget or template may carry
    /// (`฿999,999,999,999.99`).
    pub const MAX: Money = Money(99_999_999_999_999);

    /// Creates a new amount from integer satang.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in satang.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// True when the amount is above [`Money::MAX`].
    #[must_use]
    pub const fn exceeds_limit(self) -> bool {
        self.0 > Self::MAX.0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Sums `amounts`, returning `None` on overflow.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Money>) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |total, amount| total.checked_add(amount))
    }

    /// Grouped number without currency sign, trailing zero decimals dropped:
    /// `1150` baht → `"1,150"`, `1150.5` → `"1,150.5"`.
    #[must_use]
    pub fn grouped(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = group_thousands(abs / 100);
        let frac = abs % 100;
        if frac == 0 {
            format!("{sign}{whole}")
        } else if frac % 10 == 0 {
            format!("{sign}{whole}.{}", frac / 10)
        } else {
            format!("{sign}{whole}.{frac:02}")
        }
    }

    /// Short form for dashboards: `฿1.23M`, `฿1.2K`, otherwise the full
    /// amount.
    #[must_use]
    pub fn compact(self) -> String {
        if self.0 >= MILLION_MINOR {
            format!("฿{:.2}M", self.0 as f64 / MILLION_MINOR as f64)
        } else if self.0 >= THOUSAND_MINOR {
            format!("฿{:.1}K", self.0 as f64 / THOUSAND_MINOR as f64)
        } else {
            self.to_string()
        }
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let baht = group_thousands(abs / 100);
        let satang = abs % 100;
        write!(f, "{sign}฿{baht}.{satang:02}")
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

/// Saturates at the `i64` bounds. Totals that must be exact use
/// [`Money::checked_add`] or [`Money::checked_sum`].
impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a decimal baht string into satang.
    ///
    /// `,` is a thousands separator and is ignored; `.` is the decimal
    /// separator. An optional leading `+`/`-` is accepted.
    ///
    /// Validation rules:
    /// - max 2 fractional digits (rejects `12.345`)
    /// - rejects empty/invalid strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::InvalidInput("empty amount".to_string());
        let invalid = || EngineError::InvalidInput("invalid amount".to_string());
        let overflow = || EngineError::InvalidInput("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };

        let rest = rest.trim().replace(',', "");
        if rest.is_empty() {
            return Err(empty());
        }

        let (baht_str, satang_str) = match rest.split_once('.') {
            Some((baht, satang)) => (baht, Some(satang)),
            None => (rest.as_str(), None),
        };

        if baht_str.is_empty() || !baht_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let baht: i64 = baht_str.parse().map_err(|_| overflow())?;

        let satang: i64 = match satang_str {
            None | Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                match frac.len() {
                    1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
                    2 => frac.parse::<i64>().map_err(|_| invalid())?,
                    _ => return Err(EngineError::InvalidInput("too many decimals".to_string())),
                }
            }
        };

        let total = baht
            .checked_mul(100)
            .and_then(|v| v.checked_add(satang))
            .ok_or_else(overflow)?;

        Ok(Money(if negative { -total } else { total }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_and_checked_totals() {
        assert!(!Money::MAX.exceeds_limit());
        assert!(Money::new(Money::MAX.minor() + 1).exceeds_limit());
        assert_eq!(
            Money::checked_sum([Money::new(100), Money::new(250)]),
            Some(Money::new(350))
        );
        assert_eq!(Money::checked_sum([Money::new(i64::MAX - 10), Money::new(100)]), None);
        assert_eq!(Money::new(i64::MAX - 10).checked_add(Money::new(100)), None);
        assert_eq!(Money::new(i64::MAX) + Money::new(1), Money::new(i64::MAX));
    }

    #[test]
    fn display_formats_thb() {
        assert_eq!(Money::new(0).to_string(), "฿0.00");
        assert_eq!(Money::new(5).to_string(), "฿0.05");
        assert_eq!(Money::new(123_450).to_string(), "฿1,234.50");
        assert_eq!(Money::new(123_456_789).to_string(), "฿1,234,567.89");
        assert_eq!(Money::new(-100_000).to_string(), "-฿1,000.00");
    }

    #[test]
    fn parse_accepts_thousands_separators() {
        assert_eq!("1,234.50".parse::<Money>().unwrap().minor(), 123_450);
        assert_eq!("1,000,000".parse::<Money>().unwrap().minor(), 100_000_000);
        assert_eq!("0.5".parse::<Money>().unwrap().minor(), 50);
        assert_eq!("  250 ".parse::<Money>().unwrap().minor(), 25_000);
        assert_eq!("-3.10".parse::<Money>().unwrap().minor(), -310);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
        assert!("12.345".parse::<Money>().is_err());
        assert!(".50".parse::<Money>().is_err());
    }

    #[test]
    fn grouped_drops_zero_decimals() {
        assert_eq!(Money::new(115_000).grouped(), "1,150");
        assert_eq!(Money::new(115_050).grouped(), "1,150.5");
        assert_eq!(Money::new(115_055).grouped(), "1,150.55");
        assert_eq!(Money::new(100_000_000).grouped(), "1,000,000");
    }

    #[test]
    fn compact_uses_k_and_m_suffixes() {
        assert_eq!(Money::new(123_456_700).compact(), "฿1.23M");
        assert_eq!(Money::new(123_400).compact(), "฿1.2K");
        assert_eq!(Money::new(99_900).compact(), "฿999.00");
    }
}
