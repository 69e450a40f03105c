//! Membership time-to-live parsing.
//!
//! A TTL is written as up to three `<count><unit>` components in the order
//! years (`y`), months (`m`), days (`d`), for example `1y8m16d` or `14d`.
//! Unit letters are case-insensitive and at least one component is required.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Days, Months, Utc};
use regex::Regex;

const YEARS_RANGE: (u32, u32) = (1, 100);
const MONTHS_RANGE: (u32, u32) = (1, 11);
const DAYS_RANGE: (u32, u32) = (1, 30);

/// Errors raised while parsing or applying a [`MembershipTtl`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TtlError {
    #[error("invalid ttl format: expected something like 1y8m16d")]
    Format,
    #[error("{unit} count must be between {min} and {max}")]
    OutOfRange {
        unit: &'static str,
        min: u32,
        max: u32,
    },
    #[error("ttl pushes the expiry past the representable calendar")]
    Overflow,
}

static TTL_RE: OnceLock<Regex> = OnceLock::new();

fn ttl_regex() -> &'static Regex {
    TTL_RE.get_or_init(|| {
        Regex::new(r"^(?i)(?:(\d+)y)?(?:(\d+)m)?(?:(\d+)d)?$")
            .unwrap_or_else(|error| panic!("ttl regex failed to compile: {error}"))
    })
}

/// Calendar-based duration after which a membership expires.
///
/// # Examples
/// ```
/// use segments::domain::MembershipTtl;
///
/// let ttl: MembershipTtl = "1y2m3d".parse().expect("valid ttl");
/// assert_eq!((ttl.years(), ttl.months(), ttl.days()), (1, 2, 3));
/// assert!("2w".parse::<MembershipTtl>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MembershipTtl {
    years: u32,
    months: u32,
    days: u32,
}

impl MembershipTtl {
    /// Number of calendar years.
    pub fn years(&self) -> u32 {
        self.years
    }

    /// Number of calendar months.
    pub fn months(&self) -> u32 {
        self.months
    }

    /// Number of days.
    pub fn days(&self) -> u32 {
        self.days
    }

    /// Compute the expiry instant for a membership granted at `now`.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, TtlError> {
        let total_months = self
            .years
            .checked_mul(12)
            .and_then(|months| months.checked_add(self.months))
            .ok_or(TtlError::Overflow)?;
        now.checked_add_months(Months::new(total_months))
            .and_then(|shifted| shifted.checked_add_days(Days::new(u64::from(self.days))))
            .ok_or(TtlError::Overflow)
    }
}

fn parse_component(
    raw: Option<regex::Match<'_>>,
    unit: &'static str,
    (min, max): (u32, u32),
) -> Result<u32, TtlError> {
    let Some(raw) = raw else {
        return Ok(0);
    };
    let out_of_range = TtlError::OutOfRange { unit, min, max };
    let value = raw.as_str().parse::<u32>().map_err(|_| out_of_range.clone())?;
    if value < min || value > max {
        return Err(out_of_range);
    }
    Ok(value)
}

impl FromStr for MembershipTtl {
    type Err = TtlError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let captures = ttl_regex().captures(value).ok_or(TtlError::Format)?;
        let (years, months, days) = (captures.get(1), captures.get(2), captures.get(3));
        if years.is_none() && months.is_none() && days.is_none() {
            return Err(TtlError::Format);
        }
        Ok(Self {
            years: parse_component(years, "years", YEARS_RANGE)?,
            months: parse_component(months, "months", MONTHS_RANGE)?,
            days: parse_component(days, "days", DAYS_RANGE)?,
        })
    }
}

impl fmt::Display for MembershipTtl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.years > 0 {
            write!(f, "{}y", self.years)?;
        }
        if self.months > 0 {
            write!(f, "{}m", self.months)?;
        }
        if self.days > 0 {
            write!(f, "{}d", self.days)?;
        }
        Ok(())
    }
}
