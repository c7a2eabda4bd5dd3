//! Cron expressions for pipeline schedules.
//!
//! Supports the classic five-field syntax (`minute hour day-of-month month
//! day-of-week`) with lists, ranges, steps and three-letter month and weekday
//! names, plus the `@hourly`, `@daily`, `@weekly`, `@monthly` and `@yearly`
//! shorthands. Expressions are evaluated in UTC.

use std::fmt;
use std::str::FromStr;

use jiff::civil::{DateTime, Time};
use jiff::tz::TimeZone;
use jiff::{Timestamp, ToSpan};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Upper bound on candidate instants visited by [`CronSchedule::next_after`].
const MAX_SEARCH_STEPS: usize = 200_000;

/// Error returned when a cron expression cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid cron expression '{expression}': {reason}")]
pub struct ParseCronError {
    expression: String,
    reason: String,
}

impl ParseCronError {
    fn new(expression: &str, reason: impl Into<String>) -> Self {
        Self {
            expression: expression.to_owned(),
            reason: reason.into(),
        }
    }

    /// Returns the reason the expression was rejected.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// A parsed cron expression.
///
/// Each field is stored as a bit set of the values it matches.
#[derive(Clone, PartialEq, Eq)]
pub struct CronSchedule {
    expression: String,
    minutes: u64,
    hours: u64,
    days_of_month: u64,
    months: u64,
    days_of_week: u64,
    day_of_month_restricted: bool,
    day_of_week_restricted: bool,
}

struct Field {
    name: &'static str,
    min: u8,
    max: u8,
    aliases: &'static [&'static str],
}

const MINUTE: Field = Field {
    name: "minute",
    min: 0,
    max: 59,
    aliases: &[],
};

const HOUR: Field = Field {
    name: "hour",
    min: 0,
    max: 23,
    aliases: &[],
};

const DAY_OF_MONTH: Field = Field {
    name: "day-of-month",
    min: 1,
    max: 31,
    aliases: &[],
};

const MONTH: Field = Field {
    name: "month",
    min: 1,
    max: 12,
    aliases: &[
        "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
    ],
};

const DAY_OF_WEEK: Field = Field {
    name: "day-of-week",
    min: 0,
    max: 7,
    aliases: &["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"],
};

impl Field {
    fn parse(&self, source: &str) -> Result<u64, String> {
        let mut mask = 0u64;

        for part in source.split(',') {
            if part.is_empty() {
                return Err(format!("empty list entry in {} field", self.name));
            }

            let (range, step) = match part.split_once('/') {
                Some((range, step)) => {
                    let step: u16 = step
                        .parse()
                        .map_err(|_| format!("invalid step '{step}' in {} field", self.name))?;
                    if step == 0 {
                        return Err(format!("step must be positive in {} field", self.name));
                    }
                    if step > u16::from(self.max - self.min) + 1 {
                        return Err(format!(
                            "step {step} exceeds the range of the {} field",
                            self.name
                        ));
                    }
                    (range, Some(step))
                }
                None => (part, None),
            };

            let (start, end) = if range == "*" {
                (self.min, self.max)
            } else if let Some((start, end)) = range.split_once('-') {
                (self.value(start)?, self.value(end)?)
            } else {
                let value = self.value(range)?;
                match step {
                    Some(_) => (value, self.max),
                    None => (value, value),
                }
            };

            if start > end {
                return Err(format!(
                    "range {start}-{end} is reversed in {} field",
                    self.name
                ));
            }

            let step = usize::from(step.unwrap_or(1));
            for value in (start..=end).step_by(step) {
                mask |= 1 << value;
            }
        }

        Ok(mask)
    }

    fn value(&self, token: &str) -> Result<u8, String> {
        if let Some(index) = self
            .aliases
            .iter()
            .position(|alias| alias.eq_ignore_ascii_case(token))
        {
            return Ok(self.min + index as u8);
        }

        let value: u8 = token
            .parse()
            .map_err(|_| format!("invalid value '{token}' in {} field", self.name))?;

        if value < self.min || value > self.max {
            return Err(format!(
                "{} value {value} is outside {}-{}",
                self.name, self.min, self.max
            ));
        }

        Ok(value)
    }
}

impl CronSchedule {
    /// Parses a cron expression.
    pub fn parse(expression: &str) -> Result<Self, ParseCronError> {
        let trimmed = expression.trim();
        let expanded = match trimmed.to_ascii_lowercase().as_str() {
            "@yearly" | "@annually" => "0 0 1 1 *",
            "@monthly" => "0 0 1 * *",
            "@weekly" => "0 0 * * 0",
            "@daily" | "@midnight" => "0 0 * * *",
            "@hourly" => "0 * * * *",
            shorthand if shorthand.starts_with('@') => {
                return Err(ParseCronError::new(trimmed, "unknown shorthand"));
            }
            _ => trimmed,
        };

        let fields: Vec<&str> = expanded.split_whitespace().collect();
        let [minute, hour, day_of_month, month, day_of_week] = fields.as_slice() else {
            return Err(ParseCronError::new(
                trimmed,
                format!("expected 5 fields, found {}", fields.len()),
            ));
        };

        let parse = |field: &Field, source: &str| -> Result<u64, ParseCronError> {
            field
                .parse(source)
                .map_err(|reason| ParseCronError::new(trimmed, reason))
        };

        let mut days_of_week = parse(&DAY_OF_WEEK, day_of_week)?;
        // Both 0 and 7 denote Sunday.
        if days_of_week & (1 << 7) != 0 {
            days_of_week = (days_of_week & !(1 << 7)) | 1;
        }

        Ok(Self {
            expression: trimmed.to_owned(),
            minutes: parse(&MINUTE, minute)?,
            hours: parse(&HOUR, hour)?,
            days_of_month: parse(&DAY_OF_MONTH, day_of_month)?,
            months: parse(&MONTH, month)?,
            days_of_week,
            day_of_month_restricted: !day_of_month.starts_with('*'),
            day_of_week_restricted: !day_of_week.starts_with('*'),
        })
    }

    /// Returns the expression as it was written.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.expression
    }

    /// Returns whether the schedule fires at the given civil minute.
    pub fn matches(&self, at: DateTime) -> bool {
        contains(self.minutes, at.minute())
            && contains(self.hours, at.hour())
            && contains(self.months, at.month())
            && self.matches_day(at)
    }

    /// Returns whether the schedule fires at the UTC minute containing `at`.
    pub fn matches_timestamp(&self, at: Timestamp) -> bool {
        self.matches(at.to_zoned(TimeZone::UTC).datetime())
    }

    /// Returns the first instant strictly after `after` at which the schedule
    /// fires, or `None` if it never fires (e.g. February 30th).
    pub fn next_after(&self, after: Timestamp) -> Option<Timestamp> {
        let start = after.to_zoned(TimeZone::UTC).datetime();
        let horizon = start.checked_add(5.years()).ok()?;
        let mut candidate = start
            .date()
            .to_datetime(Time::new(start.hour(), start.minute(), 0, 0).ok()?)
            .checked_add(1.minute())
            .ok()?;

        for _ in 0..MAX_SEARCH_STEPS {
            if candidate > horizon {
                return None;
            }

            let date = candidate.date();
            candidate = if !contains(self.months, candidate.month()) {
                date.first_of_month()
                    .checked_add(1.month())
                    .ok()?
                    .to_datetime(Time::midnight())
            } else if !self.matches_day(candidate) {
                date.checked_add(1.day()).ok()?.to_datetime(Time::midnight())
            } else if !contains(self.hours, candidate.hour()) {
                date.to_datetime(Time::new(candidate.hour(), 0, 0, 0).ok()?)
                    .checked_add(1.hour())
                    .ok()?
            } else if !contains(self.minutes, candidate.minute()) {
                candidate.checked_add(1.minute()).ok()?
            } else {
                return candidate.to_zoned(TimeZone::UTC).ok().map(|z| z.timestamp());
            };
        }

        None
    }

    fn matches_day(&self, at: DateTime) -> bool {
        let day_of_month = contains(self.days_of_month, at.day());
        let day_of_week = contains(
            self.days_of_week,
            at.weekday().to_sunday_zero_offset(),
        );

        // Standard cron semantics: when both day fields are restricted,
        // either one matching is enough.
        if self.day_of_month_restricted && self.day_of_week_restricted {
            day_of_month || day_of_week
        } else {
            day_of_month && day_of_week
        }
    }
}

#[inline]
fn contains(mask: u64, value: i8) -> bool {
    (0..64).contains(&value) && mask & (1 << value) != 0
}

impl FromStr for CronSchedule {
    type Err = ParseCronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

impl fmt::Debug for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CronSchedule").field(&self.expression).finish()
    }
}

impl Serialize for CronSchedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.expression)
    }
}

impl<'de> Deserialize<'de> for CronSchedule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let expression = String::deserialize(deserializer)?;
        Self::parse(&expression).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "schema")]
impl schemars::JsonSchema for CronSchedule {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        "CronSchedule".into()
    }

    fn json_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": "string",
            "description": "Five-field cron expression evaluated in UTC, or one of @hourly, @daily, @weekly, @monthly, @yearly.",
            "examples": ["0 6 * * *", "*/15 * * * MON-FRI", "@daily"]
        })
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::datetime;

    use super::*;

    #[test]
    fn parses_wildcards_lists_ranges_and_steps() {
        let schedule = CronSchedule::parse("*/15 9-17 * * 1,3,5").unwrap();
        assert!(schedule.matches(datetime(2026, 3, 2, 9, 30, 0, 0))); // Monday
        assert!(!schedule.matches(datetime(2026, 3, 2, 9, 31, 0, 0)));
        assert!(!schedule.matches(datetime(2026, 3, 3, 9, 30, 0, 0))); // Tuesday
        assert!(!schedule.matches(datetime(2026, 3, 2, 18, 0, 0, 0)));
    }

    #[test]
    fn large_step_selects_only_start() {
        let schedule = CronSchedule::parse("5/59 * * * *").unwrap();
        assert!(schedule.matches(datetime(2026, 3, 2, 9, 5, 0, 0)));
        for minute in (0..60).filter(|minute| *minute != 5) {
            assert!(!schedule.matches(datetime(2026, 3, 2, 9, minute, 0, 0)));
        }
    }

    #[test]
    fn accepts_names_and_sunday_as_seven() {
        let by_name = CronSchedule::parse("0 6 * JAN-MAR SUN").unwrap();
        let by_number = CronSchedule::parse("0 6 * 1-3 7").unwrap();
        let sunday = datetime(2026, 2, 1, 6, 0, 0, 0);
        assert!(by_name.matches(sunday));
        assert!(by_number.matches(sunday));
        assert!(!by_name.matches(datetime(2026, 4, 5, 6, 0, 0, 0)));
    }

    #[test]
    fn restricted_day_fields_are_ored() {
        // 13th of the month or any Friday.
        let schedule = CronSchedule::parse("0 0 13 * 5").unwrap();
        assert!(schedule.matches(datetime(2026, 1, 13, 0, 0, 0, 0))); // Tuesday the 13th
        assert!(schedule.matches(datetime(2026, 1, 16, 0, 0, 0, 0))); // Friday
        assert!(!schedule.matches(datetime(2026, 1, 14, 0, 0, 0, 0)));
    }

    #[test]
    fn shorthands_expand() {
        let daily = CronSchedule::parse("@daily").unwrap();
        assert_eq!(daily.as_str(), "@daily");
        assert!(daily.matches(datetime(2026, 7, 4, 0, 0, 0, 0)));
        assert!(!daily.matches(datetime(2026, 7, 4, 0, 1, 0, 0)));
    }

    #[test]
    fn rejects_malformed_expressions() {
        for expression in [
            "",
            "* * * *",
            "* * * * * *",
            "60 * * * *",
            "* 24 * * *",
            "* * 0 * *",
            "* * * 13 *",
            "*/0 * * * *",
            "5/65535 * * * *",
            "*/61 * * * *",
            "5-1 * * * *",
            "a * * * *",
            "1,,2 * * * *",
            "@fortnightly",
        ] {
            assert!(
                CronSchedule::parse(expression).is_err(),
                "expected '{expression}' to be rejected"
            );
        }
    }

    #[test]
    fn next_after_finds_following_minute() {
        let schedule = CronSchedule::parse("30 6 * * *").unwrap();
        let after: Timestamp = "2026-05-01T06:30:00Z".parse().unwrap();
        let next = schedule.next_after(after).unwrap();
        assert_eq!(next.to_string(), "2026-05-02T06:30:00Z");
    }

    #[test]
    fn next_after_returns_none_for_impossible_dates() {
        let schedule = CronSchedule::parse("0 0 30 2 *").unwrap();
        let after: Timestamp = "2026-01-01T00:00:00Z".parse().unwrap();
        assert!(schedule.next_after(after).is_none());
    }

    #[test]
    fn serializes_as_expression() {
        let schedule = CronSchedule::parse("0 6 * * *").unwrap();
        let json = serde_json::to_string(&schedule).unwrap();
        assert_eq!(json, "\"0 6 * * *\"");
        let back: CronSchedule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schedule);
        assert!(serde_json::from_str::<CronSchedule>("\"bogus\"").is_err());
    }
}
