//! Semantic value types with first-class flag support.
//!
//! [`Duration`] and [`Timestamp`] are the two non-primitive leaf types the
//! default [`Registry`](crate::Registry) knows how to parse. Both serialize to
//! their display string so they snapshot and fill like any other leaf.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use toml::value::{Date, Datetime, Offset, Time};

const NANOS_PER_SEC: u128 = 1_000_000_000;
const NANOS_PER_MIN: u128 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MIN;

/// A span of time written the way humans type it on a command line:
/// `9ms`, `1.5s`, `1h30m`, `250µs`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration(pub std::time::Duration);

impl Duration {
    pub const fn from_secs(secs: u64) -> Self {
        Duration(std::time::Duration::from_secs(secs))
    }

    pub const fn from_millis(millis: u64) -> Self {
        Duration(std::time::Duration::from_millis(millis))
    }

    pub fn as_std(&self) -> std::time::Duration {
        self.0
    }
}

impl From<std::time::Duration> for Duration {
    fn from(d: std::time::Duration) -> Self {
        Duration(d)
    }
}

impl From<Duration> for std::time::Duration {
    fn from(d: Duration) -> Self {
        d.0
    }
}

impl FromStr for Duration {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse_duration(input).map(Duration)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nanos = self.0.as_nanos();
        if nanos == 0 {
            return write!(f, "0s");
        }
        if nanos < 1_000 {
            return write!(f, "{nanos}ns");
        }
        if nanos < 1_000_000 {
            return write!(f, "{}µs", decimal(nanos, 1_000));
        }
        if nanos < NANOS_PER_SEC {
            return write!(f, "{}ms", decimal(nanos, 1_000_000));
        }

        let hours = nanos / NANOS_PER_HOUR;
        let minutes = (nanos % NANOS_PER_HOUR) / NANOS_PER_MIN;
        let rest = nanos % NANOS_PER_MIN;
        if hours > 0 {
            write!(f, "{hours}h{minutes}m")?;
        } else if minutes > 0 {
            write!(f, "{minutes}m")?;
        }
        write!(f, "{}s", decimal(rest, NANOS_PER_SEC))
    }
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Render `value / unit` with the shortest exact decimal fraction.
fn decimal(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let width = unit.to_string().len() - 1;
    let digits = format!("{frac:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

fn parse_duration(input: &str) -> Result<std::time::Duration, String> {
    let mut rest = input.strip_prefix('+').unwrap_or(input);
    if rest.starts_with('-') {
        return Err(format!("negative duration {input:?} is not supported"));
    }
    if rest == "0" {
        return Ok(std::time::Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(format!("invalid duration {input:?}"));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (int_part, after_int) = rest.split_at(int_end);

        let (frac_part, after_number) = match after_int.strip_prefix('.') {
            Some(tail) => {
                let end = tail
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(tail.len());
                tail.split_at(end)
            }
            None => ("", after_int),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(format!("invalid duration {input:?}"));
        }

        let unit_end = after_number
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after_number.len());
        let (unit, tail) = after_number.split_at(unit_end);
        let scale = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SEC,
            "m" => NANOS_PER_MIN,
            "h" => NANOS_PER_HOUR,
            "" => return Err(format!("missing unit in duration {input:?}")),
            other => return Err(format!("unknown unit {other:?} in duration {input:?}")),
        };

        let overflow = || format!("duration {input:?} is too large");
        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| overflow())?
        };
        let mut value = whole.checked_mul(scale).ok_or_else(overflow)?;
        if !frac_part.is_empty() {
            // Nanosecond precision never needs more than 18 fractional digits.
            let digits = &frac_part[..frac_part.len().min(18)];
            let frac: u128 = digits.parse().map_err(|_| overflow())?;
            value += frac * scale / 10u128.pow(digits.len() as u32);
        }
        total = total.checked_add(value).ok_or_else(overflow)?;
        rest = tail;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| format!("duration {input:?} is too large"))?;
    Ok(std::time::Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}

/// An RFC 3339 instant (`1979-05-27T07:32:00Z`).
///
/// The default value is `0001-01-01T00:00:00Z`, the earliest representable
/// instant, so configuration structs holding a timestamp can still derive
/// `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub Datetime);

impl Timestamp {
    pub fn datetime(&self) -> &Datetime {
        &self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp(Datetime {
            date: Some(Date {
                year: 1,
                month: 1,
                day: 1,
            }),
            time: Some(Time {
                hour: 0,
                minute: 0,
                second: 0,
                nanosecond: 0,
            }),
            offset: Some(Offset::Z),
        })
    }
}

impl FromStr for Timestamp {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let datetime: Datetime = input.parse().map_err(|e| format!("{e}"))?;
        match (datetime.date, datetime.time, datetime.offset) {
            (Some(_), Some(_), Some(_)) => Ok(Timestamp(datetime)),
            _ => Err(format!("{input:?} is not an RFC 3339 timestamp with offset")),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dur(s: &str) -> std::time::Duration {
        s.parse::<Duration>().unwrap().0
    }

    #[test]
    fn parses_single_units() {
        assert_eq!(dur("9ms"), std::time::Duration::from_millis(9));
        assert_eq!(dur("1s"), std::time::Duration::from_secs(1));
        assert_eq!(dur("2m"), std::time::Duration::from_secs(120));
        assert_eq!(dur("1h"), std::time::Duration::from_secs(3600));
        assert_eq!(dur("15ns"), std::time::Duration::from_nanos(15));
        assert_eq!(dur("250us"), std::time::Duration::from_micros(250));
        assert_eq!(dur("250µs"), std::time::Duration::from_micros(250));
    }

    #[test]
    fn parses_compound_and_fractions() {
        assert_eq!(dur("1h30m"), std::time::Duration::from_secs(5400));
        assert_eq!(dur("1.5s"), std::time::Duration::from_millis(1500));
        assert_eq!(dur(".5s"), std::time::Duration::from_millis(500));
        assert_eq!(dur("+2s"), std::time::Duration::from_secs(2));
    }

    #[test]
    fn zero_needs_no_unit() {
        assert_eq!(dur("0"), std::time::Duration::ZERO);
    }

    #[test]
    fn rejects_garbage() {
        assert!("ItsAnError".parse::<Duration>().is_err());
        assert!("".parse::<Duration>().is_err());
        assert!("10".parse::<Duration>().is_err());
        assert!("5d".parse::<Duration>().is_err());
        assert!("-1s".parse::<Duration>().is_err());
    }

    #[test]
    fn displays_like_it_parses() {
        assert_eq!(Duration::default().to_string(), "0s");
        assert_eq!(Duration::from_millis(9).to_string(), "9ms");
        assert_eq!(Duration::from_millis(1500).to_string(), "1.5s");
        assert_eq!(Duration::from_secs(90).to_string(), "1m30s");
        assert_eq!(Duration::from_secs(3600).to_string(), "1h0m0s");
        assert_eq!(
            Duration(std::time::Duration::from_micros(1500)).to_string(),
            "1.5ms"
        );
    }

    #[test]
    fn duration_serializes_as_string() {
        let value = serde_json::to_value(Duration::from_secs(1)).unwrap();
        assert_eq!(value, serde_json::Value::String("1s".into()));
        let back: Duration = serde_json::from_value(value).unwrap();
        assert_eq!(back, Duration::from_secs(1));
    }

    #[test]
    fn timestamp_parses_rfc3339() {
        let ts: Timestamp = "1979-05-27T07:32:00Z".parse().unwrap();
        assert_eq!(ts.to_string(), "1979-05-27T07:32:00Z");
    }

    #[test]
    fn timestamp_requires_offset() {
        assert!("1979-05-27".parse::<Timestamp>().is_err());
        assert!("1979-05-27T07:32:00".parse::<Timestamp>().is_err());
        assert!("yesterday".parse::<Timestamp>().is_err());
    }

    #[test]
    fn timestamp_default_is_year_one() {
        assert_eq!(Timestamp::default().to_string(), "0001-01-01T00:00:00Z");
    }

    #[test]
    fn timestamp_serializes_as_string() {
        let ts: Timestamp = "2016-04-20T17:39:00Z".parse().unwrap();
        let value = serde_json::to_value(ts).unwrap();
        assert_eq!(value, serde_json::Value::String("2016-04-20T17:39:00Z".into()));
        let back: Timestamp = serde_json::from_value(value).unwrap();
        assert_eq!(back, ts);
        assert!(serde_json::from_value::<Timestamp>("1979-05-27".into()).is_err());
    }
}
