use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Time delta used to turn window counts into offsets on the time axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    /// `n` units of an integer time axis
    Steps(i64),
    /// Fixed duration on a `Date` (whole days only) or `Datetime` axis
    Fixed(Duration),
    /// Calendar months on a `Date` or `Datetime` axis
    Months(u32),
}

impl Frequency {
    pub fn days(n: i64) -> Self {
        Self::Fixed(Duration::days(n))
    }

    pub fn hours(n: i64) -> Self {
        Self::Fixed(Duration::hours(n))
    }

    pub fn months(n: u32) -> Self {
        Self::Months(n)
    }

    pub fn is_positive(&self) -> bool {
        match self {
            Self::Steps(n) => *n > 0,
            Self::Fixed(d) => *d > Duration::zero(),
            Self::Months(n) => *n > 0,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Steps(n) => write!(f, "{}", n),
            Self::Months(n) => write!(f, "{}mo", n),
            Self::Fixed(d) => {
                let nanos = total_nanos(d);
                let units: [(&str, i128); 8] = [
                    ("w", 7 * 86_400 * NANOS_PER_SECOND),
                    ("d", 86_400 * NANOS_PER_SECOND),
                    ("h", 3_600 * NANOS_PER_SECOND),
                    ("min", 60 * NANOS_PER_SECOND),
                    ("s", NANOS_PER_SECOND),
                    ("ms", 1_000_000),
                    ("us", 1_000),
                    ("ns", 1),
                ];
                let (suffix, size) = units
                    .iter()
                    .copied()
                    .find(|(_, size)| nanos % size == 0)
                    .unwrap_or(("ns", 1));
                write!(f, "{}{}", nanos / size, suffix)
            }
        }
    }
}

impl FromStr for Frequency {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (count, unit) = s.split_at(split);

        let n: i64 = if count.is_empty() {
            1
        } else {
            count.parse().map_err(|e| {
                ForecastError::Configuration(format!("Invalid frequency '{}': {}", s, e))
            })?
        };
        if n <= 0 || s.is_empty() {
            return Err(ForecastError::Configuration(format!(
                "Frequency must be a positive step, got '{}'",
                s
            )));
        }

        let freq = match unit {
            "" => Self::Steps(n),
            "w" => Self::Fixed(Duration::weeks(n)),
            "d" => Self::Fixed(Duration::days(n)),
            "h" => Self::Fixed(Duration::hours(n)),
            "min" => Self::Fixed(Duration::minutes(n)),
            "s" => Self::Fixed(Duration::seconds(n)),
            "ms" => Self::Fixed(Duration::milliseconds(n)),
            "us" => Self::Fixed(Duration::microseconds(n)),
            "ns" => Self::Fixed(Duration::nanoseconds(n)),
            "mo" => Self::Months(u32::try_from(n).map_err(|_| {
                ForecastError::Configuration(format!("Month frequency too large: {}", s))
            })?),
            other => {
                return Err(ForecastError::Configuration(format!(
                    "Unknown frequency unit '{}' in '{}'",
                    other, s
                )))
            }
        };
        Ok(freq)
    }
}

impl TryFrom<String> for Frequency {
    type Error = ForecastError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(freq: Frequency) -> Self {
        freq.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeKind {
    Integer,
    Date,
    Datetime(TimeUnit),
}

/// Physical (i64) view of a time column.
///
/// Dates are days since the epoch, datetimes are ticks of their time unit.
/// Ordering of the physical values matches the ordering of the timestamps.
#[derive(Debug, Clone)]
pub struct TimeAxis {
    dtype: DataType,
    kind: TimeKind,
    values: Vec<i64>,
}

impl TimeAxis {
    pub fn from_column(column: &Column) -> Result<Self> {
        let kind = match column.dtype() {
            DataType::Date => TimeKind::Date,
            DataType::Datetime(unit, _) => TimeKind::Datetime(*unit),
            dtype if dtype.is_integer() => TimeKind::Integer,
            other => {
                return Err(ForecastError::InvalidInput(format!(
                    "Column '{}' has unsupported time dtype {:?}",
                    column.name(),
                    other
                )))
            }
        };

        if column.null_count() > 0 {
            return Err(ForecastError::InvalidInput(format!(
                "Column '{}' contains {} null timestamps",
                column.name(),
                column.null_count()
            )));
        }

        let physical = column.cast(&DataType::Int64)?;
        let values: Vec<i64> = physical.i64()?.into_no_null_iter().collect();

        Ok(Self {
            dtype: column.dtype().clone(),
            kind,
            values,
        })
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dtype(&self) -> &DataType {
        &self.dtype
    }

    pub fn kind(&self) -> TimeKind {
        self.kind
    }

    /// Move `value` by `steps` repetitions of `freq` (negative steps go back in time)
    pub fn shift(&self, value: i64, steps: i64, freq: &Frequency) -> Result<i64> {
        match (freq, self.kind) {
            (Frequency::Steps(n), TimeKind::Integer) => steps
                .checked_mul(*n)
                .and_then(|delta| value.checked_add(delta))
                .ok_or_else(|| overflow(value, steps, freq)),
            (Frequency::Fixed(d), TimeKind::Date) => {
                if *d != Duration::days(d.num_days()) {
                    return Err(ForecastError::InvalidInput(format!(
                        "Frequency '{}' is not a whole number of days and cannot step a Date column",
                        freq
                    )));
                }
                steps
                    .checked_mul(d.num_days())
                    .and_then(|delta| value.checked_add(delta))
                    .ok_or_else(|| overflow(value, steps, freq))
            }
            (Frequency::Fixed(d), TimeKind::Datetime(unit)) => {
                let nanos = total_nanos(d);
                let per_tick = match unit {
                    TimeUnit::Nanoseconds => 1,
                    TimeUnit::Microseconds => 1_000,
                    TimeUnit::Milliseconds => 1_000_000,
                };
                if nanos % per_tick != 0 {
                    return Err(ForecastError::InvalidInput(format!(
                        "Frequency '{}' is not a whole number of {:?} and cannot step this Datetime column",
                        freq, unit
                    )));
                }
                i64::try_from(nanos / per_tick)
                    .ok()
                    .and_then(|t| steps.checked_mul(t))
                    .and_then(|delta| value.checked_add(delta))
                    .ok_or_else(|| overflow(value, steps, freq))
            }
            (Frequency::Months(n), TimeKind::Date) => {
                let date = epoch_date()
                    .checked_add_signed(Duration::days(value))
                    .ok_or_else(|| overflow(value, steps, freq))?;
                let shifted = shift_months(date, steps, *n).ok_or_else(|| overflow(value, steps, freq))?;
                Ok((shifted - epoch_date()).num_days())
            }
            (Frequency::Months(n), TimeKind::Datetime(unit)) => {
                let datetime = ticks_to_datetime(value, unit).ok_or_else(|| overflow(value, steps, freq))?;
                let shifted = shift_months(datetime.date(), steps, *n)
                    .map(|date| date.and_time(datetime.time()))
                    .ok_or_else(|| overflow(value, steps, freq))?;
                datetime_to_ticks(shifted, unit).ok_or_else(|| overflow(value, steps, freq))
            }
            (freq, kind) => Err(ForecastError::InvalidInput(format!(
                "Frequency '{}' cannot step a {:?} time column",
                freq, kind
            ))),
        }
    }

    /// Build a column of this axis' dtype from physical values
    pub fn to_column(&self, name: &str, values: Vec<i64>) -> Result<Column> {
        let column = Column::new(name.into(), values);
        Ok(column.cast(&self.dtype)?)
    }
}

fn overflow(value: i64, steps: i64, freq: &Frequency) -> ForecastError {
    ForecastError::InvalidInput(format!(
        "Shifting time value {} by {} x '{}' leaves the representable range",
        value, steps, freq
    ))
}

fn epoch_date() -> NaiveDate {
    DateTime::UNIX_EPOCH.date_naive()
}

fn total_nanos(d: &Duration) -> i128 {
    d.num_seconds() as i128 * NANOS_PER_SECOND + d.subsec_nanos() as i128
}

fn is_month_end(date: NaiveDate) -> bool {
    date.succ_opt().map_or(true, |next| next.month() != date.month())
}

/// Calendar month shift. Month-end dates stay on the month end so that
/// repeated steps over month-end data never drift (Apr 30 - 1 month is Mar 31).
fn shift_months(date: NaiveDate, steps: i64, months: u32) -> Option<NaiveDate> {
    let total = steps.checked_mul(months as i64)?;
    let magnitude = Months::new(u32::try_from(total.unsigned_abs()).ok()?);
    let shift = |d: NaiveDate| {
        if total >= 0 {
            d.checked_add_months(magnitude)
        } else {
            d.checked_sub_months(magnitude)
        }
    };

    if is_month_end(date) {
        shift(date.with_day(1)?)?
            .checked_add_months(Months::new(1))?
            .pred_opt()
    } else {
        shift(date)
    }
}

fn ticks_to_datetime(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let datetime = match unit {
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
    };
    datetime.map(|dt| dt.naive_utc())
}

fn datetime_to_ticks(value: NaiveDateTime, unit: TimeUnit) -> Option<i64> {
    let utc = value.and_utc();
    match unit {
        TimeUnit::Nanoseconds => utc.timestamp_nanos_opt(),
        TimeUnit::Microseconds => Some(utc.timestamp_micros()),
        TimeUnit::Milliseconds => Some(utc.timestamp_millis()),
    }
}
