//! Temporal range generator for date, time and datetime columns.
//!
//! The generator yields `from`, then advances by `step` `unit`s per row. When
//! the next value would pass `to` it wraps back to `from`. Time ranges are
//! confined to a single day and wrap at midnight even without a `to`.

use crate::error::GeneratorError;
use crate::generator::ValueGenerator;
use async_trait::async_trait;
use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use relgen_core::{parse_date, parse_datetime, parse_time, Range, RangeKind, StepUnit, Value};

/// Steps through a temporal range.
#[derive(Debug, Clone)]
pub struct RangeGenerator {
    kind: RangeKind,
    from: NaiveDateTime,
    to: Option<NaiveDateTime>,
    step: i64,
    unit: StepUnit,
    next: NaiveDateTime,
}

impl RangeGenerator {
    pub fn new(column: &str, range: &Range) -> Result<Self, GeneratorError> {
        let invalid = |reason: String| GeneratorError::InvalidRange {
            column: column.to_string(),
            reason,
        };

        let unit = range.unit();
        let unit_fits = match range.kind {
            RangeKind::Date => !matches!(
                unit,
                StepUnit::Second | StepUnit::Minute | StepUnit::Hour
            ),
            RangeKind::Time => matches!(unit, StepUnit::Second | StepUnit::Minute | StepUnit::Hour),
            RangeKind::DateTime => true,
        };
        if !unit_fits {
            return Err(invalid(format!(
                "unit {unit:?} does not apply to {:?} ranges",
                range.kind
            )));
        }
        if range.step <= 0 {
            return Err(invalid(format!("step must be positive, got {}", range.step)));
        }

        let from = match &range.from {
            Some(s) => parse_bound(range.kind, s)
                .ok_or_else(|| invalid(format!("cannot parse 'from' value '{s}'")))?,
            None => now(range.kind),
        };
        let to = range
            .to
            .as_deref()
            .map(|s| {
                parse_bound(range.kind, s)
                    .ok_or_else(|| invalid(format!("cannot parse 'to' value '{s}'")))
            })
            .transpose()?;

        if let Some(to) = to {
            if to < from {
                return Err(invalid(format!(
                    "'to' ({}) is before 'from' ({})",
                    to_value(range.kind, to),
                    to_value(range.kind, from)
                )));
            }
        }

        Ok(Self {
            kind: range.kind,
            from,
            to,
            step: range.step,
            unit,
            next: from,
        })
    }

    fn advance(&self, current: NaiveDateTime) -> Option<NaiveDateTime> {
        match self.unit {
            StepUnit::Second => current.checked_add_signed(TimeDelta::try_seconds(self.step)?),
            StepUnit::Minute => current.checked_add_signed(TimeDelta::try_minutes(self.step)?),
            StepUnit::Hour => current.checked_add_signed(TimeDelta::try_hours(self.step)?),
            StepUnit::Day => current.checked_add_signed(TimeDelta::try_days(self.step)?),
            StepUnit::Week => current.checked_add_signed(TimeDelta::try_weeks(self.step)?),
            StepUnit::Month => {
                current.checked_add_months(Months::new(u32::try_from(self.step).ok()?))
            }
            StepUnit::Year => {
                let months = u32::try_from(self.step).ok()?.checked_mul(12)?;
                current.checked_add_months(Months::new(months))
            }
        }
    }

    fn within(&self, candidate: NaiveDateTime) -> bool {
        let below_to = self.to.map_or(true, |to| candidate <= to);
        let same_day = self.kind != RangeKind::Time || candidate.date() == self.from.date();
        below_to && same_day
    }
}

#[async_trait]
impl ValueGenerator for RangeGenerator {
    async fn next_value(&mut self) -> Result<Value, GeneratorError> {
        let current = self.next;
        self.next = match self.advance(current) {
            Some(candidate) if self.within(candidate) => candidate,
            _ => self.from,
        };
        Ok(to_value(self.kind, current))
    }
}

/// Time ranges run on a fixed anchor day.
fn anchor_day() -> NaiveDate {
    NaiveDate::default()
}

fn parse_bound(kind: RangeKind, s: &str) -> Option<NaiveDateTime> {
    match kind {
        RangeKind::Date => parse_date(s).map(|d| d.and_time(NaiveTime::MIN)),
        RangeKind::Time => parse_time(s).map(|t| anchor_day().and_time(t)),
        RangeKind::DateTime => parse_datetime(s),
    }
}

fn now(kind: RangeKind) -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    match kind {
        RangeKind::Date => now.date().and_time(NaiveTime::MIN),
        RangeKind::Time => anchor_day().and_time(now.time()),
        RangeKind::DateTime => now,
    }
}

fn to_value(kind: RangeKind, dt: NaiveDateTime) -> Value {
    match kind {
        RangeKind::Date => Value::Date(dt.date()),
        RangeKind::Time => Value::Time(dt.time()),
        RangeKind::DateTime => Value::DateTime(dt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(
        kind: RangeKind,
        from: &str,
        to: Option<&str>,
        step: i64,
        unit: Option<StepUnit>,
    ) -> Range {
        Range {
            kind,
            from: Some(from.to_string()),
            to: to.map(String::from),
            step,
            unit,
        }
    }

    async fn take(generator: &mut RangeGenerator, n: usize) -> Vec<String> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(generator.next_value().await.unwrap().to_string());
        }
        out
    }

    #[tokio::test]
    async fn test_date_range_wraps() {
        let mut generator = RangeGenerator::new(
            "day",
            &range(RangeKind::Date, "2024-01-30", Some("2024-02-01"), 1, None),
        )
        .unwrap();
        assert_eq!(
            take(&mut generator, 4).await,
            vec!["2024-01-30", "2024-01-31", "2024-02-01", "2024-01-30"]
        );
    }

    #[tokio::test]
    async fn test_month_steps() {
        let mut generator = RangeGenerator::new(
            "billing",
            &range(RangeKind::Date, "2024-01-31", None, 1, Some(StepUnit::Month)),
        )
        .unwrap();
        assert_eq!(
            take(&mut generator, 3).await,
            vec!["2024-01-31", "2024-02-29", "2024-03-29"]
        );
    }

    #[tokio::test]
    async fn test_time_range_wraps_at_midnight() {
        let mut generator = RangeGenerator::new(
            "at",
            &range(RangeKind::Time, "23:00:00", None, 30, Some(StepUnit::Minute)),
        )
        .unwrap();
        assert_eq!(
            take(&mut generator, 3).await,
            vec!["23:00:00", "23:30:00", "23:00:00"]
        );
    }

    #[tokio::test]
    async fn test_full_day_of_quarter_hours_wraps() {
        let mut generator = RangeGenerator::new(
            "slot",
            &range(
                RangeKind::Time,
                "00:00:00",
                Some("23:45:00"),
                15,
                Some(StepUnit::Minute),
            ),
        )
        .unwrap();

        let values = take(&mut generator, 98).await;
        assert_eq!(values[0], "00:00:00");
        assert_eq!(values[1], "00:15:00");
        assert_eq!(values[94], "23:30:00");
        assert_eq!(values[95], "23:45:00");
        assert_eq!(values[96], "00:00:00");
        assert_eq!(values[97], "00:15:00");
        let distinct: std::collections::HashSet<_> = values[..96].iter().collect();
        assert_eq!(distinct.len(), 96);
    }

    #[tokio::test]
    async fn test_datetime_hours() {
        let mut generator = RangeGenerator::new(
            "created_at",
            &range(
                RangeKind::DateTime,
                "2024-03-01 22:00:00",
                Some("2024-03-02 00:00:00"),
                1,
                Some(StepUnit::Hour),
            ),
        )
        .unwrap();
        assert_eq!(
            take(&mut generator, 4).await,
            vec![
                "2024-03-01 22:00:00",
                "2024-03-01 23:00:00",
                "2024-03-02 00:00:00",
                "2024-03-01 22:00:00"
            ]
        );
    }

    #[tokio::test]
    async fn test_from_defaults_to_now() {
        let spec = Range {
            kind: RangeKind::Date,
            from: None,
            to: None,
            step: 1,
            unit: None,
        };
        let mut generator = RangeGenerator::new("d", &spec).unwrap();
        let before = Utc::now().date_naive();
        let Value::Date(first) = generator.next_value().await.unwrap() else {
            panic!("Expected date");
        };
        assert!(first >= before && first <= Utc::now().date_naive());
    }

    #[test]
    fn test_invalid_ranges() {
        let cases = [
            range(RangeKind::Date, "2024-02-01", Some("2024-01-01"), 1, None),
            range(RangeKind::Date, "2024-01-01", None, 0, None),
            range(RangeKind::Date, "2024-01-01", None, 1, Some(StepUnit::Hour)),
            range(RangeKind::Time, "10:00", None, 1, Some(StepUnit::Day)),
            range(RangeKind::Date, "not a date", None, 1, None),
        ];
        for case in cases {
            assert!(
                matches!(
                    RangeGenerator::new("c", &case),
                    Err(GeneratorError::InvalidRange { .. })
                ),
                "{case:?} should be rejected"
            );
        }
    }
}
