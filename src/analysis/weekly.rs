use std::fmt::Display;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::utils::time::date_key;

use super::{summary::SessionSummary, table::SegmentTable};

pub const BUCKET_DAYS: u64 = 7;

/// Inclusive range of up to [BUCKET_DAYS] days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekBucket {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekBucket {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl Display for WeekBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}〜{}", date_key(self.start), date_key(self.end))
    }
}

/// Splits `[start, end]` into windows of [BUCKET_DAYS] days counted from `start`. Windows don't
/// follow calendar weeks. The last one is cut at `end`.
pub fn build_weekly_buckets(start: NaiveDate, end: NaiveDate) -> Vec<WeekBucket> {
    let mut buckets = vec![];
    let mut current = Some(start);
    while let Some(bucket_start) = current.filter(|v| *v <= end) {
        let bucket_end = bucket_start
            .checked_add_days(Days::new(BUCKET_DAYS - 1))
            .map_or(end, |v| v.min(end));
        buckets.push(WeekBucket {
            start: bucket_start,
            end: bucket_end,
        });
        current = bucket_start.checked_add_days(Days::new(BUCKET_DAYS));
    }
    buckets
}

/// One row per bucket. Cells hold the **mean** minutes of a segment over the sessions in the
/// bucket that went through it, or 0 if none did. Unlike the daily table this shows a typical
/// duration, not time spent.
pub fn build_weekly_table(
    summaries: &[SessionSummary],
    buckets: &[WeekBucket],
    segment_names: &[String],
) -> SegmentTable {
    let mut table = SegmentTable::new(segment_names.to_vec());
    for bucket in buckets {
        let inside = summaries
            .iter()
            .filter(|v| v.anchor_date.is_some_and(|date| bucket.contains(date)))
            .collect::<Vec<_>>();
        let row = table.push_row(bucket.label());
        for (index, name) in segment_names.iter().enumerate() {
            let values = inside
                .iter()
                .filter_map(|v| v.minutes_for(name))
                .collect::<Vec<_>>();
            if !values.is_empty() {
                row[index] = values.iter().sum::<f64>() / values.len() as f64;
            }
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::analysis::summary::{Segment, SessionSummary};

    use super::{build_weekly_buckets, build_weekly_table, WeekBucket};

    fn day(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn summary(id: u64, anchor: u32, segments: &[(&str, f64)]) -> SessionSummary {
        SessionSummary {
            session_id: id,
            segments: segments
                .iter()
                .map(|(label, minutes)| Segment {
                    label: label.to_string(),
                    minutes: *minutes,
                })
                .collect(),
            total_minutes: segments.iter().map(|v| v.1).sum(),
            anchor_date: Some(day(anchor)),
        }
    }

    #[test]
    fn buckets_anchor_at_range_start() {
        let buckets = build_weekly_buckets(day(1), day(10));
        assert_eq!(
            buckets,
            vec![
                WeekBucket {
                    start: day(1),
                    end: day(7)
                },
                WeekBucket {
                    start: day(8),
                    end: day(10)
                },
            ]
        );
        assert_eq!(buckets[0].label(), "2024-01-01〜2024-01-07");
        assert_eq!(buckets[1].label(), "2024-01-08〜2024-01-10");
    }

    #[test]
    fn buckets_ignore_calendar_weeks() {
        // 2024-01-03 is a Wednesday.
        let buckets = build_weekly_buckets(day(3), day(16));
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].end, day(9));
        assert_eq!(buckets[1].start, day(10));
        assert_eq!(buckets[1].end, day(16));
    }

    #[test]
    fn degenerate_ranges() {
        assert!(build_weekly_buckets(day(5), day(4)).is_empty());
        assert_eq!(
            build_weekly_buckets(day(5), day(5)),
            vec![WeekBucket {
                start: day(5),
                end: day(5)
            }]
        );
    }

    #[test]
    fn buckets_stop_at_the_last_date() {
        let start = NaiveDate::MAX - chrono::Days::new(9);

        let buckets = build_weekly_buckets(start, NaiveDate::MAX);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[1].end, NaiveDate::MAX);
    }

    #[test]
    fn weekly_cells_are_means() {
        let summaries = [
            summary(1, 3, &[("A→B", 10.)]),
            summary(2, 3, &[("A→B", 14.)]),
        ];
        let buckets = build_weekly_buckets(day(1), day(10));

        let table = build_weekly_table(&summaries, &buckets, &["A→B".to_string()]);

        assert_eq!(table.value("2024-01-01〜2024-01-07", "A→B"), Some(12.));
        assert_eq!(table.value("2024-01-08〜2024-01-10", "A→B"), Some(0.));
    }

    #[test]
    fn repeated_segment_counts_once_per_session() {
        let summaries = [
            summary(1, 2, &[("A→B", 10.), ("A→B", 4.)]),
            summary(2, 3, &[("A→B", 20.)]),
        ];
        let buckets = build_weekly_buckets(day(1), day(7));

        let table = build_weekly_table(&summaries, &buckets, &["A→B".to_string()]);

        assert_eq!(table.value("2024-01-01〜2024-01-07", "A→B"), Some(15.));
    }

    #[test]
    fn mean_only_counts_sessions_with_the_segment() {
        let summaries = [
            summary(1, 2, &[("A→B", 10.), ("B→C", 6.)]),
            summary(2, 4, &[("A→C", 20.)]),
            summary(3, 9, &[("A→B", 7.)]),
            summary(4, 5, &[("A→B", 20.), ("B→C", 2.)]),
        ];
        let names = ["A→B".to_string(), "B→C".into(), "A→C".into()];
        let buckets = build_weekly_buckets(day(1), day(10));

        let table = build_weekly_table(&summaries, &buckets, &names);

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].values, vec![15., 4., 20.]);
        assert_eq!(table.rows[1].values, vec![7., 0., 0.]);
    }
}
