use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::utils::time::date_key;

use super::{summary::SessionSummary, table::SegmentTable};

/// One row per anchor day, ascending. Cells hold the **sum** of a segment's minutes over all
/// sessions of that day, so the row total is the time spent commuting that day.
pub fn build_daily_table(summaries: &[SessionSummary], segment_names: &[String]) -> SegmentTable {
    let mut days = BTreeMap::<NaiveDate, Vec<&SessionSummary>>::new();
    for summary in summaries {
        if let Some(day) = summary.anchor_date {
            days.entry(day).or_default().push(summary);
        }
    }

    let mut table = SegmentTable::new(segment_names.to_vec());
    for (day, day_summaries) in days {
        let row = table.push_row(date_key(day));
        for segment in day_summaries.iter().flat_map(|v| v.segments.iter()) {
            if let Some(index) = segment_names.iter().position(|v| *v == segment.label) {
                row[index] += segment.minutes;
            }
        }
    }
    table
}
