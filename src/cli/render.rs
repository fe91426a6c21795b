use ansi_term::Style;
use chrono::{DateTime, Local, Utc};

use crate::{
    analysis::{AnalysisReport, ViewMode},
    recording::WaypointProgress,
    storage::entities::{Route, Session, Waypoint},
    utils::time::date_key,
};

/// Terminal output. Headings are bold only when `colored` is set.
pub struct Renderer {
    pub colored: bool,
}

impl Renderer {
    fn heading(&self, text: &str) -> String {
        if self.colored {
            Style::new().bold().paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn route(&self, route: &Route, waypoints: &[Waypoint]) -> String {
        let mut out = self.heading(&route.name);
        out.push('\n');
        for waypoint in waypoints {
            out.push_str(&format!("{}\t{}\n", waypoint.order + 1, waypoint.name));
        }
        out
    }

    pub fn progress(&self, session: &Session, progress: &[WaypointProgress]) -> String {
        let mut out = self.heading(&format!(
            "Recording session {} started {}",
            session.id,
            format_time(session.started_at)
        ));
        out.push('\n');
        for WaypointProgress { waypoint, arrival } in progress {
            let reached = arrival
                .as_ref()
                .map(|v| format_time(v.ts))
                .unwrap_or_else(|| "-".into());
            out.push_str(&format!(
                "{}\t{}\t{}\n",
                waypoint.order + 1,
                waypoint.name,
                reached
            ));
        }
        out
    }

    pub fn idle(&self, last: Option<&Session>) -> String {
        match last {
            Some(session) => format!(
                "Idle. Last session {} started {}\n",
                session.id,
                format_time(session.started_at)
            ),
            None => "Idle. No sessions recorded yet\n".to_string(),
        }
    }

    pub fn report(&self, report: &AnalysisReport) -> String {
        let mut out = format!(
            "Sessions between {} and {}: {}\n",
            date_key(report.range.start),
            date_key(report.range.end),
            report.session_count
        );
        if report.session_count == 0 {
            return out;
        }

        let title = match report.mode {
            ViewMode::Daily => "Minutes per segment by day",
            ViewMode::Weekly => "Average minutes per segment by 7 days",
        };
        out.push_str(&format!("\n{}\n", self.heading(title)));
        let key_header = match report.mode {
            ViewMode::Daily => "day",
            ViewMode::Weekly => "period",
        };
        out.push_str(&format!(
            "{}\t{}\ttotal\n",
            key_header,
            report.stacked.columns.join("\t")
        ));
        for row in &report.stacked.rows {
            let values = row
                .values
                .iter()
                .map(|v| format!("{v:.1}"))
                .collect::<Vec<_>>();
            out.push_str(&format!(
                "{}\t{}\t{:.1}\n",
                row.key,
                values.join("\t"),
                row.values.iter().sum::<f64>()
            ));
        }

        out.push_str(&format!("\n{}\n", self.heading("Total minutes per session")));
        out.push_str("date\tsession\ttotal\tmoving average\n");
        for (point, average) in report.totals.iter().zip(&report.moving_average) {
            out.push_str(&format!(
                "{}\t{}\t{:.1}\t{:.1}\n",
                date_key(point.date),
                point.session_id,
                point.total_minutes,
                average
            ));
        }
        out
    }
}

fn format_time(moment: DateTime<Utc>) -> String {
    moment.with_timezone(&Local).format("%x %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::{
        analysis::{table::SegmentTable, totals::TotalPoint, AnalysisReport, DateRange, ViewMode},
        storage::entities::{Route, Waypoint},
    };

    use super::Renderer;

    #[test]
    fn report_lists_table_and_totals() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let mut stacked = SegmentTable::new(vec!["A→B".into(), "B→C".into()]);
        stacked.push_row("2024-01-03".into()).copy_from_slice(&[24., 26.]);
        let report = AnalysisReport {
            range: DateRange::new(day(1), day(10)),
            mode: ViewMode::Daily,
            session_count: 2,
            stacked,
            totals: vec![
                TotalPoint {
                    date: day(3),
                    session_id: 1,
                    total_minutes: 30.,
                },
                TotalPoint {
                    date: day(3),
                    session_id: 2,
                    total_minutes: 20.,
                },
            ],
            moving_average: vec![30., 25.],
        };

        let text = Renderer { colored: false }.report(&report);

        assert_eq!(
            text,
            "Sessions between 2024-01-01 and 2024-01-10: 2\n\
             \n\
             Minutes per segment by day\n\
             day\tA→B\tB→C\ttotal\n\
             2024-01-03\t24.0\t26.0\t50.0\n\
             \n\
             Total minutes per session\n\
             date\tsession\ttotal\tmoving average\n\
             2024-01-03\t1\t30.0\t30.0\n\
             2024-01-03\t2\t20.0\t25.0\n"
        );
    }

    #[test]
    fn route_lists_waypoints_by_position() {
        let route = Route {
            id: 1,
            name: "morning".into(),
        };
        let waypoints = ["家", "会社"]
            .iter()
            .enumerate()
            .map(|(index, name)| Waypoint {
                id: index as u64 + 1,
                route_id: 1,
                order: index as u32,
                name: name.to_string(),
            })
            .collect::<Vec<_>>();

        assert_eq!(
            Renderer { colored: false }.route(&route, &waypoints),
            "morning\n1\t家\n2\t会社\n"
        );
    }

    #[test]
    fn empty_report_is_one_line() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let report = AnalysisReport {
            range: DateRange::new(day, day),
            mode: ViewMode::Weekly,
            session_count: 0,
            stacked: SegmentTable::default(),
            totals: vec![],
            moving_average: vec![],
        };

        assert_eq!(
            Renderer { colored: false }.report(&report),
            "Sessions between 2024-01-01 and 2024-01-01: 0\n"
        );
    }
}
