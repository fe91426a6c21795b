//! Formats stored data and analysis results for use outside the application.

pub mod csv;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{analysis::AnalysisReport, storage::entities::Database};

#[derive(Serialize)]
struct Backup<'a> {
    #[serde(flatten)]
    database: &'a Database,
    exported_at: DateTime<Utc>,
}

/// Full dump of the database. The output can be used as a data file as is, `exported_at` is
/// ignored when it's read back.
pub fn backup_json(database: &Database, exported_at: DateTime<Utc>) -> Result<String> {
    Ok(serde_json::to_string_pretty(&Backup {
        database,
        exported_at,
    })?)
}

pub fn report_json(report: &AnalysisReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{TimeZone, Utc};

    use crate::storage::entities::{Arrival, Database, Route, Session};

    use super::backup_json;

    #[test]
    fn backup_can_be_read_back() -> Result<()> {
        let moment = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let database = Database {
            routes: vec![Route {
                id: 1,
                name: "route".into(),
            }],
            places: vec![],
            sessions: vec![Session {
                id: 1,
                route_id: 1,
                started_at: moment,
                ended_at: Some(moment),
            }],
            arrivals: vec![Arrival {
                id: 1,
                session_id: 1,
                place_id: 1,
                ts: moment,
            }],
        };

        let json = backup_json(&database, moment)?;

        assert!(json.contains("\"exported_at\": \"2024-01-01T08:00:00Z\""));
        assert!(json.contains("\"ts\": 1704096000000"));
        assert_eq!(serde_json::from_str::<Database>(&json)?, database);
        Ok(())
    }
}
