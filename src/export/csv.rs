use chrono::SecondsFormat;

use crate::{
    analysis::{table::SegmentTable, totals::TotalPoint},
    storage::entities::Database,
    utils::time::date_key,
};

/// Every arrival with its session, route and waypoint name. Names of deleted routes or
/// waypoints are left empty.
pub fn arrivals_csv(database: &Database) -> String {
    let mut arrivals = database.arrivals.iter().collect::<Vec<_>>();
    arrivals.sort_by_key(|v| v.id);

    let mut out = String::from("session_id,route_name,place,timestamp_iso\n");
    for arrival in arrivals {
        let route = database
            .sessions
            .iter()
            .find(|v| v.id == arrival.session_id)
            .and_then(|session| database.route(session.route_id))
            .map(|v| v.name.as_str())
            .unwrap_or_default();
        let place = database
            .places
            .iter()
            .find(|v| v.id == arrival.place_id)
            .map(|v| v.name.as_str())
            .unwrap_or_default();
        out.push_str(&format!(
            "{},{},{},{}\n",
            arrival.session_id,
            escape(route),
            escape(place),
            arrival.ts.to_rfc3339_opts(SecondsFormat::Millis, true)
        ));
    }
    out
}

/// `key_header` names the first column, the rest are the table columns.
pub fn table_csv(table: &SegmentTable, key_header: &str) -> String {
    let mut out = String::new();
    let header = std::iter::once(key_header)
        .chain(table.columns.iter().map(String::as_str))
        .map(escape)
        .collect::<Vec<_>>();
    out.push_str(&header.join(","));
    out.push('\n');
    for row in &table.rows {
        let values = row.values.iter().map(|v| format!("{v:.1}"));
        let line = std::iter::once(escape(&row.key))
            .chain(values)
            .collect::<Vec<_>>();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

/// Totals next to their moving average. Both slices are index aligned.
pub fn totals_csv(totals: &[TotalPoint], moving_average: &[f64]) -> String {
    let mut out = String::from("date,session_id,total_minutes,moving_average\n");
    for (point, average) in totals.iter().zip(moving_average) {
        out.push_str(&format!(
            "{},{},{:.1},{:.1}\n",
            date_key(point.date),
            point.session_id,
            point.total_minutes,
            average
        ));
    }
    out
}

fn escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
