use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};
use tracing::{info, warn};

use crate::{
    analysis::{
        analyze, summary::ArrivalPolicy, totals::DEFAULT_MOVING_AVERAGE_WINDOW, AnalysisConfig,
        AnalysisRequest, DateRange, ViewMode,
    },
    export::{
        csv::{table_csv, totals_csv},
        report_json,
    },
    recording::RouteContext,
    storage::{entities::RouteSnapshot, store::CommuteStore},
    utils::time::local_date,
};

use super::{render::Renderer, Args};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ReportFormat {
    Table,
    Csv,
    Json,
}

impl Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Table => write!(f, "table"),
            ReportFormat::Csv => write!(f, "csv"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct ReportCommand {
    #[arg(
        long = "start",
        short,
        help = "First day of the range. Examples are \"yesterday\", \"2 weeks ago\", \"15/03/2025\". Defaults to the day of the earliest arrival"
    )]
    start_date: Option<String>,
    #[arg(
        long = "end",
        short,
        help = "Last day of the range, inclusive. Defaults to the day of the latest arrival"
    )]
    end_date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(
        short,
        long,
        default_value_t = ViewMode::Daily,
        help = "daily sums segment minutes per day, weekly averages them per 7 days counted from the start"
    )]
    mode: ViewMode,
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_MOVING_AVERAGE_WINDOW,
        help = "Number of sessions in the moving average of total time"
    )]
    window: usize,
    #[arg(
        long = "first-arrival",
        help = "When a waypoint was checked in more than once, use the first check-in instead of the last"
    )]
    first_arrival: bool,
    #[arg(short, long, default_value_t = ReportFormat::Table)]
    format: ReportFormat,
}

/// Command to process `report` command. Report shows how long each segment of the route took
/// between `start_date` and `end_date`.
pub async fn process_report_command(
    store: &impl CommuteStore,
    context: RouteContext,
    renderer: &Renderer,
    ReportCommand {
        start_date,
        end_date,
        date_style,
        mode,
        window,
        first_arrival,
        format,
    }: ReportCommand,
) -> Result<()> {
    let snapshot = store.load().await?.snapshot(context.route_id);
    let now = Local::now();
    let default = default_range(&snapshot, &Local, now.date_naive());
    let range = DateRange::new(
        parse_day(start_date, now, date_style, "start")?.unwrap_or(default.start),
        parse_day(end_date, now, date_style, "end")?.unwrap_or(default.end),
    );
    if range.end < range.start {
        warn!("Range {range:?} is empty");
    }

    let request = AnalysisRequest {
        range,
        mode,
        config: AnalysisConfig {
            moving_average_window: window,
            arrival_policy: if first_arrival {
                ArrivalPolicy::FirstWins
            } else {
                ArrivalPolicy::LastWins
            },
        },
    };
    let report = analyze(&snapshot, &request, &Local);
    info!("Report for {} sessions", report.session_count);

    match format {
        ReportFormat::Table => print!("{}", renderer.report(&report)),
        ReportFormat::Csv => {
            let key_header = match mode {
                ViewMode::Daily => "day",
                ViewMode::Weekly => "period",
            };
            print!("{}", table_csv(&report.stacked, key_header));
            println!();
            print!("{}", totals_csv(&report.totals, &report.moving_average));
        }
        ReportFormat::Json => println!("{}", report_json(&report)?),
    }
    Ok(())
}

fn parse_day(
    value: Option<String>,
    now: DateTime<Local>,
    date_style: DateStyle,
    name: &str,
) -> Result<Option<NaiveDate>> {
    match value.map(|s| parse_date_string(&s, now, date_style.into())) {
        Some(Ok(v)) => Ok(Some(v.date_naive())),
        Some(Err(e)) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate {name} date {e}"),
            )
            .into()),
        None => Ok(None),
    }
}

/// Days of the earliest and latest recorded arrival, or `today` when nothing was recorded.
fn default_range<Tz: TimeZone>(snapshot: &RouteSnapshot, tz: &Tz, today: NaiveDate) -> DateRange {
    let first = snapshot.arrivals.iter().map(|v| v.ts).min();
    let last = snapshot.arrivals.iter().map(|v| v.ts).max();
    match (first, last) {
        (Some(first), Some(last)) => DateRange::new(local_date(first, tz), local_date(last, tz)),
        _ => DateRange::new(today, today),
    }
}
