pub mod render;
pub mod report;
pub mod route;
pub mod session;

use std::{fmt::Display, io::IsTerminal, path::PathBuf};

use anyhow::{bail, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use render::Renderer;
use report::{process_report_command, ReportCommand};
use route::{process_route_command, RouteCommand};
use session::{
    process_arrive_command, process_end_command, process_start_command, process_status_command,
};
use tracing::{info, level_filters::LevelFilter};

use crate::{
    export::{backup_json, csv::arrivals_csv},
    recording::{
        route::{clear_all, ensure_default_route},
        SessionRecorder,
    },
    storage::store::{CommuteStore, JsonFileStore},
    utils::{
        clock::DefaultClock,
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Commutelog", version, long_about = None)]
#[command(about = "Records commute check-ins and shows how long each part of the route takes", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Show or edit the route")]
    Route {
        #[command(subcommand)]
        command: RouteCommand,
    },
    #[command(about = "Start a commute session")]
    Start,
    #[command(about = "Finish the running session")]
    End,
    #[command(about = "Check in at a waypoint of the running session")]
    Arrive {
        #[arg(help = "Waypoint name or its position on the route, starting from 1")]
        place: String,
    },
    #[command(about = "Show the running session")]
    Status,
    #[command(about = "Show minutes spent on each segment of the route")]
    Report {
        #[command(flatten)]
        command: ReportCommand,
    },
    #[command(about = "Export arrivals as csv or the whole database as json")]
    Export {
        #[arg(default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        #[arg(short, long, help = "File to write into. Prints to stdout by default")]
        output: Option<PathBuf>,
    },
    #[command(about = "Delete every route, session and arrival")]
    Clear {
        #[arg(long, help = "Confirm deleting everything")]
        yes: bool,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = match args.dir {
        Some(dir) => ensure_dir(dir)?,
        None => create_application_default_path()?,
    };
    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &dir, logging_level, args.log)?;

    let store = JsonFileStore::new(dir)?;
    let context = ensure_default_route(&store).await?;
    let renderer = Renderer {
        colored: std::io::stdout().is_terminal(),
    };
    let recorder = SessionRecorder::new(store.clone(), DefaultClock);

    match args.commands {
        Commands::Route { command } => {
            process_route_command(&store, context, &renderer, command).await
        }
        Commands::Start => process_start_command(&recorder, context).await,
        Commands::End => process_end_command(&recorder, context).await,
        Commands::Arrive { place } => {
            process_arrive_command(&recorder, context, &renderer, &place).await
        }
        Commands::Status => process_status_command(&recorder, &store, context, &renderer).await,
        Commands::Report { command } => {
            process_report_command(&store, context, &renderer, command).await
        }
        Commands::Export { format, output } => {
            let db = store.load().await?;
            let content = match format {
                ExportFormat::Csv => arrivals_csv(&db),
                ExportFormat::Json => backup_json(&db, Utc::now())?,
            };
            match output {
                Some(path) => {
                    tokio::fs::write(&path, content).await?;
                    info!("Exported {format} into {path:?}");
                }
                None => print!("{content}"),
            }
            Ok(())
        }
        Commands::Clear { yes } => {
            if !yes {
                bail!("Clearing deletes every recorded session. Pass --yes to confirm");
            }
            clear_all(&store).await?;
            println!("All data was deleted");
            Ok(())
        }
    }
}
