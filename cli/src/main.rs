mod delimited;


use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracker::camera::{Camera, Point};
use tracker::config::{ConfigError, TrackerConfig};
use tracker::consts::TILE_SIZE_PX;
use tracker::doc::{LoadError, SurveySources};
use tracker::engine::Session;
use tracker::geometry::{ConnectorEnd, Endpoints};
use tracker::ident;
use tracker::input::PaintMode;
use tracker::shape::Bounds;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("survey load failed: {0}")]
    Load(#[from] LoadError),
    #[error("invalid box `{0}`; expected min_lon,min_lat,max_lon,max_lat")]
    InvalidBox(String),
    #[error("invalid connector `{0}`; expected ID:start or ID:end")]
    InvalidConnector(String),
    #[error("no connector `{0}` in the tables layer")]
    UnknownConnector(String),
    #[error("unreadable lengths file: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "cable-tracker", about = "Solar-farm DC cable-pulling progress from survey files")]
struct Cli {
    #[command(flatten)]
    inputs: Inputs,

    #[command(subcommand)]
    command: Command,
}

/// Survey layers and the length table.
#[derive(Args, Debug)]
struct Inputs {
    #[arg(long, env = "TRACKER_TABLES", help = "Tables GeoJSON")]
    tables: PathBuf,

    #[arg(long, env = "TRACKER_BACKGROUND")]
    background: Option<PathBuf>,

    #[arg(long, env = "TRACKER_TEXT", help = "Text annotation GeoJSON")]
    text: Option<PathBuf>,

    #[arg(long, env = "TRACKER_INVERTER_POINTS")]
    inverter_points: Option<PathBuf>,

    #[arg(long, env = "TRACKER_LENGTHS", help = "Delimited plus/minus length file")]
    lengths: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
struct SelectionArgs {
    #[arg(long = "select", value_name = "PREFIX", help = "Group prefix or table id to add")]
    groups: Vec<String>,

    #[arg(long = "deselect", value_name = "PREFIX", help = "Group prefix or table id to remove")]
    ungroups: Vec<String>,

    #[arg(long = "bbox", value_name = "BOX", help = "World box min_lon,min_lat,max_lon,max_lat to add")]
    boxes: Vec<String>,

    #[arg(long = "mc4", value_name = "ID:END", help = "Installed connector, e.g. TX1-INV1-STR1:start")]
    connectors: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Progress totals for a selection.
    Summary(SelectionArgs),
    /// Selected table ids after applying groups and boxes.
    Select(SelectionArgs),
    /// Permanent labels at a map zoom level.
    Labels {
        #[arg(long, default_value_t = 19.0)]
        zoom: f64,
    },
    /// Label angle and connector endpoints of every table.
    Tables,
    /// Daily record for the tables added since an earlier selection.
    Submit {
        #[command(flatten)]
        selection: SelectionArgs,

        #[arg(long = "since", value_name = "PREFIX", help = "Group prefix or id already submitted")]
        since: Vec<String>,

        #[arg(long)]
        date: String,

        #[arg(long)]
        subcontractor: String,

        #[arg(long, default_value_t = 0)]
        workers: u32,
    },
}

/// File contents for every input, read before any parsing.
#[derive(Debug, Default)]
struct Texts {
    tables: String,
    background: Option<String>,
    text: Option<String>,
    inverter_points: Option<String>,
    lengths: Option<String>,
}

#[derive(Serialize)]
struct TableRow<'a> {
    id: &'a str,
    angle: f64,
    endpoints: Option<Endpoints>,
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = TrackerConfig::from_env()?;
    let texts = read_inputs(&cli.inputs)?;
    let mut session = build_session(config, &texts)?;

    match cli.command {
        Command::Summary(args) => {
            apply_selection(&mut session, &args)?;
            print_json(&session.progress())
        }
        Command::Select(args) => {
            apply_selection(&mut session, &args)?;
            print_json(&json!({ "selected": session.selection(), "totals": session.totals() }))
        }
        Command::Labels { zoom } => {
            session.camera = camera_at_map_zoom(zoom);
            print_json(&session.labels())
        }
        Command::Tables => {
            let rows: Vec<TableRow<'_>> = session
                .survey()
                .tables()
                .iter()
                .map(|f| TableRow { id: &f.id, angle: f.angle, endpoints: f.endpoints })
                .collect();
            print_json(&rows)
        }
        Command::Submit { selection, since, date, subcontractor, workers } => {
            for prefix in &since {
                session.select_group(prefix);
            }
            session.submit(&date, &subcontractor, workers);
            apply_selection(&mut session, &selection)?;
            let record = session.submit(&date, &subcontractor, workers);
            print_json(&json!({ "record": record, "chart_label": record.chart_label() }))
        }
    }
}

fn read_inputs(inputs: &Inputs) -> Result<Texts, CliError> {
    Ok(Texts {
        tables: read(&inputs.tables)?,
        background: read_optional(inputs.background.as_deref())?,
        text: read_optional(inputs.text.as_deref())?,
        inverter_points: read_optional(inputs.inverter_points.as_deref())?,
        lengths: read_optional(inputs.lengths.as_deref())?,
    })
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read { path: path.display().to_string(), source })
}

fn read_optional(path: Option<&Path>) -> Result<Option<String>, CliError> {
    path.map(read).transpose()
}

fn build_session(config: TrackerConfig, texts: &Texts) -> Result<Session, CliError> {
    let mut session = Session::new(config);
    session.load_survey(&SurveySources {
        tables: &texts.tables,
        background: texts.background.as_deref(),
        text: texts.text.as_deref(),
        inverter_points: texts.inverter_points.as_deref(),
    })?;
    if let Some(lengths) = &texts.lengths {
        session.load_lengths(&delimited::split_rows(lengths)?);
    }
    Ok(session)
}

fn apply_selection(session: &mut Session, args: &SelectionArgs) -> Result<(), CliError> {
    for prefix in &args.groups {
        session.select_group(prefix);
    }
    for raw in &args.boxes {
        session.select_region(&parse_box(raw)?, PaintMode::Add);
    }
    for prefix in &args.ungroups {
        session.deselect_group(prefix);
    }
    for raw in &args.connectors {
        let (id, end) = parse_connector(raw)?;
        if !session.set_connector(&id, end, true) {
            return Err(CliError::UnknownConnector(raw.clone()));
        }
    }
    Ok(())
}

fn parse_box(raw: &str) -> Result<Bounds, CliError> {
    let invalid = || CliError::InvalidBox(raw.to_string());
    let values = raw
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;
    match values.as_slice() {
        [x0, y0, x1, y1] => Ok(Bounds::from_corners(Point::new(*x0, *y0), Point::new(*x1, *y1))),
        _ => Err(invalid()),
    }
}

fn parse_connector(raw: &str) -> Result<(String, ConnectorEnd), CliError> {
    let invalid = || CliError::InvalidConnector(raw.to_string());
    let (id, end) = raw.rsplit_once(':').ok_or_else(invalid)?;
    let end = match end.trim().to_ascii_lowercase().as_str() {
        "start" => ConnectorEnd::Start,
        "end" => ConnectorEnd::End,
        _ => return Err(invalid()),
    };
    let id = ident::normalize(id);
    if id.is_empty() {
        return Err(invalid());
    }
    Ok((id, end))
}

/// Camera whose pixels-per-degree matches a web-map zoom level.
fn camera_at_map_zoom(map_zoom: f64) -> Camera {
    Camera { zoom: TILE_SIZE_PX * map_zoom.exp2() / 360.0, ..Camera::default() }
}

fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
