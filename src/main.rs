use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};
use tileboard::config::{AppConfig, ConfigError};
use tileboard::defaults::populate_defaults;
use tileboard::error::LayoutError;
use tileboard::geometry::{self, HandleKind, Point, Rect};
use tileboard::input::{Button, Modifiers};
use tileboard::payload::{HeadlessFactory, MetricValues};
use tileboard::record::{load_or_populate, serialize};
use tileboard::store::{LayoutStore, Profile};
use tileboard::surface::{Action, LayoutSurface};
use tracing::info;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("no tile at index {index}; the layout has {len} tiles")]
    NoSuchTile { index: usize, len: usize },
    #[error("tile {index} is too small to drag without grabbing a resize handle")]
    TooSmallToDrag { index: usize },
    #[error("invalid metric `{0}`; expected KEY=VALUE")]
    InvalidMetric(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "tileboard", about = "Inspect and edit dashboard tile layouts")]
struct Cli {
    /// Directory holding the layout files.
    #[arg(long)]
    data_dir: Option<std::path::PathBuf>,

    /// System section to read and write.
    #[arg(long)]
    system: Option<String>,

    /// Layout profile; defaults to the last one used.
    #[arg(long)]
    profile: Option<Profile>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current layout.
    Show,
    /// Replace the layout with the default population.
    Reset,
    /// Drag a tile by a delta, as a pointer would.
    #[command(allow_negative_numbers = true)]
    Move { index: usize, dx: f64, dy: f64 },
    /// Drag one of a tile's resize handles by a delta.
    #[command(allow_negative_numbers = true)]
    Resize {
        index: usize,
        handle: HandleArg,
        dx: f64,
        dy: f64,
    },
    /// Turn persisted edit mode on or off.
    Edit { state: Toggle },
    /// Print the last used profile, or set it.
    Profile { profile: Option<Profile> },
    /// Publish metric values (`core1=75`) and print what each payload received.
    Publish { values: Vec<String> },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum HandleArg {
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl From<HandleArg> for HandleKind {
    fn from(handle: HandleArg) -> Self {
        match handle {
            HandleArg::Top => HandleKind::Top,
            HandleArg::Bottom => HandleKind::Bottom,
            HandleArg::Left => HandleKind::Left,
            HandleArg::Right => HandleKind::Right,
            HandleArg::TopLeft => HandleKind::TopLeft,
            HandleArg::TopRight => HandleKind::TopRight,
            HandleArg::BottomLeft => HandleKind::BottomLeft,
            HandleArg::BottomRight => HandleKind::BottomRight,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Toggle {
    On,
    Off,
}

/// Resolved settings plus the store they point at.
struct Session {
    config: AppConfig,
    store: LayoutStore,
    profile: Profile,
}

impl Session {
    fn open(cli: &Cli) -> Result<Self, CliError> {
        let mut config = AppConfig::from_env()?;
        if let Some(dir) = &cli.data_dir {
            config.data_dir.clone_from(dir);
        }
        if let Some(system) = &cli.system {
            config.system_name.clone_from(system);
        }
        let store = LayoutStore::new(config.data_dir.clone(), config.system_name.clone());
        let profile = cli
            .profile
            .or(config.profile)
            .unwrap_or_else(|| store.load_last_profile());
        Ok(Self { config, store, profile })
    }

    fn load(&self, factory: &mut HeadlessFactory) -> Result<LayoutSurface, CliError> {
        let core_count = self.config.core_count;
        let surface = load_or_populate(self.store.load(self.profile), self.config.layout, factory, |surface, factory| {
            populate_defaults(surface, factory, core_count);
        })?;
        Ok(surface)
    }

    fn save(&self, surface: &LayoutSurface) -> Result<(), CliError> {
        self.store.save(self.profile, &serialize(surface))?;
        Ok(())
    }

    fn header(&self) -> Value {
        json!({ "profile": self.profile, "system": self.store.system() })
    }
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let session = Session::open(&cli)?;

    match cli.command {
        Command::Show => run_show(&session),
        Command::Reset => run_reset(&session),
        Command::Move { index, dx, dy } => run_move(&session, index, Point::new(dx, dy)),
        Command::Resize { index, handle, dx, dy } => run_resize(&session, index, handle.into(), Point::new(dx, dy)),
        Command::Edit { state } => run_edit(&session, matches!(state, Toggle::On)),
        Command::Profile { profile } => run_profile(&session, profile),
        Command::Publish { values } => run_publish(&session, &values),
    }
}

fn run_show(session: &Session) -> Result<(), CliError> {
    let surface = session.load(&mut HeadlessFactory::new())?;
    let tiles: Vec<Value> = surface
        .tiles()
        .iter()
        .enumerate()
        .map(|(index, tile)| {
            json!({
                "index": index,
                "label": tile.label(),
                "kind": tile.payload_ref().kind,
                "key": tile.payload_ref().key,
                "geometry": tile.committed(),
            })
        })
        .collect();
    let mut out = session.header();
    out["editMode"] = json!(surface.is_edit_mode());
    out["bounds"] = json!(surface.bounds());
    out["minimumSize"] = json!(surface.minimum_size());
    out["tiles"] = Value::Array(tiles);
    print_json(&out)
}

fn run_reset(session: &Session) -> Result<(), CliError> {
    let mut surface = LayoutSurface::new(session.config.layout)?;
    let added = populate_defaults(&mut surface, &mut HeadlessFactory::new(), session.config.core_count);
    session.save(&surface)?;
    let mut out = session.header();
    out["tiles"] = json!(added);
    print_json(&out)
}

fn run_move(session: &Session, index: usize, delta: Point) -> Result<(), CliError> {
    let mut surface = session.load(&mut HeadlessFactory::new())?;
    let before = tile_geometry(&surface, index)?;
    let body = geometry::body_zone(&before, surface.config().handle_margin).ok_or(CliError::TooSmallToDrag { index })?;
    let press = Point::new(body.x + body.width / 2.0, body.y + body.height / 2.0);
    let outcome = run_gesture(&mut surface, press, delta);
    finish_gesture(session, &surface, before, outcome)
}

fn run_resize(session: &Session, index: usize, handle: HandleKind, delta: Point) -> Result<(), CliError> {
    let mut surface = session.load(&mut HeadlessFactory::new())?;
    let before = tile_geometry(&surface, index)?;
    let zone = handle.zone(&before, surface.config().handle_margin).unwrap_or(before);
    let press = Point::new(zone.x + zone.width / 2.0, zone.y + zone.height / 2.0);
    let outcome = run_gesture(&mut surface, press, delta);
    finish_gesture(session, &surface, before, outcome)
}

fn run_edit(session: &Session, enabled: bool) -> Result<(), CliError> {
    let mut surface = session.load(&mut HeadlessFactory::new())?;
    surface.set_edit_mode(enabled);
    session.save(&surface)?;
    let mut out = session.header();
    out["editMode"] = json!(enabled);
    print_json(&out)
}

fn run_profile(session: &Session, profile: Option<Profile>) -> Result<(), CliError> {
    let current = match profile {
        Some(profile) => {
            session.store.save_last_profile(profile)?;
            info!(%profile, "last profile updated");
            profile
        }
        None => session.store.load_last_profile(),
    };
    print_json(&json!({ "system": session.store.system(), "lastProfile": current }))
}

fn run_publish(session: &Session, raw: &[String]) -> Result<(), CliError> {
    let values = raw.iter().map(|pair| parse_metric(pair)).collect::<Result<MetricValues, _>>()?;
    let mut factory = HeadlessFactory::new();
    let mut surface = session.load(&mut factory)?;
    surface.publish(&values);
    let payloads: Vec<Value> = factory
        .probes()
        .iter()
        .filter(|(_, probe)| !probe.borrow().disposed)
        .map(|(payload, probe)| {
            let state = probe.borrow();
            json!({
                "kind": payload.kind,
                "key": payload.key,
                "value": state.value,
                "history": state.history,
            })
        })
        .collect();
    let mut out = session.header();
    out["payloads"] = Value::Array(payloads);
    print_json(&out)
}

// =============================================================================
// HELPERS
// =============================================================================

fn tile_geometry(surface: &LayoutSurface, index: usize) -> Result<Rect, CliError> {
    surface
        .tiles()
        .get(index)
        .map(tileboard::tile::Tile::committed)
        .ok_or(CliError::NoSuchTile { index, len: surface.len() })
}

struct GestureOutcome {
    committed: Option<Rect>,
    rolled_back: bool,
}

/// Press at `press`, move by `delta` and release, with edit mode on for the
/// duration of the gesture.
fn run_gesture(surface: &mut LayoutSurface, press: Point, delta: Point) -> GestureOutcome {
    let was_editing = surface.is_edit_mode();
    surface.set_edit_mode(true);
    let release = Point::new(press.x + delta.x, press.y + delta.y);
    let none = Modifiers::default();

    surface.on_pointer_down(press, Button::Primary, none);
    let moved = surface.on_pointer_move(release, none);
    let released = surface.on_pointer_up(release, Button::Primary, none);
    surface.set_edit_mode(was_editing);

    GestureOutcome {
        committed: released.iter().find_map(|action| match action {
            Action::TileCommitted { geometry, .. } => Some(*geometry),
            _ => None,
        }),
        rolled_back: moved.iter().any(|action| matches!(action, Action::TileRolledBack { .. })),
    }
}

fn finish_gesture(session: &Session, surface: &LayoutSurface, before: Rect, outcome: GestureOutcome) -> Result<(), CliError> {
    let after = outcome.committed.unwrap_or(before);
    if after != before {
        session.save(surface)?;
    }
    let mut out = session.header();
    out["before"] = json!(before);
    out["after"] = json!(after);
    out["rejected"] = json!(outcome.rolled_back);
    print_json(&out)
}

fn parse_metric(pair: &str) -> Result<(String, f64), CliError> {
    let (key, value) = pair.split_once('=').ok_or_else(|| CliError::InvalidMetric(pair.to_string()))?;
    let value = value.trim().parse::<f64>().map_err(|_| CliError::InvalidMetric(pair.to_string()))?;
    Ok((key.trim().to_string(), value))
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
