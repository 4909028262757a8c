//! TOML level files describing the grid, its tiles and the session rules.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use hexwalk_core::{
    axial_round, world_to_axial, AxialCoord, Command, FieldBounds, MovementTiming, Rgba,
    RunSetup, Tile, TileId, WorldPoint, DEFAULT_HEX_SIZE,
};
use hexwalk_system_recorder::FootprintStyle;
use serde::Deserialize;
use tracing::warn;

const SUPPORTED_LEVEL_VERSION: u32 = 1;

/// Fully validated level ready to be loaded into a world.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Level {
    pub(crate) hex_size: f32,
    pub(crate) field: FieldBounds,
    pub(crate) decoys: u32,
    pub(crate) timing: MovementTiming,
    pub(crate) footprints: FootprintStyle,
    pub(crate) tiles: Vec<Tile>,
}

impl Level {
    /// Reads and validates the level stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read level file at {}", path.display()))?;
        parse_level(&contents).with_context(|| format!("invalid level {}", path.display()))
    }

    /// Commands that configure a fresh world for this level.
    pub(crate) fn world_commands(&self) -> Vec<Command> {
        let mut commands = Vec::with_capacity(self.tiles.len() + 2);
        commands.push(Command::ConfigureGrid {
            hex_size: self.hex_size,
        });
        commands.push(Command::ConfigureTiming {
            timing: self.timing,
        });
        commands.extend(
            self.tiles
                .iter()
                .map(|tile| Command::RegisterTile { tile: *tile }),
        );
        commands
    }

    /// Spawn parameters for a run on this level.
    pub(crate) fn run_setup(&self) -> RunSetup {
        RunSetup {
            start: None,
            field: self.field,
            decoys: self.decoys,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LevelFile {
    version: u32,
    #[serde(default = "default_hex_size")]
    hex_size: f32,
    #[serde(default)]
    field: FieldSection,
    #[serde(default)]
    session: SessionSection,
    #[serde(default)]
    timing: TimingSection,
    #[serde(default)]
    footprints: FootprintSection,
    #[serde(default)]
    tiles: Vec<TileEntry>,
}

fn default_hex_size() -> f32 {
    DEFAULT_HEX_SIZE
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FieldSection {
    center: AxialCoord,
    radius: u32,
}

impl Default for FieldSection {
    fn default() -> Self {
        let bounds = FieldBounds::default();
        Self {
            center: bounds.center(),
            radius: bounds.radius(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SessionSection {
    decoys: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TimingSection {
    move_duration_ms: u64,
    animation_cycle_ms: u64,
    cycles_per_movement: u32,
    trap_hold_ms: u64,
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            move_duration_ms: 0,
            animation_cycle_ms: 250,
            cycles_per_movement: 2,
            trap_hold_ms: 500,
        }
    }
}

impl TimingSection {
    fn timing(&self) -> MovementTiming {
        MovementTiming::from_animation(
            Duration::from_millis(self.move_duration_ms),
            Duration::from_millis(self.animation_cycle_ms),
            self.cycles_per_movement,
            Duration::from_millis(self.trap_hold_ms),
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FootprintSection {
    scale: [f32; 2],
    trail_color: [f32; 4],
    decoy_color: [f32; 4],
}

impl Default for FootprintSection {
    fn default() -> Self {
        let style = FootprintStyle::default();
        Self {
            scale: style.scale,
            trail_color: rgba_components(style.trail_color),
            decoy_color: rgba_components(style.decoy_color),
        }
    }
}

fn rgba_components(color: Rgba) -> [f32; 4] {
    [color.r, color.g, color.b, color.a]
}

fn rgba([r, g, b, a]: [f32; 4]) -> Result<Rgba> {
    if [r, g, b, a]
        .iter()
        .any(|component| !(0.0..=1.0).contains(component))
    {
        bail!("colour components must lie in 0.0..=1.0, got [{r}, {g}, {b}, {a}]");
    }
    Ok(Rgba::new(r, g, b, a))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TileEntry {
    q: Option<i32>,
    r: Option<i32>,
    x: Option<f32>,
    y: Option<f32>,
    #[serde(default)]
    start: bool,
    #[serde(default)]
    finish: bool,
    #[serde(default)]
    trap: bool,
}

impl TileEntry {
    fn coord(&self, hex_size: f32) -> Result<AxialCoord> {
        match (self.q, self.r, self.x, self.y) {
            (Some(q), Some(r), None, None) => Ok(AxialCoord::new(q, r)),
            (None, None, Some(x), Some(y)) => {
                if !(x.is_finite() && y.is_finite()) {
                    bail!("tile position must be finite, got x = {x}, y = {y}");
                }
                Ok(axial_round(world_to_axial(WorldPoint::new(x, y), hex_size)))
            }
            (None, None, None, None) => bail!("tile has no position; give either q/r or x/y"),
            _ => bail!("tile position must be exactly one of q/r or x/y"),
        }
    }
}

fn parse_level(contents: &str) -> Result<Level> {
    let file: LevelFile = toml::from_str(contents).context("failed to parse level toml")?;
    if file.version != SUPPORTED_LEVEL_VERSION {
        bail!(
            "unsupported level version {}; expected {}",
            file.version,
            SUPPORTED_LEVEL_VERSION
        );
    }
    if !(file.hex_size.is_finite() && file.hex_size > 0.0) {
        bail!("hex_size must be strictly positive, got {}", file.hex_size);
    }

    let mut tiles: Vec<Tile> = Vec::with_capacity(file.tiles.len());
    for (index, entry) in file.tiles.iter().enumerate() {
        let coord = entry
            .coord(file.hex_size)
            .with_context(|| format!("tile #{}", index + 1))?;
        let raw_id = u32::try_from(index + 1).context("too many tiles")?;
        let mut tile = Tile::new(TileId::new(raw_id), coord);
        if entry.start {
            tile = tile.with_start();
        }
        if entry.finish {
            tile = tile.with_finish();
        }
        if entry.trap {
            tile = tile.with_trap();
        }

        if let Some(previous) = tiles.iter().position(|other| other.coord() == coord) {
            warn!(
                q = coord.q(),
                r = coord.r(),
                "tile #{} overrides tile #{} at the same cell",
                index + 1,
                previous + 1
            );
        }
        tiles.push(tile);
    }

    Ok(Level {
        hex_size: file.hex_size,
        field: FieldBounds::new(file.field.center, file.field.radius),
        decoys: file.session.decoys,
        timing: file.timing.timing(),
        footprints: FootprintStyle {
            scale: file.footprints.scale,
            trail_color: rgba(file.footprints.trail_color).context("footprints.trail_color")?,
            decoy_color: rgba(file.footprints.decoy_color).context("footprints.decoy_color")?,
        },
        tiles,
    })
}
