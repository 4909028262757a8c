#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Hexwalk engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches. The run store
//! consumes [`RunCommand`] batches in the same way.

use std::time::Duration;

use serde::{Deserialize, Serialize};

mod hex;
mod run;

pub use hex::{
    axial_round, axial_to_world, cube_distance, world_to_axial, AxialCoord, CubeCoord,
    FractionalAxial, HexDirection, WorldPoint,
};
pub use run::{
    FakeTrailRecord, FootprintRecord, Rgba, RunCommand, RunResult, StepRecord, Timestamp,
};

/// Hex circumradius used when no grid has been configured.
pub const DEFAULT_HEX_SIZE: f32 = 1.0;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Sets the circumradius of a single hex in world units.
    ConfigureGrid {
        /// Circumradius of one cell. Must be strictly positive.
        hex_size: f32,
    },
    /// Replaces the durations that drive timed movement states.
    ConfigureTiming {
        /// Durations to apply to subsequent moves.
        timing: MovementTiming,
    },
    /// Registers a tile, replacing any tile stored at the same coordinate.
    RegisterTile {
        /// Tile to register.
        tile: Tile,
    },
    /// Removes a tile if it is still the one registered at its coordinate.
    UnregisterTile {
        /// Tile to remove.
        tile: Tile,
    },
    /// Removes every registered tile.
    ClearTiles,
    /// Spawns the agent and opens a new run.
    StartRun {
        /// Spawn parameters for the agent.
        setup: RunSetup,
    },
    /// Asks the agent to walk onto an adjacent cell.
    RequestMove {
        /// Destination cell.
        target: AxialCoord,
    },
    /// Asks the agent to lay a decoy trail on an adjacent cell without moving.
    PlaceDecoy {
        /// Cell that should receive the decoy.
        target: AxialCoord,
    },
    /// Reports the cell currently under the pointer, if any.
    HoverCell {
        /// Hovered cell.
        target: Option<AxialCoord>,
    },
    /// Ends the active run without reaching the finish.
    GiveUp,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms the hex size now used for world-space conversions.
    GridConfigured {
        /// Circumradius of one cell.
        hex_size: f32,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a tile was stored in the index.
    TileRegistered {
        /// Tile that was stored.
        tile: Tile,
    },
    /// Confirms that a tile left the index.
    TileUnregistered {
        /// Tile that was removed.
        tile: Tile,
    },
    /// Confirms that the tile index was emptied.
    TilesCleared,
    /// Announces that the agent spawned and a new run began.
    RunStarted {
        /// Cell the agent spawned on.
        start: AxialCoord,
        /// Region the agent may walk within.
        field: FieldBounds,
        /// Decoys available for the run.
        decoys: u32,
    },
    /// Announces that the agent began walking between two cells.
    MoveAccepted {
        /// Cell the agent is leaving.
        from: AxialCoord,
        /// Cell the agent is walking to.
        to: AxialCoord,
        /// Facing of the agent for the duration of the walk.
        direction: HexDirection,
        /// Indicates an automatic return from a trap.
        forced: bool,
    },
    /// Confirms that the agent completed a move.
    AgentArrived {
        /// Cell the agent left.
        from: AxialCoord,
        /// Cell the agent now occupies.
        to: AxialCoord,
        /// Tile registered at the destination, if any.
        tile: Option<Tile>,
        /// Indicates an automatic return from a trap.
        forced: bool,
        /// Total steps completed in the run, including this one.
        step_count: u32,
    },
    /// Reports a transition of the movement state machine.
    MovementStateChanged {
        /// State that was left.
        previous: MovementState,
        /// State that was entered.
        current: MovementState,
    },
    /// Announces that the agent is stuck on a trap until the hold elapses.
    TrapHoldBegan {
        /// Trap cell the agent landed on.
        trap: AxialCoord,
        /// Cell the agent will be returned to.
        return_to: AxialCoord,
    },
    /// Announces that the hold elapsed and the forced return begins.
    TrapHoldEnded {
        /// Trap cell the agent is leaving.
        trap: AxialCoord,
    },
    /// Confirms that a decoy trail was laid.
    DecoyPlaced {
        /// Cell the agent occupies.
        from: AxialCoord,
        /// Cell that received the decoy.
        target: AxialCoord,
        /// Decoys left for the run.
        remaining: u32,
    },
    /// Reports that the highlighted tile changed.
    HighlightChanged {
        /// Tile highlighted before the change.
        previous: Option<AxialCoord>,
        /// Tile highlighted after the change.
        current: Option<AxialCoord>,
    },
    /// Announces that the run reached a terminal outcome.
    RunEnded {
        /// Outcome of the run.
        result: RunResult,
        /// Steps completed before the run ended.
        step_count: u32,
    },
}

/// Unique identifier assigned to a tile by the level loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(u32);

impl TileId {
    /// Creates a new tile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Metadata of a single hex tile placed by level geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    id: TileId,
    coord: AxialCoord,
    is_start: bool,
    is_finish: bool,
    is_trap: bool,
}

impl Tile {
    /// Creates a plain walkable tile.
    #[must_use]
    pub const fn new(id: TileId, coord: AxialCoord) -> Self {
        Self {
            id,
            coord,
            is_start: false,
            is_finish: false,
            is_trap: false,
        }
    }

    /// Marks the tile as the spawn location.
    #[must_use]
    pub const fn with_start(mut self) -> Self {
        self.is_start = true;
        self
    }

    /// Marks the tile as the finish line.
    #[must_use]
    pub const fn with_finish(mut self) -> Self {
        self.is_finish = true;
        self
    }

    /// Marks the tile as a trap.
    #[must_use]
    pub const fn with_trap(mut self) -> Self {
        self.is_trap = true;
        self
    }

    /// Identifier assigned by the level loader.
    #[must_use]
    pub const fn id(&self) -> TileId {
        self.id
    }

    /// Cell the tile occupies.
    #[must_use]
    pub const fn coord(&self) -> AxialCoord {
        self.coord
    }

    /// Whether the agent may spawn here.
    #[must_use]
    pub const fn is_start(&self) -> bool {
        self.is_start
    }

    /// Whether reaching this tile ends the run.
    #[must_use]
    pub const fn is_finish(&self) -> bool {
        self.is_finish
    }

    /// Whether landing here forces the agent back.
    #[must_use]
    pub const fn is_trap(&self) -> bool {
        self.is_trap
    }
}

/// Hex-distance region the agent may walk within.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldBounds {
    center: AxialCoord,
    radius: u32,
}

impl FieldBounds {
    /// Creates bounds covering every cell within `radius` steps of `center`.
    #[must_use]
    pub const fn new(center: AxialCoord, radius: u32) -> Self {
        Self { center, radius }
    }

    /// Centre of the field.
    #[must_use]
    pub const fn center(&self) -> AxialCoord {
        self.center
    }

    /// Inclusive hex-distance radius of the field.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Reports whether the cell lies inside the field.
    #[must_use]
    pub fn contains(&self, coord: AxialCoord) -> bool {
        cube_distance(self.center, coord) <= self.radius
    }
}

impl Default for FieldBounds {
    fn default() -> Self {
        Self::new(AxialCoord::new(0, 0), 3)
    }
}

/// Parameters used to spawn the agent for a new run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSetup {
    /// Explicit spawn cell. When absent, the tile flagged as start is used,
    /// falling back to the field centre.
    pub start: Option<AxialCoord>,
    /// Region the agent may walk within.
    pub field: FieldBounds,
    /// Number of decoy trails available for the run.
    pub decoys: u32,
}

/// Durations that drive the timed movement states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MovementTiming {
    move_duration: Duration,
    trap_hold: Duration,
}

impl MovementTiming {
    const MINIMUM_MOVE: Duration = Duration::from_millis(1);

    /// Creates timing with an explicit walk duration.
    ///
    /// A zero walk duration is allowed and completes moves within the request.
    #[must_use]
    pub const fn new(move_duration: Duration, trap_hold: Duration) -> Self {
        Self {
            move_duration,
            trap_hold,
        }
    }

    /// Derives the walk duration from the walk animation.
    ///
    /// A non-zero `explicit` duration wins. Otherwise the walk lasts
    /// `cycle * max(1, cycles)`, and never less than one millisecond.
    #[must_use]
    pub fn from_animation(
        explicit: Duration,
        cycle: Duration,
        cycles: u32,
        trap_hold: Duration,
    ) -> Self {
        let move_duration = if explicit > Duration::ZERO {
            explicit
        } else {
            cycle
                .saturating_mul(cycles.max(1))
                .max(Self::MINIMUM_MOVE)
        };
        Self::new(move_duration, trap_hold)
    }

    /// Time spent in the moving states for every step.
    #[must_use]
    pub const fn move_duration(&self) -> Duration {
        self.move_duration
    }

    /// Time spent on a trap before the forced return starts.
    #[must_use]
    pub const fn trap_hold(&self) -> Duration {
        self.trap_hold
    }
}

impl Default for MovementTiming {
    fn default() -> Self {
        Self::from_animation(
            Duration::ZERO,
            Duration::from_millis(250),
            2,
            Duration::from_millis(500),
        )
    }
}

/// Phases of the agent's movement state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MovementState {
    /// Waiting for a move request.
    Idle,
    /// Walking towards a requested cell.
    Moving,
    /// Standing on a trap until the hold elapses.
    TrapHold,
    /// Walking back to the cell occupied before the trap.
    ForcedReturn,
    /// The run ended; no further moves are accepted.
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_bounds_are_inclusive() {
        let field = FieldBounds::new(AxialCoord::new(1, 1), 2);
        assert!(field.contains(AxialCoord::new(1, 1)));
        assert!(field.contains(AxialCoord::new(3, -1)));
        assert!(!field.contains(AxialCoord::new(4, 1)));
    }

    #[test]
    fn explicit_move_duration_overrides_animation() {
        let timing = MovementTiming::from_animation(
            Duration::from_millis(120),
            Duration::from_millis(250),
            2,
            Duration::ZERO,
        );
        assert_eq!(timing.move_duration(), Duration::from_millis(120));
    }

    #[test]
    fn animation_cycles_define_move_duration() {
        let timing = MovementTiming::default();
        assert_eq!(timing.move_duration(), Duration::from_millis(500));

        let single = MovementTiming::from_animation(
            Duration::ZERO,
            Duration::from_millis(250),
            0,
            Duration::ZERO,
        );
        assert_eq!(single.move_duration(), Duration::from_millis(250));

        let floored =
            MovementTiming::from_animation(Duration::ZERO, Duration::ZERO, 3, Duration::ZERO);
        assert_eq!(floored.move_duration(), Duration::from_millis(1));
    }

    #[test]
    fn tile_flags_compose() {
        let tile = Tile::new(TileId::new(4), AxialCoord::new(2, 0))
            .with_finish()
            .with_start();
        assert!(tile.is_finish());
        assert!(tile.is_start());
        assert!(!tile.is_trap());
    }

    #[test]
    fn axial_coord_round_trips_through_bincode() {
        let coord = AxialCoord::new(-7, 12);
        let bytes = bincode::serialize(&coord).expect("serialize");
        let restored: AxialCoord = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, coord);
    }

    #[test]
    fn run_results_use_snake_case_names() {
        let encoded = serde_json::to_string(&RunResult::GaveUp).expect("serialize");
        assert_eq!(encoded, "\"gave_up\"");
        let decoded: RunResult = serde_json::from_str("\"finished\"").expect("deserialize");
        assert_eq!(decoded, RunResult::Finished);
    }

    #[test]
    fn sparse_footprints_fill_render_defaults() {
        let footprint: FootprintRecord =
            serde_json::from_str(r#"{"position":[1.0,2.0,0.0],"timestamp":42}"#)
                .expect("deserialize");
        assert_eq!(footprint.scale, [1.0, 1.0]);
        assert_eq!(footprint.color, Rgba::WHITE);
        assert!(!footprint.is_fake);
        assert_eq!(footprint.timestamp, Timestamp::from_unix_millis(42));
    }
}
