#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Hexwalk.
//!
//! The world owns the tile index, the single agent of the active run, the
//! hover highlight and the simulation clock. It is mutated exclusively through
//! [`apply`] and observed through the [`query`] module.

use std::time::Duration;

use hexwalk_core::{
    cube_distance, AxialCoord, Command, Event, MovementState, MovementTiming, DEFAULT_HEX_SIZE,
};
use tracing::{debug, error, info};

mod agent;
mod tiles;

use agent::Agent;
pub use tiles::TileIndex;

/// Represents the authoritative Hexwalk world state.
#[derive(Debug)]
pub struct World {
    hex_size: f32,
    timing: MovementTiming,
    tiles: TileIndex,
    agent: Option<Agent>,
    hovered: Option<AxialCoord>,
    highlight: Option<AxialCoord>,
    clock: Duration,
}

impl World {
    /// Creates an empty world with default grid and timing configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hex_size: DEFAULT_HEX_SIZE,
            timing: MovementTiming::default(),
            tiles: TileIndex::new(),
            agent: None,
            hovered: None,
            highlight: None,
            clock: Duration::ZERO,
        }
    }

    fn advance_timers(&mut self, out_events: &mut Vec<Event>) {
        let Some(agent) = self.agent.as_mut() else {
            return;
        };

        let before = agent.position();
        agent.advance(self.clock, self.timing, &self.tiles, out_events);
        if agent.position() != before {
            self.refresh_highlight(out_events);
        }
    }

    fn set_highlight(&mut self, next: Option<AxialCoord>, out_events: &mut Vec<Event>) {
        if next == self.highlight {
            return;
        }

        let previous = self.highlight;
        self.highlight = next;
        out_events.push(Event::HighlightChanged {
            previous,
            current: next,
        });
    }

    /// Re-evaluates the hovered cell against the agent's current neighbourhood.
    fn refresh_highlight(&mut self, out_events: &mut Vec<Event>) {
        let next = self.hovered.filter(|coord| self.highlightable(*coord));
        self.set_highlight(next, out_events);
    }

    fn highlightable(&self, coord: AxialCoord) -> bool {
        let Some(agent) = self.agent.as_ref() else {
            return false;
        };
        self.tiles.get(coord).is_some() && cube_distance(agent.position(), coord) == 1
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// # Panics
///
/// Panics when `Command::ConfigureGrid` carries a non-positive hex size. In
/// debug builds, also panics when a move is requested while the agent is still
/// resolving a previous move; callers must wait for [`MovementState::Idle`].
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid { hex_size } => {
            assert!(
                hex_size > 0.0,
                "hex size must be strictly positive, got {hex_size}"
            );
            world.hex_size = hex_size;
            out_events.push(Event::GridConfigured { hex_size });
        }
        Command::ConfigureTiming { timing } => {
            world.timing = timing;
        }
        Command::RegisterTile { tile } => {
            if let Some(replaced) = world.tiles.register(tile) {
                debug!(coord = ?tile.coord(), replaced = replaced.id().get(), "tile replaced");
            }
            out_events.push(Event::TileRegistered { tile });
            world.refresh_highlight(out_events);
        }
        Command::UnregisterTile { tile } => {
            if world.tiles.unregister(&tile) {
                out_events.push(Event::TileUnregistered { tile });
                world.refresh_highlight(out_events);
            }
        }
        Command::ClearTiles => {
            world.tiles.clear();
            out_events.push(Event::TilesCleared);
            world.refresh_highlight(out_events);
        }
        Command::StartRun { setup } => {
            let start = setup
                .start
                .or_else(|| world.tiles.start_tile().map(|tile| tile.coord()))
                .unwrap_or_else(|| setup.field.center());
            if let Some(previous) = world.agent.as_ref() {
                if previous.state() != MovementState::Finished {
                    debug!(state = ?previous.state(), "replacing unfinished agent");
                }
            }

            world.agent = Some(Agent::spawn(start, setup.field, setup.decoys));
            info!(q = start.q(), r = start.r(), decoys = setup.decoys, "run started");
            out_events.push(Event::RunStarted {
                start,
                field: setup.field,
                decoys: setup.decoys,
            });
            world.refresh_highlight(out_events);
        }
        Command::RequestMove { target } => {
            let Some(agent) = world.agent.as_mut() else {
                debug!(?target, "move ignored without an agent");
                return;
            };

            match agent.state() {
                MovementState::Idle => {}
                MovementState::Finished => return,
                busy => {
                    error!(state = ?busy, ?target, "move requested while the agent is busy");
                    debug_assert_eq!(busy, MovementState::Idle, "move requested while busy");
                    return;
                }
            }

            if agent.request_move(target, world.clock, world.timing, out_events) {
                world.advance_timers(out_events);
            }
        }
        Command::PlaceDecoy { target } => {
            if let Some(agent) = world.agent.as_mut() {
                let _ = agent.place_decoy(target, out_events);
            }
        }
        Command::HoverCell { target } => {
            world.hovered = target;
            world.refresh_highlight(out_events);
        }
        Command::GiveUp => {
            if let Some(agent) = world.agent.as_mut() {
                if agent.give_up(out_events) {
                    info!(steps = agent.step_count(), "run abandoned by the player");
                }
            }
        }
        Command::Tick { dt } => {
            world.clock = world.clock.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
            world.advance_timers(out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use hexwalk_core::{AxialCoord, FieldBounds, HexDirection, MovementState, Tile, WorldPoint};

    use super::{TileIndex, World};

    /// Simulated time accumulated from ticks.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.clock
    }

    /// Provides read-only access to the tile index.
    #[must_use]
    pub fn tile_index(world: &World) -> &TileIndex {
        &world.tiles
    }

    /// Tile registered at the provided cell, if any.
    #[must_use]
    pub fn tile_at(world: &World, coord: AxialCoord) -> Option<Tile> {
        world.tiles.get(coord).copied()
    }

    /// Active tile closest to a world-space point, using the configured hex size.
    #[must_use]
    pub fn nearest_tile<F>(
        world: &World,
        point: WorldPoint,
        max_distance: f32,
        is_active: F,
    ) -> Option<Tile>
    where
        F: Fn(&Tile) -> bool,
    {
        world
            .tiles
            .nearest(point, max_distance, world.hex_size, is_active)
            .copied()
    }

    /// Captures the agent of the active run.
    #[must_use]
    pub fn agent(world: &World) -> Option<AgentSnapshot> {
        world.agent.as_ref().map(|agent| AgentSnapshot {
            position: agent.position(),
            field: agent.field(),
            state: agent.state(),
            step_count: agent.step_count(),
            decoys_remaining: agent.decoys_remaining(),
        })
    }

    /// Movement state of the agent, if a run has started.
    #[must_use]
    pub fn movement_state(world: &World) -> Option<MovementState> {
        world.agent.as_ref().map(|agent| agent.state())
    }

    /// Tile currently highlighted under the pointer.
    #[must_use]
    pub fn highlighted_tile(world: &World) -> Option<Tile> {
        world
            .highlight
            .and_then(|coord| world.tiles.get(coord).copied())
    }

    /// Facing the agent would take if `target` were requested right now.
    ///
    /// Returns `None` whenever the move would be rejected, which lets
    /// presentation adapters preview only legal moves.
    #[must_use]
    pub fn move_preview(world: &World, target: AxialCoord) -> Option<HexDirection> {
        let agent = world.agent.as_ref()?;
        if agent.state() != MovementState::Idle || !agent.can_reach(target) {
            return None;
        }
        agent.position().direction_to(target)
    }

    /// Immutable representation of the agent's state used for queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct AgentSnapshot {
        /// Cell the agent occupies.
        pub position: AxialCoord,
        /// Region the agent may walk within.
        pub field: FieldBounds,
        /// Current movement state.
        pub state: MovementState,
        /// Steps completed in the run.
        pub step_count: u32,
        /// Decoys left for the run.
        pub decoys_remaining: u32,
    }
}
