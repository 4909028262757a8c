#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure input system that turns pointer activity into agent commands.

use hexwalk_core::{AxialCoord, Command, Event, MovementState, WorldPoint, DEFAULT_HEX_SIZE};

/// Pointer snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerInput {
    /// World-space position of the pointer, if it is over the play area.
    pub position: Option<WorldPoint>,
    /// Indicates whether the player requested a move on this frame.
    pub primary: bool,
    /// Indicates whether the player requested a decoy on this frame.
    pub secondary: bool,
}

impl PointerInput {
    /// Pointer resting at `position` without any button pressed.
    #[must_use]
    pub const fn hover(position: WorldPoint) -> Self {
        Self {
            position: Some(position),
            primary: false,
            secondary: false,
        }
    }

    /// Primary press at `position`.
    #[must_use]
    pub const fn primary_at(position: WorldPoint) -> Self {
        Self {
            position: Some(position),
            primary: true,
            secondary: false,
        }
    }

    /// Secondary press at `position`.
    #[must_use]
    pub const fn secondary_at(position: WorldPoint) -> Self {
        Self {
            position: Some(position),
            primary: false,
            secondary: true,
        }
    }
}

/// Input system that translates pointer snapshots into world commands.
///
/// Move requests are only forwarded while the agent is idle, so the world
/// never receives a move while a previous one is still resolving. Adapters
/// must apply the emitted commands and feed the resulting events into the
/// next call before pressing again.
#[derive(Clone, Debug)]
pub struct Input {
    hex_size: f32,
    state: Option<MovementState>,
    hovered: Option<AxialCoord>,
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}

impl Input {
    /// Creates a new input system that has not yet seen a run start.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hex_size: DEFAULT_HEX_SIZE,
            state: None,
            hovered: None,
        }
    }

    /// Movement state most recently reported by the world.
    #[must_use]
    pub const fn movement_state(&self) -> Option<MovementState> {
        self.state
    }

    /// Consumes world events and the pointer snapshot to emit commands.
    pub fn handle(&mut self, events: &[Event], pointer: PointerInput, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::GridConfigured { hex_size } => self.hex_size = *hex_size,
                Event::RunStarted { .. } => self.state = Some(MovementState::Idle),
                Event::MovementStateChanged { current, .. } => self.state = Some(*current),
                _ => {}
            }
        }

        let cell = pointer
            .position
            .map(|position| AxialCoord::from_world(position, self.hex_size));

        if cell != self.hovered {
            self.hovered = cell;
            out.push(Command::HoverCell { target: cell });
        }

        let Some(target) = cell else {
            return;
        };

        if pointer.primary && self.state == Some(MovementState::Idle) {
            out.push(Command::RequestMove { target });
        }

        let run_active = matches!(self.state, Some(state) if state != MovementState::Finished);
        if pointer.secondary && run_active {
            out.push(Command::PlaceDecoy { target });
        }
    }
}
