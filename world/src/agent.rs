//! Agent state and the timed movement state machine.

use std::time::Duration;

use hexwalk_core::{
    cube_distance, AxialCoord, Event, FieldBounds, MovementState, MovementTiming, RunResult,
};
use tracing::debug;

use crate::tiles::TileIndex;

/// Single agent walking the grid for the duration of one run.
#[derive(Clone, Debug)]
pub(crate) struct Agent {
    position: AxialCoord,
    field: FieldBounds,
    step_count: u32,
    decoys_remaining: u32,
    phase: Phase,
}

/// Movement state together with the deadline that ends it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Moving(Walk),
    TrapHold {
        trap: AxialCoord,
        return_to: AxialCoord,
        deadline: Duration,
    },
    ForcedReturn(Walk),
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Walk {
    from: AxialCoord,
    to: AxialCoord,
    deadline: Duration,
}

impl Phase {
    fn state(self) -> MovementState {
        match self {
            Self::Idle => MovementState::Idle,
            Self::Moving(_) => MovementState::Moving,
            Self::TrapHold { .. } => MovementState::TrapHold,
            Self::ForcedReturn(_) => MovementState::ForcedReturn,
            Self::Finished => MovementState::Finished,
        }
    }
}

impl Agent {
    pub(crate) fn spawn(position: AxialCoord, field: FieldBounds, decoys: u32) -> Self {
        Self {
            position,
            field,
            step_count: 0,
            decoys_remaining: decoys,
            phase: Phase::Idle,
        }
    }

    pub(crate) fn position(&self) -> AxialCoord {
        self.position
    }

    pub(crate) fn field(&self) -> FieldBounds {
        self.field
    }

    pub(crate) fn step_count(&self) -> u32 {
        self.step_count
    }

    pub(crate) fn decoys_remaining(&self) -> u32 {
        self.decoys_remaining
    }

    pub(crate) fn state(&self) -> MovementState {
        self.phase.state()
    }

    /// Adjacent to the agent and inside the field.
    pub(crate) fn can_reach(&self, target: AxialCoord) -> bool {
        cube_distance(self.position, target) == 1 && self.field.contains(target)
    }

    /// Starts a walk towards `target`. Callers guarantee the agent is idle.
    pub(crate) fn request_move(
        &mut self,
        target: AxialCoord,
        now: Duration,
        timing: MovementTiming,
        out_events: &mut Vec<Event>,
    ) -> bool {
        debug_assert_eq!(self.phase, Phase::Idle);
        if !self.can_reach(target) {
            return false;
        }
        let Some(direction) = self.position.direction_to(target) else {
            return false;
        };

        let walk = Walk {
            from: self.position,
            to: target,
            deadline: now.saturating_add(timing.move_duration()),
        };
        self.enter(Phase::Moving(walk), out_events);
        out_events.push(Event::MoveAccepted {
            from: walk.from,
            to: walk.to,
            direction,
            forced: false,
        });
        true
    }

    /// Lays a decoy on an adjacent cell, consuming one decoy.
    pub(crate) fn place_decoy(&mut self, target: AxialCoord, out_events: &mut Vec<Event>) -> bool {
        if self.phase == Phase::Finished || self.decoys_remaining == 0 || !self.can_reach(target) {
            return false;
        }

        self.decoys_remaining -= 1;
        out_events.push(Event::DecoyPlaced {
            from: self.position,
            target,
            remaining: self.decoys_remaining,
        });
        true
    }

    /// Ends the run on the player's request. Only an idle agent can give up.
    pub(crate) fn give_up(&mut self, out_events: &mut Vec<Event>) -> bool {
        if self.phase != Phase::Idle {
            return false;
        }

        self.enter(Phase::Finished, out_events);
        out_events.push(Event::RunEnded {
            result: RunResult::GaveUp,
            step_count: self.step_count,
        });
        true
    }

    /// Resolves every timed state whose deadline is at or before `now`.
    ///
    /// Follow-up deadlines are measured from the deadline that just elapsed,
    /// so the outcome does not depend on how time was sliced into ticks.
    pub(crate) fn advance(
        &mut self,
        now: Duration,
        timing: MovementTiming,
        tiles: &TileIndex,
        out_events: &mut Vec<Event>,
    ) {
        loop {
            match self.phase {
                Phase::Moving(walk) if walk.deadline <= now => {
                    self.complete_walk(walk, false, timing, tiles, out_events);
                }
                Phase::ForcedReturn(walk) if walk.deadline <= now => {
                    self.complete_walk(walk, true, timing, tiles, out_events);
                }
                Phase::TrapHold {
                    trap,
                    return_to,
                    deadline,
                } if deadline <= now => {
                    out_events.push(Event::TrapHoldEnded { trap });
                    let walk = Walk {
                        from: trap,
                        to: return_to,
                        deadline: deadline.saturating_add(timing.move_duration()),
                    };
                    self.enter(Phase::ForcedReturn(walk), out_events);
                    if let Some(direction) = trap.direction_to(return_to) {
                        out_events.push(Event::MoveAccepted {
                            from: trap,
                            to: return_to,
                            direction,
                            forced: true,
                        });
                    }
                }
                _ => break,
            }
        }
    }

    fn complete_walk(
        &mut self,
        walk: Walk,
        forced: bool,
        timing: MovementTiming,
        tiles: &TileIndex,
        out_events: &mut Vec<Event>,
    ) {
        self.position = walk.to;
        self.step_count = self.step_count.saturating_add(1);
        let landed = tiles.get(walk.to).copied();
        out_events.push(Event::AgentArrived {
            from: walk.from,
            to: walk.to,
            tile: landed,
            forced,
            step_count: self.step_count,
        });

        match landed {
            Some(tile) if tile.is_finish() => {
                self.enter(Phase::Finished, out_events);
                out_events.push(Event::RunEnded {
                    result: RunResult::Finished,
                    step_count: self.step_count,
                });
            }
            // A forced return never re-triggers a trap, even if it lands on one.
            Some(tile) if tile.is_trap() && !forced => {
                let deadline = walk.deadline.saturating_add(timing.trap_hold());
                self.enter(
                    Phase::TrapHold {
                        trap: walk.to,
                        return_to: walk.from,
                        deadline,
                    },
                    out_events,
                );
                out_events.push(Event::TrapHoldBegan {
                    trap: walk.to,
                    return_to: walk.from,
                });
            }
            _ => self.enter(Phase::Idle, out_events),
        }
    }

    fn enter(&mut self, next: Phase, out_events: &mut Vec<Event>) {
        let previous = self.phase.state();
        self.phase = next;
        let current = next.state();
        debug!(?previous, ?current, position = ?self.position, "movement state changed");
        out_events.push(Event::MovementStateChanged { previous, current });
    }
}
