//! Headless play session that pumps the world, its systems and the run store.

use std::time::Duration;

use hexwalk_core::{
    axial_to_world, AxialCoord, Command, Event, MovementState, RunResult, Timestamp,
};
use hexwalk_storage::{Clock, RunStore};
use hexwalk_system_input::{Input, PointerInput};
use hexwalk_system_recorder::Recorder;
use hexwalk_world::{self as world, query, World};
use tracing::{debug, info, warn};

use crate::{level::Level, script::Action};

/// Simulated frame length used while waiting for the agent.
const FRAME: Duration = Duration::from_millis(16);

/// Upper bound on frames spent waiting for a single action to settle.
const MAX_SETTLE_FRAMES: u32 = 10_000;

/// Outcome of a scripted session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) position: AxialCoord,
    pub(crate) steps: u32,
    pub(crate) decoys_remaining: u32,
    pub(crate) result: Option<RunResult>,
}

/// Single run on a level, wired to a run store.
pub(crate) struct Session<'a, C: Clock> {
    world: World,
    input: Input,
    recorder: Recorder,
    store: &'a mut RunStore<C>,
    hex_size: f32,
    started_at: Timestamp,
    unseen: Vec<Event>,
    result: Option<RunResult>,
}

impl<'a, C: Clock> Session<'a, C> {
    /// Loads the level into a fresh world and starts a run.
    pub(crate) fn start(level: &Level, store: &'a mut RunStore<C>, started_at: Timestamp) -> Self {
        let mut session = Self {
            world: World::new(),
            input: Input::new(),
            recorder: Recorder::new(level.footprints),
            store,
            hex_size: level.hex_size,
            started_at,
            unseen: Vec::new(),
            result: None,
        };

        let mut commands = level.world_commands();
        commands.push(Command::StartRun {
            setup: level.run_setup(),
        });
        session.dispatch(commands);
        session
    }

    /// Performs one scripted action and waits until the agent settles.
    pub(crate) fn perform(&mut self, action: Action) {
        debug!(%action, "performing action");
        match action {
            Action::Move(cell) => {
                let point = axial_to_world(cell, self.hex_size);
                self.press(PointerInput::primary_at(point));
            }
            Action::Decoy(cell) => {
                let point = axial_to_world(cell, self.hex_size);
                self.press(PointerInput::secondary_at(point));
            }
            Action::Click(point) => self.press(PointerInput::primary_at(point)),
            Action::DecoyClick(point) => self.press(PointerInput::secondary_at(point)),
            Action::Hover(point) => self.press(PointerInput::hover(point)),
            Action::Wait(duration) => self.wait(duration),
            Action::GiveUp => self.dispatch(vec![Command::GiveUp]),
        }
        self.settle();
    }

    /// Summarizes the run. Runs that never ended are left out of the log.
    pub(crate) fn finish(self) -> Summary {
        let agent = query::agent(&self.world);
        let summary = Summary {
            position: agent.map_or(AxialCoord::new(0, 0), |agent| agent.position),
            steps: agent.map_or(0, |agent| agent.step_count),
            decoys_remaining: agent.map_or(0, |agent| agent.decoys_remaining),
            result: self.result,
        };
        if summary.result.is_none() {
            info!(steps = summary.steps, "run left unfinished and was not recorded");
        }
        summary
    }

    fn press(&mut self, pointer: PointerInput) {
        let events = std::mem::take(&mut self.unseen);
        let mut commands = Vec::new();
        self.input.handle(&events, pointer, &mut commands);
        self.dispatch(commands);
    }

    fn wait(&mut self, duration: Duration) {
        let mut remaining = duration;
        while remaining > Duration::ZERO {
            let dt = remaining.min(FRAME);
            remaining -= dt;
            self.dispatch(vec![Command::Tick { dt }]);
        }
    }

    fn settle(&mut self) {
        for _ in 0..MAX_SETTLE_FRAMES {
            match query::movement_state(&self.world) {
                Some(
                    MovementState::Moving | MovementState::TrapHold | MovementState::ForcedReturn,
                ) => self.dispatch(vec![Command::Tick { dt: FRAME }]),
                _ => return,
            }
        }
        warn!(frames = MAX_SETTLE_FRAMES, "agent did not settle");
    }

    fn dispatch(&mut self, commands: Vec<Command>) {
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }

        for event in &events {
            log_event(event);
            if let Event::RunEnded { result, .. } = event {
                self.result = Some(*result);
            }
        }

        let now = self.now();
        let mut run_commands = Vec::new();
        self.recorder.handle(&events, now, &mut run_commands);
        for command in run_commands {
            self.store.apply(command);
        }
        self.unseen.extend(events);
    }

    fn now(&self) -> Timestamp {
        let elapsed = i64::try_from(query::elapsed(&self.world).as_millis()).unwrap_or(i64::MAX);
        Timestamp::from_unix_millis(self.started_at.unix_millis().saturating_add(elapsed))
    }
}

fn log_event(event: &Event) {
    match event {
        Event::MoveAccepted {
            from,
            to,
            direction,
            forced,
        } => debug!(?from, ?to, ?direction, forced, "move accepted"),
        Event::AgentArrived {
            to,
            forced,
            step_count,
            ..
        } => info!(q = to.q(), r = to.r(), forced, steps = step_count, "agent arrived"),
        Event::TrapHoldBegan { trap, return_to } => {
            info!(?trap, ?return_to, "agent caught on a trap");
        }
        Event::DecoyPlaced {
            target, remaining, ..
        } => info!(q = target.q(), r = target.r(), remaining, "decoy placed"),
        Event::RunEnded { result, step_count } => {
            info!(?result, steps = step_count, "run ended");
        }
        _ => {}
    }
}
