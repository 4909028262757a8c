#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that converts world events into run store commands.

use hexwalk_core::{
    axial_to_world, AxialCoord, Event, FakeTrailRecord, FootprintRecord, Rgba, RunCommand,
    StepRecord, Timestamp, DEFAULT_HEX_SIZE,
};

/// Visual parameters stamped onto every recorded footprint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FootprintStyle {
    /// Horizontal and vertical scale of a footprint.
    pub scale: [f32; 2],
    /// Tint of footprints left by the agent itself.
    pub trail_color: Rgba,
    /// Colour of footprints left by decoys.
    pub decoy_color: Rgba,
}

impl Default for FootprintStyle {
    fn default() -> Self {
        Self {
            scale: [1.0, 1.0],
            trail_color: Rgba::new(0.55, 0.4, 0.25, 1.0),
            decoy_color: Rgba::WHITE,
        }
    }
}

/// Recorder system that reacts to world events and emits run commands.
#[derive(Clone, Debug)]
pub struct Recorder {
    style: FootprintStyle,
    hex_size: f32,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new(FootprintStyle::default())
    }
}

impl Recorder {
    /// Creates a recorder that lays footprints with the provided style.
    #[must_use]
    pub const fn new(style: FootprintStyle) -> Self {
        Self {
            style,
            hex_size: DEFAULT_HEX_SIZE,
        }
    }

    /// Consumes world events observed at `now` and emits run commands.
    pub fn handle(&mut self, events: &[Event], now: Timestamp, out: &mut Vec<RunCommand>) {
        for event in events {
            match event {
                Event::GridConfigured { hex_size } => self.hex_size = *hex_size,
                Event::RunStarted { start, .. } => out.push(RunCommand::Start { start: *start }),
                Event::AgentArrived { from, to, .. } => {
                    out.push(RunCommand::RecordStep {
                        step: StepRecord {
                            coord: *to,
                            timestamp: now,
                        },
                    });
                    out.push(RunCommand::RecordFootprint {
                        footprint: self.footprint(*from, *to, false, now),
                    });
                }
                Event::DecoyPlaced { from, target, .. } => {
                    out.push(RunCommand::RecordFakeTrail {
                        trail: FakeTrailRecord {
                            coord: *target,
                            timestamp: now,
                        },
                    });
                    out.push(RunCommand::RecordFootprint {
                        footprint: self.footprint(*from, *target, true, now),
                    });
                }
                Event::RunEnded { result, .. } => {
                    out.push(RunCommand::Finalize { result: *result });
                }
                _ => {}
            }
        }
    }

    fn footprint(
        &self,
        from: AxialCoord,
        to: AxialCoord,
        is_fake: bool,
        now: Timestamp,
    ) -> FootprintRecord {
        let centre = axial_to_world(to, self.hex_size);
        let rotation_z = from
            .direction_to(to)
            .map_or(0.0, |direction| direction.heading_degrees());
        let color = if is_fake {
            self.style.decoy_color
        } else {
            self.style.trail_color
        };

        FootprintRecord {
            position: [centre.x, centre.y, 0.0],
            rotation_z,
            scale: self.style.scale,
            color,
            is_fake,
            timestamp: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexwalk_core::RunResult;

    #[test]
    fn ignores_events_unrelated_to_runs() {
        let mut recorder = Recorder::default();
        let mut commands = Vec::new();

        recorder.handle(
            &[Event::TilesCleared, Event::GridConfigured { hex_size: 2.0 }],
            Timestamp::from_unix_millis(0),
            &mut commands,
        );

        assert!(commands.is_empty());
    }

    #[test]
    fn run_end_finalizes_with_its_result() {
        let mut recorder = Recorder::default();
        let mut commands = Vec::new();

        recorder.handle(
            &[Event::RunEnded {
                result: RunResult::GaveUp,
                step_count: 4,
            }],
            Timestamp::from_unix_millis(10),
            &mut commands,
        );

        assert_eq!(
            commands,
            vec![RunCommand::Finalize {
                result: RunResult::GaveUp,
            }]
        );
    }

    #[test]
    fn decoy_footprints_use_the_base_colour() {
        let style = FootprintStyle {
            scale: [0.5, 0.75],
            trail_color: Rgba::new(1.0, 0.0, 0.0, 1.0),
            decoy_color: Rgba::new(0.0, 0.0, 1.0, 0.5),
        };
        let mut recorder = Recorder::new(style);
        let mut commands = Vec::new();

        recorder.handle(
            &[Event::DecoyPlaced {
                from: AxialCoord::new(0, 0),
                target: AxialCoord::new(0, 1),
                remaining: 0,
            }],
            Timestamp::from_unix_millis(99),
            &mut commands,
        );

        let Some(RunCommand::RecordFootprint { footprint }) = commands.last() else {
            panic!("expected a footprint, got {commands:?}");
        };
        assert!(footprint.is_fake);
        assert_eq!(footprint.color, style.decoy_color);
        assert_eq!(footprint.scale, [0.5, 0.75]);
        assert_eq!(footprint.rotation_z, 90.0);
    }
}
