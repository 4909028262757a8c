//! Records describing a single play session and the commands that build them.

use serde::{Deserialize, Serialize};

use crate::AxialCoord;

/// Wall-clock instant expressed in milliseconds since the Unix epoch.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Wraps a millisecond count since the Unix epoch.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the Unix epoch.
    #[must_use]
    pub const fn unix_millis(&self) -> i64 {
        self.0
    }
}

/// Outcome stamped onto a run when it is finalized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunResult {
    /// The agent reached the finish tile.
    Finished,
    /// The player abandoned the run explicitly.
    GaveUp,
    /// The run ended on a trap.
    Trap,
}

/// Completed step of the agent onto a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Cell the agent arrived on.
    pub coord: AxialCoord,
    /// Moment the step completed.
    pub timestamp: Timestamp,
}

/// Decoy trail placed next to the agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FakeTrailRecord {
    /// Cell that received the decoy.
    pub coord: AxialCoord,
    /// Moment the decoy was placed.
    pub timestamp: Timestamp,
}

/// RGBA colour with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red component.
    pub r: f32,
    /// Green component.
    pub g: f32,
    /// Blue component.
    pub b: f32,
    /// Opacity.
    pub a: f32,
}

impl Rgba {
    /// Opaque white, the untinted footprint colour.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Creates a colour from its components.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Everything a renderer needs to redraw one footprint of a past run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FootprintRecord {
    /// World-space position `[x, y, z]`.
    pub position: [f32; 3],
    /// Rotation around the view axis, in degrees.
    #[serde(default)]
    pub rotation_z: f32,
    /// Horizontal and vertical scale.
    #[serde(default = "unit_scale")]
    pub scale: [f32; 2],
    /// Tint applied when drawing.
    #[serde(default)]
    pub color: Rgba,
    /// Marks footprints that belong to a decoy trail.
    #[serde(default)]
    pub is_fake: bool,
    /// Moment the footprint was laid down.
    pub timestamp: Timestamp,
}

fn unit_scale() -> [f32; 2] {
    [1.0, 1.0]
}

/// Mutations accepted by a run store.
///
/// Recording commands are ignored by stores that have no open run.
#[derive(Clone, Debug, PartialEq)]
pub enum RunCommand {
    /// Opens a new run, discarding any run that is still open.
    Start {
        /// Cell the agent spawned on.
        start: AxialCoord,
    },
    /// Appends a completed step to the open run.
    RecordStep {
        /// Step to append.
        step: StepRecord,
    },
    /// Appends a decoy placement to the open run.
    RecordFakeTrail {
        /// Decoy to append.
        trail: FakeTrailRecord,
    },
    /// Appends a footprint render-record to the open run.
    RecordFootprint {
        /// Footprint to append.
        footprint: FootprintRecord,
    },
    /// Closes the open run with the provided outcome and persists it.
    Finalize {
        /// Outcome of the run.
        result: RunResult,
    },
}
