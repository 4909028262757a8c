//! On-disk representation of the run log and its atomic persistence.

use std::{
    fmt,
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use hexwalk_core::{
    AxialCoord, FakeTrailRecord, FootprintRecord, RunResult, StepRecord, Timestamp,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::StorageError;

/// Short identifier assigned to a run when it starts.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Draws a fresh identifier of eight lowercase hexadecimal characters.
    #[must_use]
    pub fn random() -> Self {
        Self(format!("{:08x}", rand::random::<u32>()))
    }

    /// Identifier as stored on disk.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Complete record of a single play session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    /// Identifier assigned when the run started.
    pub id: RunId,
    /// Cell the agent spawned on.
    pub start: AxialCoord,
    /// Moment the run started.
    pub start_time: Timestamp,
    /// Moment the run was finalized.
    #[serde(default)]
    pub end_time: Option<Timestamp>,
    /// Outcome of the run, absent while it is still open.
    #[serde(default)]
    pub result: Option<RunResult>,
    /// Number of recorded steps.
    #[serde(default)]
    pub steps_count: u32,
    /// Steps in the order they completed.
    #[serde(default)]
    pub steps: Vec<StepRecord>,
    /// Decoys in the order they were placed.
    #[serde(default)]
    pub fake_trails: Vec<FakeTrailRecord>,
    /// Footprints in the order they were laid.
    #[serde(default)]
    pub footprints: Vec<FootprintRecord>,
}

impl Run {
    pub(crate) fn open(start: AxialCoord, start_time: Timestamp) -> Self {
        Self {
            id: RunId::random(),
            start,
            start_time,
            end_time: None,
            result: None,
            steps_count: 0,
            steps: Vec::new(),
            fake_trails: Vec::new(),
            footprints: Vec::new(),
        }
    }

    /// Reports whether the agent reached the finish in this run.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.result == Some(RunResult::Finished)
    }
}

/// Ordered collection of finalized runs, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
    /// Finalized runs in the order they were appended.
    #[serde(default)]
    pub runs: Vec<Run>,
}

impl RunLog {
    /// Reads the log stored at `path`. A missing file yields an empty log.
    pub fn read(path: &Path) -> Result<Self, StorageError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(StorageError::io(path, source)),
        };
        let log = serde_json::from_slice(&bytes)?;
        Ok(log)
    }

    /// Replaces the log stored at `path` with `self`.
    ///
    /// The document is first written to a sibling temporary file and then
    /// renamed over the final path, so the previous log stays intact until
    /// the replacement is complete.
    pub fn write_atomic(&self, path: &Path) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(self)?;

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StorageError::io(parent, source))?;
        }

        let tmp = temporary_path(path);
        let mut file = File::create(&tmp).map_err(|source| StorageError::io(&tmp, source))?;
        let written = file.write_all(&json).and_then(|()| file.sync_all());
        drop(file);
        if let Err(source) = written {
            discard_temporary(&tmp);
            return Err(StorageError::io(&tmp, source));
        }

        fs::rename(&tmp, path).map_err(|source| {
            discard_temporary(&tmp);
            StorageError::io(path, source)
        })
    }
}

/// Best-effort removal of a temporary file left by a failed write.
fn discard_temporary(tmp: &Path) {
    if let Err(error) = fs::remove_file(tmp) {
        debug!(path = %tmp.display(), %error, "temporary run log not removed");
    }
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
