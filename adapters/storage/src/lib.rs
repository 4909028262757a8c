#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Run store that accumulates the active run and persists finished runs.
//!
//! The store owns at most one open [`Run`]. Finalized runs are appended to a
//! [`RunLog`] that is loaded lazily from disk on first use and rewritten in
//! full whenever a run is finalized or the log is cleared. Read failures fall
//! back to an empty log and write failures are logged; the in-memory log
//! stays authoritative for the lifetime of the store.

use std::{
    io,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use hexwalk_core::{
    AxialCoord, FakeTrailRecord, FootprintRecord, RunCommand, RunResult, StepRecord, Timestamp,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

mod history;

pub use history::{Run, RunId, RunLog};

/// Default file name of the run log.
pub const DEFAULT_LOG_FILE: &str = "runs.json";

/// Failures raised while reading or writing the run log.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem access failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The log document could not be encoded or decoded.
    #[error("malformed run log: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Source of wall-clock timestamps for run start and end times.
pub trait Clock {
    /// Current wall-clock time.
    fn now(&self) -> Timestamp;
}

/// Clock backed by the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
            });
        Timestamp::from_unix_millis(millis)
    }
}

/// Owner of the open run and the durable run log.
#[derive(Debug)]
pub struct RunStore<C = SystemClock> {
    path: PathBuf,
    clock: C,
    log: Option<RunLog>,
    current: Option<Run>,
}

impl RunStore<SystemClock> {
    /// Creates a store persisting to `path`. Nothing is read until needed.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, SystemClock)
    }
}

impl<C: Clock> RunStore<C> {
    /// Creates a store persisting to `path` that stamps runs using `clock`.
    #[must_use]
    pub fn with_clock(path: impl Into<PathBuf>, clock: C) -> Self {
        Self {
            path: path.into(),
            clock,
            log: None,
            current: None,
        }
    }

    /// Run that is currently being recorded, if any.
    #[must_use]
    pub fn current_run(&self) -> Option<&Run> {
        self.current.as_ref()
    }

    /// Opens a new run, discarding any run that was never finalized.
    pub fn start_run(&mut self, start: AxialCoord) -> &Run {
        let _ = self.log_mut();
        if let Some(abandoned) = self.current.take() {
            warn!(
                id = %abandoned.id,
                steps = abandoned.steps_count,
                "discarding unfinished run"
            );
        }

        let run = Run::open(start, self.clock.now());
        info!(id = %run.id, q = start.q(), r = start.r(), "run opened");
        self.current.insert(run)
    }

    /// Appends a completed step to the open run.
    pub fn record_step(&mut self, coord: AxialCoord, timestamp: Timestamp) {
        if let Some(run) = self.current.as_mut() {
            run.steps.push(StepRecord { coord, timestamp });
            run.steps_count = u32::try_from(run.steps.len()).unwrap_or(u32::MAX);
        }
    }

    /// Appends a decoy placement to the open run.
    pub fn record_fake_trail(&mut self, coord: AxialCoord, timestamp: Timestamp) {
        if let Some(run) = self.current.as_mut() {
            run.fake_trails.push(FakeTrailRecord { coord, timestamp });
        }
    }

    /// Appends a footprint to the open run.
    pub fn record_footprint(&mut self, footprint: FootprintRecord) {
        if let Some(run) = self.current.as_mut() {
            run.footprints.push(footprint);
        }
    }

    /// Closes the open run, appends it to the log and persists the log.
    pub fn finalize_run(&mut self, result: RunResult) {
        let Some(mut run) = self.current.take() else {
            let _ = self.log_mut();
            return;
        };

        run.result = Some(result);
        run.end_time = Some(self.clock.now());
        run.steps_count = u32::try_from(run.steps.len()).unwrap_or(u32::MAX);
        info!(id = %run.id, ?result, steps = run.steps_count, "run finalized");

        self.log_mut().runs.push(run);
        self.persist();
    }

    /// Up to `max_count` finalized runs, most recent first.
    pub fn load_recent_runs(&mut self, max_count: usize) -> Vec<&Run> {
        self.log_mut().runs.iter().rev().take(max_count).collect()
    }

    /// Fewest steps among runs that reached the finish.
    pub fn best_finished_steps(&mut self) -> Option<u32> {
        self.log_mut()
            .runs
            .iter()
            .filter(|run| run.is_finished())
            .map(|run| run.steps_count)
            .min()
    }

    /// Empties the log in memory and on disk.
    pub fn clear_all(&mut self) {
        self.log_mut().runs.clear();
        info!(path = %self.path.display(), "run log cleared");
        self.persist();
    }

    /// Executes a run command produced by the recorder system.
    pub fn apply(&mut self, command: RunCommand) {
        match command {
            RunCommand::Start { start } => {
                let _ = self.start_run(start);
            }
            RunCommand::RecordStep { step } => self.record_step(step.coord, step.timestamp),
            RunCommand::RecordFakeTrail { trail } => {
                self.record_fake_trail(trail.coord, trail.timestamp);
            }
            RunCommand::RecordFootprint { footprint } => self.record_footprint(footprint),
            RunCommand::Finalize { result } => self.finalize_run(result),
        }
    }

    fn log_mut(&mut self) -> &mut RunLog {
        let path = &self.path;
        self.log.get_or_insert_with(|| match RunLog::read(path) {
            Ok(log) => {
                debug!(path = %path.display(), runs = log.runs.len(), "run log loaded");
                log
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "failed to load run log, starting empty");
                RunLog::default()
            }
        })
    }

    fn persist(&mut self) {
        let path = self.path.clone();
        let log = self.log_mut();
        match log.write_atomic(&path) {
            Ok(()) => debug!(path = %path.display(), runs = log.runs.len(), "run log written"),
            Err(error) => error!(path = %path.display(), %error, "failed to write run log"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, Default)]
    struct StepClock(Cell<i64>);

    impl Clock for StepClock {
        fn now(&self) -> Timestamp {
            let next = self.0.get() + 1;
            self.0.set(next);
            Timestamp::from_unix_millis(next)
        }
    }

    fn store() -> (tempfile::TempDir, RunStore<StepClock>) {
        let dir = tempfile::tempdir().expect("temporary directory");
        let store = RunStore::with_clock(dir.path().join(DEFAULT_LOG_FILE), StepClock::default());
        (dir, store)
    }

    #[test]
    fn recording_without_an_open_run_is_ignored() {
        let (_dir, mut store) = store();

        store.record_step(AxialCoord::new(1, 0), Timestamp::from_unix_millis(3));
        store.record_fake_trail(AxialCoord::new(1, 0), Timestamp::from_unix_millis(3));
        store.finalize_run(RunResult::Finished);

        assert!(store.current_run().is_none());
        assert!(store.load_recent_runs(10).is_empty());
    }

    #[test]
    fn steps_count_tracks_recorded_steps() {
        let (_dir, mut store) = store();
        let _ = store.start_run(AxialCoord::new(0, 0));

        store.record_step(AxialCoord::new(1, 0), Timestamp::from_unix_millis(10));
        store.record_step(AxialCoord::new(2, 0), Timestamp::from_unix_millis(20));

        let run = store.current_run().expect("run open");
        assert_eq!(run.steps_count, 2);
        assert!(run.result.is_none());
        assert!(run.end_time.is_none());
    }

    #[test]
    fn starting_again_discards_the_open_run() {
        let (_dir, mut store) = store();
        let _ = store.start_run(AxialCoord::new(0, 0));
        store.record_step(AxialCoord::new(1, 0), Timestamp::from_unix_millis(1));

        let second = store.start_run(AxialCoord::new(3, 3)).id.clone();
        store.finalize_run(RunResult::GaveUp);

        let runs = store.load_recent_runs(10);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].id, second);
        assert_ne!(runs[0].start, AxialCoord::new(0, 0));
        assert_eq!(runs[0].steps_count, 0);
    }

    #[test]
    fn finalize_stamps_result_and_end_time() {
        let (_dir, mut store) = store();
        let _ = store.start_run(AxialCoord::new(0, 0));
        store.finalize_run(RunResult::Finished);

        let run = store.load_recent_runs(1)[0];
        assert_eq!(run.result, Some(RunResult::Finished));
        assert_eq!(run.start_time, Timestamp::from_unix_millis(1));
        assert_eq!(run.end_time, Some(Timestamp::from_unix_millis(2)));
    }
}
