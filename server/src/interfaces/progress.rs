//! Progress reporting contract
//!
//! Long-running operations receive a `ProgressSink` and report through it.
//! The sink doubles as the cooperative cancellation point: a paused task
//! blocks inside `report`, and an aborted task gets `TaskError::Aborted`
//! back from it.

use async_trait::async_trait;

use crate::shared::error::TaskError;

/// Receiver for progress updates
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Reports progress (0..=100) with a human-readable description.
    ///
    /// Returns `Err(TaskError::Aborted)` when the surrounding task was
    /// aborted; callers propagate that with `?` and stop working.
    async fn report(&self, progress: i32, description: &str) -> Result<(), TaskError>;
}

/// A sink that discards everything; for callers outside a task context
pub struct NoopProgress;

#[async_trait]
impl ProgressSink for NoopProgress {
    async fn report(&self, _progress: i32, _description: &str) -> Result<(), TaskError> {
        Ok(())
    }
}

/// Maps a child operation's 0..=100 progress into a slice of the parent's
/// range, so episode 3 of 8 reports inside its own window.
pub struct SliceProgress<'a> {
    inner: &'a dyn ProgressSink,
    lo: f64,
    hi: f64,
}

impl<'a> SliceProgress<'a> {
    pub fn new(inner: &'a dyn ProgressSink, lo: f64, hi: f64) -> Self {
        Self { inner, lo, hi }
    }
}

#[async_trait]
impl ProgressSink for SliceProgress<'_> {
    async fn report(&self, progress: i32, description: &str) -> Result<(), TaskError> {
        let fraction = f64::from(progress.clamp(0, 100)) / 100.0;
        let scaled = self.lo + fraction * (self.hi - self.lo);
        self.inner.report(scaled.round() as i32, description).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<i32>>);

    #[async_trait]
    impl ProgressSink for Recorder {
        async fn report(&self, progress: i32, _description: &str) -> Result<(), TaskError> {
            self.0.lock().unwrap().push(progress);
            Ok(())
        }
    }

    #[tokio::test]
    async fn slice_maps_into_window() {
        let recorder = Recorder(Mutex::new(Vec::new()));
        let slice = SliceProgress::new(&recorder, 10.0, 50.0);
        slice.report(0, "start").await.unwrap();
        slice.report(50, "half").await.unwrap();
        slice.report(100, "done").await.unwrap();
        assert_eq!(*recorder.0.lock().unwrap(), vec![10, 30, 50]);
    }

    #[tokio::test]
    async fn slice_clamps_out_of_range_input() {
        let recorder = Recorder(Mutex::new(Vec::new()));
        let slice = SliceProgress::new(&recorder, 0.0, 100.0);
        slice.report(150, "overshoot").await.unwrap();
        assert_eq!(*recorder.0.lock().unwrap(), vec![100]);
    }
}
