//! External object-detector capability and its bounded-time invocation.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shelfscan_core::{Detection, RgbaImage, RgbaImageView, SourceMethod};

/// Why the external detector produced nothing usable.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExternalDetectorError {
    #[error("external detector unavailable: {0}")]
    Unavailable(String),
    #[error("external detector timed out after {0:?}")]
    Timeout(Duration),
    #[error("external detector failed: {0}")]
    Failed(String),
}

/// One box reported by an external detector, top-left corner plus size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExternalDetection {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    #[serde(default)]
    pub label: Option<String>,
}

/// A detector living outside this crate, e.g. a model server client.
///
/// Implementations may block; they are run on a worker thread.
pub trait ExternalDetector: Send + Sync {
    fn detect(
        &self,
        frame: &RgbaImageView<'_>,
    ) -> Result<Vec<ExternalDetection>, ExternalDetectorError>;
}

/// Run `detector` on a copy of `frame`, waiting at most `timeout`.
///
/// On timeout the worker thread is left to finish on its own; its result is
/// dropped.
pub fn detect_with_timeout(
    detector: &Arc<dyn ExternalDetector>,
    frame: &RgbaImageView<'_>,
    timeout: Duration,
) -> Result<Vec<ExternalDetection>, ExternalDetectorError> {
    let owned = RgbaImage {
        width: frame.width,
        height: frame.height,
        data: frame.data.to_vec(),
    };
    let worker = Arc::clone(detector);
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("shelfscan-external".into())
        .spawn(move || {
            let result = worker.detect(&owned.view());
            // receiver is gone after a timeout
            let _ = tx.send(result);
        })
        .map_err(|e| ExternalDetectorError::Unavailable(e.to_string()))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(ExternalDetectorError::Timeout(timeout)),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(ExternalDetectorError::Failed(
            "worker exited without a result".into(),
        )),
    }
}

/// Turn external boxes into detections numbered from 1, dropping boxes with
/// non-positive or non-finite size.
pub fn adapt_external(raw: Vec<ExternalDetection>) -> Vec<Detection> {
    let total = raw.len();
    let out: Vec<Detection> = raw
        .into_iter()
        .filter_map(|e| {
            let det = Detection::new(
                0,
                e.x,
                e.y,
                e.width,
                e.height,
                e.confidence,
                SourceMethod::External,
            )?;
            Some(match e.label {
                Some(label) => det.with_label(label),
                None => det,
            })
        })
        .enumerate()
        .map(|(i, mut det)| {
            det.id = i as u64 + 1;
            det
        })
        .collect();
    if out.len() < total {
        log::debug!("discarded {} degenerate external boxes", total - out.len());
    }
    out
}
