use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use approx::assert_relative_eq;
use shelfscan::core::RgbaImage;
use shelfscan::{
    ExternalDetection, ExternalDetector, ExternalDetectorError, ImageError, PipelineError,
    RgbaImageView, ShelfScanConfig, ShelfScanner, SourceMethod, SuggestionKind,
};

/// Eight alternating red / cyan spines standing on a dark plank.
fn synthetic_shelf() -> RgbaImage {
    let mut img = RgbaImage::filled(400, 300, [240, 240, 240]);
    for (i, x) in (40..360).step_by(40).enumerate() {
        let rgb = if i % 2 == 0 { [200, 30, 30] } else { [30, 200, 200] };
        img.fill_rect(x, 60, 40, 190, rgb);
    }
    img.fill_rect(0, 250, 400, 12, [60, 40, 20]);
    img
}

struct Failing {
    calls: AtomicUsize,
}

impl ExternalDetector for Failing {
    fn detect(
        &self,
        _frame: &RgbaImageView<'_>,
    ) -> Result<Vec<ExternalDetection>, ExternalDetectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ExternalDetectorError::Unavailable("no model server".into()))
    }
}

struct Slow;

impl ExternalDetector for Slow {
    fn detect(
        &self,
        _frame: &RgbaImageView<'_>,
    ) -> Result<Vec<ExternalDetection>, ExternalDetectorError> {
        thread::sleep(Duration::from_millis(400));
        Ok(vec![ExternalDetection {
            x: 0.0,
            y: 0.0,
            width: 30.0,
            height: 120.0,
            confidence: 0.9,
            label: None,
        }])
    }
}

struct Fixed(Vec<ExternalDetection>);

impl ExternalDetector for Fixed {
    fn detect(
        &self,
        _frame: &RgbaImageView<'_>,
    ) -> Result<Vec<ExternalDetection>, ExternalDetectorError> {
        Ok(self.0.clone())
    }
}

fn boxed(x: f32, width: f32, height: f32) -> ExternalDetection {
    ExternalDetection {
        x,
        y: 20.0,
        width,
        height,
        confidence: 0.9,
        label: Some("book".into()),
    }
}

#[test]
fn synthetic_shelf_yields_spines() {
    let img = synthetic_shelf();
    let mut scanner = ShelfScanner::default();
    let report = scanner.process(&img.view()).expect("valid frame");

    assert_eq!(report.source_method, SourceMethod::Segmentation);
    // the spine tops and the plank give two overlapping bands; each of the
    // eight books is reported once
    assert_eq!(report.diagnostics.bands, 2);
    assert_eq!(report.diagnostics.duplicate_spines, 8);
    assert_eq!(report.detections.len(), 8);
    assert_eq!(report.stats.books_found, 8);
    assert!(report.diagnostics.filtered_edges > 0);
    // 6 x 39 px + 2 x 42 px of a 400 px frame
    assert_relative_eq!(report.stats.space_used_percent, 79.5, epsilon = 1e-3);

    let mut ids = HashSet::new();
    for det in &report.detections {
        assert!(ids.insert(det.id), "duplicate id {}", det.id);
        assert!((0.0..=1.0).contains(&det.confidence));
        assert!(det.width > 0.0 && det.height > 0.0);
        assert!(!det.stable);
        // every spine lies inside the painted book area
        assert!(det.x >= 30.0 && det.x + det.width <= 370.0);
    }
    assert_relative_eq!(report.stats.detection_stability, 0.0);
}

#[test]
fn repeated_frame_becomes_stable_without_moving() {
    let img = synthetic_shelf();
    let mut scanner = ShelfScanner::default();
    let first = scanner.process(&img.view()).expect("valid frame");
    let second = scanner.process(&img.view()).expect("valid frame");

    assert_eq!(second.frame_index, 1);
    assert_eq!(first.detections.len(), second.detections.len());
    assert_eq!(second.diagnostics.stabilize.matched, first.detections.len());
    for (a, b) in first.detections.iter().zip(&second.detections) {
        assert_eq!(a.id, b.id);
        assert!(b.stable);
        assert_relative_eq!(a.x, b.x, epsilon = 1e-3);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-3);
        assert_relative_eq!(a.width, b.width, epsilon = 1e-3);
        assert_relative_eq!(a.height, b.height, epsilon = 1e-3);
    }
    assert_relative_eq!(second.stats.detection_stability, 100.0);
}

#[test]
fn invalid_buffer_leaves_tracks_untouched() {
    let img = synthetic_shelf();
    let mut scanner = ShelfScanner::default();
    scanner.process(&img.view()).expect("valid frame");
    let before = scanner.stabilizer().detections().to_vec();

    let empty = RgbaImageView {
        width: 400,
        height: 300,
        data: &[],
    };
    assert_eq!(
        scanner.process(&empty).unwrap_err(),
        PipelineError::InvalidBuffer(ImageError::EmptyBuffer)
    );
    let short = vec![0u8; 10];
    let truncated = RgbaImageView {
        width: 400,
        height: 300,
        data: &short,
    };
    assert!(matches!(
        scanner.process(&truncated),
        Err(PipelineError::InvalidBuffer(ImageError::BufferSizeMismatch { .. }))
    ));

    assert_eq!(scanner.stabilizer().detections(), before.as_slice());
    assert_eq!(scanner.frames(), 1);

    let next = scanner.process(&img.view()).expect("valid frame");
    assert_eq!(next.frame_index, 1);
    assert!(next.detections.iter().all(|d| d.stable));
}

#[test]
fn failing_external_detector_falls_back_to_segmentation() {
    let img = synthetic_shelf();
    let failing = Arc::new(Failing {
        calls: AtomicUsize::new(0),
    });
    let mut with_external =
        ShelfScanner::new(&ShelfScanConfig::default()).with_external(failing.clone());
    let mut local = ShelfScanner::default();

    let fallback = with_external.process(&img.view()).expect("no error surfaces");
    let reference = local.process(&img.view()).expect("valid frame");

    assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
    assert_eq!(fallback.source_method, SourceMethod::Segmentation);
    assert_eq!(fallback.detections, reference.detections);
}

#[test]
fn slow_external_detector_times_out_to_segmentation() {
    let img = synthetic_shelf();
    let config = ShelfScanConfig {
        external_timeout_ms: 20,
        ..ShelfScanConfig::default()
    };
    let mut scanner = ShelfScanner::new(&config).with_external(Arc::new(Slow));
    let report = scanner.process(&img.view()).expect("no error surfaces");
    assert_eq!(report.source_method, SourceMethod::Segmentation);
    assert!(report.detections.len() >= 3);
}

#[test]
fn external_boxes_drive_suggestions() {
    let img = RgbaImage::filled(400, 300, [200, 200, 200]);
    let detector = Fixed(vec![
        // tall and thin: stack
        boxed(10.0, 20.0, 150.0),
        // squat: rotate
        boxed(100.0, 70.0, 60.0),
        // wide and tall: face-out
        boxed(200.0, 60.0, 200.0),
        // degenerate, dropped
        boxed(300.0, 0.0, 100.0),
    ]);
    let mut scanner = ShelfScanner::default().with_external(Arc::new(detector));
    let report = scanner.process(&img.view()).expect("valid frame");

    assert_eq!(report.source_method, SourceMethod::External);
    assert_eq!(report.detections.len(), 3);
    assert!(report
        .detections
        .iter()
        .all(|d| d.source == SourceMethod::External && d.label.as_deref() == Some("book")));

    let kinds: Vec<SuggestionKind> = report.suggestions.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![SuggestionKind::FaceOut, SuggestionKind::Stack, SuggestionKind::Rotate]
    );
    let face_out = &report.suggestions[0];
    assert_relative_eq!(face_out.efficiency_gain, 48.0, epsilon = 1e-4);
    assert_relative_eq!(face_out.anchor_x, 230.0);
    assert_relative_eq!(face_out.anchor_y, 20.0);

    // 150 px of spines on a 400 px frame
    assert_relative_eq!(report.stats.space_used_percent, 37.5, epsilon = 1e-4);
    assert!(report.stats.potential_gain_percent > 0.0);
}

#[test]
fn configured_shelf_width_drives_utilization() {
    let img = RgbaImage::filled(400, 300, [200, 200, 200]);
    let config = ShelfScanConfig {
        shelf: Some(shelfscan::ShelfDimensions::new(100.0, 300.0)),
        ..ShelfScanConfig::default()
    };
    let detector = Fixed(vec![boxed(10.0, 20.0, 150.0), boxed(100.0, 30.0, 150.0)]);
    let mut scanner = ShelfScanner::new(&config).with_external(Arc::new(detector));
    let report = scanner.process(&img.view()).expect("valid frame");
    assert_relative_eq!(report.stats.space_used_percent, 50.0, epsilon = 1e-4);
}

#[test]
fn report_serializes_with_lowercase_tags() {
    let img = synthetic_shelf();
    let mut scanner = ShelfScanner::default();
    let report = scanner.process(&img.view()).expect("valid frame");
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["source_method"], "segmentation");
    assert!(json["stats"]["books_found"].as_u64().unwrap() >= 3);
    assert_eq!(json["diagnostics"]["segment_pass"], "primary");
}
