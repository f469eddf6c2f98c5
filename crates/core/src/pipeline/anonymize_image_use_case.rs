use std::path::Path;
use std::time::Duration;

use crate::detection::domain::detection::Detection;
use crate::detection::domain::face_detector::{FaceDetector, StageTimings};
use crate::image_io::domain::image_reader::ImageReader;
use crate::image_io::domain::image_writer::ImageWriter;
use crate::pipeline::anonymizer::Anonymizer;
use crate::pipeline::infrastructure::background_task::{self, AnonymizationJob};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::constants::DEFAULT_TASK_WAIT_MS;
use crate::shared::frame::Frame;

/// Result of anonymizing one image.
pub struct AnonymizeReport {
    /// The anonymized frame, as written to the output file.
    pub frame: Frame,
    pub detections: Vec<Detection>,
    pub timings: Option<StageTimings>,
}

/// Single-image pipeline: read → [detect → anonymize] → write.
///
/// The bracketed part runs as a background task that owns the frame and
/// detector until it completes.
pub struct AnonymizeImageUseCase {
    reader: Box<dyn ImageReader>,
    writer: Box<dyn ImageWriter>,
    // Lent to the background task for the duration of a run.
    detector: Option<Box<dyn FaceDetector>>,
    anonymizer: Option<Anonymizer>,
    logger: Box<dyn PipelineLogger>,
    wait: Duration,
}

impl AnonymizeImageUseCase {
    pub fn new(
        reader: Box<dyn ImageReader>,
        writer: Box<dyn ImageWriter>,
        detector: Box<dyn FaceDetector>,
        anonymizer: Anonymizer,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            writer,
            detector: Some(detector),
            anonymizer: Some(anonymizer),
            logger,
            wait: Duration::from_millis(DEFAULT_TASK_WAIT_MS),
        }
    }

    /// How long to wait for the background task before logging that it is
    /// still running. The task is always awaited to completion.
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    pub fn logger(&self) -> &dyn PipelineLogger {
        &*self.logger
    }

    /// Reads `input_path`, anonymizes every detected face and writes the
    /// result to `output_path`. Nothing is written if detection fails.
    pub fn execute(
        &mut self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<AnonymizeReport, Box<dyn std::error::Error>> {
        let frame = self.reader.read(input_path)?;
        let detector = self
            .detector
            .take()
            .ok_or("detector unavailable after an earlier task failure")?;
        let anonymizer = self
            .anonymizer
            .take()
            .ok_or("anonymizer unavailable after an earlier task failure")?;
        self.logger.info(&format!(
            "Anonymizing {} ({}x{}) with {}",
            input_path.display(),
            frame.width(),
            frame.height(),
            anonymizer.method()
        ));

        let handle = background_task::spawn(AnonymizationJob {
            frame,
            detector,
            anonymizer,
        })?;
        if !handle.wait_timeout(self.wait) {
            log::warn!(
                "Anonymization still running after {}ms, waiting for completion",
                self.wait.as_millis()
            );
        }
        let outcome = handle.join()?;

        let timings = outcome.detector.last_timings();
        self.detector = Some(outcome.detector);
        self.anonymizer = Some(outcome.anonymizer);
        let detections = outcome.result?;

        if let Some(t) = timings {
            for (stage, duration) in t.stages() {
                self.logger.timing(stage, duration.as_secs_f64() * 1000.0);
            }
        }
        self.logger.metric("faces", detections.len() as f64);

        self.writer.write(output_path, &outcome.frame)?;
        self.logger.image_done(input_path, detections.len());

        Ok(AnonymizeReport {
            frame: outcome.frame,
            detections,
            timings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_detector::DetectionError;
    use crate::image_io::domain::image_io_error::ImageIoError;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::color::Color;
    use crate::shared::region::Region;
    use crate::transform::domain::region_transform::RegionTransform;
    use crate::transform::infrastructure::transform_factory::{create_transform, TransformKind};
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubImageReader {
        frame: Frame,
    }

    impl ImageReader for StubImageReader {
        fn read(&self, _path: &Path) -> Result<Frame, ImageIoError> {
            Ok(self.frame.clone())
        }
    }

    type Written = Arc<Mutex<Vec<(PathBuf, Frame)>>>;

    struct StubImageWriter {
        written: Written,
    }

    impl ImageWriter for StubImageWriter {
        fn write(&self, path: &Path, frame: &Frame) -> Result<(), ImageIoError> {
            self.written
                .lock()
                .unwrap()
                .push((path.to_path_buf(), frame.clone()));
            Ok(())
        }
    }

    struct StubDetector {
        detections: Vec<Detection>,
        calls: Arc<Mutex<usize>>,
        fail: bool,
    }

    impl FaceDetector for StubDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, DetectionError> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                return Err(DetectionError::Inference("stub failure".into()));
            }
            Ok(self.detections.clone())
        }

        fn last_timings(&self) -> Option<StageTimings> {
            Some(StageTimings {
                preprocess: Duration::from_millis(1),
                infer: Duration::from_millis(2),
                postprocess: Duration::from_millis(3),
                total: Duration::from_millis(6),
            })
        }
    }

    struct RecordingTransform {
        calls: Arc<Mutex<Vec<Region>>>,
    }

    impl RegionTransform for RecordingTransform {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn apply(&self, _frame: &mut Frame, region: &Region) {
            self.calls.lock().unwrap().push(*region);
        }
    }

    struct RecordingLogger {
        timings: Arc<Mutex<Vec<String>>>,
    }

    impl PipelineLogger for RecordingLogger {
        fn image_done(&mut self, _path: &Path, _faces: usize) {}
        fn timing(&mut self, stage: &str, _duration_ms: f64) {
            self.timings.lock().unwrap().push(stage.to_string());
        }
        fn metric(&mut self, name: &str, value: f64) {
            self.timings.lock().unwrap().push(format!("{name}={value}"));
        }
        fn info(&mut self, message: &str) {
            self.timings.lock().unwrap().push(format!("info: {message}"));
        }
    }

    // --- Helpers ---

    fn detector(detections: Vec<Detection>, fail: bool) -> (Box<dyn FaceDetector>, Arc<Mutex<usize>>) {
        let calls = Arc::new(Mutex::new(0));
        (
            Box::new(StubDetector {
                detections,
                calls: calls.clone(),
                fail,
            }),
            calls,
        )
    }

    fn use_case(
        frame: Frame,
        detector: Box<dyn FaceDetector>,
        anonymizer: Anonymizer,
    ) -> (AnonymizeImageUseCase, Written) {
        let written = Written::default();
        let uc = AnonymizeImageUseCase::new(
            Box::new(StubImageReader { frame }),
            Box::new(StubImageWriter {
                written: written.clone(),
            }),
            detector,
            anonymizer,
            Box::new(NullPipelineLogger),
        );
        (uc, written)
    }

    fn sample_detections() -> Vec<Detection> {
        vec![
            Detection::new(0.95, Region::new(50, 50, 90, 90)),
            Detection::new(0.7, Region::new(-5, 100, 20, 130)),
            Detection::new(0.6, Region::new(10, 10, 30, 40)),
        ]
    }

    // --- Tests ---

    #[test]
    fn test_one_transform_call_per_detection_in_order() {
        let regions = Arc::new(Mutex::new(Vec::new()));
        let (det, _) = detector(sample_detections(), false);
        let (mut uc, _) = use_case(
            Frame::filled(160, 120, Color::WHITE),
            det,
            Anonymizer::new(Box::new(RecordingTransform {
                calls: regions.clone(),
            })),
        );

        let report = uc.execute(Path::new("in.png"), Path::new("out.png")).unwrap();

        let expected: Vec<Region> = sample_detections().iter().map(|d| d.region).collect();
        assert_eq!(*regions.lock().unwrap(), expected);
        assert_eq!(report.detections, sample_detections());
    }

    #[test]
    fn test_writes_anonymized_frame() {
        let (det, _) = detector(vec![Detection::new(0.9, Region::new(50, 50, 90, 90))], false);
        let (mut uc, written) = use_case(
            Frame::filled(160, 120, Color::WHITE),
            det,
            Anonymizer::new(create_transform(TransformKind::BlackOut)),
        );

        let report = uc.execute(Path::new("in.png"), Path::new("out.png")).unwrap();

        let written = written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].0, PathBuf::from("out.png"));
        assert_eq!(written[0].1, report.frame);
        assert_eq!(report.frame.pixel(60, 60), Color::BLACK);
        assert_eq!(report.frame.pixel(10, 10), Color::WHITE);
    }

    #[test]
    fn test_no_faces_still_writes_image() {
        let (det, _) = detector(vec![], false);
        let (mut uc, written) = use_case(
            Frame::filled(64, 48, Color::WHITE),
            det,
            Anonymizer::new(create_transform(TransformKind::Blur)),
        );

        let report = uc.execute(Path::new("in.png"), Path::new("out.png")).unwrap();
        assert!(report.detections.is_empty());
        assert_eq!(written.lock().unwrap()[0].1, Frame::filled(64, 48, Color::WHITE));
    }

    #[test]
    fn test_detection_failure_writes_nothing_and_keeps_detector() {
        let (det, calls) = detector(vec![], true);
        let (mut uc, written) = use_case(
            Frame::filled(32, 32, Color::WHITE),
            det,
            Anonymizer::new(create_transform(TransformKind::Pixelate)),
        );

        assert!(uc.execute(Path::new("in.png"), Path::new("out.png")).is_err());
        assert!(written.lock().unwrap().is_empty());

        // The detector came back from the worker and is used again.
        assert!(uc.execute(Path::new("in.png"), Path::new("out.png")).is_err());
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[test]
    fn test_reports_stage_timings_and_face_count() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (det, _) = detector(sample_detections(), false);
        let mut uc = AnonymizeImageUseCase::new(
            Box::new(StubImageReader {
                frame: Frame::filled(160, 120, Color::WHITE),
            }),
            Box::new(StubImageWriter {
                written: Written::default(),
            }),
            det,
            Anonymizer::new(create_transform(TransformKind::BlackOut)),
            Box::new(RecordingLogger {
                timings: log.clone(),
            }),
        )
        .with_wait(Duration::from_millis(1));

        let report = uc.execute(Path::new("in.png"), Path::new("out.png")).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "info: Anonymizing in.png (160x120) with black-out",
                "preprocess",
                "infer",
                "postprocess",
                "total",
                "faces=3"
            ]
        );
        assert_eq!(report.timings.unwrap().total, Duration::from_millis(6));
    }
}
