use std::thread::JoinHandle;
use std::time::Duration;

use thiserror::Error;

use crate::detection::domain::detection::Detection;
use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::pipeline::anonymizer::Anonymizer;
use crate::shared::frame::Frame;

const THREAD_NAME: &str = "anonymize";

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("failed to spawn anonymization thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("anonymization thread panicked")]
    Panicked,
}

/// Everything one detection + anonymization run needs, moved into the worker.
pub struct AnonymizationJob {
    pub frame: Frame,
    pub detector: Box<dyn FaceDetector>,
    pub anonymizer: Anonymizer,
}

/// The job's resources handed back by the worker, plus the detection result.
///
/// On detection failure the frame is returned unmodified.
pub struct JobOutcome {
    pub frame: Frame,
    pub detector: Box<dyn FaceDetector>,
    pub anonymizer: Anonymizer,
    pub result: Result<Vec<Detection>, DetectionError>,
}

impl AnonymizationJob {
    /// Runs detection and, if it succeeds, anonymizes every detection.
    pub fn run(self) -> JobOutcome {
        let AnonymizationJob {
            mut frame,
            mut detector,
            anonymizer,
        } = self;

        let result = detector.detect(&frame);
        match &result {
            Ok(detections) => anonymizer.anonymize(&mut frame, detections),
            Err(e) => log::error!("Face detection failed: {e}"),
        }

        JobOutcome {
            frame,
            detector,
            anonymizer,
            result,
        }
    }
}

/// Handle to a job running on its own thread.
///
/// The frame and detector are owned by the worker until [`join`](Self::join)
/// returns them, so the caller cannot observe a half-processed buffer.
pub struct TaskHandle {
    handle: JoinHandle<JobOutcome>,
    // Never sent on; disconnects when the worker returns or unwinds.
    done_rx: crossbeam_channel::Receiver<()>,
}

/// Starts `job` on a dedicated thread.
pub fn spawn(job: AnonymizationJob) -> Result<TaskHandle, TaskError> {
    let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(0);
    let handle = std::thread::Builder::new()
        .name(THREAD_NAME.into())
        .spawn(move || {
            let _done = done_tx;
            job.run()
        })
        .map_err(TaskError::Spawn)?;
    Ok(TaskHandle { handle, done_rx })
}

impl TaskHandle {
    /// Blocks until the job finishes or `timeout` elapses.
    ///
    /// Returns `true` once the job has finished (successfully or not).
    /// Can be called repeatedly; the handle stays valid after a timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.done_rx.recv_timeout(timeout) {
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => false,
            Ok(()) | Err(crossbeam_channel::RecvTimeoutError::Disconnected) => true,
        }
    }

    /// Waits for the job and takes back its resources.
    pub fn join(self) -> Result<JobOutcome, TaskError> {
        self.handle.join().map_err(|_| TaskError::Panicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::color::Color;
    use crate::shared::region::Region;
    use crate::transform::infrastructure::black_out::BlackOut;
    use std::sync::{Arc, Barrier};

    struct FixedDetector {
        detections: Vec<Detection>,
    }

    impl FaceDetector for FixedDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, DetectionError> {
            Ok(self.detections.clone())
        }
    }

    struct FailingDetector;

    impl FaceDetector for FailingDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, DetectionError> {
            Err(DetectionError::Inference("no model".into()))
        }
    }

    struct GatedDetector {
        gate: Arc<Barrier>,
    }

    impl FaceDetector for GatedDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, DetectionError> {
            self.gate.wait();
            Ok(vec![])
        }
    }

    struct PanickingDetector;

    impl FaceDetector for PanickingDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, DetectionError> {
            panic!("detector blew up");
        }
    }

    fn job(detector: Box<dyn FaceDetector>) -> AnonymizationJob {
        AnonymizationJob {
            frame: Frame::filled(40, 30, Color::WHITE),
            detector,
            anonymizer: Anonymizer::new(Box::new(BlackOut)),
        }
    }

    #[test]
    fn test_completed_job_returns_anonymized_frame() {
        let detections = vec![Detection::new(0.9, Region::new(5, 5, 15, 15))];
        let handle = spawn(job(Box::new(FixedDetector {
            detections: detections.clone(),
        })))
        .unwrap();

        assert!(handle.wait_timeout(Duration::from_secs(10)));
        // Already finished: returns immediately every time
        assert!(handle.wait_timeout(Duration::ZERO));

        let outcome = handle.join().unwrap();
        assert_eq!(outcome.result.unwrap(), detections);
        assert_eq!(outcome.frame.pixel(5, 5), Color::BLACK);
        assert_eq!(outcome.frame.pixel(20, 20), Color::WHITE);
    }

    #[test]
    fn test_wait_times_out_while_job_runs() {
        let gate = Arc::new(Barrier::new(2));
        let handle = spawn(job(Box::new(GatedDetector { gate: gate.clone() }))).unwrap();

        assert!(!handle.wait_timeout(Duration::from_millis(20)));
        assert!(!handle.wait_timeout(Duration::from_millis(20)));

        gate.wait();
        assert!(handle.wait_timeout(Duration::from_secs(10)));
        assert!(handle.join().unwrap().result.unwrap().is_empty());
    }

    #[test]
    fn test_detection_failure_returns_frame_untouched() {
        let handle = spawn(job(Box::new(FailingDetector))).unwrap();
        let outcome = handle.join().unwrap();
        assert!(matches!(outcome.result, Err(DetectionError::Inference(_))));
        assert_eq!(outcome.frame, Frame::filled(40, 30, Color::WHITE));
    }

    #[test]
    fn test_panicking_worker_is_reported() {
        let handle = spawn(job(Box::new(PanickingDetector))).unwrap();
        assert!(handle.wait_timeout(Duration::from_secs(10)));
        assert!(matches!(handle.join(), Err(TaskError::Panicked)));
    }

    #[test]
    fn test_run_inline_matches_threaded() {
        let detections = vec![Detection::new(0.9, Region::new(0, 0, 8, 8))];
        let inline = job(Box::new(FixedDetector {
            detections: detections.clone(),
        }))
        .run();
        let threaded = spawn(job(Box::new(FixedDetector { detections })))
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(inline.frame, threaded.frame);
    }
}
