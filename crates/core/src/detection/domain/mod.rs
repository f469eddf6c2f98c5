pub mod detection;
pub mod detector_stages;
pub mod face_detector;
pub mod staged_face_detector;
