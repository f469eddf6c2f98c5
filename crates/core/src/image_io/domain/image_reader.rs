use std::path::Path;

use crate::shared::frame::Frame;

use super::image_io_error::ImageIoError;

/// Loads an image file as an RGB888 frame.
pub trait ImageReader: Send {
    fn read(&self, path: &Path) -> Result<Frame, ImageIoError>;
}
