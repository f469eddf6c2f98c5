use std::fs;
use std::path::Path;

use crate::image_io::domain::image_io_error::ImageIoError;
use crate::image_io::domain::image_reader::ImageReader;
use crate::shared::frame::Frame;

use super::jpeg_decoder::decode_jpeg;

/// Decodes image files with the `image` crate, converting any pixel format
/// (grayscale, RGBA, 16-bit) to RGB888.
///
/// `.jpg` / `.jpeg` files go through [`decode_jpeg`] on the raw file bytes.
#[derive(Default)]
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path) -> Result<Frame, ImageIoError> {
        let frame = if is_jpeg(path) {
            let bytes = fs::read(path).map_err(|source| ImageIoError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            decode_jpeg(&bytes)?
        } else {
            let img = image::open(path)
                .map_err(|source| ImageIoError::Decode {
                    path: path.to_path_buf(),
                    source,
                })?
                .to_rgb8();
            let (width, height) = img.dimensions();
            Frame::new(img.into_raw(), width, height)
        };
        log::debug!(
            "Read {}x{} image from {}",
            frame.width(),
            frame.height(),
            path.display()
        );
        Ok(frame)
    }
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false)
}
