use crate::image_io::domain::image_io_error::ImageIoError;
use crate::shared::frame::Frame;

/// Decodes an in-memory JPEG into an RGB888 frame.
pub fn decode_jpeg(bytes: &[u8]) -> Result<Frame, ImageIoError> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Jpeg)
        .map_err(ImageIoError::DecodeBytes)?
        .to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height))
}
