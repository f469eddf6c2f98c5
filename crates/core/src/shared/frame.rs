use ndarray::ArrayView3;

use super::color::Color;

/// Bytes per pixel of the RGB24 raster.
pub const CHANNELS: usize = 3;

/// An RGB24 image raster: contiguous bytes in row-major order, 3 bytes per pixel.
///
/// Coordinate access is bounds-checked. Reads outside the raster return
/// black and writes outside the raster are ignored, so region transforms
/// never have to special-case the image border.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
        }
    }

    /// A frame with every pixel set to `color`.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let data = color
            .to_array()
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * CHANNELS)
            .collect();
        Self::new(data, width, height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Byte offset of pixel `(x, y)`. Caller must ensure it is in bounds.
    pub(crate) fn offset(&self, x: usize, y: usize) -> usize {
        (y * self.width as usize + x) * CHANNELS
    }

    /// Returns the pixel at `(x, y)`, or black when out of bounds.
    pub fn pixel(&self, x: i32, y: i32) -> Color {
        if !self.contains(x, y) {
            return Color::BLACK;
        }
        let i = self.offset(x as usize, y as usize);
        Color::new(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    /// Overwrites the pixel at `(x, y)`. Out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if !self.contains(x, y) {
            return;
        }
        let i = self.offset(x as usize, y as usize);
        self.data[i..i + CHANNELS].copy_from_slice(&color.to_array());
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, CHANNELS)
    }
}
