//! Human-readable hex dumps of frame contents.
//!
//! Dumps are written to logs on constrained targets and turned back into
//! images offline with [`parse_pixel_dump`].

use std::fmt::Write;

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::region::Region;

pub const DUMP_START: &str = "===PIXELS_START===";
pub const DUMP_END: &str = "===PIXELS_END===";

/// Bytes per line in a full-frame dump.
const BYTES_PER_LINE: usize = 48;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PixelDumpError {
    #[error("no {DUMP_START} marker found")]
    MissingStart,
    #[error("no {DUMP_END} marker after {DUMP_START}")]
    MissingEnd,
    #[error("dump has an odd number of hex digits ({0})")]
    OddDigitCount(usize),
    #[error("dump holds {actual} bytes, expected {expected} for the given size")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Whole raster as uppercase hex, [`BYTES_PER_LINE`] bytes per line,
/// framed by [`DUMP_START`] / [`DUMP_END`].
pub fn dump_pixels(frame: &Frame) -> String {
    let data = frame.data();
    let mut out = String::with_capacity(data.len() * 2 + data.len() / BYTES_PER_LINE + 64);
    out.push_str(DUMP_START);
    out.push('\n');
    for line in data.chunks(BYTES_PER_LINE) {
        for byte in line {
            let _ = write!(out, "{byte:02X}");
        }
        out.push('\n');
    }
    out.push_str(DUMP_END);
    out.push('\n');
    out
}

/// One line per row of `region`, each pixel as an `RRGGBB ` token.
///
/// Pixels outside the frame read as `000000`. Ends with the frame resolution.
pub fn dump_subpicture(frame: &Frame, region: &Region) -> String {
    let region = region.normalized();
    let mut out = String::new();
    out.push_str(DUMP_START);
    out.push('\n');
    for y in region.y1..region.y2 {
        for x in region.x1..region.x2 {
            let px = frame.pixel(x, y);
            let _ = write!(out, "{:02X}{:02X}{:02X} ", px.r, px.g, px.b);
        }
        out.push('\n');
    }
    out.push_str(DUMP_END);
    out.push('\n');
    let _ = writeln!(out, "Resolution: {} x {}", frame.width(), frame.height());
    out
}

/// Rebuilds a `width × height` frame from a [`dump_pixels`] dump embedded
/// anywhere in `text` (e.g. a captured serial log).
///
/// Everything that is not a hex digit between the markers is ignored.
pub fn parse_pixel_dump(text: &str, width: u32, height: u32) -> Result<Frame, PixelDumpError> {
    let start = text.find(DUMP_START).ok_or(PixelDumpError::MissingStart)? + DUMP_START.len();
    let len = text[start..].find(DUMP_END).ok_or(PixelDumpError::MissingEnd)?;

    let digits: Vec<u8> = text[start..start + len]
        .chars()
        .filter_map(|c| c.to_digit(16))
        .map(|d| d as u8)
        .collect();
    if digits.len() % 2 != 0 {
        return Err(PixelDumpError::OddDigitCount(digits.len()));
    }

    let expected = width as usize * height as usize * 3;
    let actual = digits.len() / 2;
    if actual != expected {
        return Err(PixelDumpError::LengthMismatch { expected, actual });
    }

    let data = digits.chunks_exact(2).map(|p| p[0] << 4 | p[1]).collect();
    Ok(Frame::new(data, width, height))
}
