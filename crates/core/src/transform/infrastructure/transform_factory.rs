use std::fmt;
use std::str::FromStr;

use crate::transform::domain::region_transform::RegionTransform;

use super::black_out::BlackOut;
use super::box_blur::BoxBlur;
use super::pixelate::Pixelate;

/// Which anonymization is applied to every detected face in a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransformKind {
    BlackOut,
    Blur,
    #[default]
    Pixelate,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown anonymization method '{0}' (expected black, blur or pixelate)")]
pub struct UnknownTransform(String);

impl FromStr for TransformKind {
    type Err = UnknownTransform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "black" | "blackout" | "black-out" => Ok(Self::BlackOut),
            "blur" => Ok(Self::Blur),
            "pixelate" | "pixel" | "mosaic" => Ok(Self::Pixelate),
            _ => Err(UnknownTransform(s.to_string())),
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BlackOut => "black",
            Self::Blur => "blur",
            Self::Pixelate => "pixelate",
        })
    }
}

/// Creates the transform for `kind`.
pub fn create_transform(kind: TransformKind) -> Box<dyn RegionTransform> {
    log::info!("Using {kind} anonymization");
    match kind {
        TransformKind::BlackOut => Box::new(BlackOut),
        TransformKind::Blur => Box::new(BoxBlur::default()),
        TransformKind::Pixelate => Box::new(Pixelate),
    }
}
