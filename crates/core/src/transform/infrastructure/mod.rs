pub mod black_out;
pub mod box_blur;
pub mod pixelate;
pub mod transform_factory;
