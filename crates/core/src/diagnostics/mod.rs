pub mod pixel_dump;
