pub mod anonymize_image_use_case;
pub mod anonymizer;
pub mod infrastructure;
pub mod pipeline_logger;
