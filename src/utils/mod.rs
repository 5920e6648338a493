pub mod error;
pub mod validation;
pub mod formats;
pub mod fs;

pub use error::{CompressorError, CompressorResult, ValidationError};
pub use validation::{parse_hex_color, validate_settings, validate_source, ValidationWarning, MAX_OUTPUT_DIMENSION};
pub use formats::{ImageFormat, format_from_extension};
pub use fs::{
    claim_unique_name,
    compressed_file_name,
    expand_inputs,
    extract_filename,
    read_source,
    timestamp_ms,
    write_output,
    write_zip,
};
