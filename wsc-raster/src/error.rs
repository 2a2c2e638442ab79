/// Error types for raster payload processing
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RasterError {
    /// Gzip stream could not be inflated
    #[error("Failed to decompress payload: {0}")]
    Decompression(String),

    /// Tar archive could not be read
    #[error("Failed to extract tar archive: {0}")]
    TarExtraction(#[from] std::io::Error),

    /// Tar archive holds no `.tif`/`.tiff` entry
    #[error("Tar archive contains no TIFF entry")]
    NoTiffEntry,

    /// Bytes are neither gzip, tar nor TIFF
    #[error("Unrecognized payload of {0} bytes")]
    UnrecognizedPayload(usize),

    #[error("Failed to decode TIFF: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Unsupported sample type: {0}")]
    UnsupportedSampleType(&'static str),

    /// Decoded buffer length is not a whole number of pixels
    #[error("Pixel buffer of {len} samples does not fit a {width}x{height} image")]
    PixelMismatch { len: usize, width: u32, height: u32 },

    #[error("Geometry has no coordinates")]
    EmptyGeometry,
}

pub type Result<T> = std::result::Result<T, RasterError>;
