use crate::error::{RasterError, Result};
use log::debug;
use std::io::Cursor;
use tiff::decoder::{Decoder, DecodingResult};

/// Mask value marking a water pixel.
pub const WATER_CLASS: u8 = 1;

/// Pixel tally of one decoded water mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RasterResult {
    pub water_pixel_count: u64,
    pub total_pixel_count: u64,
}

impl RasterResult {
    /// Share of water pixels, 0.0 for an empty raster.
    pub fn water_fraction(&self) -> f64 {
        if self.total_pixel_count == 0 {
            return 0.0;
        }
        self.water_pixel_count as f64 / self.total_pixel_count as f64
    }
}

fn count_matching<T: Copy>(samples: &[T], stride: usize, is_water: impl Fn(T) -> bool) -> u64 {
    samples
        .iter()
        .step_by(stride)
        .filter(|&&s| is_water(s))
        .count() as u64
}

/// Decodes a TIFF mask and counts pixels whose first sample equals the
/// water class.
pub fn count_water_pixels(tiff: &[u8]) -> Result<RasterResult> {
    let mut decoder = Decoder::new(Cursor::new(tiff))?;
    let (width, height) = decoder.dimensions()?;
    let total = u64::from(width) * u64::from(height);
    if total == 0 {
        return Ok(RasterResult::default());
    }
    let image = decoder.read_image()?;
    let len = match &image {
        DecodingResult::U8(v) => v.len(),
        DecodingResult::U16(v) => v.len(),
        DecodingResult::U32(v) => v.len(),
        DecodingResult::F32(v) => v.len(),
        DecodingResult::F64(v) => v.len(),
        _ => return Err(RasterError::UnsupportedSampleType("signed or 64-bit integer")),
    };
    let pixels = usize::try_from(total).unwrap_or(usize::MAX);
    if len == 0 || len % pixels != 0 {
        return Err(RasterError::PixelMismatch { len, width, height });
    }
    let stride = len / pixels;
    let water = match image {
        DecodingResult::U8(v) => count_matching(&v, stride, |s| s == WATER_CLASS),
        DecodingResult::U16(v) => count_matching(&v, stride, |s| s == u16::from(WATER_CLASS)),
        DecodingResult::U32(v) => count_matching(&v, stride, |s| s == u32::from(WATER_CLASS)),
        DecodingResult::F32(v) => count_matching(&v, stride, |s| s == f32::from(WATER_CLASS)),
        DecodingResult::F64(v) => count_matching(&v, stride, |s| s == f64::from(WATER_CLASS)),
        _ => return Err(RasterError::UnsupportedSampleType("signed or 64-bit integer")),
    };
    debug!("{}x{} mask, {} samples per pixel, {} water pixels", width, height, stride, water);
    Ok(RasterResult {
        water_pixel_count: water,
        total_pixel_count: total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::fixtures::*;

    #[test]
    fn test_empty_raster_has_zero_fraction() {
        let empty = RasterResult::default();
        assert_eq!(empty.water_fraction(), 0.0);
    }

    #[test]
    fn test_count_u8_mask() {
        let mask = [1, 1, 0, 0, 1, 0, 0, 0, 2];
        let result = count_water_pixels(&gray8_tiff(3, 3, &mask)).unwrap();
        assert_eq!(result.water_pixel_count, 3);
        assert_eq!(result.total_pixel_count, 9);
        assert!((result.water_fraction() - 3.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_count_u16_and_f32_masks() {
        let result = count_water_pixels(&gray16_tiff(2, 2, &[1, 0, 1, 1])).unwrap();
        assert_eq!(result.water_pixel_count, 3);

        let result = count_water_pixels(&gray_f32_tiff(2, 2, &[0.0, 1.0, 0.5, 0.0])).unwrap();
        assert_eq!(result.water_pixel_count, 1);
        assert_eq!(result.total_pixel_count, 4);
    }

    #[test]
    fn test_all_water_and_no_water() {
        let full = count_water_pixels(&gray8_tiff(4, 4, &[1; 16])).unwrap();
        assert_eq!(full.water_fraction(), 1.0);
        let dry = count_water_pixels(&gray8_tiff(4, 4, &[0; 16])).unwrap();
        assert_eq!(dry.water_fraction(), 0.0);
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(count_water_pixels(b"II*\0garbage").is_err());
    }
}
