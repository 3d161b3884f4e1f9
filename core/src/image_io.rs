//! Image I/O

use crate::base::*;
use crate::spectrum::*;
use image::*;
use std::result::Result;

/// Write a resolved image in an 8-bit format chosen from the file suffix.
///
/// * `path`   - Output file path.
/// * `pixels` - Linear RGB pixels, top row first.
/// * `width`  - Image width.
/// * `height` - Image height.
pub fn write_image(path: &str, pixels: &[Spectrum], width: usize, height: usize) -> Result<(), String> {
    if pixels.len() != width * height {
        return Err(format!(
            "Image {path} has {} pixels, expected {width}x{height}",
            pixels.len()
        ));
    }
    let image_format =
        ImageFormat::from_path(path).map_err(|_| format!("Can't determine file type from suffix of filename {path}."))?;

    info!("Writing image {path} with resolution {width}x{height}");

    let mut imgbuf = ImageBuffer::new(width as u32, height as u32);
    for (i, p) in pixels.iter().enumerate() {
        let x = (i % width) as u32;
        let y = (i / width) as u32;
        imgbuf.put_pixel(x, y, Rgb(apply_gamma(&p.sanitized())));
    }

    match imgbuf.save_with_format(path, image_format) {
        Ok(()) => Ok(()),
        Err(err) => Err(format!("Error saving output image {path}: {err}.")),
    }
}

/// Returns the sRGB gamma corrected value of a linear value.
///
/// * `value` - The value.
#[inline(always)]
pub fn gamma_correct(value: Float) -> Float {
    if value <= 0.0031308 {
        12.92 * value
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}

/// Apply gamma correction and quantize to 8 bits.
///
/// * `rgb` - Linear RGB.
fn apply_gamma(rgb: &Spectrum) -> [u8; 3] {
    [clamp_byte(rgb[0]), clamp_byte(rgb[1]), clamp_byte(rgb[2])]
}

/// Clamp floating point value to 8-bit range [0, 255].
///
/// * `v` - Value to clamp.
#[inline]
fn clamp_byte(v: Float) -> u8 {
    clamp(255.0 * gamma_correct(v) + 0.5, 0.0, 255.0) as u8
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    #[test]
    fn gamma_maps_unit_interval_onto_itself() {
        assert_eq!(gamma_correct(0.0), 0.0);
        assert!(approx_eq!(f32, gamma_correct(1.0), 1.0, epsilon = 1e-5));
        assert_eq!(clamp_byte(2.0), 255);
        assert_eq!(clamp_byte(-1.0), 0);
    }

    #[test]
    fn mismatched_pixel_count_is_rejected() {
        let pixels = vec![Spectrum::ZERO; 3];
        assert!(write_image("out.png", &pixels, 2, 2).is_err());
    }
}
