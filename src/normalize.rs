//! The image normalization transform shared by all tools.

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use ndarray::Array3;

use crate::error::{Error, Result};

/// Number of channels in the normalized output.
pub const RGB_CHANNELS: usize = 3;

/// A normalized image: `(size, size, 3)` pixel array, values in `[0, 255]`.
pub type NormalizedImage = Array3<u8>;

/// Resampling policy for the aspect-preserving resize.
///
/// `Box` is used when extracting from record archives, `Bicubic` when
/// building reference batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleFilter {
    Box,
    Bicubic,
}

impl ResampleFilter {
    /// `imageops` has no true box filter; `Triangle` is its closest
    /// averaging filter.
    fn filter_type(self) -> FilterType {
        match self {
            ResampleFilter::Box => FilterType::Triangle,
            ResampleFilter::Bicubic => FilterType::CatmullRom,
        }
    }
}

/// Normalize an image to a `(image_size, image_size, 3)` u8 array.
///
/// The image is:
/// 1. Resized so its smaller dimension equals `image_size`, preserving
///    aspect ratio (each dimension rounds independently, floored at
///    `image_size` so the crop below can never underflow)
/// 2. Center-cropped to the target square
/// 3. Coerced to 3 channels (grayscale broadcasts, alpha is dropped)
///
/// # Errors
///
/// Returns `InvalidParameter` if `image_size` is zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn normalize(
    image: &DynamicImage,
    image_size: u32,
    filter: ResampleFilter,
) -> Result<NormalizedImage> {
    if image_size == 0 {
        return Err(Error::InvalidParameter {
            name: "image_size".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    let (width, height) = image.dimensions();
    let scale = f64::from(image_size) / f64::from(width.min(height));
    // Safe: rounded products are positive and bounded by the source dimensions
    // times a scale that maps the smaller one onto image_size.
    let new_width = ((scale * f64::from(width)).round() as u32).max(image_size);
    let new_height = ((scale * f64::from(height)).round() as u32).max(image_size);

    let resized = image.resize_exact(new_width, new_height, filter.filter_type());

    let x_off = (new_width - image_size) / 2;
    let y_off = (new_height - image_size) / 2;
    let cropped = resized.crop_imm(x_off, y_off, image_size, image_size).to_rgb8();

    let side = image_size as usize;
    let arr = Array3::from_shape_vec((side, side, RGB_CHANNELS), cropped.into_raw())?;
    Ok(arr)
}
