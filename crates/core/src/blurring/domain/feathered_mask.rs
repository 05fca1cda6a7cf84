use ndarray::{Array2, ArrayView3};

use crate::shared::frame::Frame;
use crate::shared::rectangle::ClampedRect;

/// Builds a `(height, width)` blend mask that is 1.0 inside and ramps
/// linearly to 0.0 over the outer `feather_size` pixels of each edge.
///
/// Ramp step `i` from an edge has weight `i / feather_size`. Each edge
/// multiplies into the mask, so corners get the product of both ramps and
/// ramps from opposite edges compound when `feather_size` exceeds half a
/// dimension.
pub fn build_feathered_mask(width: usize, height: usize, feather_size: usize) -> Array2<f32> {
    let mut mask = Array2::<f32>::ones((height, width));

    for i in 0..feather_size {
        if i >= height || i >= width {
            break;
        }
        let alpha = i as f32 / feather_size as f32;
        mask.row_mut(i).map_inplace(|v| *v *= alpha);
        mask.row_mut(height - 1 - i).map_inplace(|v| *v *= alpha);
        mask.column_mut(i).map_inplace(|v| *v *= alpha);
        mask.column_mut(width - 1 - i).map_inplace(|v| *v *= alpha);
    }

    mask
}

/// Writes `blurred * mask + original * (1 - mask)` over `rect` of `frame`,
/// truncating each result to `u8`.
///
/// `blurred` is a tightly packed `rect.h x rect.w x channels` buffer; the
/// original pixels are read from the frame itself.
pub fn blend_into(frame: &mut Frame, rect: ClampedRect, blurred: &[u8], mask: &Array2<f32>) {
    let channels = frame.channels() as usize;
    debug_assert_eq!(mask.dim(), (rect.h, rect.w));

    let Ok(blurred) = ArrayView3::from_shape((rect.h, rect.w, channels), blurred) else {
        debug_assert!(false, "blurred ROI length must match rect dimensions");
        return;
    };

    for ((row, col, ch), px) in frame.region_mut(rect).indexed_iter_mut() {
        let weight = mask[[row, col]];
        let value = blurred[[row, col, ch]] as f32 * weight + *px as f32 * (1.0 - weight);
        *px = value.clamp(0.0, 255.0) as u8;
    }
}
