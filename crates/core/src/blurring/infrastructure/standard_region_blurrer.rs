use crate::blurring::domain::feathered_mask::{blend_into, build_feathered_mask};
use crate::blurring::domain::region_blurrer::{BlurError, RegionBlurrer};
use crate::shared::constants::{DEFAULT_BLUR_KERNEL_SIZE, STANDARD_FEATHER_SIZE};
use crate::shared::frame::Frame;
use crate::shared::rectangle::Rectangle;

use super::gaussian;
use super::roi::extract_roi;

/// Gaussian-only region blur with a 10px feathered blend.
pub struct StandardRegionBlurrer {
    kernel: Vec<f32>,
    feather_size: usize,
}

impl StandardRegionBlurrer {
    pub fn new(kernel_size: usize) -> Self {
        Self {
            kernel: gaussian::gaussian_kernel_1d(kernel_size),
            feather_size: STANDARD_FEATHER_SIZE,
        }
    }
}

impl Default for StandardRegionBlurrer {
    fn default() -> Self {
        Self::new(DEFAULT_BLUR_KERNEL_SIZE)
    }
}

impl RegionBlurrer for StandardRegionBlurrer {
    fn blur_region(&self, frame: &mut Frame, region: &Rectangle) -> Result<(), BlurError> {
        let Some(rect) = frame.clamp(region) else {
            log::debug!("Region {region:?} lies outside frame {}; skipping", frame.index());
            return Ok(());
        };
        let channels = frame.channels() as usize;

        let mut roi = extract_roi(frame, rect);
        let mut temp = Vec::new();
        gaussian::separable_gaussian_blur_with_kernel(
            &mut roi,
            rect.w,
            rect.h,
            channels,
            &self.kernel,
            &mut temp,
        );

        let mask = build_feathered_mask(rect.w, rect.h, self.feather_size);
        blend_into(frame, rect, &roi, &mask);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = if (x / 2 + y / 2) % 2 == 0 { 255 } else { 0 };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        Frame::rgb(data, width, height, 0)
    }

    #[test]
    fn test_pixels_outside_region_bit_identical() {
        let mut frame = checkerboard(120, 90);
        let original = frame.clone();
        let region = Rectangle::new(30, 20, 50, 40);
        StandardRegionBlurrer::new(15)
            .blur_region(&mut frame, &region)
            .unwrap();

        let rect = region.clamp_to(120, 90).unwrap();
        for y in 0..90 {
            for x in 0..120 {
                if !rect.contains(x, y) {
                    assert_eq!(frame.pixel(x, y), original.pixel(x, y), "({x},{y})");
                }
            }
        }
    }

    #[test]
    fn test_interior_matches_full_blur() {
        let mut frame = checkerboard(120, 90);
        let original = frame.clone();
        let region = Rectangle::new(30, 20, 50, 40);
        StandardRegionBlurrer::new(15)
            .blur_region(&mut frame, &region)
            .unwrap();

        let rect = region.clamp_to(120, 90).unwrap();
        let mut expected = extract_roi(&original, rect);
        gaussian::separable_gaussian_blur(&mut expected, rect.w, rect.h, 3, 15);

        // mask is exactly 1.0 at >= 10px from every edge
        for row in 10..rect.h - 10 {
            for col in 10..rect.w - 10 {
                let got = frame.pixel(rect.x + col, rect.y + row);
                let idx = (row * rect.w + col) * 3;
                assert_eq!(got, &expected[idx..idx + 3]);
            }
        }
    }

    #[test]
    fn test_region_edge_pixel_keeps_original() {
        let mut frame = checkerboard(120, 90);
        let original = frame.clone();
        StandardRegionBlurrer::new(15)
            .blur_region(&mut frame, &Rectangle::new(30, 20, 50, 40))
            .unwrap();
        // the outermost ring has mask weight 0
        assert_eq!(frame.pixel(30, 20), original.pixel(30, 20));
        assert_eq!(frame.pixel(79, 59), original.pixel(79, 59));
        assert_eq!(frame.pixel(50, 20), original.pixel(50, 20));
    }

    #[test]
    fn test_blur_changes_high_contrast_interior() {
        let mut frame = checkerboard(120, 90);
        let original = frame.clone();
        StandardRegionBlurrer::new(15)
            .blur_region(&mut frame, &Rectangle::new(30, 20, 50, 40))
            .unwrap();
        assert_ne!(frame.pixel(55, 40), original.pixel(55, 40));
    }

    #[test]
    fn test_region_overhanging_frame_is_clamped() {
        let mut frame = checkerboard(60, 40);
        let original = frame.clone();
        StandardRegionBlurrer::new(15)
            .blur_region(&mut frame, &Rectangle::new(30, 10, 139, 51))
            .unwrap();
        assert_eq!(frame.pixel(10, 10), original.pixel(10, 10));
        assert_ne!(frame.data(), original.data());
    }

    #[test]
    fn test_region_outside_frame_is_noop() {
        let mut frame = checkerboard(60, 40);
        let original = frame.clone();
        StandardRegionBlurrer::default()
            .blur_region(&mut frame, &Rectangle::new(25, 820, 139, 51))
            .unwrap();
        assert_eq!(frame.data(), original.data());
    }

    #[test]
    fn test_preserves_frame_index() {
        let mut frame = Frame::rgb(vec![128u8; 40 * 40 * 3], 40, 40, 42);
        StandardRegionBlurrer::new(5)
            .blur_region(&mut frame, &Rectangle::new(5, 5, 20, 20))
            .unwrap();
        assert_eq!(frame.index(), 42);
    }
}
