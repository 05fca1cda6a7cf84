use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::shared::constants::POSITION_COUNT;
use crate::shared::error::WatermarkError;
use crate::shared::rectangle::Rectangle;

/// Margins anchoring the three watermark positions to the frame edges.
///
/// Index 0 (top-left) is fixed; index 1 (center-right) follows the right
/// edge; index 2 (bottom-left) follows the bottom edge. Values are tuned
/// to a particular watermark source and can be overridden from JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionLayout {
    pub top_left_x: i32,
    pub top_left_y: i32,
    pub right_margin: i32,
    pub center_right_y: i32,
    pub bottom_left_x: i32,
    pub bottom_offset: i32,
}

impl Default for RegionLayout {
    fn default() -> Self {
        Self {
            top_left_x: 20,
            top_left_y: 75,
            right_margin: 10,
            center_right_y: 592,
            bottom_left_x: 25,
            bottom_offset: 260,
        }
    }
}

impl RegionLayout {
    /// Loads a layout from a JSON object; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, WatermarkError> {
        let json = fs::read_to_string(path).map_err(|e| {
            WatermarkError::Config(format!("cannot read layout {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
            .map_err(|e| WatermarkError::Config(format!("{} ({})", e, path.display())))
    }

    pub fn from_json_str(json: &str) -> Result<Self, WatermarkError> {
        serde_json::from_str(json)
            .map_err(|e| WatermarkError::Config(format!("malformed layout: {e}")))
    }

    /// Computes the three candidate rectangles for a frame, index-aligned
    /// with the position schedule.
    ///
    /// Rectangles are not clipped to the frame. A rectangle whose anchor
    /// would fall left of or above the frame origin is pinned to 0 on that
    /// axis.
    pub fn compute_regions(
        &self,
        frame_width: u32,
        frame_height: u32,
        box_width: u32,
        box_height: u32,
    ) -> [Rectangle; POSITION_COUNT] {
        let fw = saturate(i64::from(frame_width));
        let fh = saturate(i64::from(frame_height));
        let bw = saturate(i64::from(box_width));
        let bh = saturate(i64::from(box_height));

        let center_right_x = fw.saturating_sub(bw).saturating_sub(self.right_margin);
        let bottom_left_y = fh.saturating_sub(self.bottom_offset);

        [
            Rectangle::new(self.top_left_x.max(0), self.top_left_y.max(0), bw, bh),
            Rectangle::new(center_right_x.max(0), self.center_right_y.max(0), bw, bh),
            Rectangle::new(self.bottom_left_x.max(0), bottom_left_y.max(0), bw, bh),
        ]
    }
}

/// [`RegionLayout::compute_regions`] with the default layout.
pub fn compute_regions(
    frame_width: u32,
    frame_height: u32,
    box_width: u32,
    box_height: u32,
) -> [Rectangle; POSITION_COUNT] {
    RegionLayout::default().compute_regions(frame_width, frame_height, box_width, box_height)
}

fn saturate(v: i64) -> i32 {
    v.min(i64::from(i32::MAX)) as i32
}
