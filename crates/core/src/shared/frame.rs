use ndarray::{s, ArrayView3, ArrayViewMut3};

use super::rectangle::{ClampedRect, Rectangle};

/// Bytes per pixel of every frame the decoder hands to the pipeline.
pub const RGB_CHANNELS: u8 = 3;

/// One decoded picture of the stream, tagged with its decode position.
///
/// Pixels are packed row-major, `channels` bytes each. The position schedule
/// keys on `index` alone, so the pipeline renumbers frames by arrival before
/// any blur runs and the writer relies on it to restore order.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Packed RGB frame at decode position `index`.
    pub fn rgb(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        Self::new(data, width, height, RGB_CHANNELS, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The same pixels at decode position `index`.
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// True when the frame is RGB at the stream's fixed resolution.
    pub fn fits_stream(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height && self.channels == RGB_CHANNELS
    }

    /// Clips `region` to this frame, `None` if nothing of it is visible.
    pub fn clamp(&self, region: &Rectangle) -> Option<ClampedRect> {
        region.clamp_to(self.width, self.height)
    }

    /// Red, green and blue bytes of the pixel at column `x`, row `y`.
    pub fn pixel(&self, x: usize, y: usize) -> &[u8] {
        let channels = self.channels as usize;
        let offset = (y * self.width as usize + x) * channels;
        &self.data[offset..offset + channels]
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    /// `rect.h x rect.w x channels` view of the pixels under `rect`.
    pub fn region(&self, rect: ClampedRect) -> ArrayView3<'_, u8> {
        self.as_ndarray()
            .slice_move(s![rect.y..rect.y + rect.h, rect.x..rect.x + rect.w, ..])
    }

    pub fn region_mut(&mut self, rect: ClampedRect) -> ArrayViewMut3<'_, u8> {
        self.as_ndarray_mut()
            .slice_move(s![rect.y..rect.y + rect.h, rect.x..rect.x + rect.w, ..])
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
