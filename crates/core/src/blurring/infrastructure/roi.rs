use crate::shared::frame::Frame;
use crate::shared::rectangle::ClampedRect;

/// Copy a clamped rectangle out of a frame into a packed buffer.
pub fn extract_roi(frame: &Frame, rect: ClampedRect) -> Vec<u8> {
    frame.region(rect).iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_copies_rows() {
        // 4x3 frame, pixel value = row*10 + col
        let mut data = Vec::new();
        for row in 0..3u8 {
            for col in 0..4u8 {
                data.extend_from_slice(&[row * 10 + col; 3]);
            }
        }
        let frame = Frame::rgb(data, 4, 3, 0);
        let roi = extract_roi(
            &frame,
            ClampedRect {
                x: 1,
                y: 1,
                w: 2,
                h: 2,
            },
        );
        let firsts: Vec<u8> = roi.chunks(3).map(|p| p[0]).collect();
        assert_eq!(firsts, vec![11, 12, 21, 22]);
    }
}
