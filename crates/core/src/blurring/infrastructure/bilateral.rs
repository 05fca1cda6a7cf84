use super::gaussian::reflect_101;

/// Edge-preserving bilateral filter over a packed 8-bit buffer.
///
/// Each output pixel averages the pixels within a circular window of
/// diameter `diameter`, weighted by spatial distance and by the L1 color
/// distance summed over channels.
pub fn bilateral_filter(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    diameter: usize,
    sigma_color: f64,
    sigma_space: f64,
) -> Vec<u8> {
    let mut out = data.to_vec();
    if width == 0 || height == 0 || diameter <= 1 {
        return out;
    }

    let radius = (diameter / 2) as isize;
    let color_coeff = -0.5 / (sigma_color * sigma_color);
    let space_coeff = -0.5 / (sigma_space * sigma_space);

    // Window offsets and their spatial weights, limited to the disc.
    let mut window: Vec<(isize, isize, f32)> = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r2 = (dx * dx + dy * dy) as f64;
            if r2.sqrt() > radius as f64 {
                continue;
            }
            window.push((dx, dy, (r2 * space_coeff).exp() as f32));
        }
    }

    // Color weights indexed by L1 distance.
    let max_distance = 255 * channels;
    let color_weights: Vec<f32> = (0..=max_distance)
        .map(|d| ((d * d) as f64 * color_coeff).exp() as f32)
        .collect();

    let mut sums = vec![0.0f32; channels];
    for y in 0..height {
        for x in 0..width {
            let center = (y * width + x) * channels;
            sums.iter_mut().for_each(|s| *s = 0.0);
            let mut weight_sum = 0.0f32;

            for &(dx, dy, space_weight) in &window {
                let sx = reflect_101(x as isize + dx, width);
                let sy = reflect_101(y as isize + dy, height);
                let offset = (sy * width + sx) * channels;

                let distance: usize = (0..channels)
                    .map(|c| (data[offset + c] as i32 - data[center + c] as i32).unsigned_abs() as usize)
                    .sum();
                let w = space_weight * color_weights[distance];

                for c in 0..channels {
                    sums[c] += data[offset + c] as f32 * w;
                }
                weight_sum += w;
            }

            for c in 0..channels {
                out[center + c] = (sums[c] / weight_sum).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    out
}
