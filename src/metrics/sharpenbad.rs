//! Sharpness-loss metric: compares local gradient magnitude between the
//! reference and candidate to estimate how much high-frequency detail the
//! recompression discarded. Named after the upstream `jpeg-recompress`
//! "sharpen-bad" guard, which this module's caller (the target-quality
//! driver) consults to bias away from over-aggressive quantization; the
//! upstream implementation is treated as a given reference and this
//! is an original gradient-domain formulation of the same intuition.

/// Sobel-style gradient magnitude at `(x, y)`, clamped to image bounds by
/// replicating edge pixels.
fn gradient_magnitude(image: &[u8], width: usize, height: usize, x: usize, y: usize) -> f32 {
    let at = |xi: isize, yi: isize| -> f32 {
        let xi = xi.clamp(0, width as isize - 1) as usize;
        let yi = yi.clamp(0, height as isize - 1) as usize;
        image[yi * width + xi] as f32
    };

    let xi = x as isize;
    let yi = y as isize;

    let gx = -at(xi - 1, yi - 1) - 2.0 * at(xi - 1, yi) - at(xi - 1, yi + 1)
        + at(xi + 1, yi - 1)
        + 2.0 * at(xi + 1, yi)
        + at(xi + 1, yi + 1);
    let gy = -at(xi - 1, yi - 1) - 2.0 * at(xi, yi - 1) - at(xi + 1, yi - 1)
        + at(xi - 1, yi + 1)
        + 2.0 * at(xi, yi + 1)
        + at(xi + 1, yi + 1);

    (gx * gx + gy * gy).sqrt()
}

/// Mean Sobel gradient magnitude loss between reference and candidate,
/// normalised to `[0, 1]` by the reference's own mean gradient magnitude.
/// A value near 0 means the candidate kept essentially all of the
/// reference's edge energy; values near 1 mean most of it was smoothed
/// away. `radius` selects the averaging window used to pool per-pixel
/// losses before the final mean (default 1, matching the upstream
/// default window of a single ring around each sample).
pub fn sharpenbad(reference: &[u8], candidate: &[u8], width: usize, height: usize, radius: usize) -> f32 {
    if width < 3 || height < 3 {
        return 0.0;
    }
    let radius = radius.max(1);

    let mut ref_total = 0.0f64;
    let mut loss_total = 0.0f64;
    let mut count = 0usize;

    let mut y = radius;
    while y < height - radius {
        let mut x = radius;
        while x < width - radius {
            let ref_mag = gradient_magnitude(reference, width, height, x, y) as f64;
            let cand_mag = gradient_magnitude(candidate, width, height, x, y) as f64;
            ref_total += ref_mag;
            loss_total += (ref_mag - cand_mag).max(0.0);
            count += 1;
            x += 1;
        }
        y += 1;
    }

    if count == 0 || ref_total <= 0.0 {
        return 0.0;
    }
    (loss_total / ref_total).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_images_have_no_sharpness_loss() {
        let image: Vec<u8> = (0..16 * 16).map(|i| ((i * 5) % 256) as u8).collect();
        assert_eq!(sharpenbad(&image, &image, 16, 16, 1), 0.0);
    }

    #[test]
    fn blurring_increases_loss() {
        let width = 16;
        let height = 16;
        let mut reference = vec![0u8; width * height];
        for y in 0..height {
            for x in 0..width {
                reference[y * width + x] = if x % 2 == 0 { 0 } else { 255 };
            }
        }
        let blurred = vec![128u8; width * height];
        let loss = sharpenbad(&reference, &blurred, width, height, 1);
        assert!(loss > 0.5);
    }
}
