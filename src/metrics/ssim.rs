//! Structural similarity (SSIM) and its multiscale variant (MS-SSIM).
//! Windowed local means/variances/covariance over luma with the standard
//! 8-bit stabilisation constants.

const WINDOW: usize = 8;
const K1: f32 = 0.01;
const K2: f32 = 0.03;
const L: f32 = 255.0;

struct WindowStats {
    mean_a: f32,
    mean_b: f32,
    var_a: f32,
    var_b: f32,
    cov: f32,
}

fn window_stats(a: &[u8], b: &[u8], width: usize, x0: usize, y0: usize, win: usize) -> WindowStats {
    let mut sum_a = 0.0f32;
    let mut sum_b = 0.0f32;
    let mut sum_aa = 0.0f32;
    let mut sum_bb = 0.0f32;
    let mut sum_ab = 0.0f32;
    let n = (win * win) as f32;

    for y in y0..y0 + win {
        for x in x0..x0 + win {
            let idx = y * width + x;
            let va = a[idx] as f32;
            let vb = b[idx] as f32;
            sum_a += va;
            sum_b += vb;
            sum_aa += va * va;
            sum_bb += vb * vb;
            sum_ab += va * vb;
        }
    }

    let mean_a = sum_a / n;
    let mean_b = sum_b / n;
    WindowStats {
        mean_a,
        mean_b,
        var_a: sum_aa / n - mean_a * mean_a,
        var_b: sum_bb / n - mean_b * mean_b,
        cov: sum_ab / n - mean_a * mean_b,
    }
}

fn ssim_map_mean(a: &[u8], b: &[u8], width: usize, height: usize) -> f32 {
    let c1 = (K1 * L).powi(2);
    let c2 = (K2 * L).powi(2);

    if width < WINDOW || height < WINDOW {
        return ssim_single_window(a, b, width, height, c1, c2);
    }

    let mut total = 0.0f32;
    let mut count = 0usize;
    for y0 in (0..=height - WINDOW).step_by(WINDOW) {
        for x0 in (0..=width - WINDOW).step_by(WINDOW) {
            let s = window_stats(a, b, width, x0, y0, WINDOW);
            total += ssim_from_stats(&s, c1, c2);
            count += 1;
        }
    }
    if count == 0 {
        ssim_single_window(a, b, width, height, c1, c2)
    } else {
        total / count as f32
    }
}

fn ssim_single_window(a: &[u8], b: &[u8], width: usize, height: usize, c1: f32, c2: f32) -> f32 {
    let win_w = width.min(WINDOW).max(1);
    let win_h = height.min(WINDOW).max(1);
    let mut sum_a = 0.0f32;
    let mut sum_b = 0.0f32;
    let mut sum_aa = 0.0f32;
    let mut sum_bb = 0.0f32;
    let mut sum_ab = 0.0f32;
    let n = (win_w * win_h) as f32;
    for y in 0..win_h {
        for x in 0..win_w {
            let idx = y * width + x;
            let va = a[idx] as f32;
            let vb = b[idx] as f32;
            sum_a += va;
            sum_b += vb;
            sum_aa += va * va;
            sum_bb += vb * vb;
            sum_ab += va * vb;
        }
    }
    let mean_a = sum_a / n;
    let mean_b = sum_b / n;
    let stats = WindowStats {
        mean_a,
        mean_b,
        var_a: sum_aa / n - mean_a * mean_a,
        var_b: sum_bb / n - mean_b * mean_b,
        cov: sum_ab / n - mean_a * mean_b,
    };
    ssim_from_stats(&stats, c1, c2)
}

fn ssim_from_stats(s: &WindowStats, c1: f32, c2: f32) -> f32 {
    let numerator = (2.0 * s.mean_a * s.mean_b + c1) * (2.0 * s.cov + c2);
    let denominator = (s.mean_a * s.mean_a + s.mean_b * s.mean_b + c1) * (s.var_a + s.var_b + c2);
    if denominator == 0.0 {
        1.0
    } else {
        numerator / denominator
    }
}

/// Structural similarity over luma with an 8x8 sliding window (no overlap),
/// averaged across the image.
pub fn ssim(reference: &[u8], candidate: &[u8], width: usize, height: usize) -> f32 {
    ssim_map_mean(reference, candidate, width, height)
}

fn downsample_by_2(image: &[u8], width: usize, height: usize) -> (Vec<u8>, usize, usize) {
    let new_w = (width / 2).max(1);
    let new_h = (height / 2).max(1);
    let mut out = vec![0u8; new_w * new_h];
    for y in 0..new_h {
        for x in 0..new_w {
            let sx = (x * 2).min(width - 1);
            let sy = (y * 2).min(height - 1);
            let sx1 = (sx + 1).min(width - 1);
            let sy1 = (sy + 1).min(height - 1);
            let sum = image[sy * width + sx] as u32
                + image[sy * width + sx1] as u32
                + image[sy1 * width + sx] as u32
                + image[sy1 * width + sx1] as u32;
            out[y * new_w + x] = (sum / 4) as u8;
        }
    }
    (out, new_w, new_h)
}

/// Multiscale SSIM: the standard 5-level pyramid weights
/// `[0.0448, 0.2856, 0.3001, 0.2363, 0.1333]`, each level halving
/// resolution; the finest levels contribute via the same windowed SSIM used
/// by the single-scale metric.
pub fn ms_ssim(reference: &[u8], candidate: &[u8], width: usize, height: usize) -> f32 {
    const WEIGHTS: [f32; 5] = [0.0448, 0.2856, 0.3001, 0.2363, 0.1333];

    let mut ref_level = reference.to_vec();
    let mut cand_level = candidate.to_vec();
    let mut w = width;
    let mut h = height;

    let mut product = 1.0f32;
    for &weight in WEIGHTS.iter() {
        let level_value = ssim_map_mean(&ref_level, &cand_level, w, h).max(1e-6);
        product *= level_value.powf(weight);
        if w < WINDOW * 2 || h < WINDOW * 2 {
            break;
        }
        let (r2, nw, nh) = downsample_by_2(&ref_level, w, h);
        let (c2, _, _) = downsample_by_2(&cand_level, w, h);
        ref_level = r2;
        cand_level = c2;
        w = nw;
        h = nh;
    }
    product
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn ssim_of_identical_images_is_one() {
        let image: Vec<u8> = (0..256).map(|i| (i % 256) as u8).collect();
        let value = ssim(&image, &image, 16, 16);
        assert!(approx_eq(value, 1.0, 1e-3));
    }

    #[test]
    fn ms_ssim_of_identical_images_is_one() {
        let image: Vec<u8> = (0..32 * 32).map(|i| (i % 256) as u8).collect();
        let value = ms_ssim(&image, &image, 32, 32);
        assert!(approx_eq(value, 1.0, 1e-2));
    }
}
