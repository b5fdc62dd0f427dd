//! Pixel-domain visual information fidelity (simplified single-scale
//! variant, often called VIFP1 by recompression tools). The upstream `iqa`
//! implementation is treated as a given reference per the quality-metric
//! module's scope; this is an original, block-local formulation of the same
//! signal/noise decomposition rather than a port.

const BLOCK: usize = 8;
const SIGMA_NSQ: f32 = 2.0;

struct BlockStats {
    var_ref: f32,
    var_dist: f32,
    cov: f32,
}

fn block_stats(reference: &[u8], candidate: &[u8], width: usize, x0: usize, y0: usize, w: usize, h: usize) -> BlockStats {
    let n = (w * h) as f32;
    let mut sum_r = 0.0f32;
    let mut sum_d = 0.0f32;
    let mut sum_rr = 0.0f32;
    let mut sum_dd = 0.0f32;
    let mut sum_rd = 0.0f32;

    for y in y0..y0 + h {
        for x in x0..x0 + w {
            let idx = y * width + x;
            let r = reference[idx] as f32;
            let d = candidate[idx] as f32;
            sum_r += r;
            sum_d += d;
            sum_rr += r * r;
            sum_dd += d * d;
            sum_rd += r * d;
        }
    }
    let mean_r = sum_r / n;
    let mean_d = sum_d / n;
    BlockStats {
        var_ref: (sum_rr / n - mean_r * mean_r).max(0.0),
        var_dist: (sum_dd / n - mean_d * mean_d).max(0.0),
        cov: sum_rd / n - mean_r * mean_d,
    }
}

/// Single-scale pixel-domain VIF. Each non-overlapping block is modelled as
/// a scalar-gain-plus-noise channel (`candidate = g * reference + noise`);
/// the fidelity ratio sums `log2(1 + g^2*var_ref/(noise_var+SIGMA_NSQ))`
/// over `log2(1 + var_ref/SIGMA_NSQ)` across all blocks.
pub fn vifp1(reference: &[u8], candidate: &[u8], width: usize, height: usize) -> f32 {
    if width < BLOCK || height < BLOCK {
        return vifp_single_block(reference, candidate, width, height);
    }

    let mut num = 0.0f32;
    let mut den = 0.0f32;

    for y0 in (0..=height - BLOCK).step_by(BLOCK) {
        for x0 in (0..=width - BLOCK).step_by(BLOCK) {
            let s = block_stats(reference, candidate, width, x0, y0, BLOCK, BLOCK);
            accumulate(&s, &mut num, &mut den);
        }
    }

    if den <= 0.0 {
        1.0
    } else {
        num / den
    }
}

fn vifp_single_block(reference: &[u8], candidate: &[u8], width: usize, height: usize) -> f32 {
    let s = block_stats(reference, candidate, width, 0, 0, width, height);
    let mut num = 0.0f32;
    let mut den = 0.0f32;
    accumulate(&s, &mut num, &mut den);
    if den <= 0.0 {
        1.0
    } else {
        num / den
    }
}

fn accumulate(s: &BlockStats, num: &mut f32, den: &mut f32) {
    if s.var_ref <= 1e-6 {
        return;
    }
    let g = s.cov / s.var_ref;
    let noise_var = (s.var_dist - g * s.cov).max(0.0);
    *num += (1.0 + (g * g * s.var_ref) / (noise_var + SIGMA_NSQ)).log2();
    *den += (1.0 + s.var_ref / SIGMA_NSQ).log2();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_images_have_unit_fidelity() {
        let image: Vec<u8> = (0..16 * 16).map(|i| ((i * 7) % 256) as u8).collect();
        let value = vifp1(&image, &image, 16, 16);
        assert!((value - 1.0).abs() < 1e-3);
    }

    #[test]
    fn flat_reference_falls_back_to_one() {
        let reference = vec![100u8; 16 * 16];
        let candidate = vec![120u8; 16 * 16];
        let value = vifp1(&reference, &candidate, 16, 16);
        assert_eq!(value, 1.0);
    }
}
