//! Reference-versus-distorted image-quality metrics. All metrics operate
//! on equi-dimensional luma buffers unless noted; `Method::Fast`
//! short-circuits the whole metric library via the perceptual hash instead.

mod nhw;
mod sharpenbad;
mod smallfry;
mod ssim;
mod vifp;

pub use nhw::nhw;
pub use sharpenbad::sharpenbad;
pub use smallfry::smallfry;
pub use ssim::{ms_ssim, ssim};
pub use vifp::vifp1;

/// Mean absolute per-sample error, normalised by total sample count.
pub fn mpe(reference: &[u8], candidate: &[u8]) -> f32 {
    let mut sum = 0.0f32;
    for (&a, &b) in reference.iter().zip(candidate.iter()) {
        sum += (a as f32 - b as f32).abs();
    }
    sum / reference.len() as f32
}

/// Mean squared error, normalised by total sample count.
pub fn mse(reference: &[u8], candidate: &[u8]) -> f32 {
    let mut sum = 0.0f32;
    for (&a, &b) in reference.iter().zip(candidate.iter()) {
        let d = a as f32 - b as f32;
        sum += d * d;
    }
    sum / reference.len() as f32
}

/// Combined variance of the reference and candidate sample populations
/// (the two buffers pooled together), used to noise-normalise MSE.
pub fn combined_variance(reference: &[u8], candidate: &[u8]) -> f32 {
    let n = 2 * reference.len();
    let mut sum = 0.0f32;
    let mut sum_sq = 0.0f32;
    for &v in reference.iter().chain(candidate.iter()) {
        let f = v as f32;
        sum += f;
        sum_sq += f * f;
    }
    let mean = sum / n as f32;
    (sum_sq / n as f32) - mean * mean
}

/// `sqrt(MSE / max(sigma^2, 1))`: a noise-normalised error.
pub fn msef(reference: &[u8], candidate: &[u8]) -> f32 {
    let mse_val = mse(reference, candidate);
    let variance = combined_variance(reference, candidate);
    let variance = if variance > 0.0 { variance } else { 1.0 };
    (mse_val / variance).sqrt()
}

/// Standard 8-bit-channel peak signal-to-noise-ratio, in dB-equivalent raw
/// form (the rescaler takes its square root, matching the source's PSNR
/// transform).
pub fn psnr(reference: &[u8], candidate: &[u8]) -> f32 {
    let mse_val = mse(reference, candidate);
    if mse_val <= 0.0 {
        return f32::INFINITY;
    }
    (255.0 * 255.0) / mse_val
}

/// Global Pearson-style correlation coefficient between reference and
/// candidate luma.
pub fn cor(reference: &[u8], candidate: &[u8]) -> f32 {
    let n = reference.len() as f32;
    let mean_r: f32 = reference.iter().map(|&v| v as f32).sum::<f32>() / n;
    let mean_c: f32 = candidate.iter().map(|&v| v as f32).sum::<f32>() / n;

    let mut cov = 0.0f32;
    let mut var_r = 0.0f32;
    let mut var_c = 0.0f32;
    for (&a, &b) in reference.iter().zip(candidate.iter()) {
        let da = a as f32 - mean_r;
        let db = b as f32 - mean_c;
        cov += da * db;
        var_r += da * da;
        var_c += db * db;
    }
    let denom = (var_r * var_c).sqrt();
    if denom <= 0.0 {
        1.0
    } else {
        cov / denom
    }
}

/// If a metric returned a non-finite value, callers coerce it to 0 before
/// fusion or rescaling.
pub fn coerce_finite(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Computes `method`'s raw metric value over equi-dimensional luma buffers
/// and rescales it to the UM scale, including the fused methods (`Sum`,
/// `SsimFry`, `SsimShb`) which combine several of the "given" perceptual
/// metrics via [`crate::rescale::fuse_summet`] / [`crate::rescale::fuse_pair`].
/// `Method::Fast` has no scalar metric, it short-circuits the whole pipeline
/// via the perceptual hash instead, and is rejected here so a caller wiring
/// it in by mistake gets a clear error rather than a nonsensical UM value.
pub fn evaluate_um(
    method: crate::run::Method,
    reference_y: &[u8],
    candidate_y: &[u8],
    width: usize,
    height: usize,
) -> crate::error::Result<f32> {
    use crate::rescale::{fuse_pair, fuse_summet, rescale};
    use crate::run::Method;

    let ssim_um = || rescale(Method::Ssim, ssim(reference_y, candidate_y, width, height));
    let smallfry_um = || rescale(Method::SmallFry, smallfry(reference_y, candidate_y, width, height));
    let sharpenbad_um = || rescale(Method::SharpenBad, sharpenbad(reference_y, candidate_y, width, height, 1));
    let nhw_um = || rescale(Method::Nhw, nhw(reference_y, candidate_y, width, height));
    let vifp1_um = || rescale(Method::VifP1, vifp1(reference_y, candidate_y, width, height));

    let um = match method {
        Method::Fast => return Err(crate::error::Error::internal("Fast has no scalar UM metric")),
        Method::MPE => rescale(Method::MPE, mpe(reference_y, candidate_y)),
        Method::Mse => rescale(Method::Mse, mse(reference_y, candidate_y)),
        Method::Psnr => rescale(Method::Psnr, psnr(reference_y, candidate_y)),
        Method::Msef => rescale(Method::Msef, msef(reference_y, candidate_y)),
        Method::Cor => rescale(Method::Cor, cor(reference_y, candidate_y)),
        Method::Ssim => ssim_um(),
        Method::MsSsim => rescale(Method::MsSsim, ms_ssim(reference_y, candidate_y, width, height)),
        Method::VifP1 => vifp1_um(),
        Method::SmallFry => smallfry_um(),
        Method::SharpenBad => sharpenbad_um(),
        Method::Nhw => nhw_um(),
        Method::SsimFry => fuse_pair(ssim_um(), smallfry_um()),
        Method::SsimShb => fuse_pair(ssim_um(), sharpenbad_um()),
        Method::Sum => fuse_summet(ssim_um(), smallfry_um(), sharpenbad_um(), nhw_um(), vifp1_um()),
    };

    Ok(coerce_finite(um))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn mse_of_identical_images_is_zero() {
        let a = vec![10u8, 20, 30, 40];
        assert_eq!(mse(&a, &a), 0.0);
    }

    #[test]
    fn cor_of_identical_images_is_one() {
        let a = vec![10u8, 50, 90, 130, 200];
        assert!(approx_eq(cor(&a, &a), 1.0, 1e-4));
    }

    #[test]
    fn psnr_of_identical_images_is_infinite() {
        let a = vec![1u8, 2, 3];
        assert!(psnr(&a, &a).is_infinite());
    }

    #[test]
    fn coerce_finite_replaces_non_finite_values() {
        assert_eq!(coerce_finite(f32::INFINITY), 0.0);
        assert_eq!(coerce_finite(f32::NAN), 0.0);
        assert_eq!(coerce_finite(0.42), 0.42);
    }

    fn gradient_image(width: usize, height: usize) -> Vec<u8> {
        (0..(width * height)).map(|i| (i % 256) as u8).collect()
    }

    #[test]
    fn evaluate_um_of_identical_images_is_near_lossless_for_every_method() {
        let image = gradient_image(16, 16);
        for method in [
            crate::run::Method::MPE,
            crate::run::Method::Mse,
            crate::run::Method::Psnr,
            crate::run::Method::Msef,
            crate::run::Method::Cor,
            crate::run::Method::Ssim,
            crate::run::Method::MsSsim,
            crate::run::Method::VifP1,
            crate::run::Method::SmallFry,
            crate::run::Method::SharpenBad,
            crate::run::Method::Nhw,
            crate::run::Method::SsimFry,
            crate::run::Method::SsimShb,
            crate::run::Method::Sum,
        ] {
            let um = evaluate_um(method, &image, &image, 16, 16).expect("evaluate_um failed");
            assert!(um.is_finite(), "{method:?} produced a non-finite UM value");
        }
    }

    #[test]
    fn evaluate_um_rejects_fast() {
        let image = gradient_image(8, 8);
        assert!(evaluate_um(crate::run::Method::Fast, &image, &image, 8, 8).is_err());
    }
}
