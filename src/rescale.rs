//! Per-metric UM-scale rescaling, the variance-weighted SUMMET fusion used
//! by `Method::Sum`, the two-metric fused methods, and the quality-preset
//! tables consumed by `--preset`/`--preset-table`.

use crate::run::Method;

/// Sigma contraction: maps an arbitrary-range correlation-like value into
/// `(0, inf)`, folding large values below 1 back in by reciprocating first.
pub fn sigma(cor: f32) -> f32 {
    let cor = cor.abs();
    if cor > 1.0 {
        let inv = 1.0 / cor;
        let s = 1.0 - (1.0 - inv * inv).sqrt();
        if s == 0.0 {
            f32::INFINITY
        } else {
            1.0 / s
        }
    } else {
        1.0 - (1.0 - cor * cor).sqrt()
    }
}

/// Rescales a raw metric value onto the shared "UM" quality scale used to
/// compare thresholds across methods. Mirrors the original's per-metric
/// switch, including MSE fallthrough into the MPE branch after taking its
/// square root.
pub fn rescale(method: Method, value: f32) -> f32 {
    match method {
        Method::Mse => rescale_mpe(value.sqrt()),
        Method::MPE => rescale_mpe(value),
        Method::Psnr => (value.sqrt() - 5.0) * 0.557,
        Method::Msef => {
            if value > 0.0 {
                (((1.0 / value).sqrt().sqrt()) - 1.0) * 0.5
            } else {
                1.0
            }
        }
        Method::Cor => sigma(sigma(value)) * 1.0,
        Method::Ssim => sigma(sigma(sigma(value))) * 1.57,
        Method::MsSsim => sigma(sigma(value)) * 1.59,
        Method::VifP1 => sigma(sigma(value)) * 1.10,
        Method::SmallFry => (value * 0.01 - 0.8) * 3.0,
        Method::SharpenBad => sigma(value) * 1.46,
        Method::Nhw => {
            if value > 0.0 {
                (((1.0 / value).sqrt().sqrt()) - 1.0) * 0.342
            } else {
                1.0
            }
        }
        // Fused methods and Fast have no single raw value to rescale;
        // callers compute them via `fuse_summet`/`fuse_pair` instead.
        Method::SsimFry | Method::SsimShb | Method::Sum | Method::Fast => value,
    }
}

fn rescale_mpe(v: f32) -> f32 {
    if v > 0.0 {
        (((255.0 / v).sqrt().sqrt()) - 1.0) * 0.29
    } else {
        1.0
    }
}

/// Variance-weighted fusion ("SUMMET"): a plain mean if the population of
/// rescaled values has zero spread, otherwise a mean weighted toward
/// values close to the population mean (outliers get down-weighted).
pub fn waverage(values: &[f32]) -> f32 {
    let n = values.len() as f32;
    if n == 0.0 {
        return 0.0;
    }
    let mean: f32 = values.iter().sum::<f32>() / n;
    let deviations: Vec<f32> = values.iter().map(|&v| (v - mean).powi(2)).collect();
    let mean_deviation: f32 = deviations.iter().sum::<f32>() / n;

    if mean_deviation > 0.0 {
        let weights: Vec<f32> = deviations
            .iter()
            .map(|&d| mean_deviation / (mean_deviation + d))
            .collect();
        let weight_sum: f32 = weights.iter().sum();
        let weighted: f32 = values.iter().zip(weights.iter()).map(|(&v, &w)| v * w).sum();
        weighted / weight_sum
    } else {
        mean
    }
}

/// Fuses the five "given" perceptual metrics (SSIM, SMALLFRY, SHARPENBAD,
/// NHW, VIFP1), already rescaled to UM scale, via `waverage`. Used by
/// `Method::Sum`.
pub fn fuse_summet(ssim_um: f32, smallfry_um: f32, sharpenbad_um: f32, nhw_um: f32, vifp1_um: f32) -> f32 {
    waverage(&[
        crate::metrics::coerce_finite(ssim_um),
        crate::metrics::coerce_finite(smallfry_um),
        crate::metrics::coerce_finite(sharpenbad_um),
        crate::metrics::coerce_finite(nhw_um),
        crate::metrics::coerce_finite(vifp1_um),
    ])
}

/// Fuses two already-rescaled UM values by plain arithmetic mean. Used by
/// `Method::SsimFry` (SSIM + SMALLFRY) and `Method::SsimShb` (SSIM +
/// SHARPENBAD).
pub fn fuse_pair(a_um: f32, b_um: f32) -> f32 {
    (crate::metrics::coerce_finite(a_um) + crate::metrics::coerce_finite(b_um)) / 2.0
}

/// A named quality-preset target threshold table, selected by
/// `--preset-table`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetTable {
    /// The table this port treats as current/default.
    Current,
    /// The older three-point table some upstream builds shipped.
    Legacy,
}

/// A named quality preset, resolved against the selected `PresetTable` to
/// a UM-scale target threshold consumed by the bisection driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Low,
    Medium,
    Subhigh,
    High,
    Veryhigh,
}

/// Resolves a preset name to its UM-scale target threshold under the given
/// table. The legacy table only defines three presets; presets it doesn't
/// carry fall back to the current table's value.
pub fn preset_threshold(table: PresetTable, preset: Preset) -> f32 {
    match table {
        PresetTable::Current => match preset {
            Preset::Low => 0.5,
            Preset::Medium => 0.75,
            Preset::Subhigh => 0.875,
            Preset::High => 0.9375,
            Preset::Veryhigh => 0.96875,
        },
        PresetTable::Legacy => match preset {
            Preset::Medium => 0.76,
            Preset::High => 0.93,
            Preset::Veryhigh => 0.99,
            other => preset_threshold(PresetTable::Current, other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn sigma_of_zero_is_zero() {
        assert_eq!(sigma(0.0), 0.0);
    }

    #[test]
    fn sigma_reciprocates_values_above_one() {
        let value = sigma(2.0);
        assert!(value.is_finite() || value.is_infinite());
    }

    #[test]
    fn waverage_falls_back_to_mean_when_uniform() {
        let values = [2.0, 2.0, 2.0];
        assert!(approx_eq(waverage(&values), 2.0, 1e-6));
    }

    #[test]
    fn waverage_downweights_outliers() {
        let values = [1.0, 1.0, 1.0, 100.0];
        let result = waverage(&values);
        assert!(result < 25.0);
    }

    #[test]
    fn preset_thresholds_match_current_table() {
        assert!(approx_eq(
            preset_threshold(PresetTable::Current, Preset::Medium),
            0.75,
            1e-6
        ));
        assert!(approx_eq(
            preset_threshold(PresetTable::Legacy, Preset::Medium),
            0.76,
            1e-6
        ));
        assert!(approx_eq(
            preset_threshold(PresetTable::Legacy, Preset::Low),
            0.5,
            1e-6
        ));
    }

    #[test]
    fn rescale_mse_matches_mpe_after_sqrt() {
        let mse_value = 16.0f32;
        let mpe_value = mse_value.sqrt();
        assert!(approx_eq(
            rescale(Method::Mse, mse_value),
            rescale(Method::MPE, mpe_value),
            1e-6
        ));
    }
}
