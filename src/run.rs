//! Immutable run configuration shared by the CLI front end and the
//! bisection/ZF-point drivers.

use crate::image::Subsampling;
use crate::rescale::{Preset, PresetTable};

/// The quality metric (or `Fast` perceptual-hash shortcut) a driver
/// iterates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Fast,
    MPE,
    Mse,
    Psnr,
    Msef,
    Ssim,
    MsSsim,
    VifP1,
    SmallFry,
    SharpenBad,
    Cor,
    Nhw,
    SsimFry,
    SsimShb,
    Sum,
}

/// The output container a run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    WebP,
}

/// What a run bisects against: an explicit numeric UM-scale target, or a
/// named quality preset resolved through a `PresetTable`.
#[derive(Debug, Clone, Copy)]
pub enum Target {
    Value(f32),
    Named(Preset),
}

/// Immutable configuration for a single recompression, built once by the
/// CLI front end (or a caller embedding this crate) and then shared
/// read-only by the chosen driver.
#[derive(Debug, Clone)]
pub struct Run {
    pub method: Method,
    pub target: Target,
    pub preset_table: PresetTable,
    pub jpeg_min: u8,
    pub jpeg_max: u8,
    pub subsampling: Subsampling,
    pub output_format: OutputFormat,
    pub strip_metadata: bool,
    pub force: bool,
    pub copy_on_no_gain: bool,
    pub accurate: bool,
    pub quiet: bool,
    pub sentinel: String,
}

impl Default for Run {
    fn default() -> Self {
        Self {
            method: Method::SmallFry,
            target: Target::Named(Preset::Medium),
            preset_table: PresetTable::Current,
            jpeg_min: crate::constants::DEFAULT_JPEG_MIN,
            jpeg_max: crate::constants::DEFAULT_JPEG_MAX,
            subsampling: Subsampling::Default,
            output_format: OutputFormat::Jpeg,
            strip_metadata: false,
            force: false,
            copy_on_no_gain: true,
            accurate: false,
            quiet: false,
            sentinel: crate::constants::SENTINEL_COMMENT.to_string(),
        }
    }
}

impl Run {
    /// Resolves this run's `Target` to a concrete UM-scale threshold.
    pub fn target_threshold(&self) -> f32 {
        match self.target {
            Target::Value(v) => v,
            Target::Named(preset) => crate::rescale::preset_threshold(self.preset_table, preset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_run_targets_medium_preset() {
        let run = Run::default();
        assert!((run.target_threshold() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn explicit_value_target_bypasses_preset_table() {
        let mut run = Run::default();
        run.target = Target::Value(0.42);
        assert!((run.target_threshold() - 0.42).abs() < 1e-6);
    }
}
