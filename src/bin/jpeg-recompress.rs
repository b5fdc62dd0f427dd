//! CLI front end: wires parsed arguments into a `Run`, sniffs and decodes
//! the input, picks a driver (target-quality or ZF-point) and an output
//! codec (JPEG or WebP), and writes the result.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use jpeg_recompress_rs::codec::jpeg::JpegCodec;
use jpeg_recompress_rs::codec::webp::WebPCodec;
use jpeg_recompress_rs::codec::{sniff, Codec, SniffedFormat};
use jpeg_recompress_rs::constants::SENTINEL_COMMENT;
use jpeg_recompress_rs::driver::{target_quality, zf_point};
use jpeg_recompress_rs::error::Error;
use jpeg_recompress_rs::image::{ImageBuffer, Subsampling};
use jpeg_recompress_rs::pixel::{hamming_distance, perceptual_hash};
use jpeg_recompress_rs::rescale::{Preset as CorePreset, PresetTable as CorePresetTable};
use jpeg_recompress_rs::run::{Method as CoreMethod, OutputFormat, Run, Target};
use jpeg_recompress_rs::ppm;

/// Side length (in pixels) of the thumbnail `fast` hashes down to before
/// comparing; 8x8 gives a 64-bit hash, matching the common pHash
/// convention this crate's perceptual hash is modelled on (resolved in
/// DESIGN.md).
const FAST_HASH_SIDE: usize = 8;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MethodArg {
    Fast,
    Mpe,
    Mse,
    Psnr,
    Msef,
    Ssim,
    #[value(name = "ms-ssim")]
    MsSsim,
    Vifp1,
    Smallfry,
    Shbad,
    Cor,
    Nhw,
    Ssimfry,
    Ssimshb,
    Sum,
}

impl From<MethodArg> for CoreMethod {
    fn from(value: MethodArg) -> Self {
        match value {
            MethodArg::Fast => CoreMethod::Fast,
            MethodArg::Mpe => CoreMethod::MPE,
            MethodArg::Mse => CoreMethod::Mse,
            MethodArg::Psnr => CoreMethod::Psnr,
            MethodArg::Msef => CoreMethod::Msef,
            MethodArg::Ssim => CoreMethod::Ssim,
            MethodArg::MsSsim => CoreMethod::MsSsim,
            MethodArg::Vifp1 => CoreMethod::VifP1,
            MethodArg::Smallfry => CoreMethod::SmallFry,
            MethodArg::Shbad => CoreMethod::SharpenBad,
            MethodArg::Cor => CoreMethod::Cor,
            MethodArg::Nhw => CoreMethod::Nhw,
            MethodArg::Ssimfry => CoreMethod::SsimFry,
            MethodArg::Ssimshb => CoreMethod::SsimShb,
            MethodArg::Sum => CoreMethod::Sum,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum PresetArg {
    Low,
    Medium,
    Subhigh,
    High,
    Veryhigh,
}

impl From<PresetArg> for CorePreset {
    fn from(value: PresetArg) -> Self {
        match value {
            PresetArg::Low => CorePreset::Low,
            PresetArg::Medium => CorePreset::Medium,
            PresetArg::Subhigh => CorePreset::Subhigh,
            PresetArg::High => CorePreset::High,
            PresetArg::Veryhigh => CorePreset::Veryhigh,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum PresetTableArg {
    Current,
    Legacy,
}

impl From<PresetTableArg> for CorePresetTable {
    fn from(value: PresetTableArg) -> Self {
        match value {
            PresetTableArg::Current => CorePresetTable::Current,
            PresetTableArg::Legacy => CorePresetTable::Legacy,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SubsampleArg {
    Default,
    Disable,
}

impl From<SubsampleArg> for Subsampling {
    fn from(value: SubsampleArg) -> Self {
        match value {
            SubsampleArg::Default => Subsampling::Default,
            SubsampleArg::Disable => Subsampling::Disabled,
        }
    }
}

/// Bisects a JPEG/WebP codec's quality axis to shrink a file without
/// visible perceptual loss.
#[derive(Parser, Debug)]
#[command(name = "jpeg-recompress", version, about)]
struct Cli {
    /// Input path, or `-` for stdin.
    input: PathBuf,

    /// Output path, or `-` for stdout. With `--method fast` this is the
    /// second JPEG to compare against `input` instead of an output path.
    output: PathBuf,

    /// Quality metric to bisect against (`fast` instead runs a direct
    /// perceptual-hash comparison between `input` and `output`).
    #[arg(long, value_enum, default_value = "smallfry")]
    method: MethodArg,

    /// Explicit UM-scale target, overriding `--preset`.
    #[arg(long)]
    target: Option<f32>,

    /// Named quality preset resolved through `--preset-table`.
    #[arg(long, value_enum, default_value = "medium")]
    preset: PresetArg,

    /// Which preset-to-target table `--preset` is resolved against.
    #[arg(long = "preset-table", value_enum, default_value = "current")]
    preset_table: PresetTableArg,

    /// Lower bound of the quality search (1-100).
    #[arg(long, default_value_t = jpeg_recompress_rs::constants::DEFAULT_JPEG_MIN)]
    min: u8,

    /// Upper bound of the quality search (1-100).
    #[arg(long, default_value_t = jpeg_recompress_rs::constants::DEFAULT_JPEG_MAX)]
    max: u8,

    /// Chroma subsampling mode for JPEG output.
    #[arg(long, value_enum, default_value = "default")]
    subsample: SubsampleArg,

    /// Drop source metadata instead of carrying it into the output.
    #[arg(long)]
    strip: bool,

    /// Write output even if it is not smaller than the input.
    #[arg(long)]
    force: bool,

    /// Fail instead of copying the input through when no candidate beats it.
    #[arg(long = "no-copy")]
    no_copy: bool,

    /// Build per-image Huffman tables on every iteration, not just the last.
    #[arg(long)]
    accurate: bool,

    /// Suppress the per-iteration progress line.
    #[arg(long)]
    quiet: bool,

    /// Encode output as WebP instead of JPEG.
    #[arg(long)]
    webp: bool,

    /// Use the ZF-point locator instead of bisecting against an explicit target.
    #[arg(long)]
    zf: bool,
}

fn read_bytes(path: &Path) -> std::io::Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read(path)
    }
}

fn write_bytes(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if path == Path::new("-") {
        std::io::stdout().write_all(bytes)
    } else {
        std::fs::write(path, bytes)
    }
}

fn decode_input(sniffed: SniffedFormat, bytes: &[u8]) -> Result<ImageBuffer, Error> {
    match sniffed {
        SniffedFormat::Jpeg => Ok(JpegCodec.decode(bytes)?.image),
        SniffedFormat::WebP => Ok(WebPCodec.decode(bytes)?.image),
        SniffedFormat::Ppm => ppm::decode(bytes),
        SniffedFormat::Unknown => Err(Error::decode("unrecognised input format (not JPEG, PPM, or WebP)")),
    }
}

/// `--method fast`: a direct perceptual-hash comparison between two JPEGs,
/// reported as a `0..=99` distance on stdout (identical images score `0`).
fn run_fast_compare(input_path: &Path, output_path: &Path) -> Result<(), Error> {
    let a_bytes = read_bytes(input_path)?;
    let b_bytes = read_bytes(output_path)?;

    if sniff(&a_bytes) != SniffedFormat::Jpeg || sniff(&b_bytes) != SniffedFormat::Jpeg {
        return Err(Error::config("fast comparison requires two JPEG inputs"));
    }

    let a = JpegCodec.decode(&a_bytes)?.image;
    let b = JpegCodec.decode(&b_bytes)?.image;

    let a_y = a.to_luma();
    let b_y = b.to_luma();

    let hash_a = perceptual_hash(&a_y, a.width, a.height, FAST_HASH_SIDE);
    let hash_b = perceptual_hash(&b_y, b.width, b.height, FAST_HASH_SIDE);
    let distance = hamming_distance(&hash_a, &hash_b);
    let bits = (FAST_HASH_SIDE * FAST_HASH_SIDE) as f32;

    let score = (distance as f32 / bits * 99.0).round().clamp(0.0, 99.0) as i32;
    println!("{score}");
    Ok(())
}

fn build_run(cli: &Cli) -> Run {
    let target = match cli.target {
        Some(value) => Target::Value(value),
        None => Target::Named(cli.preset.into()),
    };

    Run {
        method: cli.method.into(),
        target,
        preset_table: cli.preset_table.into(),
        jpeg_min: cli.min,
        jpeg_max: cli.max,
        subsampling: cli.subsample.into(),
        output_format: if cli.webp { OutputFormat::WebP } else { OutputFormat::Jpeg },
        strip_metadata: cli.strip,
        force: cli.force,
        copy_on_no_gain: !cli.no_copy,
        accurate: cli.accurate,
        quiet: cli.quiet,
        sentinel: SENTINEL_COMMENT.to_string(),
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    if matches!(cli.method, MethodArg::Fast) {
        return run_fast_compare(&cli.input, &cli.output);
    }

    if cli.min > cli.max {
        return Err(Error::config("--min must be <= --max"));
    }

    let input_bytes = read_bytes(&cli.input)?;
    let sniffed = sniff(&input_bytes);
    let reference = decode_input(sniffed, &input_bytes)?;
    let reference_y = reference.to_luma();

    let run_config = build_run(cli);
    let codec: Box<dyn Codec> = if cli.webp { Box::new(WebPCodec) } else { Box::new(JpegCodec) };

    let output_bytes = if cli.zf {
        zf_point::locate(codec.as_ref(), sniffed, &reference, &reference_y, &input_bytes, &run_config)?
    } else {
        target_quality::recompress(codec.as_ref(), sniffed, &reference, &reference_y, &input_bytes, &run_config)?
    };

    write_bytes(&cli.output, &output_bytes)?;
    if !run_config.quiet {
        eprintln!(
            "{} -> {} bytes ({} -> {})",
            input_bytes.len(),
            output_bytes.len(),
            cli.input.display(),
            cli.output.display()
        );
    }
    Ok(())
}

fn exit_code_for(err: &Error) -> ExitCode {
    match err {
        Error::AlreadyProcessed => ExitCode::from(2),
        _ => ExitCode::from(1),
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(255);
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err}");
            exit_code_for(&err)
        }
    }
}
