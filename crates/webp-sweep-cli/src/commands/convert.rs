//! Single conversion command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;
use webp_sweep::{ParameterSet, SsimComparator, WebpCodec, convert_once, load_source};

pub fn run(source: PathBuf, method: u8, quality: u8, output: Option<PathBuf>) -> Result<()> {
    let params = ParameterSet::new(method, quality)?;
    let output = output.unwrap_or_else(|| source.with_extension("webp"));

    let image = load_source(&source)?;
    let info = image.info();
    println!(
        "Source: {} ({}x{}, {}, {} bytes)",
        source.display(),
        info.width,
        info.height,
        info.color_model,
        info.byte_size
    );

    let codec = WebpCodec::new();
    let comparator = SsimComparator::new();
    let conversion = convert_once(&codec, &comparator, &image, &params, &output)
        .with_context(|| format!("Conversion with {} failed", params))?;

    let result = &conversion.result;
    println!("Output: {}", conversion.artifact_path.display());
    println!("Parameters: {}", params);
    println!("Encode time: {:.2} ms", result.elapsed_ms);
    println!("Size: {} bytes", result.artifact_bytes);
    let ratio = result.compression_ratio(info.byte_size);
    println!("Compression ratio: {:.2}x", ratio);
    println!("SSIM: {:.5}", result.similarity);

    let (width, height) = conversion.artifact_dimensions;
    debug!(
        width,
        height,
        alpha = conversion.artifact_has_alpha,
        "decoded artifact"
    );

    Ok(())
}
