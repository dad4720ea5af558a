//! texfrag - render LaTeX fragments as baseline-aligned inline SVG
//!
//! This library compiles a LaTeX fragment with an external toolchain
//! (latex + dvisvgm, optionally scour) and post-processes the resulting SVG
//! so it can be dropped inline into HTML or EPUB content: dimensions in em
//! units, a `vertical-align` style that lines the formula's baseline up with
//! the surrounding text, and per-document id namespacing so several
//! formulas can share a page.
//!
//! # Example
//!
//! ```no_run
//! use texfrag::convert;
//!
//! let out = convert(r"$\sqrt{x}$").unwrap();
//! assert!(out.svg.contains("<svg"));
//! println!("baseline offset: {}em", out.valign);
//! ```

pub mod config;
pub mod document;
pub mod extract;
pub mod postprocess;
pub mod toolchain;

pub use config::{ConfigError, ConfigOverrides, ConversionConfig, Optimizer};
pub use document::TemplateError;
pub use postprocess::{Degradation, FixedPrefix, PrefixSource, RandomPrefix};
pub use toolchain::{CompilationError, ConversionError, SystemToolchain, Toolchain};

use thiserror::Error;
use tracing::debug;

/// Errors that can occur during the conversion pipeline
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The fragment was empty or whitespace-only
    #[error("empty LaTeX fragment")]
    EmptyFragment,

    /// Invalid option value
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The document template lacks a required placeholder
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// The typesetting engine rejected the fragment; carries its
    /// diagnostics verbatim
    #[error("compilation failed: {0}")]
    Compilation(#[from] CompilationError),

    /// The DVI→SVG step produced no usable SVG
    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    /// Temporary workspace could not be created
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of one conversion; owned by the caller
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// Post-processed SVG markup
    pub svg: String,
    /// Baseline offset in em, applied via `vertical-align`; zero or
    /// negative (the image drops by the depth of the typeset box)
    pub valign: f64,
    /// Image width in em
    pub width: f64,
    /// Image height in em
    pub height: f64,
    /// Set when a soft failure (failed minifier) degraded the output
    pub degradation: Option<Degradation>,
}

/// Convert a LaTeX fragment with the default configuration
///
/// This is the main entry point for the library. It requires `latex`,
/// `dvisvgm` and `scour` on the PATH.
pub fn convert(fragment: &str) -> Result<ConversionOutput, ConvertError> {
    convert_with_config(fragment, ConversionConfig::default())
}

/// Convert a LaTeX fragment with a custom configuration
pub fn convert_with_config(
    fragment: &str,
    config: ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    convert_with_toolchain(
        fragment,
        &config,
        &SystemToolchain::default(),
        &mut RandomPrefix,
    )
}

/// Convert with an explicit toolchain and id-prefix source
///
/// The full injection point: tests pass a fake toolchain and a fixed prefix
/// to run the pipeline without a TeX installation and with deterministic
/// output. All temporary files live in a private directory that is removed
/// on every exit path.
pub fn convert_with_toolchain(
    fragment: &str,
    config: &ConversionConfig,
    toolchain: &dyn Toolchain,
    prefixes: &mut dyn PrefixSource,
) -> Result<ConversionOutput, ConvertError> {
    config.validate()?;
    if fragment.trim().is_empty() {
        return Err(ConvertError::EmptyFragment);
    }

    let document = document::assemble(fragment, config)?;

    // dropped (and deleted) on every path out of this function
    let workdir = tempfile::tempdir()?;

    let artifact = toolchain.typeset(workdir.path(), &document)?;
    let raw = toolchain.render(&artifact)?;
    let processed = postprocess::postprocess(&raw, config, toolchain, prefixes)?;

    debug!(
        width_em = processed.geometry.width_em,
        height_em = processed.geometry.height_em,
        valign_em = processed.geometry.valign_em,
        degraded = processed.degradation.is_some(),
        "conversion finished"
    );

    Ok(ConversionOutput {
        svg: processed.svg,
        valign: processed.geometry.valign_em,
        width: processed.geometry.width_em,
        height: processed.geometry.height_em,
        degradation: processed.degradation,
    })
}
