//! SVG post-processing: the steps between raw converter output and the
//! embeddable result
//!
//! Order matters: comments and units first, then id namespacing (mandatory,
//! even when no optimizer follows), then the optional minifier, then the
//! prolog. Minifier failure degrades to the unminified SVG and is recorded
//! on the result instead of aborting the conversion.

pub mod ids;
pub mod rewrite;

pub use ids::{namespace_ids, FixedPrefix, PrefixSource, RandomPrefix};
pub use rewrite::{rewrite_root, strip_comments, strip_prolog, Geometry};

use tracing::warn;

use crate::config::{ConversionConfig, Optimizer};
use crate::extract;
use crate::toolchain::{ConversionError, RawConversion, Toolchain};

/// A recoverable quality loss during post-processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// The minifier failed; the unminified SVG was kept
    MinifierFailed(String),
}

/// Post-processed SVG plus its alignment metadata
#[derive(Debug, Clone)]
pub struct Processed {
    pub svg: String,
    pub geometry: Geometry,
    pub degradation: Option<Degradation>,
}

/// Run all post-processing steps on one raw conversion
pub fn postprocess(
    raw: &RawConversion,
    config: &ConversionConfig,
    toolchain: &dyn Toolchain,
    prefixes: &mut dyn PrefixSource,
) -> Result<Processed, ConversionError> {
    let depth_pt = extract::depth_points(&raw.log);

    let svg = strip_comments(&raw.svg);
    let (svg, geometry) = rewrite_root(&svg, depth_pt, config)?;
    let svg = namespace_ids(&svg, &prefixes.next_prefix());

    let (svg, degradation) = match config.optimizer {
        Optimizer::None => (svg, None),
        Optimizer::Minify => match toolchain.minify(&svg) {
            Ok(minified) => (minified, None),
            Err(err) => {
                warn!(error = %err, "minifier failed, keeping unminified SVG");
                let reason = err.to_string();
                (svg, Some(Degradation::MinifierFailed(reason)))
            }
        },
    };

    let svg = if config.strip_prolog {
        strip_prolog(&svg)
    } else {
        svg
    };

    Ok(Processed {
        svg,
        geometry,
        degradation,
    })
}
