//! Depth extraction from the converter's diagnostic stream
//!
//! dvisvgm reports the typeset box geometry on stderr, e.g.
//!
//! ```text
//! processing page 1
//!   width=37.641994pt, height=10.2pt, depth=3.444443pt
//! ```
//!
//! Only the depth (baseline-to-bottom distance, TeX pt) matters here. The
//! scan is deliberately tolerant: a missing or unparsable marker means a
//! fragment with no descenders, so it yields 0 instead of an error.

use std::sync::OnceLock;

use regex::Regex;

static DEPTH_RE: OnceLock<Regex> = OnceLock::new();

fn depth_re() -> &'static Regex {
    DEPTH_RE.get_or_init(|| Regex::new(r"\bdepth=(-?[0-9.]+(?:e-?[0-9]+)?)pt").unwrap())
}

/// Scan a diagnostic stream for the depth marker, in TeX points
pub fn depth_points(log: &str) -> f64 {
    depth_re()
        .captures(log)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .unwrap_or(0.0)
}
