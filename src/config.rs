//! Conversion configuration: defaults, overrides, and validation
//!
//! A `ConversionConfig` is built once (defaults plus any caller overrides)
//! and then shared read-only across conversions. Overrides can come from a
//! TOML file or be applied programmatically; both paths go through `merge`,
//! which validates before any external tool is invoked.

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// Conversion factor from TeX points (1/72.27 in) to CSS/DTP points (1/72 in).
///
/// dvisvgm reports box dimensions in TeX pt while the generated SVG is
/// consumed in CSS units, so every pt value read from the toolchain is
/// multiplied by this before the em conversion. Calibrated against dvisvgm's
/// own output; change it only together with the toolchain.
pub const TEX_PT_TO_CSS_PT: f64 = 72.27 / 72.0;

/// Default document font size in TeX points.
///
/// This must match the size declared in the document template's
/// `\documentclass` option: it is the divisor that turns pt dimensions into
/// em units, so a mismatch skews every reported width/height/valign.
pub const DEFAULT_FONT_SIZE_PT: f64 = 12.0;

/// Default document skeleton. Placeholders are replaced by the assembler.
pub const DEFAULT_TEMPLATE: &str = r"\documentclass[{{ fontsize }}pt,preview]{standalone}
{{ preamble }}
\begin{document}
\begin{preview}
{{ code }}
\end{preview}
\end{document}
";

/// Default preamble: math packages plus guards against old font commands
/// and a few common blackboard shortcuts.
pub const DEFAULT_PREAMBLE: &str = r"\usepackage[utf8x]{inputenc}
\usepackage{amsmath}
\usepackage{amsfonts}
\usepackage{amssymb}
\usepackage{amstext}
\usepackage{newtxtext}
\usepackage[libertine]{newtxmath}
% prevent errors from old font commands
\DeclareOldFontCommand{\rm}{\normalfont\rmfamily}{\mathrm}
\DeclareOldFontCommand{\sf}{\normalfont\sffamily}{\mathsf}
\DeclareOldFontCommand{\tt}{\normalfont\ttfamily}{\mathtt}
\DeclareOldFontCommand{\bf}{\normalfont\bfseries}{\mathbf}
\DeclareOldFontCommand{\it}{\normalfont\itshape}{\mathit}
% prevent errors from undefined shortcuts
\newcommand{\N}{\mathbb{N}}
\newcommand{\R}{\mathbb{R}}
\newcommand{\Z}{\mathbb{Z}}
";

/// Errors that can occur when building or loading a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("scale must be positive, got {0}")]
    InvalidScale(f64),
    #[error("font size must be positive, got {0}")]
    InvalidFontSize(f64),
    #[error("unknown optimizer '{0}' (expected 'minify' or 'none')")]
    UnknownOptimizer(String),
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// SVG optimizer choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Optimizer {
    /// Pipe the SVG through the external minifier
    Minify,
    /// Emit the post-processed SVG as-is
    None,
}

impl FromStr for Optimizer {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minify" => Ok(Optimizer::Minify),
            "none" => Ok(Optimizer::None),
            other => Err(ConfigError::UnknownOptimizer(other.to_string())),
        }
    }
}

/// Configuration for one or more conversions
///
/// Immutable by convention once built; clone it to vary options per call.
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// LaTeX source inserted at the template's preamble placeholder
    pub preamble: String,
    /// Document skeleton with `{{ fontsize }}`, `{{ preamble }}` and
    /// `{{ code }}` placeholders
    pub template: String,
    /// Declared document font size in TeX pt, also the em divisor
    pub font_size: f64,
    /// Optimizer to run after post-processing
    pub optimizer: Optimizer,
    /// Extra uniform scaling applied to the output dimensions
    pub scale: f64,
    /// Remove a leading XML declaration for inline embedding
    pub strip_prolog: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            preamble: DEFAULT_PREAMBLE.to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
            font_size: DEFAULT_FONT_SIZE_PT,
            optimizer: Optimizer::Minify,
            scale: 1.0,
            strip_prolog: true,
        }
    }
}

impl ConversionConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the LaTeX preamble
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    /// Set the document template
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Set the document font size (TeX pt)
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    /// Set the optimizer choice
    pub fn with_optimizer(mut self, optimizer: Optimizer) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Set the output scale factor
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Set whether the XML declaration is stripped from the output
    pub fn with_strip_prolog(mut self, strip: bool) -> Self {
        self.strip_prolog = strip;
        self
    }

    /// Overlay caller overrides onto this configuration and validate
    pub fn merge(mut self, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        if let Some(preamble) = overrides.preamble {
            self.preamble = preamble;
        }
        if let Some(template) = overrides.template {
            self.template = template;
        }
        if let Some(font_size) = overrides.font_size {
            self.font_size = font_size;
        }
        if let Some(optimizer) = overrides.optimizer {
            self.optimizer = optimizer;
        }
        if let Some(scale) = overrides.scale {
            self.scale = scale;
        }
        if let Some(strip) = overrides.strip_prolog {
            self.strip_prolog = strip;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check value invariants
    ///
    /// Runs before any boundary process is invoked, so invalid options never
    /// reach the toolchain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.scale > 0.0) {
            return Err(ConfigError::InvalidScale(self.scale));
        }
        if !(self.font_size > 0.0) {
            return Err(ConfigError::InvalidFontSize(self.font_size));
        }
        Ok(())
    }
}

/// A partial option set overlaid onto the defaults
///
/// Unknown option names are rejected when deserializing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub preamble: Option<String>,
    pub template: Option<String>,
    pub font_size: Option<f64>,
    pub optimizer: Option<Optimizer>,
    pub scale: Option<f64>,
    pub strip_prolog: Option<bool>,
}

impl ConfigOverrides {
    /// Load overrides from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse overrides from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
