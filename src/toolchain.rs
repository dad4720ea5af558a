//! External toolchain boundary: latex, dvisvgm, and the SVG minifier
//!
//! Every external process sits behind the `Toolchain` trait so the pipeline
//! can be exercised in tests with fakes instead of a real TeX installation.
//! `SystemToolchain` is the production implementation; command lines are
//! plain data so callers can point it at different binaries.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

/// Name of the temporary source/artifact files inside the work directory
const JOB_NAME: &str = "fragment";

/// Raw output of the DVI→SVG step: the markup plus the converter's
/// diagnostic stream (which carries the depth marker)
#[derive(Debug, Clone)]
pub struct RawConversion {
    pub svg: String,
    pub log: String,
}

/// The typesetting engine rejected the document or could not run
#[derive(Error, Debug)]
pub enum CompilationError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    /// Diagnostics are the engine's output verbatim; LaTeX reports errors on
    /// stdout, so both streams are preserved.
    #[error("{command} exited with {status}\n{diagnostics}")]
    Failed {
        command: String,
        status: String,
        diagnostics: String,
    },
    #[error("failed to write document source: {0}")]
    Io(#[from] std::io::Error),
}

/// The DVI→SVG converter produced no usable SVG
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("{command} exited with {status}\n{diagnostics}")]
    Failed {
        command: String,
        status: String,
        diagnostics: String,
    },
    #[error("converter produced no SVG output")]
    EmptySvg,
    #[error("SVG root element has no usable '{0}' attribute")]
    MalformedSvg(&'static str),
}

/// Minifier failure; always recovered by falling back to the unminified SVG
#[derive(Error, Debug)]
pub enum MinifierError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("{command} exited with {status}")]
    Failed { command: String, status: String },
    #[error("minifier produced no output")]
    EmptyOutput,
}

/// Capability interface over the external tools used by one conversion
pub trait Toolchain {
    /// Compile `document` inside `workdir`, returning the typeset artifact path
    fn typeset(&self, workdir: &Path, document: &str) -> Result<PathBuf, CompilationError>;

    /// Convert the typeset artifact to SVG markup plus a diagnostic stream
    fn render(&self, artifact: &Path) -> Result<RawConversion, ConversionError>;

    /// Minify SVG markup (stdin → stdout contract)
    fn minify(&self, svg: &str) -> Result<String, MinifierError>;
}

/// Production toolchain invoking latex, dvisvgm and scour as subprocesses
#[derive(Debug, Clone)]
pub struct SystemToolchain {
    /// Typesetting command and arguments (the `.tex` file is appended)
    pub latex: Vec<String>,
    /// DVI→SVG command and arguments (the artifact path is appended);
    /// must write the SVG to stdout and its measurements to stderr
    pub dvisvgm: Vec<String>,
    /// Minifier command and arguments (SVG on stdin, minified SVG on stdout)
    pub minifier: Vec<String>,
    /// Ghostscript library path exported as `LIBGS` for dvisvgm
    pub libgs: Option<PathBuf>,
}

impl Default for SystemToolchain {
    fn default() -> Self {
        Self {
            latex: vec![
                "latex".into(),
                "-interaction".into(),
                "nonstopmode".into(),
                "-halt-on-error".into(),
            ],
            dvisvgm: vec![
                "dvisvgm".into(),
                "--no-fonts".into(),
                "--exact-bbox".into(),
                "--stdout".into(),
            ],
            minifier: vec![
                "scour".into(),
                "--no-line-breaks".into(),
                "--remove-metadata".into(),
                "--enable-comment-stripping".into(),
            ],
            libgs: None,
        }
    }
}

impl SystemToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Ghostscript library path passed to dvisvgm via `LIBGS`
    pub fn with_libgs(mut self, path: impl Into<PathBuf>) -> Self {
        self.libgs = Some(path.into());
        self
    }
}

impl Toolchain for SystemToolchain {
    fn typeset(&self, workdir: &Path, document: &str) -> Result<PathBuf, CompilationError> {
        let tex_file = workdir.join(format!("{JOB_NAME}.tex"));
        std::fs::write(&tex_file, document)?;

        let (program, args) = split_command(&self.latex);
        debug!(command = program, dir = %workdir.display(), "typesetting fragment");
        let output = Command::new(program)
            .args(args)
            .arg(format!("{JOB_NAME}.tex"))
            .current_dir(workdir)
            .output()
            .map_err(|e| CompilationError::Spawn {
                command: program.to_string(),
                source: e,
            })?;

        if !output.status.success() {
            // LaTeX writes its error log to stdout and little to stderr;
            // keep both, verbatim, for the caller to surface.
            let mut diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
            diagnostics.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(CompilationError::Failed {
                command: program.to_string(),
                status: output.status.to_string(),
                diagnostics,
            });
        }

        Ok(workdir.join(format!("{JOB_NAME}.dvi")))
    }

    fn render(&self, artifact: &Path) -> Result<RawConversion, ConversionError> {
        let (program, args) = split_command(&self.dvisvgm);
        debug!(command = program, artifact = %artifact.display(), "converting to SVG");
        let mut cmd = Command::new(program);
        cmd.args(args).arg(artifact);
        if let Some(libgs) = &self.libgs {
            cmd.env("LIBGS", libgs);
        }
        let output = cmd.output().map_err(|e| ConversionError::Spawn {
            command: program.to_string(),
            source: e,
        })?;

        let log = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(ConversionError::Failed {
                command: program.to_string(),
                status: output.status.to_string(),
                diagnostics: log,
            });
        }

        let svg = String::from_utf8_lossy(&output.stdout).into_owned();
        if svg.trim().is_empty() {
            return Err(ConversionError::EmptySvg);
        }
        Ok(RawConversion { svg, log })
    }

    fn minify(&self, svg: &str) -> Result<String, MinifierError> {
        let (program, args) = split_command(&self.minifier);
        debug!(command = program, "minifying SVG");
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| MinifierError::Spawn {
                command: program.to_string(),
                source: e,
            })?;

        // stdin is dropped at the end of the scope, closing the pipe
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(svg.as_bytes())
                .map_err(|e| MinifierError::Spawn {
                    command: program.to_string(),
                    source: e,
                })?;
        }

        let output = child.wait_with_output().map_err(|e| MinifierError::Spawn {
            command: program.to_string(),
            source: e,
        })?;

        if !output.status.success() {
            return Err(MinifierError::Failed {
                command: program.to_string(),
                status: output.status.to_string(),
            });
        }
        let minified = String::from_utf8_lossy(&output.stdout).into_owned();
        if minified.trim().is_empty() {
            return Err(MinifierError::EmptyOutput);
        }
        Ok(minified)
    }
}

fn split_command(command: &[String]) -> (&str, &[String]) {
    match command.split_first() {
        Some((program, args)) => (program.as_str(), args),
        // An empty command vector can only come from caller misconfiguration;
        // let the spawn fail with a clear "not found" error.
        None => ("", &[]),
    }
}
