//! texfrag CLI
//!
//! Reads a LaTeX fragment from stdin and writes the rendered SVG to stdout.
//! Baseline offset, width and height (all in em units) end up in the SVG's
//! own attributes, so the output can be inlined into HTML/EPUB as-is.
//!
//! Usage:
//!   echo '$x^2$' | texfrag > out.svg
//!   texfrag --preamble preamble.tex --optimizer none --scale 1.5 < in.tex

use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use texfrag::{convert_with_config, ConfigOverrides, ConversionConfig, Optimizer};

#[derive(Parser)]
#[command(name = "texfrag", version)]
#[command(about = "Render a LaTeX fragment from stdin as a baseline-aligned inline SVG on stdout")]
struct Cli {
    /// LaTeX preamble code to read from file
    #[arg(short, long)]
    preamble: Option<PathBuf>,

    /// SVG optimizer to use: minify (default) or none
    #[arg(short, long, value_parser = parse_optimizer)]
    optimizer: Option<Optimizer>,

    /// Extra output scaling (default: 1.0)
    #[arg(short, long)]
    scale: Option<f64>,

    /// Keep the XML declaration (for standalone .svg files)
    #[arg(long)]
    keep_prolog: bool,

    /// Configuration file (TOML), applied before the other flags
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn parse_optimizer(s: &str) -> Result<Optimizer, String> {
    Optimizer::from_str(s).map_err(|e| e.to_string())
}

/// Overlay command-line flags onto file-provided overrides
///
/// Flags win over the config file, but only when the user actually passed
/// them; absent flags leave the file's values in place.
fn apply_flags(mut overrides: ConfigOverrides, cli: &Cli) -> ConfigOverrides {
    if let Some(optimizer) = cli.optimizer {
        overrides.optimizer = Some(optimizer);
    }
    if let Some(scale) = cli.scale {
        overrides.scale = Some(scale);
    }
    if cli.keep_prolog {
        overrides.strip_prolog = Some(false);
    }
    overrides
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    // If stdin is a terminal (interactive), show intro help instead of blocking
    if io::stdin().is_terminal() {
        print_intro();
        return;
    }

    let mut overrides = match &cli.config {
        Some(path) => match ConfigOverrides::from_file(path) {
            Ok(o) => o,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => ConfigOverrides::default(),
    };

    // flags win over the config file
    if let Some(path) = &cli.preamble {
        match std::fs::read_to_string(path) {
            Ok(preamble) => overrides.preamble = Some(preamble),
            Err(e) => {
                eprintln!("Error reading preamble '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }
    let overrides = apply_flags(overrides, &cli);

    let config = match ConversionConfig::default().merge(overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut fragment = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut fragment) {
        eprintln!("Error reading from stdin: {}", e);
        std::process::exit(1);
    }

    match convert_with_config(&fragment, config) {
        Ok(out) => {
            let mut stdout = io::stdout();
            if let Err(e) = stdout.write_all(out.svg.as_bytes()) {
                eprintln!("Error writing SVG: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            // tool diagnostics are embedded verbatim in the error display
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn print_intro() {
    println!(
        r#"texfrag - render LaTeX fragments as baseline-aligned inline SVG

USAGE:
    echo '<latex>' | texfrag [OPTIONS] > output.svg

OPTIONS:
    -p, --preamble <FILE>    LaTeX preamble code to read from file
    -o, --optimizer <NAME>   SVG optimizer: minify (default) or none
    -s, --scale <FACTOR>     Extra output scaling (default: 1.0)
    --keep-prolog            Keep the XML declaration in the output
    -c, --config <FILE>      TOML configuration file
    -h, --help               Print help
    -V, --version            Print version

QUICK START:
    echo '$E = mc^2$' | texfrag > emc2.svg

The SVG carries width/height in em units and a vertical-align style, so it
scales with the surrounding text and sits on the text baseline. Requires
latex, dvisvgm and (for --optimizer minify) scour on the PATH."#
    );
}
