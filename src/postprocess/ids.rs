//! Identifier namespacing for embedding several SVGs on one page
//!
//! dvisvgm numbers glyph paths the same way in every run (`g0-120`,
//! `page1`, ...), so two formulas inlined into the same HTML document would
//! otherwise share ids and resolve each other's references. Every id
//! definition and reference gets a short per-conversion prefix. The prefix
//! only needs to make collisions astronomically unlikely, not unguessable,
//! so a fast non-cryptographic source is enough.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Length of the generated prefix; 52^3 variants keep same-page collisions
/// astronomically unlikely
const PREFIX_LEN: usize = 3;

/// Source of per-conversion id prefixes
///
/// Pluggable so tests can inject a deterministic sequence.
pub trait PrefixSource {
    fn next_prefix(&mut self) -> String;
}

/// Random ASCII-letter prefixes (ids may not start with a digit)
#[derive(Debug, Default)]
pub struct RandomPrefix;

impl PrefixSource for RandomPrefix {
    fn next_prefix(&mut self) -> String {
        (0..PREFIX_LEN).map(|_| fastrand::alphabetic()).collect()
    }
}

/// A fixed prefix, for deterministic output
#[derive(Debug, Clone)]
pub struct FixedPrefix(pub String);

impl PrefixSource for FixedPrefix {
    fn next_prefix(&mut self) -> String {
        self.0.clone()
    }
}

static ID_DEF_RE: OnceLock<Regex> = OnceLock::new();
static URL_REF_RE: OnceLock<Regex> = OnceLock::new();
static HREF_REF_RE: OnceLock<Regex> = OnceLock::new();

// The attribute patterns capture the preceding character and reject `-`/`:`
// there, so `xml:id`, `data-id` and the like are left alone.

fn id_def_re() -> &'static Regex {
    ID_DEF_RE.get_or_init(|| Regex::new(r#"(^|[^-:\w])id\s*=\s*(['"])([^'"]+)(['"])"#).unwrap())
}

fn url_ref_re() -> &'static Regex {
    URL_REF_RE.get_or_init(|| Regex::new(r"url\(#([^)'\x22]+)\)").unwrap())
}

fn href_ref_re() -> &'static Regex {
    HREF_REF_RE.get_or_init(|| {
        Regex::new(r#"(^|[^-:\w])((?:xlink:)?href)\s*=\s*(['"])#([^'"]+)(['"])"#).unwrap()
    })
}

/// Prepend `prefix` to every id definition and every internal id reference
///
/// All occurrences of one original id receive the identical rewritten id,
/// and distinct originals stay distinct (`<prefix>_<original>`). References
/// to ids that are not defined in this document (external anchors) are left
/// untouched.
pub fn namespace_ids(svg: &str, prefix: &str) -> String {
    let defined: HashSet<String> = id_def_re()
        .captures_iter(svg)
        .map(|caps| caps[3].to_string())
        .collect();
    if defined.is_empty() {
        return svg.to_string();
    }

    let svg = id_def_re().replace_all(svg, |caps: &Captures| {
        format!("{}id={}{}_{}{}", &caps[1], &caps[2], prefix, &caps[3], &caps[4])
    });
    let svg = url_ref_re().replace_all(&svg, |caps: &Captures| {
        if defined.contains(&caps[1]) {
            format!("url(#{}_{})", prefix, &caps[1])
        } else {
            caps[0].to_string()
        }
    });
    let svg = href_ref_re().replace_all(&svg, |caps: &Captures| {
        if defined.contains(&caps[4]) {
            format!(
                "{}{}={}#{}_{}{}",
                &caps[1], &caps[2], &caps[3], prefix, &caps[4], &caps[5]
            )
        } else {
            caps[0].to_string()
        }
    });
    svg.into_owned()
}
