//! Markup rewriting: absolute units to em, baseline style, prolog handling
//!
//! dvisvgm emits a root element with `width`/`height` in TeX pt and a
//! `viewBox`. The attributes are rewritten to em so the image scales with
//! the surrounding text; the viewBox is left untouched, so the browser
//! scales the geometry from the root dimensions. `vertical-align` (negative
//! of the depth) drops the image below the text baseline by exactly the
//! depth of the typeset box.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::config::{ConversionConfig, TEX_PT_TO_CSS_PT};
use crate::toolchain::ConversionError;

/// Output dimensions in em units, after scaling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub width_em: f64,
    pub height_em: f64,
    pub valign_em: f64,
}

static COMMENT_RE: OnceLock<Regex> = OnceLock::new();
static WIDTH_RE: OnceLock<Regex> = OnceLock::new();
static HEIGHT_RE: OnceLock<Regex> = OnceLock::new();
static STYLE_RE: OnceLock<Regex> = OnceLock::new();

fn comment_re() -> &'static Regex {
    COMMENT_RE.get_or_init(|| Regex::new(r"(?s)<!--.*?-->\n?").unwrap())
}

// The attribute patterns capture the preceding character and reject `-`/`:`
// there, so compound names like `stroke-width` or `font-style` never match.

fn width_re() -> &'static Regex {
    WIDTH_RE.get_or_init(|| {
        Regex::new(r#"(^|[^-:\w])width\s*=\s*(['"])(-?[0-9.]+(?:e-?[0-9]+)?)(?:pt)?(['"])"#)
            .unwrap()
    })
}

fn height_re() -> &'static Regex {
    HEIGHT_RE.get_or_init(|| {
        Regex::new(r#"(^|[^-:\w])height\s*=\s*(['"])(-?[0-9.]+(?:e-?[0-9]+)?)(?:pt)?(['"])"#)
            .unwrap()
    })
}

fn style_re() -> &'static Regex {
    STYLE_RE.get_or_init(|| Regex::new(r#"(^|[^-:\w])style\s*=\s*(['"])([^'"]*)(['"])"#).unwrap())
}

/// Remove XML comments (the converter's "Generated by" banner)
pub fn strip_comments(svg: &str) -> String {
    comment_re().replace_all(svg, "").into_owned()
}

/// Remove a leading `<?xml ... ?>` declaration for inline embedding
pub fn strip_prolog(svg: &str) -> String {
    let trimmed = svg.trim_start();
    if let Some(rest) = trimmed.strip_prefix("<?xml") {
        if let Some(end) = rest.find("?>") {
            return rest[end + 2..].trim_start().to_string();
        }
    }
    svg.to_string()
}

/// Rewrite the root element's dimensions to em and inject the baseline style
///
/// Reads `width`/`height` (TeX pt) from the root element, converts them with
/// `em = pt / font_size * TEX_PT_TO_CSS_PT * scale`, rewrites the attributes
/// as six-decimal em strings, and merges `vertical-align:<valign>em` into
/// the root `style` attribute without clobbering other style properties.
pub fn rewrite_root(
    svg: &str,
    depth_pt: f64,
    config: &ConversionConfig,
) -> Result<(String, Geometry), ConversionError> {
    let root_start = svg.find("<svg").ok_or(ConversionError::EmptySvg)?;
    let root_len = svg[root_start..].find('>').ok_or(ConversionError::EmptySvg)? + 1;
    let root = &svg[root_start..root_start + root_len];

    let to_em = |pt: f64| pt / config.font_size * TEX_PT_TO_CSS_PT * config.scale;
    let width_pt = attr_points(width_re(), root).ok_or(ConversionError::MalformedSvg("width"))?;
    let height_pt =
        attr_points(height_re(), root).ok_or(ConversionError::MalformedSvg("height"))?;
    let geometry = Geometry {
        width_em: to_em(width_pt),
        height_em: to_em(height_pt),
        // 0.0 rather than -0.0 for depthless fragments
        valign_em: if depth_pt == 0.0 { 0.0 } else { -to_em(depth_pt) },
    };

    let root = width_re().replace(root, |caps: &Captures| {
        format!(
            "{}width={}{:.6}em{}",
            &caps[1], &caps[2], geometry.width_em, &caps[4]
        )
    });
    let root = height_re().replace(&root, |caps: &Captures| {
        format!(
            "{}height={}{:.6}em{}",
            &caps[1], &caps[2], geometry.height_em, &caps[4]
        )
    });
    let root = inject_valign(&root, geometry.valign_em);

    let mut out = String::with_capacity(svg.len() + 40);
    out.push_str(&svg[..root_start]);
    out.push_str(&root);
    out.push_str(&svg[root_start + root_len..]);
    Ok((out, geometry))
}

fn attr_points(re: &Regex, root: &str) -> Option<f64> {
    re.captures(root)?.get(3)?.as_str().parse::<f64>().ok()
}

fn inject_valign(root: &str, valign_em: f64) -> String {
    let declaration = format!("vertical-align:{:.6}em", valign_em);
    if style_re().is_match(root) {
        // merge with whatever the converter already put there
        return style_re()
            .replace(root, |caps: &Captures| {
                let existing = caps[3].trim_end_matches(';');
                if existing.is_empty() {
                    format!("{}style={}{}{}", &caps[1], &caps[2], declaration, &caps[4])
                } else {
                    format!(
                        "{}style={}{};{}{}",
                        &caps[1], &caps[2], existing, declaration, &caps[4]
                    )
                }
            })
            .into_owned();
    }
    // no style attribute yet; add one just before the closing bracket
    let insert_at = if root.ends_with("/>") {
        root.len() - 2
    } else {
        root.len() - 1
    };
    format!(
        "{} style=\"{}\"{}",
        &root[..insert_at].trim_end(),
        declaration,
        &root[insert_at..]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConversionConfig, DEFAULT_FONT_SIZE_PT};

    const RAW_ROOT: &str = "<svg version='1.1' xmlns='http://www.w3.org/2000/svg' \
         width='24.0pt' height='12.0pt' viewBox='0 0 24 12'>\n<g id='page1'/>\n</svg>";

    #[test]
    fn test_unit_conversion() {
        let config = ConversionConfig::default();
        let (out, geometry) = rewrite_root(RAW_ROOT, 0.0, &config).unwrap();
        let expected_width = 24.0 / DEFAULT_FONT_SIZE_PT * TEX_PT_TO_CSS_PT;
        assert!((geometry.width_em - expected_width).abs() < 1e-12);
        assert!(out.contains(&format!("width='{:.6}em'", expected_width)));
        assert!(out.contains(&format!(
            "height='{:.6}em'",
            12.0 / DEFAULT_FONT_SIZE_PT * TEX_PT_TO_CSS_PT
        )));
        // the viewBox stays in absolute units
        assert!(out.contains("viewBox='0 0 24 12'"));
    }

    #[test]
    fn test_valign_sign_and_linearity() {
        let config = ConversionConfig::default();
        let (out, geometry) = rewrite_root(RAW_ROOT, 3.0, &config).unwrap();
        let expected = -(3.0 / DEFAULT_FONT_SIZE_PT * TEX_PT_TO_CSS_PT);
        assert!((geometry.valign_em - expected).abs() < 1e-12);
        assert!(out.contains(&format!("vertical-align:{:.6}em", expected)));

        let (_, doubled) = rewrite_root(RAW_ROOT, 6.0, &config).unwrap();
        assert!((doubled.valign_em - 2.0 * geometry.valign_em).abs() < 1e-12);
    }

    #[test]
    fn test_scale_multiplies_all_dimensions() {
        let base = rewrite_root(RAW_ROOT, 3.0, &ConversionConfig::default())
            .unwrap()
            .1;
        let scaled = rewrite_root(RAW_ROOT, 3.0, &ConversionConfig::default().with_scale(2.0))
            .unwrap()
            .1;
        assert!((scaled.width_em - 2.0 * base.width_em).abs() < 1e-12);
        assert!((scaled.height_em - 2.0 * base.height_em).abs() < 1e-12);
        assert!((scaled.valign_em - 2.0 * base.valign_em).abs() < 1e-12);
    }

    #[test]
    fn test_zero_depth_valign() {
        let config = ConversionConfig::default();
        let (out, geometry) = rewrite_root(RAW_ROOT, 0.0, &config).unwrap();
        assert_eq!(geometry.valign_em, 0.0);
        assert!(out.contains("vertical-align:"));
    }

    #[test]
    fn test_style_merge_preserves_existing_properties() {
        let svg = r#"<svg width="10pt" height="5pt" style="overflow:visible"><g/></svg>"#;
        let (out, _) = rewrite_root(svg, 1.0, &ConversionConfig::default()).unwrap();
        assert!(out.contains("overflow:visible;vertical-align:"));
        // only one style attribute on the root
        assert_eq!(out.matches("style=").count(), 1);
    }

    #[test]
    fn test_only_root_attributes_are_rewritten() {
        let svg = "<svg width='10pt' height='5pt'><rect width='10' height='5'/></svg>";
        let (out, _) = rewrite_root(svg, 0.0, &ConversionConfig::default()).unwrap();
        assert!(out.contains("<rect width='10' height='5'/>"));
    }

    #[test]
    fn test_compound_attribute_names_are_not_rewritten() {
        // stroke-width precedes width; the wrong attribute must not be
        // picked up by the first-match replacement
        let svg = "<svg stroke-width='2' width='24.0pt' height='12.0pt'><g/></svg>";
        let (out, geometry) = rewrite_root(svg, 0.0, &ConversionConfig::default()).unwrap();
        assert!(out.contains("stroke-width='2'"));
        assert!(out.contains(&format!("width='{:.6}em'", geometry.width_em)));
        assert!((geometry.width_em - 24.0 / DEFAULT_FONT_SIZE_PT * TEX_PT_TO_CSS_PT).abs() < 1e-12);
    }

    #[test]
    fn test_font_style_attribute_is_not_merged_into() {
        let svg = "<svg font-style='italic' width='10pt' height='5pt'><g/></svg>";
        let (out, _) = rewrite_root(svg, 1.0, &ConversionConfig::default()).unwrap();
        assert!(out.contains("font-style='italic'"));
        // a fresh style attribute was added instead
        assert!(out.contains("style=\"vertical-align:"));
    }

    #[test]
    fn test_missing_width_attribute_is_an_error() {
        let svg = "<svg height='5pt'><g/></svg>";
        let err = rewrite_root(svg, 0.0, &ConversionConfig::default()).unwrap_err();
        assert!(matches!(err, ConversionError::MalformedSvg("width")));
    }

    #[test]
    fn test_strip_comments() {
        let svg = "<?xml version='1.0'?>\n<!-- This file was generated by dvisvgm -->\n<svg/>";
        let out = strip_comments(svg);
        assert!(!out.contains("<!--"));
        assert!(out.contains("<svg/>"));
    }

    #[test]
    fn test_strip_prolog() {
        let svg = "<?xml version='1.0' encoding='UTF-8'?>\n<svg width='1pt'/>";
        let out = strip_prolog(svg);
        assert!(out.starts_with("<svg"));
    }

    #[test]
    fn test_strip_prolog_without_prolog_is_a_no_op() {
        assert_eq!(strip_prolog("<svg/>"), "<svg/>");
    }
}
