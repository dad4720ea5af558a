//! Document assembly: splice a fragment into the configured template
//!
//! Pure string templating. The fragment is never inspected or validated;
//! whether it is meaningful LaTeX is decided by the typesetting engine.

use thiserror::Error;

use crate::config::ConversionConfig;

/// Placeholder for the document font size (`\documentclass` option)
pub const FONT_SIZE_SLOT: &str = "{{ fontsize }}";
/// Placeholder for the preamble, before `\begin{document}`
pub const PREAMBLE_SLOT: &str = "{{ preamble }}";
/// Placeholder for the caller's fragment
pub const FRAGMENT_SLOT: &str = "{{ code }}";

/// Errors raised while assembling the document source
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template is missing the {0} placeholder")]
    MissingPlaceholder(&'static str),
}

/// Build a standalone document source from a fragment and configuration
///
/// Each placeholder in the template is replaced exactly once. Substitution
/// is a single pass over the template text, so placeholder-like text inside
/// the preamble or the fragment is left alone.
pub fn assemble(fragment: &str, config: &ConversionConfig) -> Result<String, TemplateError> {
    let font_size = format_font_size(config.font_size);
    let slots = [
        (FONT_SIZE_SLOT, font_size.as_str()),
        (PREAMBLE_SLOT, config.preamble.as_str()),
        (FRAGMENT_SLOT, fragment),
    ];

    let template = config.template.as_str();
    let mut sites = Vec::with_capacity(slots.len());
    for (slot, value) in slots {
        let pos = template
            .find(slot)
            .ok_or(TemplateError::MissingPlaceholder(slot))?;
        sites.push((pos, slot, value));
    }
    sites.sort_by_key(|&(pos, _, _)| pos);

    let mut out = String::with_capacity(template.len() + fragment.len() + config.preamble.len());
    let mut cursor = 0;
    for (pos, slot, value) in sites {
        out.push_str(&template[cursor..pos]);
        out.push_str(value);
        cursor = pos + slot.len();
    }
    out.push_str(&template[cursor..]);
    Ok(out)
}

/// Render the font size the way `\documentclass` expects it: `12`, not `12.0`
fn format_font_size(pt: f64) -> String {
    if pt.fract() == 0.0 {
        format!("{}", pt as i64)
    } else {
        format!("{}", pt)
    }
}
