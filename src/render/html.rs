use crate::constants::{SCRIPT_TAG_OPEN, STYLE_TAG_OPEN};

/// Stamps `nonce="<nonce>"` onto every `<script` and `<style` opener.
///
/// This is a plain text substitution over the whole document. Markup is not
/// parsed, so occurrences inside comments or attribute values are rewritten
/// too, and a tag that already carries a nonce gets a second one.
pub fn inject_nonce_attributes(html: &str, nonce: &str) -> String {
    let script = format!("{} nonce=\"{}\"", SCRIPT_TAG_OPEN, nonce);
    let style = format!("{} nonce=\"{}\"", STYLE_TAG_OPEN, nonce);

    html.replace(SCRIPT_TAG_OPEN, &script)
        .replace(STYLE_TAG_OPEN, &style)
}

/// Number of openers [`inject_nonce_attributes`] would rewrite.
pub fn nonce_attribute_targets(html: &str) -> usize {
    html.matches(SCRIPT_TAG_OPEN).count() + html.matches(STYLE_TAG_OPEN).count()
}
