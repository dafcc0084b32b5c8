use crate::core::source::Source;
use crate::security::hash::{HashAlgorithm, HashGenerator};

/// Output of rendering one route: the markup plus the extra `script-src`
/// expressions the host appends to the CSP header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderResult {
    pub html: String,
    pub csp_script_src_hashes: Vec<String>,
}

impl RenderResult {
    #[inline]
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            csp_script_src_hashes: Vec::new(),
        }
    }

    #[inline]
    pub fn push_script_source(&mut self, source: Source) {
        self.csp_script_src_hashes.push(source.to_string());
    }

    /// Allow-lists an inline script body by digest.
    pub fn add_script_hash(&mut self, algorithm: HashAlgorithm, content: &str) {
        self.push_script_source(HashGenerator::generate_source(algorithm, content.as_bytes()));
    }

    #[inline]
    pub fn has_script_sources(&self) -> bool {
        !self.csp_script_src_hashes.is_empty()
    }
}
