use crate::constants::NONCE_LENGTH;
use crate::core::directives::Directive;
use crate::core::policy::CspPolicy;
use crate::core::source::Source;
use crate::error::CspError;
use crate::security::hash::HashAlgorithm;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Lifetime of the nonce stamped onto rendered markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NonceMode {
    /// One nonce generated at startup and shared by every response.
    #[default]
    PerProcess,
    /// A fresh nonce for every rendered request.
    PerRequest,
}

/// Render-time CSP settings handed to the host pipeline.
#[derive(Debug, Clone)]
pub struct CspConfig {
    report_only: bool,
    hash_algorithm: HashAlgorithm,
    unsafe_inline_compatibility: bool,
    nonce_mode: NonceMode,
    nonce_length: usize,
    policy: Option<CspPolicy>,
}

impl Default for CspConfig {
    fn default() -> Self {
        Self {
            report_only: false,
            hash_algorithm: HashAlgorithm::Sha256,
            unsafe_inline_compatibility: true,
            nonce_mode: NonceMode::PerProcess,
            nonce_length: NONCE_LENGTH,
            policy: None,
        }
    }
}

impl CspConfig {
    #[inline]
    pub fn report_only(&self) -> bool {
        self.report_only
    }

    #[inline]
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    #[inline]
    pub fn unsafe_inline_compatibility(&self) -> bool {
        self.unsafe_inline_compatibility
    }

    #[inline]
    pub fn nonce_mode(&self) -> NonceMode {
        self.nonce_mode
    }

    #[inline]
    pub fn nonce_length(&self) -> usize {
        self.nonce_length
    }

    /// A caller-supplied policy replacing the built-in strict one.
    #[inline]
    pub fn policy(&self) -> Option<&CspPolicy> {
        self.policy.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct CspConfigBuilder {
    config: CspConfig,
}

impl CspConfigBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn report_only(mut self, enabled: bool) -> Self {
        self.config.report_only = enabled;
        self
    }

    #[inline]
    pub fn hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.config.hash_algorithm = algorithm;
        self
    }

    #[inline]
    pub fn unsafe_inline_compatibility(mut self, enabled: bool) -> Self {
        self.config.unsafe_inline_compatibility = enabled;
        self
    }

    #[inline]
    pub fn nonce_mode(mut self, mode: NonceMode) -> Self {
        self.config.nonce_mode = mode;
        self
    }

    #[inline]
    pub fn with_nonce_per_request(self, enabled: bool) -> Self {
        self.nonce_mode(if enabled {
            NonceMode::PerRequest
        } else {
            NonceMode::PerProcess
        })
    }

    #[inline]
    pub fn nonce_length(mut self, length: usize) -> Self {
        self.config.nonce_length = length;
        self
    }

    #[inline]
    pub fn policy(mut self, policy: CspPolicy) -> Self {
        self.config.policy = Some(policy);
        self
    }

    pub fn build(self) -> Result<CspConfig, CspError> {
        if self.config.nonce_length == 0 {
            return Err(CspError::ConfigError(
                "nonce length must be at least one byte".to_string(),
            ));
        }

        if let Some(policy) = &self.config.policy {
            policy.validate()?;
        }

        Ok(self.config)
    }
}

/// JSON form of [`CspConfig`], using the camelCase keys of the host
/// framework's render options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CspOptions {
    pub report_only: bool,
    pub hash_algorithm: Option<String>,
    pub unsafe_inline_compatibility: Option<bool>,
    pub nonce_mode: NonceMode,
    pub nonce_length: Option<usize>,
    /// Directive name to source expressions, replacing the built-in policy.
    pub policies: Option<IndexMap<String, Vec<String>>>,
}

impl CspOptions {
    pub fn from_json(json: &str) -> Result<Self, CspError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CspError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn into_builder(self) -> Result<CspConfigBuilder, CspError> {
        let mut builder = CspConfigBuilder::new()
            .report_only(self.report_only)
            .nonce_mode(self.nonce_mode);

        if let Some(name) = self.hash_algorithm.as_deref() {
            builder = builder.hash_algorithm(HashAlgorithm::try_from(name)?);
        }
        if let Some(enabled) = self.unsafe_inline_compatibility {
            builder = builder.unsafe_inline_compatibility(enabled);
        }
        if let Some(length) = self.nonce_length {
            builder = builder.nonce_length(length);
        }
        if let Some(policies) = &self.policies {
            builder = builder.policy(Self::policy_from_map(policies, self.report_only)?);
        }

        Ok(builder)
    }

    fn policy_from_map(
        policies: &IndexMap<String, Vec<String>>,
        report_only: bool,
    ) -> Result<CspPolicy, CspError> {
        if policies.is_empty() {
            return Err(CspError::ConfigError(
                "policies must name at least one directive".to_string(),
            ));
        }

        let mut policy = CspPolicy::new();
        for (name, expressions) in policies {
            let mut directive = Directive::new(name.clone());
            directive.add_sources(expressions.iter().map(|expr| Source::parse(expr.trim())));
            policy.add_directive(directive);
        }
        policy.set_report_only(report_only);

        Ok(policy)
    }

    pub fn into_config(self) -> Result<CspConfig, CspError> {
        self.into_builder()?.build()
    }
}
