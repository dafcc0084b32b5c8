//! The policy injector: owns the nonce and the policy that references it, and
//! stamps both onto each rendered response.

use crate::core::config::{CspConfig, NonceMode};
use crate::core::policy::{header_name_for, CspPolicy, CspPolicyBuilder};
use crate::core::source::Source;
use crate::error::CspError;
use crate::monitoring::stats::CspStats;
use crate::render::{
    inject_nonce_attributes, nonce_attribute_targets, RenderContext, RenderHooks, RenderResult,
};
use crate::security::nonce::NonceGenerator;
use actix_web::http::header::{HeaderName, HeaderValue};
use log::{debug, trace, warn};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

/// The strict policy: nonce-gated scripts and styles with `'self'` and
/// `'unsafe-inline'` fallbacks for older browsers, everything else same-origin.
pub fn default_policy(nonce: &str) -> CspPolicy {
    let nonce_source = || Source::nonce(nonce.to_owned());
    let data = || Source::scheme("data");

    CspPolicyBuilder::new()
        .script_src([Source::UnsafeInline, Source::Self_, nonce_source()])
        .object_src([Source::None])
        .base_uri([Source::None])
        .require_trusted_types_for(["script"])
        .style_src([nonce_source(), Source::Self_, Source::UnsafeInline])
        .img_src([Source::Self_, data()])
        .connect_src([Source::Self_])
        .frame_src([Source::Self_])
        .frame_ancestors([Source::Self_])
        .font_src([Source::Self_, data()])
        .media_src([Source::Self_])
        .manifest_src([Source::Self_])
        .worker_src([Source::Self_])
        .form_action([Source::Self_])
        .build_unchecked()
}

#[derive(Debug, Clone)]
pub struct PolicyInjector {
    config: CspConfig,
    generator: NonceGenerator,
    nonce: String,
    policy: CspPolicy,
    stats: Arc<CspStats>,
}

impl PolicyInjector {
    /// Generates the process nonce and builds the default strict policy.
    pub fn initialize() -> Result<Self, CspError> {
        Self::with_config(CspConfig::default())
    }

    pub fn with_config(config: CspConfig) -> Result<Self, CspError> {
        let generator = NonceGenerator::new(config.nonce_length());
        let nonce = generator.try_generate()?;
        let injector = Self::with_nonce(config, nonce);
        injector.stats.increment_nonce_generation_count();
        Ok(injector)
    }

    /// Builds an injector around a known nonce instead of a random one.
    pub fn with_nonce(config: CspConfig, nonce: impl Into<String>) -> Self {
        let nonce = nonce.into();
        let policy = match config.policy() {
            Some(policy) => policy.with_nonce(&nonce),
            None => default_policy(&nonce),
        };

        debug!(
            "CSP policy initialised with {} directives, nonce mode {:?}",
            policy.directives().count(),
            config.nonce_mode()
        );

        Self {
            generator: NonceGenerator::new(config.nonce_length()),
            config,
            nonce,
            policy,
            stats: Arc::new(CspStats::new()),
        }
    }

    #[inline]
    pub fn config(&self) -> &CspConfig {
        &self.config
    }

    /// The nonce generated at initialization.
    #[inline]
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    #[inline]
    pub fn policy(&self) -> &CspPolicy {
        &self.policy
    }

    #[inline]
    pub fn stats(&self) -> &Arc<CspStats> {
        &self.stats
    }

    #[inline]
    pub fn header_name(&self) -> HeaderName {
        header_name_for(self.config.report_only() || self.policy.is_report_only())
    }

    /// The policy as it applies to one request, with its nonce sources bound
    /// to the nonce published in `context`.
    pub fn policy_for(&self, context: &RenderContext) -> Cow<'_, CspPolicy> {
        match context.nonce() {
            Some(nonce) if nonce != self.nonce => Cow::Owned(self.policy.with_nonce(nonce)),
            _ => Cow::Borrowed(&self.policy),
        }
    }

    /// Header value for a rendered response: the request's policy with the
    /// result's script sources merged into `script-src`.
    pub fn header_value(
        &self,
        result: &RenderResult,
        context: &RenderContext,
    ) -> Result<HeaderValue, CspError> {
        let started = Instant::now();

        let mut extra = Vec::with_capacity(result.csp_script_src_hashes.len() + 1);
        if self.config.unsafe_inline_compatibility() && result.has_script_sources() {
            extra.push(Source::UnsafeInline.to_string());
        }
        extra.extend(result.csp_script_src_hashes.iter().cloned());

        let value = self.policy_for(context).header_value_with_script_sources(&extra);
        self.stats
            .record_header_build(started.elapsed().as_nanos() as usize);
        value
    }

    /// Allow-lists the serialized state script by digest, using the configured
    /// hash algorithm.
    pub fn hash_state_script(&self, result: &mut RenderResult, script_body: &str) {
        result.add_script_hash(self.config.hash_algorithm(), script_body);
    }

    /// Hashes the context's state script into `result` when the rendered page
    /// embeds it. Returns whether a hash was added.
    pub fn hash_embedded_state(
        &self,
        result: &mut RenderResult,
        context: &RenderContext,
    ) -> Result<bool, CspError> {
        if context.state().is_empty() {
            return Ok(false);
        }

        let body = context.state_script_body()?;
        if !result.html.contains(&body) {
            return Ok(false);
        }

        self.hash_state_script(result, &body);
        Ok(true)
    }
}

impl RenderHooks for PolicyInjector {
    fn on_route_context(&self, context: &RenderContext) {
        trace!("CSP route context for {}", context.route());
    }

    fn on_serialize_state(&self, context: &mut RenderContext) -> Result<(), CspError> {
        let nonce = match self.config.nonce_mode() {
            NonceMode::PerProcess => self.nonce.clone(),
            NonceMode::PerRequest => {
                let nonce = self.generator.try_generate()?;
                self.stats.increment_nonce_generation_count();
                nonce
            }
        };
        context.set_nonce(nonce);
        Ok(())
    }

    fn on_route_rendered(
        &self,
        url: &str,
        result: &mut RenderResult,
        context: &RenderContext,
    ) -> Result<(), CspError> {
        let nonce = match context.nonce() {
            Some(nonce) => nonce,
            None => {
                self.stats.increment_missing_nonce_count();
                warn!(
                    "No nonce in render context for {} (request {}), leaving markup untouched",
                    url,
                    context.request_id().unwrap_or("-")
                );
                return Err(CspError::MissingNonce(url.to_owned()));
            }
        };

        result
            .csp_script_src_hashes
            .push(Source::nonce(nonce.to_owned()).to_string());

        let stamped = nonce_attribute_targets(&result.html);
        result.html = inject_nonce_attributes(&result.html, nonce);
        self.stats.record_html_rewrite(stamped);

        trace!("Stamped nonce on {} tags for {}", stamped, url);
        Ok(())
    }
}
