use crate::constants::{
    DEFAULT_BUFFER_CAPACITY, HEADER_CSP, HEADER_CSP_REPORT_ONLY, REPORT_URI, SCRIPT_SRC,
    SEMICOLON_SPACE,
};
use crate::core::directives::{
    BaseUri, ConnectSrc, DefaultSrc, Directive, DirectiveSpec, FontSrc, FormAction,
    FrameAncestors, FrameSrc, ImgSrc, ManifestSrc, MediaSrc, ObjectSrc, RequireTrustedTypesFor,
    ScriptSrc, StyleSrc, WorkerSrc,
};
use crate::core::source::Source;
use crate::error::CspError;
use crate::utils::BufferWriter;
use actix_web::http::header::{HeaderName, HeaderValue};
use bytes::BytesMut;
use indexmap::IndexMap;
use std::borrow::Cow;
use url::Url;

/// An ordered mapping from directive name to its source list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CspPolicy {
    directives: IndexMap<Cow<'static, str>, Directive>,
    report_only: bool,
    report_uri: Option<Cow<'static, str>>,
}

impl CspPolicy {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a directive. Re-adding a name replaces its sources but keeps
    /// its original position.
    pub fn add_directive(&mut self, directive: Directive) -> &mut Self {
        let name = directive.name().to_owned();
        self.directives.insert(Cow::Owned(name), directive);
        self
    }

    #[inline]
    pub fn set_report_only(&mut self, report_only: bool) -> &mut Self {
        self.report_only = report_only;
        self
    }

    pub fn set_report_uri(&mut self, uri: impl Into<Cow<'static, str>>) -> &mut Self {
        self.report_uri = Some(uri.into());
        self
    }

    #[inline]
    pub fn header_name(&self) -> HeaderName {
        header_name_for(self.report_only)
    }

    pub fn header_value(&self) -> Result<HeaderValue, CspError> {
        self.header_value_with_script_sources(&[])
    }

    /// Serializes the policy, appending `extra` to `script-src`.
    ///
    /// `extra` holds rendered source expressions such as `'nonce-abc'` or
    /// `'sha256-…'`. Expressions already present are not repeated. When the
    /// policy has no `script-src`, one is emitted after the other directives.
    pub fn header_value_with_script_sources(
        &self,
        extra: &[String],
    ) -> Result<HeaderValue, CspError> {
        let mut buffer = BytesMut::with_capacity(self.estimated_size().max(DEFAULT_BUFFER_CAPACITY));
        let extra: Vec<Source> = extra.iter().map(|s| Source::parse(s)).collect();

        let mut first = true;
        for directive in self.directives.values() {
            if !first {
                buffer.extend_from_slice(SEMICOLON_SPACE);
            }
            if directive.name() == SCRIPT_SRC && !extra.is_empty() {
                let mut merged = directive.clone();
                merged.add_sources(extra.iter().cloned());
                merged.write_to_buffer(&mut buffer);
            } else {
                directive.write_to_buffer(&mut buffer);
            }
            first = false;
        }

        if !extra.is_empty() && !self.directives.contains_key(SCRIPT_SRC) {
            if !first {
                buffer.extend_from_slice(SEMICOLON_SPACE);
            }
            ScriptSrc::new()
                .add_sources(extra)
                .build()
                .write_to_buffer(&mut buffer);
            first = false;
        }

        if let Some(uri) = &self.report_uri {
            if !first {
                buffer.extend_from_slice(SEMICOLON_SPACE);
            }
            buffer.extend_from_slice(REPORT_URI.as_bytes());
            buffer.extend_from_slice(b" ");
            buffer.extend_from_slice(uri.as_bytes());
        }

        HeaderValue::from_maybe_shared(buffer.freeze())
            .map_err(|err| CspError::HeaderError(err.to_string()))
    }

    /// Returns a copy with every nonce source replaced by `nonce`.
    pub fn with_nonce(&self, nonce: &str) -> CspPolicy {
        let mut policy = self.clone();
        for directive in policy.directives.values_mut() {
            directive.rebind_nonce(nonce);
        }
        policy
    }

    pub fn validate(&self) -> Result<(), CspError> {
        for directive in self.directives.values() {
            directive.validate()?;
        }

        if let Some(uri) = &self.report_uri {
            if !uri.starts_with('/') {
                Url::parse(uri).map_err(|err| {
                    CspError::InvalidReportUri(format!("{}: {}", uri, err))
                })?;
            }
        }

        Ok(())
    }

    #[inline]
    pub fn get_directive(&self, name: &str) -> Option<&Directive> {
        self.directives.get(name)
    }

    #[inline]
    pub fn is_report_only(&self) -> bool {
        self.report_only
    }

    #[inline]
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.directives.values()
    }

    #[inline]
    pub fn directive_names(&self) -> impl Iterator<Item = &str> {
        self.directives.keys().map(|name| name.as_ref())
    }

    #[inline]
    pub fn report_uri(&self) -> Option<&str> {
        self.report_uri.as_deref()
    }

    /// Every distinct nonce value referenced anywhere in the policy.
    pub fn nonce_values(&self) -> Vec<&str> {
        let mut values: Vec<&str> = Vec::new();
        for source in self.directives.values().flat_map(|d| d.sources()) {
            if let Some(nonce) = source.nonce_value() {
                if !values.contains(&nonce) {
                    values.push(nonce);
                }
            }
        }
        values
    }

    #[inline]
    pub fn contains_nonce(&self) -> bool {
        self.directives.values().any(|d| d.contains_nonce())
    }

    #[inline]
    pub fn contains_hash(&self) -> bool {
        self.directives.values().any(|d| d.contains_hash())
    }

    fn estimated_size(&self) -> usize {
        self.directives
            .values()
            .map(|d| d.estimated_size() + SEMICOLON_SPACE.len())
            .sum::<usize>()
            + self.report_uri.as_ref().map_or(0, |u| u.len() + REPORT_URI.len() + 3)
    }
}

#[inline]
pub(crate) fn header_name_for(report_only: bool) -> HeaderName {
    if report_only {
        HeaderName::from_static(HEADER_CSP_REPORT_ONLY)
    } else {
        HeaderName::from_static(HEADER_CSP)
    }
}

#[derive(Debug, Default)]
pub struct CspPolicyBuilder {
    policy: CspPolicy,
}

impl CspPolicyBuilder {
    #[inline]
    pub fn new() -> Self {
        Self {
            policy: CspPolicy::new(),
        }
    }

    pub fn add_directive<D: DirectiveSpec>(mut self, directive_builder: D) -> Self {
        self.policy.add_directive(directive_builder.build());
        self
    }

    #[inline]
    pub fn with_directive(mut self, directive: Directive) -> Self {
        self.policy.add_directive(directive);
        self
    }

    pub fn default_src(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.add_directive(DefaultSrc::new().add_sources(sources))
    }

    pub fn script_src(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.add_directive(ScriptSrc::new().add_sources(sources))
    }

    pub fn style_src(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.add_directive(StyleSrc::new().add_sources(sources))
    }

    pub fn img_src(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.add_directive(ImgSrc::new().add_sources(sources))
    }

    pub fn connect_src(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.add_directive(ConnectSrc::new().add_sources(sources))
    }

    pub fn font_src(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.add_directive(FontSrc::new().add_sources(sources))
    }

    pub fn object_src(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.add_directive(ObjectSrc::new().add_sources(sources))
    }

    pub fn media_src(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.add_directive(MediaSrc::new().add_sources(sources))
    }

    pub fn frame_src(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.add_directive(FrameSrc::new().add_sources(sources))
    }

    pub fn worker_src(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.add_directive(WorkerSrc::new().add_sources(sources))
    }

    pub fn manifest_src(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.add_directive(ManifestSrc::new().add_sources(sources))
    }

    pub fn frame_ancestors(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.add_directive(FrameAncestors::new().add_sources(sources))
    }

    pub fn base_uri(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.add_directive(BaseUri::new().add_sources(sources))
    }

    pub fn form_action(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.add_directive(FormAction::new().add_sources(sources))
    }

    pub fn require_trusted_types_for(
        self,
        sinks: impl IntoIterator<Item = impl Into<Cow<'static, str>>>,
    ) -> Self {
        self.add_directive(
            RequireTrustedTypesFor::new().add_sources(sinks.into_iter().map(Source::keyword)),
        )
    }

    #[inline]
    pub fn report_uri(mut self, uri: impl Into<Cow<'static, str>>) -> Self {
        self.policy.set_report_uri(uri);
        self
    }

    #[inline]
    pub fn report_only(mut self, enabled: bool) -> Self {
        self.policy.set_report_only(enabled);
        self
    }

    pub fn build(self) -> Result<CspPolicy, CspError> {
        self.policy.validate()?;
        Ok(self.policy)
    }

    #[inline]
    pub fn build_unchecked(self) -> CspPolicy {
        self.policy
    }
}
