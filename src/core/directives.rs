use crate::constants;
use crate::core::source::Source;
use crate::error::CspError;
use crate::utils::BufferWriter;
use bytes::BytesMut;
use smallvec::SmallVec;
use std::{borrow::Cow, fmt};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Directive {
    name: Cow<'static, str>,
    sources: SmallVec<[Source; 4]>,
}

impl Directive {
    #[inline]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            sources: SmallVec::new(),
        }
    }

    /// Appends a source, keeping insertion order and dropping duplicates.
    /// `'none'` never shares a directive with another source.
    pub fn add_source(&mut self, source: Source) -> &mut Self {
        if source.is_none() {
            self.sources.clear();
            self.sources.push(source);
        } else if !self.sources.is_empty() && self.sources[0].is_none() {
            self.sources.clear();
            self.sources.push(source);
        } else if !self.sources.iter().any(|s| s == &source) {
            self.sources.push(source);
        }
        self
    }

    pub fn add_sources<I>(&mut self, sources: I) -> &mut Self
    where
        I: IntoIterator<Item = Source>,
    {
        for source in sources {
            self.add_source(source);
        }
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Replaces the value of every nonce source in place.
    pub fn rebind_nonce(&mut self, nonce: &str) {
        for source in self.sources.iter_mut() {
            if let Source::Nonce(value) = source {
                *value = Cow::Owned(nonce.to_owned());
            }
        }
    }

    pub fn validate(&self) -> Result<(), CspError> {
        if self.name.is_empty() {
            return Err(CspError::InvalidDirectiveName(
                "Directive name cannot be empty".to_string(),
            ));
        }

        if !self
            .name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b == b'-')
        {
            return Err(CspError::InvalidDirectiveName(self.name.to_string()));
        }

        for source in &self.sources {
            match source {
                Source::Host(host) if host.is_empty() => {
                    return Err(CspError::ValidationError(format!(
                        "Directive '{}' contains empty host",
                        self.name
                    )));
                }
                Source::Scheme(scheme) if scheme.is_empty() => {
                    return Err(CspError::ValidationError(format!(
                        "Directive '{}' contains empty scheme",
                        self.name
                    )));
                }
                Source::Nonce(nonce) if nonce.is_empty() => {
                    return Err(CspError::ValidationError(format!(
                        "Directive '{}' contains empty nonce",
                        self.name
                    )));
                }
                Source::Hash { value, .. } if value.is_empty() => {
                    return Err(CspError::ValidationError(format!(
                        "Directive '{}' contains empty hash",
                        self.name
                    )));
                }
                Source::Keyword(word) if word.is_empty() => {
                    return Err(CspError::ValidationError(format!(
                        "Directive '{}' contains empty keyword",
                        self.name
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }

    #[inline]
    pub fn estimated_size(&self) -> usize {
        let mut size = self.name.len();

        if !self.sources.is_empty() {
            size += self
                .sources
                .iter()
                .map(|s| s.estimated_size() + 1)
                .sum::<usize>();
        }

        size
    }

    #[inline]
    pub fn contains_nonce(&self) -> bool {
        self.sources.iter().any(|s| s.contains_nonce())
    }

    #[inline]
    pub fn contains_hash(&self) -> bool {
        self.sources.iter().any(|s| s.contains_hash())
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for source in &self.sources {
            write!(f, " {}", source)?;
        }
        Ok(())
    }
}

impl BufferWriter for Directive {
    fn write_to_buffer(&self, buffer: &mut BytesMut) {
        buffer.extend_from_slice(self.name.as_bytes());
        for source in &self.sources {
            buffer.extend_from_slice(b" ");
            source.write_to_buffer(buffer);
        }
    }
}

pub trait DirectiveSpec: Sized {
    const NAME: &'static str;

    fn add_source(mut self, source: Source) -> Self {
        self.inner_mut().add_source(source);
        self
    }

    fn add_sources<I>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = Source>,
    {
        self.inner_mut().add_sources(sources);
        self
    }

    fn inner_mut(&mut self) -> &mut Directive;

    fn build(self) -> Directive;
}

macro_rules! define_directive {
    ($name:ident, $directive_name:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name {
            directive: Directive,
        }

        impl $name {
            #[inline]
            pub fn new() -> Self {
                Self {
                    directive: Directive::new($directive_name),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl DirectiveSpec for $name {
            const NAME: &'static str = $directive_name;

            #[inline]
            fn inner_mut(&mut self) -> &mut Directive {
                &mut self.directive
            }

            #[inline]
            fn build(self) -> Directive {
                self.directive
            }
        }
    };
}

define_directive!(DefaultSrc, constants::DEFAULT_SRC);
define_directive!(ScriptSrc, constants::SCRIPT_SRC);
define_directive!(StyleSrc, constants::STYLE_SRC);
define_directive!(ImgSrc, constants::IMG_SRC);
define_directive!(ConnectSrc, constants::CONNECT_SRC);
define_directive!(FontSrc, constants::FONT_SRC);
define_directive!(ObjectSrc, constants::OBJECT_SRC);
define_directive!(MediaSrc, constants::MEDIA_SRC);
define_directive!(FrameSrc, constants::FRAME_SRC);
define_directive!(WorkerSrc, constants::WORKER_SRC);
define_directive!(ManifestSrc, constants::MANIFEST_SRC);
define_directive!(FrameAncestors, constants::FRAME_ANCESTORS);
define_directive!(BaseUri, constants::BASE_URI);
define_directive!(FormAction, constants::FORM_ACTION);
define_directive!(RequireTrustedTypesFor, constants::REQUIRE_TRUSTED_TYPES_FOR);
