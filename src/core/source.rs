use crate::constants::{
    NONCE_PREFIX, NONE_SOURCE, SELF_SOURCE, STRICT_DYNAMIC_SOURCE, SUFFIX_QUOTE,
    UNSAFE_EVAL_SOURCE, UNSAFE_INLINE_SOURCE,
};
use crate::security::hash::HashAlgorithm;
use crate::utils::BufferWriter;
use bytes::BytesMut;
use std::{borrow::Cow, fmt};

/// A single CSP source expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    None,
    Self_,
    UnsafeInline,
    UnsafeEval,
    StrictDynamic,
    Host(Cow<'static, str>),
    /// Rendered with a trailing colon, `data` becomes `data:`.
    Scheme(Cow<'static, str>),
    Nonce(Cow<'static, str>),
    Hash {
        algorithm: HashAlgorithm,
        value: Cow<'static, str>,
    },
    /// A quoted bare token, e.g. `'script'` for `require-trusted-types-for`.
    Keyword(Cow<'static, str>),
}

impl Source {
    #[inline]
    pub fn nonce(value: impl Into<Cow<'static, str>>) -> Self {
        Source::Nonce(value.into())
    }

    #[inline]
    pub fn scheme(value: impl Into<Cow<'static, str>>) -> Self {
        Source::Scheme(value.into())
    }

    #[inline]
    pub fn keyword(value: impl Into<Cow<'static, str>>) -> Self {
        Source::Keyword(value.into())
    }

    #[inline(always)]
    pub const fn is_none(&self) -> bool {
        matches!(self, Source::None)
    }

    #[inline]
    pub const fn as_static_str(&self) -> Option<&'static str> {
        match self {
            Source::None => Some(NONE_SOURCE),
            Source::Self_ => Some(SELF_SOURCE),
            Source::UnsafeInline => Some(UNSAFE_INLINE_SOURCE),
            Source::UnsafeEval => Some(UNSAFE_EVAL_SOURCE),
            Source::StrictDynamic => Some(STRICT_DYNAMIC_SOURCE),
            _ => None,
        }
    }

    #[inline]
    pub fn estimated_size(&self) -> usize {
        match self {
            Source::Host(host) => host.len(),
            Source::Scheme(scheme) => scheme.len() + 1,
            Source::Nonce(nonce) => NONCE_PREFIX.len() + nonce.len() + SUFFIX_QUOTE.len(),
            Source::Hash { algorithm, value } => {
                algorithm.prefix().len() + value.len() + SUFFIX_QUOTE.len()
            }
            Source::Keyword(word) => word.len() + 2,
            other => other.as_static_str().map_or(0, str::len),
        }
    }

    #[inline]
    pub fn contains_nonce(&self) -> bool {
        matches!(self, Source::Nonce(_))
    }

    #[inline]
    pub fn contains_hash(&self) -> bool {
        matches!(self, Source::Hash { .. })
    }

    #[inline]
    pub fn nonce_value(&self) -> Option<&str> {
        match self {
            Source::Nonce(nonce) => Some(nonce),
            _ => None,
        }
    }

    #[inline]
    pub fn hash_value(&self) -> Option<(&str, HashAlgorithm)> {
        match self {
            Source::Hash { algorithm, value } => Some((value, *algorithm)),
            _ => None,
        }
    }

    /// Parses a rendered source expression back into a `Source`.
    ///
    /// Unknown quoted tokens become [`Source::Keyword`], anything ending in a
    /// colon becomes a scheme and the rest is treated as a host.
    pub fn parse(expr: &str) -> Self {
        match expr {
            NONE_SOURCE => return Source::None,
            SELF_SOURCE => return Source::Self_,
            UNSAFE_INLINE_SOURCE => return Source::UnsafeInline,
            UNSAFE_EVAL_SOURCE => return Source::UnsafeEval,
            STRICT_DYNAMIC_SOURCE => return Source::StrictDynamic,
            _ => {}
        }

        if let Some(rest) = expr.strip_prefix(NONCE_PREFIX) {
            if let Some(value) = rest.strip_suffix(SUFFIX_QUOTE) {
                return Source::Nonce(Cow::Owned(value.to_owned()));
            }
        }

        for algorithm in [
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha384,
            HashAlgorithm::Sha512,
        ] {
            if let Some(rest) = expr.strip_prefix(algorithm.prefix()) {
                if let Some(value) = rest.strip_suffix(SUFFIX_QUOTE) {
                    return Source::Hash {
                        algorithm,
                        value: Cow::Owned(value.to_owned()),
                    };
                }
            }
        }

        if expr.len() > 2 && expr.starts_with('\'') && expr.ends_with('\'') {
            return Source::Keyword(Cow::Owned(expr[1..expr.len() - 1].to_owned()));
        }

        match expr.strip_suffix(':') {
            Some(scheme) if !scheme.is_empty() && !scheme.contains('/') => {
                Source::Scheme(Cow::Owned(scheme.to_owned()))
            }
            _ => Source::Host(Cow::Owned(expr.to_owned())),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Host(host) => f.write_str(host),
            Source::Scheme(scheme) => write!(f, "{}:", scheme),
            Source::Nonce(nonce) => write!(f, "{}{}{}", NONCE_PREFIX, nonce, SUFFIX_QUOTE),
            Source::Hash { algorithm, value } => {
                write!(f, "{}{}{}", algorithm.prefix(), value, SUFFIX_QUOTE)
            }
            Source::Keyword(word) => write!(f, "'{}'", word),
            other => f.write_str(other.as_static_str().unwrap_or_default()),
        }
    }
}

impl BufferWriter for Source {
    fn write_to_buffer(&self, buffer: &mut BytesMut) {
        match self {
            Source::Host(host) => buffer.extend_from_slice(host.as_bytes()),
            Source::Scheme(scheme) => {
                buffer.extend_from_slice(scheme.as_bytes());
                buffer.extend_from_slice(b":");
            }
            Source::Nonce(nonce) => {
                buffer.reserve(NONCE_PREFIX.len() + nonce.len() + SUFFIX_QUOTE.len());
                buffer.extend_from_slice(NONCE_PREFIX.as_bytes());
                buffer.extend_from_slice(nonce.as_bytes());
                buffer.extend_from_slice(SUFFIX_QUOTE.as_bytes());
            }
            Source::Hash { algorithm, value } => {
                let prefix = algorithm.prefix();
                buffer.reserve(prefix.len() + value.len() + SUFFIX_QUOTE.len());
                buffer.extend_from_slice(prefix.as_bytes());
                buffer.extend_from_slice(value.as_bytes());
                buffer.extend_from_slice(SUFFIX_QUOTE.as_bytes());
            }
            Source::Keyword(word) => {
                buffer.extend_from_slice(b"'");
                buffer.extend_from_slice(word.as_bytes());
                buffer.extend_from_slice(b"'");
            }
            other => {
                if let Some(text) = other.as_static_str() {
                    buffer.extend_from_slice(text.as_bytes());
                }
            }
        }
    }
}
