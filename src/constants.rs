pub(crate) const HEADER_CSP: &str = "content-security-policy";
pub(crate) const HEADER_CSP_REPORT_ONLY: &str = "content-security-policy-report-only";

pub(crate) const DEFAULT_SRC: &str = "default-src";
pub(crate) const SCRIPT_SRC: &str = "script-src";
pub(crate) const STYLE_SRC: &str = "style-src";
pub(crate) const IMG_SRC: &str = "img-src";
pub(crate) const CONNECT_SRC: &str = "connect-src";
pub(crate) const FONT_SRC: &str = "font-src";
pub(crate) const OBJECT_SRC: &str = "object-src";
pub(crate) const MEDIA_SRC: &str = "media-src";
pub(crate) const FRAME_SRC: &str = "frame-src";
pub(crate) const WORKER_SRC: &str = "worker-src";
pub(crate) const MANIFEST_SRC: &str = "manifest-src";
pub(crate) const FRAME_ANCESTORS: &str = "frame-ancestors";
pub(crate) const BASE_URI: &str = "base-uri";
pub(crate) const FORM_ACTION: &str = "form-action";
pub(crate) const REQUIRE_TRUSTED_TYPES_FOR: &str = "require-trusted-types-for";

pub(crate) const REPORT_URI: &str = "report-uri";

pub(crate) const NONE_SOURCE: &str = "'none'";
pub(crate) const SELF_SOURCE: &str = "'self'";
pub(crate) const UNSAFE_INLINE_SOURCE: &str = "'unsafe-inline'";
pub(crate) const UNSAFE_EVAL_SOURCE: &str = "'unsafe-eval'";
pub(crate) const STRICT_DYNAMIC_SOURCE: &str = "'strict-dynamic'";
pub(crate) const NONCE_PREFIX: &str = "'nonce-";
pub(crate) const HASH_PREFIX_SHA256: &str = "'sha256-";
pub(crate) const HASH_PREFIX_SHA384: &str = "'sha384-";
pub(crate) const HASH_PREFIX_SHA512: &str = "'sha512-";
pub(crate) const SUFFIX_QUOTE: &str = "'";

/// Random bytes behind every nonce; 24 bytes encode to 32 base64 characters.
pub const NONCE_LENGTH: usize = 24;

/// Key under which the nonce is published in the serialized application state.
pub const STATE_NONCE_KEY: &str = "nonce";
pub(crate) const STATE_GLOBAL: &str = "window.__STATE__";

pub(crate) const SCRIPT_TAG_OPEN: &str = "<script";
pub(crate) const STYLE_TAG_OPEN: &str = "<style";

pub(crate) const SEMICOLON_SPACE: &[u8] = b"; ";
pub(crate) const DEFAULT_BUFFER_CAPACITY: usize = 512;
