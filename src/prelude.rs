pub use crate::core::{CspConfig, CspConfigBuilder, CspOptions, CspPolicy, CspPolicyBuilder, NonceMode, Source};
pub use crate::injector::PolicyInjector;
pub use crate::middleware::{csp_nonce_middleware, CspExtensions, CspNonceMiddleware};
pub use crate::render::{RenderContext, RenderHooks, RenderResult};
pub use crate::security::{HashAlgorithm, NonceGenerator};
