pub mod constants;
pub mod core;
pub mod error;
pub mod injector;
pub mod middleware;
pub mod monitoring;
pub mod prelude;
pub mod render;
pub mod security;
pub(crate) mod utils;

// Re-export commonly used types for convenience
pub use crate::core::{CspConfig, CspConfigBuilder, CspOptions, CspPolicy, CspPolicyBuilder, NonceMode, Source};
pub use error::CspError;
pub use injector::{default_policy, PolicyInjector};
pub use middleware::{
    csp_nonce_middleware, csp_nonce_middleware_with_config, CspExtensions, CspNonceMiddleware,
};
pub use monitoring::CspStats;
pub use render::{inject_nonce_attributes, RenderContext, RenderHooks, RenderResult};
pub use security::{HashAlgorithm, HashGenerator, NonceGenerator, RequestNonce};
