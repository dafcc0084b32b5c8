pub mod csp;
pub mod extensions;

pub use csp::{
    csp_nonce_middleware, csp_nonce_middleware_with_config, CspNonceMiddleware,
    CspNonceMiddlewareService,
};
pub use extensions::CspExtensions;
