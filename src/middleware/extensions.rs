use crate::error::CspError;
use crate::render::RenderContext;
use crate::security::hash::{HashAlgorithm, HashGenerator};
use crate::security::nonce::RequestNonce;
use actix_web::HttpMessage;
use serde::Serialize;

/// Request helpers for handlers running behind
/// [`CspNonceMiddleware`](crate::middleware::CspNonceMiddleware).
pub trait CspExtensions {
    fn get_nonce(&self) -> Option<String>;
    fn render_context(&self) -> Option<RenderContext>;
    /// Adds a value to the state serialized into the page.
    fn insert_render_state<T: Serialize>(&self, key: &str, value: T) -> Result<(), CspError>;
    /// The inline script carrying the render state, ready to embed in markup.
    fn render_state_script(&self) -> Result<Option<String>, CspError>;
    fn generate_hash(&self, algorithm: HashAlgorithm, data: &[u8]) -> String;
}

impl<T> CspExtensions for T
where
    T: HttpMessage,
{
    fn get_nonce(&self) -> Option<String> {
        self.extensions()
            .get::<RequestNonce>()
            .map(|nonce| nonce.0.clone())
    }

    fn render_context(&self) -> Option<RenderContext> {
        self.extensions().get::<RenderContext>().cloned()
    }

    fn insert_render_state<V: Serialize>(&self, key: &str, value: V) -> Result<(), CspError> {
        match self.extensions_mut().get_mut::<RenderContext>() {
            Some(context) => context.insert_state(key, value),
            None => Err(CspError::ConfigError(
                "no render context on this request".to_string(),
            )),
        }
    }

    fn render_state_script(&self) -> Result<Option<String>, CspError> {
        self.extensions()
            .get::<RenderContext>()
            .map(RenderContext::state_script)
            .transpose()
    }

    fn generate_hash(&self, algorithm: HashAlgorithm, data: &[u8]) -> String {
        HashGenerator::generate(algorithm, data)
    }
}
