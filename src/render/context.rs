use crate::constants::{STATE_GLOBAL, STATE_NONCE_KEY};
use crate::error::CspError;
use crate::utils::escape_inline_json;
use serde::Serialize;
use serde_json::{Map, Value};

/// Request-scoped state carried through one server-side render.
///
/// `state` is serialized into the page so client code can read it after
/// hydration; the nonce is published there under `"nonce"`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderContext {
    route: String,
    request_id: Option<String>,
    state: Map<String, Value>,
}

impl RenderContext {
    #[inline]
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    #[inline]
    pub fn route(&self) -> &str {
        &self.route
    }

    #[inline]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    #[inline]
    pub fn nonce(&self) -> Option<&str> {
        self.state.get(STATE_NONCE_KEY).and_then(Value::as_str)
    }

    #[inline]
    pub fn set_nonce(&mut self, nonce: impl Into<String>) {
        self.state
            .insert(STATE_NONCE_KEY.to_owned(), Value::String(nonce.into()));
    }

    #[inline]
    pub fn state(&self) -> &Map<String, Value> {
        &self.state
    }

    /// Stores any serializable value in the application state.
    pub fn insert_state<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> Result<(), CspError> {
        self.state.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn state_json(&self) -> Result<String, CspError> {
        Ok(serde_json::to_string(&self.state)?)
    }

    /// Body of the state script, the text a `script-src` hash covers.
    pub fn state_script_body(&self) -> Result<String, CspError> {
        let json = escape_inline_json(&self.state_json()?);
        Ok(format!("{}={}", STATE_GLOBAL, json))
    }

    /// The inline script that hands the state to the client.
    pub fn state_script(&self) -> Result<String, CspError> {
        Ok(format!("<script>{}</script>", self.state_script_body()?))
    }
}
