//! Host-side render pipeline types and the extension points the pipeline
//! calls while producing a server-side rendered page.

pub mod context;
pub mod hooks;
pub mod html;
pub mod result;

pub use context::RenderContext;
pub use hooks::RenderHooks;
pub use html::{inject_nonce_attributes, nonce_attribute_targets};
pub use result::RenderResult;
