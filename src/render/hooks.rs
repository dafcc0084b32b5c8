use crate::error::CspError;
use crate::render::{RenderContext, RenderResult};

/// Extension points a server-side render pipeline invokes, in order:
/// `on_route_context` once the context exists, `on_serialize_state` before the
/// application state is written into the page, and `on_route_rendered` once
/// the markup is complete.
pub trait RenderHooks {
    fn on_route_context(&self, _context: &RenderContext) {}

    fn on_serialize_state(&self, context: &mut RenderContext) -> Result<(), CspError>;

    fn on_route_rendered(
        &self,
        url: &str,
        result: &mut RenderResult,
        context: &RenderContext,
    ) -> Result<(), CspError>;
}
