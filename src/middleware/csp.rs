use crate::core::config::CspConfig;
use crate::error::CspError;
use crate::injector::PolicyInjector;
use crate::render::{RenderContext, RenderHooks, RenderResult};
use crate::security::nonce::RequestNonce;
use actix_web::{
    body::{self, BoxBody, MessageBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::CONTENT_TYPE,
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use log::{debug, error, warn};
use std::{rc::Rc, sync::Arc};
use uuid::Uuid;

/// Runs the [`PolicyInjector`] hooks around every request and sets the CSP
/// header on the response. HTML bodies get their `<script>`/`<style>` tags
/// stamped with the request's nonce.
#[derive(Clone)]
pub struct CspNonceMiddleware {
    injector: Arc<PolicyInjector>,
}

impl CspNonceMiddleware {
    #[inline]
    pub fn new(injector: PolicyInjector) -> Self {
        Self {
            injector: Arc::new(injector),
        }
    }

    #[inline]
    pub fn injector(&self) -> Arc<PolicyInjector> {
        self.injector.clone()
    }
}

impl<S, B> Transform<S, ServiceRequest> for CspNonceMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = CspNonceMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CspNonceMiddlewareService {
            service: Rc::new(service),
            injector: self.injector.clone(),
        }))
    }
}

pub struct CspNonceMiddlewareService<S> {
    service: Rc<S>,
    injector: Arc<PolicyInjector>,
}

impl<S, B> Service<ServiceRequest> for CspNonceMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let injector = self.injector.clone();

        Box::pin(async move {
            injector.stats().increment_request_count();

            let request_id = Uuid::new_v4()
                .hyphenated()
                .encode_lower(&mut Uuid::encode_buffer())
                .to_owned();
            let route = req.path().to_owned();

            let mut context = RenderContext::new(route.clone()).with_request_id(request_id);
            injector.on_route_context(&context);
            injector.on_serialize_state(&mut context)?;

            if let Some(nonce) = context.nonce() {
                req.extensions_mut().insert(RequestNonce(nonce.to_owned()));
            }
            req.extensions_mut().insert(context);

            let res = service.call(req).await?;

            let context = res
                .request()
                .extensions_mut()
                .remove::<RenderContext>()
                .unwrap_or_else(|| RenderContext::new(route.clone()));

            let (mut res, result) = if is_html(&res) {
                render_html(&injector, &route, res, &context).await?
            } else {
                (res.map_into_boxed_body(), RenderResult::default())
            };

            match injector.header_value(&result, &context) {
                Ok(value) => {
                    res.headers_mut().insert(injector.header_name(), value);
                    Ok::<_, Error>(res)
                }
                Err(err) => {
                    error!(
                        "Failed to build CSP header for {} (request {}): {}",
                        route,
                        context.request_id().unwrap_or("-"),
                        err
                    );
                    Ok(res.error_response(err))
                }
            }
        })
    }
}

fn is_html<B>(res: &ServiceResponse<B>) -> bool {
    res.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| value.starts_with("text/html"))
}

async fn render_html<B>(
    injector: &PolicyInjector,
    route: &str,
    res: ServiceResponse<B>,
    context: &RenderContext,
) -> Result<(ServiceResponse<BoxBody>, RenderResult), Error>
where
    B: MessageBody + 'static,
{
    let (http_req, http_res) = res.into_parts();
    let (head, payload) = http_res.into_parts();

    let bytes = body::to_bytes(payload).await.map_err(|err| {
        let err: Box<dyn std::error::Error> = err.into();
        CspError::BodyError(err.to_string())
    })?;

    let html = match String::from_utf8(bytes.to_vec()) {
        Ok(html) => html,
        Err(_) => {
            warn!("HTML response for {} is not UTF-8, passing it through", route);
            let res = head.set_body(bytes).map_into_boxed_body();
            return Ok((ServiceResponse::new(http_req, res), RenderResult::default()));
        }
    };

    let mut result = RenderResult::new(html);
    match injector.on_route_rendered(route, &mut result, context) {
        Ok(()) => {
            if injector.hash_embedded_state(&mut result, context)? {
                debug!(
                    "Allow-listed state script for {} by {}",
                    route,
                    injector.config().hash_algorithm()
                );
            }
        }
        Err(err) => debug!("Serving {} without nonce attributes: {}", route, err),
    }

    let res = head
        .set_body(std::mem::take(&mut result.html))
        .map_into_boxed_body();
    Ok((ServiceResponse::new(http_req, res), result))
}

/// Middleware with the default strict policy and a fresh process nonce.
pub fn csp_nonce_middleware() -> Result<CspNonceMiddleware, CspError> {
    Ok(CspNonceMiddleware::new(PolicyInjector::initialize()?))
}

pub fn csp_nonce_middleware_with_config(
    config: CspConfig,
) -> Result<CspNonceMiddleware, CspError> {
    Ok(CspNonceMiddleware::new(PolicyInjector::with_config(config)?))
}
