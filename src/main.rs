use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use actix_web_csp_nonce::{CspExtensions, CspNonceMiddleware, CspOptions, PolicyInjector};
use std::io;

async fn index(req: HttpRequest) -> HttpResponse {
    if let Err(err) = req.insert_render_state("page", "index") {
        log::warn!("Could not extend render state: {}", err);
    }
    let state = req.render_state_script().ok().flatten().unwrap_or_default();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <style>body {{ font-family: sans-serif; }}</style>
</head>
<body>
    <h1>CSP nonce demo</h1>
    {}
    <script>console.log('nonce', window.__STATE__.nonce);</script>
</body>
</html>"#,
        state
    );

    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let options = match std::env::args().nth(1) {
        Some(path) => CspOptions::from_file(path),
        None => Ok(CspOptions::default()),
    }
    .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;

    let injector = options
        .into_config()
        .and_then(PolicyInjector::with_config)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;

    log::info!(
        "Serving on http://127.0.0.1:8080 with {}: {}",
        injector.header_name(),
        injector
            .policy()
            .header_value()
            .ok()
            .and_then(|value| value.to_str().map(str::to_owned).ok())
            .unwrap_or_default()
    );

    let middleware = CspNonceMiddleware::new(injector);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware.clone())
            .route("/", web::get().to(index))
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}
