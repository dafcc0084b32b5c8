use actix_web::{test, web, App, HttpRequest, HttpResponse};
use actix_web_csp_nonce::core::{CspConfig, CspConfigBuilder, NonceMode};
use actix_web_csp_nonce::{
    CspExtensions, CspNonceMiddleware, HashAlgorithm, HashGenerator, PolicyInjector,
};

async fn html_page(req: HttpRequest) -> HttpResponse {
    let state = req.render_state_script().unwrap().unwrap_or_default();
    let html = format!(
        "<html><head><style>body{{}}</style></head><body>{}<script>alert(1)</script></body></html>",
        state
    );
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html)
}

async fn plain_nonce(req: HttpRequest) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain")
        .body(format!("<script>{}", req.get_nonce().unwrap_or_default()))
}

async fn static_page() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html")
        .body("<html><body><script>app()</script></body></html>")
}

async fn request_id(req: HttpRequest) -> HttpResponse {
    let context = req.render_context().unwrap();
    HttpResponse::Ok()
        .content_type("text/plain")
        .body(context.request_id().unwrap_or_default().to_owned())
}

fn state_hash(algorithm: HashAlgorithm, nonce: &str) -> String {
    let body = format!(r#"window.__STATE__={{"nonce":"{}"}}"#, nonce);
    HashGenerator::generate_source(algorithm, body.as_bytes()).to_string()
}

async fn json_api() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

fn header_nonce(header: &str) -> String {
    let start = header.find("'nonce-").expect("header carries a nonce") + "'nonce-".len();
    let end = header[start..].find('\'').unwrap() + start;
    header[start..end].to_owned()
}

fn middleware_with_nonce(nonce: &str) -> CspNonceMiddleware {
    CspNonceMiddleware::new(PolicyInjector::with_nonce(CspConfig::default(), nonce))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn test_html_response_is_stamped_and_headed() {
        let app = test::init_service(
            App::new()
                .wrap(middleware_with_nonce("abc123=="))
                .route("/", web::get().to(html_page)),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let header = resp
            .headers()
            .get("content-security-policy")
            .expect("CSP header present")
            .to_str()
            .unwrap()
            .to_owned();
        assert!(header.starts_with(&format!(
            "script-src 'unsafe-inline' 'self' 'nonce-abc123==' {}; ",
            state_hash(HashAlgorithm::Sha256, "abc123==")
        )));
        assert!(header.contains("style-src 'nonce-abc123==' 'self' 'unsafe-inline'"));
        assert_eq!(header.matches("'nonce-abc123=='").count(), 2);

        let body = test::read_body(resp).await;
        let body = std::str::from_utf8(&body).unwrap();
        assert!(body.contains(r#"<style nonce="abc123==">body{}</style>"#));
        assert!(body.contains(r#"<script nonce="abc123==">alert(1)</script>"#));
        assert!(body.contains(r#"<script nonce="abc123==">window.__STATE__={"nonce":"abc123=="}</script>"#));
        assert_eq!(body.matches("nonce=\"abc123==\"").count(), 3);
    }

    #[actix_web::test]
    async fn test_non_html_response_gets_header_only() {
        let app = test::init_service(
            App::new()
                .wrap(middleware_with_nonce("abc"))
                .route("/nonce", web::get().to(plain_nonce))
                .route("/api", web::get().to(json_api)),
        )
        .await;

        let req = test::TestRequest::get().uri("/nonce").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.headers().contains_key("content-security-policy"));
        let body = test::read_body(resp).await;
        assert_eq!(body, "<script>abc");

        let req = test::TestRequest::get().uri("/api").to_request();
        let resp = test::call_service(&app, req).await;
        let header = resp
            .headers()
            .get("content-security-policy")
            .unwrap()
            .to_str()
            .unwrap()
            .to_owned();
        assert_eq!(header_nonce(&header), "abc");
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "ok");
    }

    #[actix_web::test]
    async fn test_per_process_nonce_is_reused() {
        let middleware = CspNonceMiddleware::new(PolicyInjector::initialize().unwrap());
        let expected = middleware.injector().nonce().to_owned();
        let app = test::init_service(
            App::new()
                .wrap(middleware)
                .route("/", web::get().to(plain_nonce)),
        )
        .await;

        for _ in 0..3 {
            let req = test::TestRequest::get().uri("/").to_request();
            let body = test::call_and_read_body(&app, req).await;
            assert_eq!(body, format!("<script>{}", expected));
        }
    }

    #[actix_web::test]
    async fn test_per_request_nonces_match_header_and_markup() {
        let config = CspConfigBuilder::new()
            .nonce_mode(NonceMode::PerRequest)
            .build()
            .unwrap();
        let middleware = CspNonceMiddleware::new(PolicyInjector::with_config(config).unwrap());
        let injector = middleware.injector();
        let app = test::init_service(
            App::new()
                .wrap(middleware)
                .route("/", web::get().to(html_page)),
        )
        .await;

        let mut nonces = Vec::new();
        for _ in 0..2 {
            let req = test::TestRequest::get().uri("/").to_request();
            let resp = test::call_service(&app, req).await;
            let header = resp
                .headers()
                .get("content-security-policy")
                .unwrap()
                .to_str()
                .unwrap()
                .to_owned();
            let nonce = header_nonce(&header);
            assert!(header.contains(&format!("style-src 'nonce-{}'", nonce)));

            let body = test::read_body(resp).await;
            let body = std::str::from_utf8(&body).unwrap().to_owned();
            assert!(body.contains(&format!(r#"<script nonce="{}">alert(1)"#, nonce)));
            nonces.push(nonce);
        }

        assert_ne!(nonces[0], nonces[1]);
        assert_eq!(injector.stats().request_count(), 2);
        assert_eq!(injector.stats().html_rewrite_count(), 2);
        assert_eq!(injector.stats().stamped_tag_count(), 6);
        assert_eq!(injector.stats().nonce_generation_count(), 3);
    }

    #[actix_web::test]
    async fn test_report_only_header_name() {
        let config = CspConfigBuilder::new().report_only(true).build().unwrap();
        let middleware = CspNonceMiddleware::new(PolicyInjector::with_config(config).unwrap());
        let app = test::init_service(
            App::new()
                .wrap(middleware)
                .route("/", web::get().to(json_api)),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp
            .headers()
            .contains_key("content-security-policy-report-only"));
        assert!(!resp.headers().contains_key("content-security-policy"));
    }

    #[actix_web::test]
    async fn test_missing_route_still_gets_header() {
        let app = test::init_service(
            App::new()
                .wrap(middleware_with_nonce("abc"))
                .route("/", web::get().to(json_api)),
        )
        .await;

        let req = test::TestRequest::get().uri("/nowhere").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(resp.headers().contains_key("content-security-policy"));
    }

    #[actix_web::test]
    async fn test_embedded_state_is_hashed_with_configured_algorithm() {
        let config = CspConfigBuilder::new()
            .hash_algorithm(HashAlgorithm::Sha384)
            .build()
            .unwrap();
        let middleware = CspNonceMiddleware::new(PolicyInjector::with_config(config).unwrap());
        let nonce = middleware.injector().nonce().to_owned();
        let app = test::init_service(
            App::new()
                .wrap(middleware)
                .route("/", web::get().to(html_page))
                .route("/static", web::get().to(static_page)),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        let header = resp
            .headers()
            .get("content-security-policy")
            .unwrap()
            .to_str()
            .unwrap()
            .to_owned();
        let script_src = header.split("; ").next().unwrap();
        assert!(script_src.contains(&state_hash(HashAlgorithm::Sha384, &nonce)));
        assert!(!header.contains("'sha256-"));

        let req = test::TestRequest::get().uri("/static").to_request();
        let resp = test::call_service(&app, req).await;
        let header = resp
            .headers()
            .get("content-security-policy")
            .unwrap()
            .to_str()
            .unwrap()
            .to_owned();
        assert!(!header.contains("'sha384-"));
        assert!(header.contains(&format!("'nonce-{}'", nonce)));
    }

    #[actix_web::test]
    async fn test_unencodable_header_fails_closed() {
        let app = test::init_service(
            App::new()
                .wrap(middleware_with_nonce("bad\nnonce"))
                .route("/", web::get().to(json_api)),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!resp.headers().contains_key("content-security-policy"));
        let body = test::read_body(resp).await;
        assert!(!body.starts_with(b"{\"status\""));
    }

    #[actix_web::test]
    async fn test_each_request_gets_its_own_id() {
        let app = test::init_service(
            App::new()
                .wrap(middleware_with_nonce("abc"))
                .route("/", web::get().to(request_id)),
        )
        .await;

        let first = test::call_and_read_body(&app, test::TestRequest::get().uri("/").to_request()).await;
        let second = test::call_and_read_body(&app, test::TestRequest::get().uri("/").to_request()).await;

        assert_eq!(first.len(), 36);
        assert_eq!(second.len(), 36);
        assert_ne!(first, second);
    }
}
