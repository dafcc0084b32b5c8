use actix_web::http::header::HeaderName;
use actix_web_csp_nonce::core::{CspPolicy, CspPolicyBuilder, Directive, Source};
use actix_web_csp_nonce::HashAlgorithm;
use test_case::test_case;

fn header_text(policy: &CspPolicy, extra: &[String]) -> String {
    policy
        .header_value_with_script_sources(extra)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_csp_policy_creation() {
        let policy = CspPolicy::new();

        assert!(!policy.is_report_only());
        assert!(policy.report_uri().is_none());
        assert_eq!(policy.directives().count(), 0);
        assert_eq!(policy.header_value().unwrap(), "");
    }

    #[test]
    fn test_csp_policy_header_name() {
        let mut policy = CspPolicy::new();

        assert_eq!(
            policy.header_name(),
            HeaderName::from_static("content-security-policy")
        );

        policy.set_report_only(true);
        assert_eq!(
            policy.header_name(),
            HeaderName::from_static("content-security-policy-report-only")
        );
    }

    #[test]
    fn test_header_value_keeps_insertion_order() {
        let policy = CspPolicyBuilder::new()
            .script_src([Source::Self_])
            .object_src([Source::None])
            .img_src([Source::Self_, Source::scheme("data")])
            .build()
            .unwrap();

        assert_eq!(
            header_text(&policy, &[]),
            "script-src 'self'; object-src 'none'; img-src 'self' data:"
        );
    }

    #[test]
    fn test_require_trusted_types_for_renders_quoted_keyword() {
        let policy = CspPolicyBuilder::new()
            .require_trusted_types_for(["script"])
            .build()
            .unwrap();

        assert_eq!(header_text(&policy, &[]), "require-trusted-types-for 'script'");
    }

    #[test]
    fn test_extra_script_sources_merge_into_script_src() {
        let policy = CspPolicyBuilder::new()
            .script_src([Source::Self_])
            .style_src([Source::Self_])
            .build_unchecked();

        let extra = vec!["'nonce-abc'".to_string(), "'sha256-xyz'".to_string()];

        assert_eq!(
            header_text(&policy, &extra),
            "script-src 'self' 'nonce-abc' 'sha256-xyz'; style-src 'self'"
        );
    }

    #[test]
    fn test_extra_script_sources_are_not_repeated() {
        let policy = CspPolicyBuilder::new()
            .script_src([Source::Self_, Source::nonce("abc")])
            .build_unchecked();

        let extra = vec!["'nonce-abc'".to_string(), "'nonce-abc'".to_string()];

        assert_eq!(header_text(&policy, &extra), "script-src 'self' 'nonce-abc'");
    }

    #[test]
    fn test_extra_script_sources_create_missing_script_src() {
        let policy = CspPolicyBuilder::new()
            .object_src([Source::None])
            .build_unchecked();

        let extra = vec!["'nonce-abc'".to_string()];

        assert_eq!(
            header_text(&policy, &extra),
            "object-src 'none'; script-src 'nonce-abc'"
        );
    }

    #[test]
    fn test_with_nonce_rebinds_every_nonce_source() {
        let policy = CspPolicyBuilder::new()
            .script_src([Source::Self_, Source::nonce("old")])
            .style_src([Source::nonce("old")])
            .build_unchecked();

        let rebound = policy.with_nonce("new");

        assert_eq!(rebound.nonce_values(), vec!["new"]);
        assert_eq!(policy.nonce_values(), vec!["old"]);
        assert_eq!(
            header_text(&rebound, &[]),
            "script-src 'self' 'nonce-new'; style-src 'nonce-new'"
        );
    }

    #[test]
    fn test_report_uri_is_appended_and_validated() {
        let policy = CspPolicyBuilder::new()
            .default_src([Source::Self_])
            .report_uri("https://example.com/csp-report")
            .build()
            .unwrap();

        assert_eq!(
            header_text(&policy, &[]),
            "default-src 'self'; report-uri https://example.com/csp-report"
        );

        let relative = CspPolicyBuilder::new()
            .report_uri("/csp-report")
            .build();
        assert!(relative.is_ok());

        let invalid = CspPolicyBuilder::new()
            .report_uri("not a uri")
            .build();
        assert!(invalid.is_err());
    }

    #[test]
    fn test_validation_rejects_empty_nonce() {
        let result = CspPolicyBuilder::new()
            .script_src([Source::nonce("")])
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_none_source_is_exclusive() {
        let mut directive = Directive::new("object-src");
        directive.add_source(Source::Self_);
        directive.add_source(Source::None);

        assert_eq!(directive.sources(), &[Source::None]);

        directive.add_source(Source::Self_);
        assert_eq!(directive.sources(), &[Source::Self_]);
    }

    #[test_case("'self'", Source::Self_ ; "self keyword")]
    #[test_case("'none'", Source::None ; "none keyword")]
    #[test_case("'unsafe-inline'", Source::UnsafeInline ; "unsafe inline")]
    #[test_case("'strict-dynamic'", Source::StrictDynamic ; "strict dynamic")]
    #[test_case("'nonce-abc123=='", Source::nonce("abc123==") ; "nonce")]
    #[test_case("data:", Source::scheme("data") ; "scheme")]
    #[test_case("'script'", Source::keyword("script") ; "keyword")]
    #[test_case("https://cdn.example.com", Source::Host("https://cdn.example.com".into()) ; "host")]
    fn test_source_parse(expr: &str, expected: Source) {
        let parsed = Source::parse(expr);

        assert_eq!(parsed, expected);
        assert_eq!(parsed.to_string(), expr);
    }

    #[test]
    fn test_source_parse_hash() {
        let parsed = Source::parse("'sha512-abc'");

        assert_eq!(parsed.hash_value(), Some(("abc", HashAlgorithm::Sha512)));
    }
}
