use actix_web_csp_nonce::security::{HashAlgorithm, HashGenerator};
use actix_web_csp_nonce::{RenderResult, Source};
use test_case::test_case;

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_sha256_of_empty_input() {
        assert_eq!(
            HashGenerator::generate(HashAlgorithm::Sha256, b""),
            "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
        );
    }

    #[test]
    fn test_hash_source_renders_with_prefix() {
        let source = HashGenerator::generate_source(HashAlgorithm::Sha256, b"");

        assert_eq!(
            source.to_string(),
            "'sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU='"
        );
        assert!(source.contains_hash());
    }

    #[test]
    fn test_verify_hash() {
        let hash = HashGenerator::generate(HashAlgorithm::Sha384, b"console.log(1)");

        assert!(HashGenerator::verify_hash(
            HashAlgorithm::Sha384,
            b"console.log(1)",
            &hash
        ));
        assert!(!HashGenerator::verify_hash(
            HashAlgorithm::Sha384,
            b"console.log(2)",
            &hash
        ));
    }

    #[test_case("sha256", HashAlgorithm::Sha256 ; "sha256")]
    #[test_case("sha384", HashAlgorithm::Sha384 ; "sha384")]
    #[test_case("sha512", HashAlgorithm::Sha512 ; "sha512")]
    fn test_hash_algorithm_from_str(name: &str, expected: HashAlgorithm) {
        assert_eq!(HashAlgorithm::try_from(name).unwrap(), expected);
        assert_eq!(expected.name(), name);
    }

    #[test]
    fn test_hash_algorithm_rejects_unknown() {
        assert!(HashAlgorithm::try_from("md5").is_err());
    }

    #[test]
    fn test_render_result_add_script_hash() {
        let mut result = RenderResult::new("<p>hi</p>");

        result.add_script_hash(HashAlgorithm::Sha256, "");

        assert_eq!(
            result.csp_script_src_hashes,
            vec!["'sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU='".to_string()]
        );
        assert_eq!(
            Source::parse(&result.csp_script_src_hashes[0]).hash_value(),
            Some((
                "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=",
                HashAlgorithm::Sha256
            ))
        );
    }
}
