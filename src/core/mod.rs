pub mod config;
pub mod directives;
pub mod policy;
pub mod source;

pub use config::{CspConfig, CspConfigBuilder, CspOptions, NonceMode};
pub use directives::*;
pub use policy::{CspPolicy, CspPolicyBuilder};
pub use source::Source;
