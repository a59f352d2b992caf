//! moredis Template - Mapping Template Engine
//!
//! Compiles the small template language used in mapping configuration
//! (`{{.field}}`, pipes, and the `toLower`/`toString`/`toSet` functions) and
//! executes it against BSON documents. Also builds structured queries from
//! templated JSON.
//!
//! # Example
//!
//! ```
//! use bson::doc;
//! use moredis_template::Template;
//!
//! let template = Template::compile("{{.name | toLower}}").unwrap();
//! assert_eq!(template.execute(&doc! { "name": "ADA" }).unwrap(), "ada");
//! ```

mod exec;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod query;
mod template;

pub use functions::Function;
pub use query::{build_query, is_object_id_hex, parse_templated_json, set_object_ids, BuiltQuery};
pub use template::{render, Template};

/// What a field lookup against a missing key renders as.
pub const NO_VALUE: &str = "<no value>";

/// True when a rendered key should not be written: empty, or a lookup that
/// found nothing.
pub fn is_skip_marker(rendered: &str) -> bool {
    rendered.is_empty() || rendered == NO_VALUE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_skip_marker() {
        assert!(is_skip_marker(""));
        assert!(is_skip_marker("<no value>"));
        assert!(!is_skip_marker("0"));
        assert!(!is_skip_marker(" <no value>"));
    }
}
