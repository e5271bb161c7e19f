// src/core/namespace.rs

use crate::constants::DEFAULT_NAMESPACE;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Any run of characters that are neither letters nor digits, in any script, separates two segments.
    static ref SEPARATOR_RE: Regex =
        Regex::new(r"[^\p{Alphabetic}\p{N}]+").expect("separator pattern is valid");
}

/// Converts a free-form application name into the PascalCase namespace that user
/// strategies and plugins are isolated under.
///
/// `"foo-bar"` becomes `"FooBar"`, `"my_app name"` becomes `"MyAppName"`. Only the first
/// character of each segment is touched. An absent or blank name yields `"Userland"`.
pub fn derive_namespace(application_name: Option<&str>) -> String {
    let namespace: String = SEPARATOR_RE
        .split(application_name.unwrap_or_default())
        .filter(|segment| !segment.is_empty())
        .map(capitalize)
        .collect();

    if namespace.is_empty() {
        DEFAULT_NAMESPACE.to_string()
    } else {
        namespace
    }
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_pascal_cases_separated_names() {
        assert_eq!(derive_namespace(Some("foo-bar")), "FooBar");
        assert_eq!(derive_namespace(Some("foo_bar")), "FooBar");
        assert_eq!(derive_namespace(Some("my app  name")), "MyAppName");
        assert_eq!(derive_namespace(Some("--leading-and-trailing--")), "LeadingAndTrailing");
    }

    #[test]
    fn test_keeps_inner_casing() {
        assert_eq!(derive_namespace(Some("fooBar-baz")), "FooBarBaz");
        assert_eq!(derive_namespace(Some("API-client")), "APIClient");
    }

    #[test]
    fn test_non_ascii_letters_are_kept() {
        assert_eq!(derive_namespace(Some("café-app")), "CaféApp");
        assert_eq!(derive_namespace(Some("über-deploy")), "ÜberDeploy");
        assert_eq!(derive_namespace(Some("projet_été 2")), "ProjetÉté2");
    }

    #[test]
    fn test_empty_name_yields_stable_default() {
        assert_eq!(derive_namespace(None), "Userland");
        assert_eq!(derive_namespace(Some("")), "Userland");
        assert_eq!(derive_namespace(Some(" - _ ")), "Userland");
    }
}
