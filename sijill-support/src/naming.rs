//! Service name canonicalization.
//!
//! Two transforms are used throughout the container:
//! - [`normalize_name`] turns any spelling of a service name into its
//!   PascalCase "method" form (`foo_bar` → `FooBar`).
//! - [`underscore`] turns a PascalCase method form back into the
//!   snake/dot separated service id (`FooBar_BazQux` → `foo_bar.baz_qux`).

use once_cell::sync::Lazy;
use regex::Regex;

static ACRONYM_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("valid acronym pattern"));

static WORD_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z\d])([A-Z])").expect("valid word pattern"));

/// Canonicalizes a service name.
///
/// Underscores and spaces separate words; every word gets an upper-case
/// first letter and the separators are dropped. Other whitespace starts a
/// new word but is kept.
///
/// ```
/// use sijill_support::naming::normalize_name;
///
/// assert_eq!(normalize_name("foo_bar"), "FooBar");
/// assert_eq!(normalize_name("fooBar"), "FooBar");
/// assert_eq!(normalize_name("FooBar"), "FooBar");
/// ```
pub fn normalize_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut word_start = true;

    for ch in name.chars() {
        match ch {
            '_' | ' ' => word_start = true,
            '\t' | '\n' | '\r' | '\x0b' | '\x0c' => {
                result.push(ch);
                word_start = true;
            }
            _ if word_start => {
                result.push(ch.to_ascii_uppercase());
                word_start = false;
            }
            _ => result.push(ch),
        }
    }

    result
}

/// Converts a PascalCase name into a lower-case service id.
///
/// Underscores become dots, then word boundaries get an underscore:
/// a run of capitals followed by a capitalized word splits before the
/// last capital (`HTMLParser` → `html_parser`), and a lower-case letter
/// or digit followed by a capital splits between them.
///
/// ```
/// use sijill_support::naming::underscore;
///
/// assert_eq!(underscore("FooService"), "foo_service");
/// assert_eq!(underscore("Foo_BarBaz"), "foo.bar_baz");
/// ```
pub fn underscore(name: &str) -> String {
    let dotted = name.replace('_', ".");
    let split = ACRONYM_BOUNDARY.replace_all(&dotted, "${1}_${2}");
    let split = WORD_BOUNDARY.replace_all(&split, "${1}_${2}");
    split.to_lowercase()
}

/// Key under which a name is stored inside a registry.
///
/// Lower-cased normalized form, so lookups ignore both case and
/// separator style.
pub fn slot_key(name: &str) -> String {
    normalize_name(name).to_ascii_lowercase()
}
