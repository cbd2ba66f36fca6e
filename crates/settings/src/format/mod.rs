//! On-disk representations of the settings map.

pub(crate) mod binary;
pub mod literal;
pub(crate) mod text;

use lattice_domain::Value;
use std::collections::BTreeMap;

/// Save entries grouped by top-level section; the empty section holds section-less keys.
///
/// Sections iterate in lexical order, entries keep the `(order, name)` order they were
/// inserted with. Names are relative to their section.
pub(crate) type SectionMap = BTreeMap<String, Vec<(String, Value)>>;

/// Characters a key may contain without being quoted in text files.
pub(crate) fn is_plain_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '/' | '.' | '+' | '-')
}

/// Splits `key` into its section and the name within it.
///
/// Keys whose first segment cannot be written as a `[section]` header stay section-less.
pub(crate) fn split_section(key: &str) -> (&str, &str) {
    match key.split_once('/') {
        Some((section, name))
            if !section.is_empty() && !name.is_empty() && section.chars().all(is_plain_key_char) =>
        {
            (section, name)
        },
        _ => ("", key),
    }
}

/// Rejoins a section and a relative name.
pub(crate) fn join_section(section: &str, name: &str) -> String {
    if section.is_empty() { name.to_owned() } else { format!("{section}/{name}") }
}
