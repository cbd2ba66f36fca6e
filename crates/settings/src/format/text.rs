//! Line-oriented text settings documents.
//!
//! ```text
//! ; comment
//! config_version=5
//! custom_features="demo,steam"
//!
//! [application]
//!
//! config/name="Demo"
//! run/main_scene="res://main.scn"
//! ```

use crate::error::SettingsError;
use crate::format::literal::{self, Cursor};
use crate::format::{SectionMap, is_plain_key_char, join_section};
use lattice_domain::Value;
use lattice_domain::constants::{CONFIG_VERSION, CONFIG_VERSION_KEY, CUSTOM_FEATURES_KEY};
use tracing::warn;

const HEADER: &str = "\
; Engine configuration file.
; It's best edited using the editor UI and not directly,
; since the parameters that go here are not all obvious.
;
; Format:
;   [section] ; section goes between []
;   param=value ; assign values to parameters
";

/// A fully parsed document, staged before any record is applied.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct TextDocument {
    /// `config_version` of the file; `0` when absent.
    pub(crate) version: i64,
    /// Assignments in file order, keys already prefixed with their section.
    pub(crate) entries: Vec<(String, Value)>,
}

/// Parses a whole document.
///
/// Malformed assignments are skipped with a warning and parsing resumes on the next line.
///
/// # Errors
/// Returns [`SettingsError::IncompatibleVersion`] if `config_version` is newer than
/// [`CONFIG_VERSION`].
pub(crate) fn parse(src: &str, origin: &str) -> Result<TextDocument, SettingsError> {
    let mut doc = TextDocument::default();
    let mut cursor = Cursor::new(src.strip_prefix('\u{feff}').unwrap_or(src));
    let mut section = String::new();

    loop {
        cursor.skip_whitespace();
        match cursor.peek() {
            None => break,
            Some(';' | '#') => cursor.skip_line(),
            Some('[') => {
                cursor.bump();
                let name = cursor.take_until(&[']']).trim().to_owned();
                if cursor.peek() == Some(']') && !name.is_empty() {
                    cursor.bump();
                    section = name;
                    finish_line(&mut cursor, origin);
                } else {
                    warn!(origin, line = cursor.line(), "Malformed section header skipped");
                    cursor.skip_line();
                }
            },
            Some(_) => {
                let Some((key, quoted, value)) = assignment(&mut cursor, origin) else {
                    continue;
                };

                if section.is_empty() && !quoted && key == CONFIG_VERSION_KEY {
                    doc.version = config_version(&value, origin)?;
                } else {
                    doc.entries.push((join_section(&section, &key), value));
                }
            },
        }
    }

    Ok(doc)
}

/// Parses `key=value`; the flag tells whether the key was quoted.
fn assignment(cursor: &mut Cursor<'_>, origin: &str) -> Option<(String, bool, Value)> {
    let line = cursor.line();
    let quoted = cursor.peek() == Some('"');
    let key = if quoted {
        match cursor.string() {
            Ok(key) => key,
            Err(failure) => {
                warn!(origin, line, error = %failure.into_error(), "Malformed key skipped");
                cursor.skip_line();
                return None;
            },
        }
    } else {
        cursor.take_until(&['=']).trim().to_owned()
    };

    cursor.skip_inline_whitespace();
    if (key.is_empty() && !quoted) || cursor.peek() != Some('=') {
        warn!(origin, line, "Line is not a key=value assignment, skipped");
        cursor.skip_line();
        return None;
    }
    cursor.bump();
    cursor.skip_inline_whitespace();

    let checkpoint = cursor.clone();
    match cursor.value() {
        Ok(value) => finish_line(cursor, origin).then_some((key, quoted, value)),
        Err(failure) => {
            warn!(origin, key = %key, error = %failure.into_error(), "Malformed value skipped");
            // Resume on the line after the assignment, not after the point of failure.
            *cursor = checkpoint;
            cursor.skip_line();
            None
        },
    }
}

/// Accepts trailing whitespace and comments; anything else discards the line.
fn finish_line(cursor: &mut Cursor<'_>, origin: &str) -> bool {
    cursor.skip_inline_whitespace();
    match cursor.peek() {
        None => true,
        Some('\n' | ';' | '#') => {
            cursor.skip_line();
            true
        },
        Some(_) => {
            warn!(origin, line = cursor.line(), "Unexpected trailing input, line skipped");
            cursor.skip_line();
            false
        },
    }
}

fn config_version(value: &Value, origin: &str) -> Result<i64, SettingsError> {
    let Some(version) = value.as_int() else {
        warn!(origin, kind = %value.kind(), "config_version is not an integer, ignored");
        return Ok(0);
    };
    if version > CONFIG_VERSION {
        return Err(SettingsError::IncompatibleVersion {
            found: version,
            supported: CONFIG_VERSION,
            context: Some(origin.to_owned().into()),
        });
    }
    Ok(version)
}

/// Renders the document written by `save_custom`.
pub(crate) fn write(sections: &SectionMap, custom_features: &str) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    out.push_str(&format!("{CONFIG_VERSION_KEY}={CONFIG_VERSION}\n"));
    if !custom_features.is_empty() {
        out.push_str(CUSTOM_FEATURES_KEY);
        out.push('=');
        literal::write_string(&mut out, custom_features);
        out.push('\n');
    }
    out.push('\n');

    for (i, (section, entries)) in sections.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if !section.is_empty() {
            out.push_str(&format!("[{section}]\n\n"));
        }
        for (name, value) in entries {
            // A bare top-level `config_version` would be read back as the file version.
            let reserved = section.is_empty() && name == CONFIG_VERSION_KEY;
            write_key(&mut out, name, reserved);
            out.push('=');
            literal::write_value(&mut out, value);
            out.push('\n');
        }
    }

    out
}

fn write_key(out: &mut String, key: &str, force_quotes: bool) {
    if !force_quotes && !key.is_empty() && key.chars().all(is_plain_key_char) {
        out.push_str(key);
    } else {
        literal::write_string(out, key);
    }
}
