//! Compact binary settings files.
//!
//! ```text
//! [magic "ECFG"][count u32]
//! count x [key_len u32][key utf-8][value_len u32][value postcard]
//! ```
//!
//! Integers are little-endian.

use crate::error::{SettingsError, SettingsErrorExt};
use lattice_domain::Value;
use lattice_domain::constants::CUSTOM_FEATURES_KEY;
use tracing::warn;

pub(crate) const MAGIC: [u8; 4] = *b"ECFG";

/// Serializes `entries`, preceded by a `custom_features` pseudo-record when non-empty.
///
/// # Errors
/// Returns [`SettingsError::Encode`] if a value cannot be encoded, or
/// [`SettingsError::InvalidParameter`] if a length does not fit the frame.
pub(crate) fn encode<'a>(
    entries: impl ExactSizeIterator<Item = (&'a str, &'a Value)>,
    custom_features: &str,
) -> Result<Vec<u8>, SettingsError> {
    let features = (!custom_features.is_empty()).then(|| Value::from(custom_features));
    let count = entries.len() + usize::from(features.is_some());

    let mut out = Vec::with_capacity(64 + count * 32);
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&frame_len(count)?.to_le_bytes());

    if let Some(value) = &features {
        write_record(&mut out, CUSTOM_FEATURES_KEY, value)?;
    }
    for (key, value) in entries {
        write_record(&mut out, key, value)?;
    }

    Ok(out)
}

fn write_record(out: &mut Vec<u8>, key: &str, value: &Value) -> Result<(), SettingsError> {
    let blob = postcard::to_stdvec(value).context(format!("Failed to encode '{key}'"))?;
    out.extend_from_slice(&frame_len(key.len())?.to_le_bytes());
    out.extend_from_slice(key.as_bytes());
    out.extend_from_slice(&frame_len(blob.len())?.to_le_bytes());
    out.extend_from_slice(&blob);
    Ok(())
}

/// Decodes every record of a binary file.
///
/// Records whose key or value cannot be decoded are skipped with a warning.
///
/// # Errors
/// Returns [`SettingsError::CorruptData`] for a wrong magic or a truncated frame; in that
/// case nothing is returned, so the caller applies nothing.
pub(crate) fn decode(bytes: &[u8], origin: &str) -> Result<Vec<(String, Value)>, SettingsError> {
    let mut reader = Reader { bytes, pos: 0 };

    if reader.take(MAGIC.len())? != MAGIC {
        return Err(SettingsError::CorruptData {
            message: "Bad header, expected ECFG".into(),
            context: Some(origin.to_owned().into()),
        });
    }
    let count = reader.u32()?;

    let mut entries = Vec::with_capacity((count as usize).min(bytes.len() / 8));
    for _ in 0..count {
        let key_len = reader.u32()? as usize;
        let key = reader.take(key_len)?;
        let value_len = reader.u32()? as usize;
        let blob = reader.take(value_len)?;

        let Ok(key) = std::str::from_utf8(key) else {
            warn!(origin, "Record key is not valid UTF-8, skipped");
            continue;
        };
        match postcard::from_bytes::<Value>(blob) {
            Ok(value) => entries.push((key.to_owned(), value)),
            Err(e) => warn!(origin, key, error = %e, "Failed to decode record, skipped"),
        }
    }

    Ok(entries)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], SettingsError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                SettingsError::corrupt(format!("Truncated frame at byte {}", self.pos))
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32, SettingsError> {
        let raw = self.take(4)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }
}

fn frame_len(len: usize) -> Result<u32, SettingsError> {
    u32::try_from(len).map_err(|_| SettingsError::InvalidParameter {
        message: format!("length {len} exceeds the binary frame limit").into(),
        context: None,
    })
}
