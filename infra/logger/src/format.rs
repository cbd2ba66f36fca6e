use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Console rendering style.
///
/// Console output always goes to stderr so that stdout stays reserved for command results.
#[derive(
    Debug, Clone, Copy, Default, Eq, PartialEq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}
