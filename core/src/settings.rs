use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::SettingsError;
use crate::pool::Category;

pub const DEFAULT_DURATION_MS: u64 = 300_000;
pub const DEFAULT_MINIMUM_TO_PRACTICE: usize = 50;
pub const DEFAULT_REPORTS_DIRECTORY: &str = "../math-facts-reports/";
pub const DEFAULT_ENABLED_MATH_FACTS: u32 = 0x1F;

/// Raw settings as stored on disk. Every field is optional; the accessors
/// resolve missing or out-of-range values to the defaults. A value of the
/// wrong type is dropped on its own and never fails the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Hex mask of `Category::bit` values, e.g. `"1F"` or `"0x1F"`. A JSON
    /// number is taken as the mask itself.
    #[serde(deserialize_with = "hex_mask")]
    pub enabled_math_facts: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub math_practice_duration_ms: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub minimum_amount_to_practice: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub reports_directory: Option<String>,
    /// Fixes the shuffle order when set.
    #[serde(deserialize_with = "lenient")]
    pub seed: Option<u64>,
}

/// Takes the value as `T`, or parses it from a string; anything else reads
/// as unset.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + FromStr,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    if let Ok(parsed) = serde_json::from_value(value.clone()) {
        return Ok(Some(parsed));
    }
    if let Some(parsed) = value.as_str().and_then(|s| s.trim().parse().ok()) {
        return Ok(Some(parsed));
    }
    warn!("ignoring setting value {value}");
    Ok(None)
}

fn hex_mask<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(None),
        Value::String(raw) => Ok(Some(raw)),
        Value::Number(ref n) if n.as_u64().is_some() => {
            Ok(n.as_u64().map(|mask| format!("{mask:X}")))
        }
        other => {
            warn!("ignoring enabled_math_facts {other}");
            Ok(None)
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn enabled_math_facts(&self) -> u32 {
        let Some(raw) = self.enabled_math_facts.as_deref() else {
            return DEFAULT_ENABLED_MATH_FACTS;
        };
        let digits = raw
            .trim()
            .trim_start_matches("0x")
            .trim_start_matches("0X");
        match u32::from_str_radix(digits, 16) {
            Ok(mask) => mask,
            Err(err) => {
                warn!("ignoring enabled_math_facts {raw:?}: {err}");
                DEFAULT_ENABLED_MATH_FACTS
            }
        }
    }

    pub fn enabled_categories(&self) -> Vec<Category> {
        let mask = self.enabled_math_facts();
        Category::ALL
            .into_iter()
            .filter(|c| c.is_enabled_in(mask))
            .collect()
    }

    pub fn practice_duration(&self) -> Duration {
        match self.math_practice_duration_ms {
            None => Duration::from_millis(DEFAULT_DURATION_MS),
            Some(ms) if ms > 0 => Duration::from_millis(ms.unsigned_abs()),
            Some(ms) => {
                warn!("ignoring math_practice_duration_ms {ms}");
                Duration::from_millis(DEFAULT_DURATION_MS)
            }
        }
    }

    pub fn minimum_amount_to_practice(&self) -> usize {
        match self.minimum_amount_to_practice {
            None => DEFAULT_MINIMUM_TO_PRACTICE,
            Some(n) if n > 0 => usize::try_from(n).unwrap_or(DEFAULT_MINIMUM_TO_PRACTICE),
            Some(n) => {
                warn!("ignoring minimum_amount_to_practice {n}");
                DEFAULT_MINIMUM_TO_PRACTICE
            }
        }
    }

    pub fn reports_directory(&self) -> PathBuf {
        match self.reports_directory.as_deref() {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => PathBuf::from(DEFAULT_REPORTS_DIRECTORY),
        }
    }
}
