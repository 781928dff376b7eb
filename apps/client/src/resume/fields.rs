//! Interview field catalogue and the flat profile mapping collected from it.
//!
//! The interview walks `Field::ORDER` front to back. `domain` is asked but is
//! not mandatory; the other seven must be non-empty before submission.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    FullName,
    Email,
    Phone,
    ExperienceLevel,
    Domain,
    JobTitle,
    Skills,
    Summary,
}

impl Field {
    /// Interview order. A step index points into this list; anything past the
    /// end is the critique/final stage.
    pub const ORDER: [Field; 8] = [
        Field::FullName,
        Field::Email,
        Field::Phone,
        Field::ExperienceLevel,
        Field::Domain,
        Field::JobTitle,
        Field::Skills,
        Field::Summary,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Field::FullName => "full_name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::ExperienceLevel => "experience_level",
            Field::Domain => "domain",
            Field::JobTitle => "job_title",
            Field::Skills => "skills",
            Field::Summary => "summary",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::FullName => "Full Name",
            Field::Email => "Email",
            Field::Phone => "Phone",
            Field::ExperienceLevel => "Experience Level",
            Field::Domain => "Domain",
            Field::JobTitle => "Job Title",
            Field::Skills => "Skills",
            Field::Summary => "Summary",
        }
    }

    /// Looks a field up by key (`job_title`) or label (`Job Title`), ignoring case.
    pub fn from_name(name: &str) -> Option<Field> {
        let wanted = name.trim().replace(['_', '-'], " ").to_ascii_lowercase();
        Field::ORDER
            .into_iter()
            .find(|f| f.label().to_ascii_lowercase() == wanted)
    }

    pub fn is_mandatory(&self) -> bool {
        !matches!(self, Field::Domain)
    }

    /// Field asked at the given step, `None` before the first step or past the last.
    pub fn at_step(step: i32) -> Option<Field> {
        usize::try_from(step)
            .ok()
            .and_then(|i| Field::ORDER.get(i).copied())
    }

    pub fn mandatory() -> impl Iterator<Item = Field> {
        Field::ORDER.into_iter().filter(Field::is_mandatory)
    }
}

/// Flat field-name → value mapping. Unknown keys from the backend are kept so
/// they round-trip on the next turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResumeProfile(BTreeMap<String, String>);

impl ResumeProfile {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn field(&self, field: Field) -> Option<&str> {
        self.get(field.key())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True once at least one value is non-blank.
    pub fn has_values(&self) -> bool {
        self.0.values().any(|v| !v.trim().is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Additive merge: keys in `other` overwrite, keys absent from it keep their
    /// value. Blank incoming values never erase an existing answer.
    pub fn merge(&mut self, other: &ResumeProfile) {
        for (key, value) in other.iter() {
            if value.trim().is_empty() {
                continue;
            }
            self.set(key, value);
        }
    }

    /// Mandatory fields that are blank after trimming, in interview order.
    pub fn missing_mandatory(&self) -> Vec<Field> {
        Field::mandatory()
            .filter(|f| self.field(*f).map_or(true, |v| v.trim().is_empty()))
            .collect()
    }
}

impl FromIterator<(String, String)> for ResumeProfile {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        ResumeProfile(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for ResumeProfile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key, s)),
                other => Some((key, other.to_string())),
            })
            .collect())
    }
}
