//! Deal records and single-field edits

use crate::error::BoardError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Opaque identifier assigned by the persistence service on insert.
///
/// Backends hand out either integer or string keys; both are held as text
/// and compared verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DealId(String);

impl DealId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for DealId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for DealId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DealId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Serialize for DealId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DealId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(id) => DealId::from(id),
            RawId::Text(id) => DealId(id),
        })
    }
}

/// A persisted pipeline record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub company: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub stage: String,
    #[serde(default)]
    pub sourcer: Option<String>,
    #[serde(default)]
    pub partner: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Nullable text columns read as empty strings
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts `timestamptz` (RFC 3339) and `timestamp` (no offset, read as UTC).
///
/// A value in neither form is dropped rather than failing the whole row.
fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, format) {
            return Ok(Some(naive.and_utc()));
        }
    }

    warn!("Ignoring unparseable last_updated value '{}'", raw);
    Ok(None)
}

impl Deal {
    /// Current value of a single editable field
    pub fn field(&self, field: DealField) -> Option<&str> {
        match field {
            DealField::Company => Some(&self.company),
            DealField::Stage => Some(&self.stage),
            DealField::Sourcer => self.sourcer.as_deref(),
            DealField::Partner => self.partner.as_deref(),
            DealField::Notes => self.notes.as_deref(),
        }
    }

    /// Overwrite one field, leaving every other field untouched
    pub fn set_field(&mut self, field: DealField, value: Option<String>) {
        match field {
            DealField::Company => self.company = value.unwrap_or_default(),
            DealField::Stage => self.stage = value.unwrap_or_default(),
            DealField::Sourcer => self.sourcer = value,
            DealField::Partner => self.partner = value,
            DealField::Notes => self.notes = value,
        }
    }
}

/// A record that has not been persisted yet: no id, no timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealDraft {
    pub company: String,
    pub stage: String,
    pub sourcer: Option<String>,
    pub partner: Option<String>,
    pub notes: Option<String>,
}

impl DealDraft {
    /// Draft placed at the given stage with everything else unset
    pub fn new(company: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            stage: stage.into(),
            sourcer: None,
            partner: None,
            notes: None,
        }
    }

    pub fn with_sourcer(mut self, sourcer: impl Into<String>) -> Self {
        self.sourcer = DealField::Sourcer.normalize(sourcer.into());
        self
    }

    pub fn with_partner(mut self, partner: impl Into<String>) -> Self {
        self.partner = DealField::Partner.normalize(partner.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = DealField::Notes.normalize(notes.into());
        self
    }
}

/// The fields a user can edit inline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DealField {
    Company,
    Stage,
    Sourcer,
    Partner,
    Notes,
}

impl DealField {
    pub const ALL: [DealField; 5] = [
        DealField::Company,
        DealField::Stage,
        DealField::Sourcer,
        DealField::Partner,
        DealField::Notes,
    ];

    /// Column name in the remote table
    pub fn as_str(&self) -> &'static str {
        match self {
            DealField::Company => "company",
            DealField::Stage => "stage",
            DealField::Sourcer => "sourcer",
            DealField::Partner => "partner",
            DealField::Notes => "notes",
        }
    }

    /// Whether an empty value means "unset" for this field
    pub fn is_optional(&self) -> bool {
        matches!(
            self,
            DealField::Sourcer | DealField::Partner | DealField::Notes
        )
    }

    /// Map raw user input to the stored value.
    ///
    /// Empty input clears optional fields; required fields keep the text.
    pub fn normalize(&self, value: String) -> Option<String> {
        if value.is_empty() && self.is_optional() {
            None
        } else {
            Some(value)
        }
    }
}

impl fmt::Display for DealField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DealField {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DealField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| BoardError::UnknownField(s.to_string()))
    }
}
