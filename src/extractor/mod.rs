//! Free-text extraction
//!
//! Turns the model's free-text answer into the set of fields it mentions.
//! The state machine only sees the `Extractor` trait, so the line-scanning
//! heuristics can be swapped for a structured-output parser later.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::FactFindError;
use crate::Result;

pub mod heuristic;
pub use heuristic::HeuristicExtractor;

/// Trait for turning a model answer into recognised fields
pub trait Extractor: Send + Sync {
    /// Best-effort extraction. Never fails: anything unparseable is left out.
    fn extract(&self, text: &str) -> ExtractedInfo;
}

//
// ================= Goal Sections =================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum GoalSection {
    #[serde(rename = "NewHomeGoalInformation")]
    NewHome,
    #[serde(rename = "NewCarInformation")]
    NewCar,
    #[serde(rename = "OtherGoalInformation")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Date,
}

const NEW_HOME_FIELDS: &[(&str, FieldKind)] = &[
    ("location", FieldKind::Text),
    ("house_price", FieldKind::Number),
    ("deposit_amount", FieldKind::Number),
    ("purchase_date", FieldKind::Date),
];

const NEW_CAR_FIELDS: &[(&str, FieldKind)] = &[
    ("car_type", FieldKind::Text),
    ("car_price", FieldKind::Number),
    ("purchase_date", FieldKind::Date),
];

const OTHER_GOAL_FIELDS: &[(&str, FieldKind)] = &[
    ("description", FieldKind::Text),
    ("amount_required", FieldKind::Number),
    ("target_date", FieldKind::Date),
];

impl GoalSection {
    /// Sections in the order they are checked and turned into goals
    pub const ALL: [GoalSection; 3] =
        [GoalSection::NewHome, GoalSection::NewCar, GoalSection::Other];

    /// Key naming the section in the prompt and in model answers
    pub fn key(&self) -> &'static str {
        match self {
            GoalSection::NewHome => "NewHomeGoalInformation",
            GoalSection::NewCar => "NewCarInformation",
            GoalSection::Other => "OtherGoalInformation",
        }
    }

    /// Lowercased marker that opens the section in a lowercased answer
    pub(crate) fn marker(&self) -> &'static str {
        match self {
            GoalSection::NewHome => "newhomegoalinformation",
            GoalSection::NewCar => "newcarinformation",
            GoalSection::Other => "othergoalinformation",
        }
    }

    /// Sub-fields recognised inside the section
    pub fn fields(&self) -> &'static [(&'static str, FieldKind)] {
        match self {
            GoalSection::NewHome => NEW_HOME_FIELDS,
            GoalSection::NewCar => NEW_CAR_FIELDS,
            GoalSection::Other => OTHER_GOAL_FIELDS,
        }
    }
}

//
// ================= Extracted Values =================
//

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

/// Sub-fields gathered for one goal section
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SectionFields(BTreeMap<&'static str, FieldValue>);

impl SectionFields {
    pub fn insert(&mut self, key: &'static str, value: FieldValue) {
        self.0.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Required text sub-field
    pub fn text(&self, section: GoalSection, key: &'static str) -> Result<String> {
        match self.get(key) {
            Some(FieldValue::Text(value)) => Ok(value.clone()),
            _ => Err(missing(section, key)),
        }
    }

    /// Required numeric sub-field
    pub fn number(&self, section: GoalSection, key: &'static str) -> Result<f64> {
        match self.get(key) {
            Some(FieldValue::Number(value)) => Ok(*value),
            _ => Err(missing(section, key)),
        }
    }

    /// Required date sub-field
    pub fn date(&self, section: GoalSection, key: &'static str) -> Result<NaiveDate> {
        match self.get(key) {
            Some(FieldValue::Date(value)) => Ok(*value),
            _ => Err(missing(section, key)),
        }
    }
}

fn missing(section: GoalSection, field: &'static str) -> FactFindError {
    FactFindError::MissingGoalField {
        goal: section.key(),
        field,
    }
}

/// Everything recognised in one model answer.
///
/// `None` / absent sections mean "not mentioned this turn".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(flatten)]
    pub sections: BTreeMap<GoalSection, SectionFields>,
}

impl ExtractedInfo {
    pub fn section(&self, section: GoalSection) -> Option<&SectionFields> {
        self.sections.get(&section)
    }

    pub fn has_identity(&self) -> bool {
        self.first_name.is_some()
            || self.last_name.is_some()
            || self.email.is_some()
            || self.date_of_birth.is_some()
    }
}
