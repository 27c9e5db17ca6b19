//! Core data models for the fact-find agent

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    NewHome,
    NewCar,
    Other,
}

impl GoalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::NewHome => "new_home",
            GoalType::NewCar => "new_car",
            GoalType::Other => "other",
        }
    }

    /// Fixed display name given to goals of this type
    pub fn display_name(&self) -> &'static str {
        match self {
            GoalType::NewHome => "New Home",
            GoalType::NewCar => "New Car",
            GoalType::Other => "Other Goal",
        }
    }
}

//
// ================= Goal Information =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewHomeGoalInformation {
    pub location: String,
    pub house_price: f64,
    pub deposit_amount: f64,
    pub purchase_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCarInformation {
    pub car_type: String,
    pub car_price: f64,
    pub purchase_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OtherGoalInformation {
    pub description: String,
    pub amount_required: f64,
    pub target_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GoalSpecificInformation {
    NewHome(NewHomeGoalInformation),
    NewCar(NewCarInformation),
    Other(OtherGoalInformation),
}

impl GoalSpecificInformation {
    pub fn goal_type(&self) -> GoalType {
        match self {
            GoalSpecificInformation::NewHome(_) => GoalType::NewHome,
            GoalSpecificInformation::NewCar(_) => GoalType::NewCar,
            GoalSpecificInformation::Other(_) => GoalType::Other,
        }
    }
}

//
// ================= Goal =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Goal {
    pub goal_type: GoalType,
    pub goal_name: String,
    pub goal_specific_information: GoalSpecificInformation,
}

impl Goal {
    /// Build a goal whose type and display name follow from its information
    pub fn new(info: GoalSpecificInformation) -> Self {
        let goal_type = info.goal_type();
        Self {
            goal_type,
            goal_name: goal_type.display_name().to_string(),
            goal_specific_information: info,
        }
    }
}

//
// ================= User =================
//

/// User record accumulated over a conversation.
///
/// Identity fields are `None` until some turn supplies them and are never
/// replaced afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub goals: Vec<Goal>,
}

impl User {
    /// True once all four identity fields hold a non-empty value
    pub fn is_complete(&self) -> bool {
        is_set(&self.first_name)
            && is_set(&self.last_name)
            && is_set(&self.email)
            && self.date_of_birth.is_some()
    }

    /// Identity fields that are still unset, in struct field order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !is_set(&self.first_name) {
            missing.push("first_name");
        }
        if !is_set(&self.last_name) {
            missing.push("last_name");
        }
        if !is_set(&self.email) {
            missing.push("email");
        }
        if self.date_of_birth.is_none() {
            missing.push("date_of_birth");
        }
        missing
    }
}

/// An empty string counts as unset.
pub(crate) fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for GoalSpecificInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalSpecificInformation::NewHome(info) => write!(
                f,
                "location: {}, house price: {:.2}, deposit: {:.2}, purchase date: {}",
                info.location, info.house_price, info.deposit_amount, info.purchase_date
            ),
            GoalSpecificInformation::NewCar(info) => write!(
                f,
                "car type: {}, car price: {:.2}, purchase date: {}",
                info.car_type, info.car_price, info.purchase_date
            ),
            GoalSpecificInformation::Other(info) => write!(
                f,
                "description: {}, amount required: {:.2}, target date: {}",
                info.description, info.amount_required, info.target_date
            ),
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.goal_type, self.goal_specific_information)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_goal_name_follows_type() {
        let goal = Goal::new(GoalSpecificInformation::NewCar(NewCarInformation {
            car_type: "estate".to_string(),
            car_price: 18000.0,
            purchase_date: date(2026, 3, 1),
        }));

        assert_eq!(goal.goal_type, GoalType::NewCar);
        assert_eq!(goal.goal_name, "New Car");
        assert_eq!(
            goal.to_string(),
            "new_car: car type: estate, car price: 18000.00, purchase date: 2026-03-01"
        );
    }

    #[test]
    fn test_user_completion() {
        let mut user = User::default();
        assert!(!user.is_complete());
        assert_eq!(user.missing_fields().len(), 4);

        user.first_name = Some("ada".to_string());
        user.last_name = Some(String::new());
        user.email = Some("ada@example.com".to_string());
        user.date_of_birth = Some(date(1990, 5, 12));
        assert!(!user.is_complete());
        assert_eq!(user.missing_fields(), vec!["last_name"]);

        user.last_name = Some("lovelace".to_string());
        assert!(user.is_complete());
    }

    #[test]
    fn test_goal_type_serialization() {
        let json = serde_json::to_string(&GoalType::NewHome).unwrap();
        assert_eq!(json, "\"new_home\"");
    }
}
