//! Domain types for the issue tracker with strong typing.
//!
//! Identifiers are newtypes so a `UserId` can never be passed where an
//! `IssueId` is expected. Roles, severities and statuses are closed enums that
//! double as database column types.

pub mod events;
pub mod permissions;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn value(&self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self::new(id)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_i32(self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                i32::deserialize(deserializer).map(Self::new)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a user account.
    UserId
);

entity_id!(
    /// Unique identifier for an issue.
    IssueId
);

entity_id!(
    /// Unique identifier for an uploaded attachment.
    FileId
);

/// Account role. Every permission decision matches on this exhaustively.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    #[sea_orm(string_value = "MAINTAINER")]
    Maintainer,
    #[sea_orm(string_value = "REPORTER")]
    Reporter,
}

impl Role {
    pub const ALL: [Self; 3] = [Self::Admin, Self::Maintainer, Self::Reporter];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Maintainer => "MAINTAINER",
            Self::Reporter => "REPORTER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority classification. Declaration order is the display order.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    #[sea_orm(string_value = "LOW")]
    Low,
    #[sea_orm(string_value = "MEDIUM")]
    Medium,
    #[sea_orm(string_value = "HIGH")]
    High,
    #[sea_orm(string_value = "CRITICAL")]
    Critical,
}

impl Severity {
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow stage. Any status may move to any other.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueStatus {
    #[default]
    #[sea_orm(string_value = "OPEN")]
    Open,
    #[sea_orm(string_value = "TRIAGED")]
    Triaged,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "DONE")]
    Done,
}

impl IssueStatus {
    pub const ALL: [Self; 4] = [Self::Open, Self::Triaged, Self::InProgress, Self::Done];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Triaged => "TRIAGED",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller of a service operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
    pub email: String,
    pub name: String,
}

impl Actor {
    #[must_use]
    pub fn owns(&self, owner: UserId) -> bool {
        self.id == owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types_with_shared_behaviour() {
        let user = UserId::new(7);
        let issue = IssueId::from(7);
        assert_eq!(user.value(), issue.value());
        assert_eq!(user.to_string(), "7");
        assert_eq!(i32::from(FileId::new(3)), 3);
    }

    #[test]
    fn id_serialization_is_a_bare_integer() {
        let json = serde_json::to_string(&IssueId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: IssueId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, IssueId::new(42));
    }

    #[test]
    fn enums_use_screaming_snake_case_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&IssueStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(serde_json::to_string(&Role::Maintainer).unwrap(), "\"MAINTAINER\"");
        let sev: Severity = serde_json::from_str("\"CRITICAL\"").unwrap();
        assert_eq!(sev, Severity::Critical);
    }

    #[test]
    fn wire_names_match_display() {
        for status in IssueStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json.trim_matches('"'), status.to_string());
        }
        for severity in Severity::ALL {
            let json = serde_json::to_string(&severity).unwrap();
            assert_eq!(json.trim_matches('"'), severity.as_str());
        }
    }

    #[test]
    fn severity_orders_low_to_critical() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn defaults_match_new_issue_state() {
        assert_eq!(IssueStatus::default(), IssueStatus::Open);
        assert_eq!(Severity::default(), Severity::Low);
    }
}
