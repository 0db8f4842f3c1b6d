use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Membership category chosen by the applicant.
///
/// Labels are parsed leniently: both the long form ("Corporate Member") and
/// the short upper-case form ("CORPORATE") are accepted. Anything that is not
/// recognised falls back to `Honorary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ToSchema)]
pub enum MembershipType {
    Corporate,
    Individual,
    SpecialHonorary,
    Honorary,
}

impl MembershipType {
    pub const ALL: [MembershipType; 4] = [
        MembershipType::Corporate,
        MembershipType::Individual,
        MembershipType::SpecialHonorary,
        MembershipType::Honorary,
    ];

    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_uppercase();
        let normalized = normalized
            .strip_suffix(" MEMBER")
            .unwrap_or(&normalized)
            .trim();
        match normalized {
            "CORPORATE" => MembershipType::Corporate,
            "INDIVIDUAL" => MembershipType::Individual,
            "SPECIAL HONORARY" => MembershipType::SpecialHonorary,
            _ => MembershipType::Honorary,
        }
    }

    /// Single-letter prefix of the type-prefixed member identifier
    pub fn prefix(self) -> char {
        match self {
            MembershipType::Corporate => 'C',
            MembershipType::Individual => 'I',
            MembershipType::SpecialHonorary => 'S',
            MembershipType::Honorary => 'H',
        }
    }

    /// Canonical label persisted on records
    pub fn label(self) -> &'static str {
        match self {
            MembershipType::Corporate => "Corporate Member",
            MembershipType::Individual => "Individual Member",
            MembershipType::SpecialHonorary => "Special Honorary Member",
            MembershipType::Honorary => "Honorary Member",
        }
    }
}

impl Display for MembershipType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.label())
    }
}

/// Account role carried by members and by the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "member_role", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Member,
}

impl UserRole {
    pub fn is_admin(self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "member" => Ok(UserRole::Member),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Member => write!(f, "member"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_labels_map_to_prefixes() {
        assert_eq!(MembershipType::from_label("Corporate Member").prefix(), 'C');
        assert_eq!(MembershipType::from_label("CORPORATE").prefix(), 'C');
        assert_eq!(MembershipType::from_label("Individual Member").prefix(), 'I');
        assert_eq!(MembershipType::from_label("individual").prefix(), 'I');
        assert_eq!(
            MembershipType::from_label("Special Honorary Member").prefix(),
            'S'
        );
        assert_eq!(MembershipType::from_label("SPECIAL HONORARY").prefix(), 'S');
        assert_eq!(MembershipType::from_label("Honorary Member").prefix(), 'H');
    }

    #[test]
    fn test_unknown_membership_defaults_to_honorary() {
        assert_eq!(
            MembershipType::from_label("Student"),
            MembershipType::Honorary
        );
        assert_eq!(MembershipType::from_label(""), MembershipType::Honorary);
    }

    #[test]
    fn test_labels_round_trip() {
        for kind in MembershipType::ALL {
            assert_eq!(MembershipType::from_label(kind.label()), kind);
        }
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Admin".parse::<UserRole>(), Ok(UserRole::Admin));
        assert_eq!("member".parse::<UserRole>(), Ok(UserRole::Member));
        assert!("owner".parse::<UserRole>().is_err());
    }
}
