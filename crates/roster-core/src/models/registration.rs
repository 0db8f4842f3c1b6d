use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::PageRequest;

/// Applicant data shared by registrations and the members provisioned from them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ApplicantProfile {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub company_name: String,
    pub profession: String,
    pub nationality: String,
    pub membership_type: String,
    pub designation: Option<String>,
    pub civil_id: Option<String>,
    pub passport_number: Option<String>,
    pub alternate_mobile: Option<String>,
    pub alternate_email: Option<String>,
    pub industry_sector: Option<String>,
    pub alternate_industry_sector: Option<String>,
    pub company_address: Option<String>,
    pub company_website: Option<String>,
    pub linkedin: Option<String>,
    pub expected_benefits: Option<String>,
    pub proposed_contribution: Option<String>,
    pub proposer1: Option<String>,
    pub proposer2: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "registration_status", rename_all = "PascalCase")
)]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(RegistrationStatus::Pending),
            "approved" => Ok(RegistrationStatus::Approved),
            "rejected" => Ok(RegistrationStatus::Rejected),
            other => Err(format!("Unknown registration status: {}", other)),
        }
    }
}

impl Display for RegistrationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RegistrationStatus::Pending => write!(f, "Pending"),
            RegistrationStatus::Approved => write!(f, "Approved"),
            RegistrationStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Persisted registration. `photo` holds a storage key, never a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: Uuid,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub profile: ApplicantProfile,
    pub photo: Option<String>,
    pub consent: bool,
    pub status: RegistrationStatus,
    pub unique_id: Option<String>,
    pub member_id: Option<String>,
    pub membership_validity: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    pub fn is_approved(&self) -> bool {
        self.status == RegistrationStatus::Approved
    }
}

/// Validated, normalized data for a registration about to be inserted.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub profile: ApplicantProfile,
    pub photo: Option<String>,
    pub consent: bool,
}

/// Raw submission as received from the applicant form.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationSubmission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub company_name: Option<String>,
    pub profession: Option<String>,
    pub nationality: Option<String>,
    pub membership_type: Option<String>,
    pub designation: Option<String>,
    pub civil_id: Option<String>,
    pub passport_number: Option<String>,
    pub alternate_mobile: Option<String>,
    pub alternate_email: Option<String>,
    pub industry_sector: Option<String>,
    pub alternate_industry_sector: Option<String>,
    pub company_address: Option<String>,
    pub company_website: Option<String>,
    pub linkedin: Option<String>,
    pub expected_benefits: Option<String>,
    pub proposed_contribution: Option<String>,
    pub proposer1: Option<String>,
    pub proposer2: Option<String>,
    pub consent: Option<bool>,
}

impl RegistrationSubmission {
    /// Assign a text field by its form name. Returns false for unknown names.
    pub fn set_text(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "name" | "fullName" => &mut self.name,
            "email" => &mut self.email,
            "mobile" => &mut self.mobile,
            "companyName" => &mut self.company_name,
            "profession" => &mut self.profession,
            "nationality" => &mut self.nationality,
            "membershipType" => &mut self.membership_type,
            "designation" => &mut self.designation,
            "civilId" => &mut self.civil_id,
            "passportNumber" => &mut self.passport_number,
            "alternateMobile" => &mut self.alternate_mobile,
            "alternateEmail" => &mut self.alternate_email,
            "industrySector" => &mut self.industry_sector,
            "alternateIndustrySector" => &mut self.alternate_industry_sector,
            "companyAddress" => &mut self.company_address,
            "companyWebsite" => &mut self.company_website,
            "linkedin" => &mut self.linkedin,
            "expectedBenefits" => &mut self.expected_benefits,
            "proposedContribution" => &mut self.proposed_contribution,
            "proposer1" => &mut self.proposer1,
            "proposer2" => &mut self.proposer2,
            "consent" => {
                let v = value.trim().to_lowercase();
                self.consent = Some(matches!(v.as_str(), "true" | "on" | "yes" | "1"));
                return true;
            }
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

/// Which registrations a list request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(RegistrationStatus),
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() || s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse().map(StatusFilter::Only)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationQuery {
    pub status: StatusFilter,
    pub search: Option<String>,
    pub page: PageRequest,
}

/// Registration as returned to clients: the photo key is resolved to a URL.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub id: Uuid,
    #[serde(flatten)]
    pub profile: ApplicantProfile,
    pub photo: Option<String>,
    pub consent: bool,
    pub status: RegistrationStatus,
    pub unique_id: Option<String>,
    pub member_id: Option<String>,
    pub membership_validity: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RegistrationResponse {
    pub fn new(registration: Registration, photo_url: Option<String>) -> Self {
        Self {
            id: registration.id,
            profile: registration.profile,
            photo: photo_url,
            consent: registration.consent,
            status: registration.status,
            unique_id: registration.unique_id,
            member_id: registration.member_id,
            membership_validity: registration.membership_validity,
            created_at: registration.created_at,
            updated_at: registration.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_parsing() {
        assert_eq!("all".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert_eq!("".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert_eq!(
            "Pending".parse::<StatusFilter>(),
            Ok(StatusFilter::Only(RegistrationStatus::Pending))
        );
        assert!("archived".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_submission_accepts_form_names() {
        let mut submission = RegistrationSubmission::default();
        assert!(submission.set_text("fullName", "Ada".to_string()));
        assert!(submission.set_text("companyName", "Engines".to_string()));
        assert!(submission.set_text("consent", "on".to_string()));
        assert!(!submission.set_text("status", "Approved".to_string()));
        assert_eq!(submission.name.as_deref(), Some("Ada"));
        assert_eq!(submission.company_name.as_deref(), Some("Engines"));
        assert_eq!(submission.consent, Some(true));
    }

    #[test]
    fn test_registration_serializes_camel_case_with_flattened_profile() {
        let registration = Registration {
            id: Uuid::new_v4(),
            profile: ApplicantProfile {
                name: "Ada".to_string(),
                company_name: "Engines".to_string(),
                ..Default::default()
            },
            photo: Some("profileimages/photo-1-abc.jpg".to_string()),
            consent: true,
            status: RegistrationStatus::Pending,
            unique_id: None,
            member_id: None,
            membership_validity: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&registration).unwrap();
        assert_eq!(json["companyName"], "Engines");
        assert_eq!(json["status"], "Pending");
        assert!(json.get("profile").is_none());
    }
}
