use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ApplicantProfile, PageRequest, Registration, UserRole};

/// Provisioned member account.
///
/// `photo` and `logo` are storage keys. The password is only ever held as a
/// salted hash and is never serialized.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: Uuid,
    pub registration_id: Option<Uuid>,
    pub unique_id: String,
    pub member_id: String,
    pub role: UserRole,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub profile: ApplicantProfile,
    pub membership_validity: Option<String>,
    pub company_brief: Option<String>,
    pub instagram: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub photo: Option<String>,
    pub logo: Option<String>,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    /// Assign a column by name. Unknown columns are ignored and reported as `false`.
    ///
    /// Required text columns keep their previous value when given `None`.
    pub fn set_column(&mut self, column: &str, value: Option<String>) -> bool {
        fn required(slot: &mut String, value: Option<String>) {
            if let Some(v) = value {
                *slot = v;
            }
        }

        let p = &mut self.profile;
        match column {
            "name" => required(&mut p.name, value),
            "email" => required(&mut p.email, value),
            "mobile" => required(&mut p.mobile, value),
            "company_name" => required(&mut p.company_name, value),
            "profession" => required(&mut p.profession, value),
            "nationality" => required(&mut p.nationality, value),
            "membership_type" => required(&mut p.membership_type, value),
            "designation" => p.designation = value,
            "civil_id" => p.civil_id = value,
            "passport_number" => p.passport_number = value,
            "alternate_mobile" => p.alternate_mobile = value,
            "alternate_email" => p.alternate_email = value,
            "industry_sector" => p.industry_sector = value,
            "alternate_industry_sector" => p.alternate_industry_sector = value,
            "company_address" => p.company_address = value,
            "company_website" => p.company_website = value,
            "linkedin" => p.linkedin = value,
            "expected_benefits" => p.expected_benefits = value,
            "proposed_contribution" => p.proposed_contribution = value,
            "proposer1" => p.proposer1 = value,
            "proposer2" => p.proposer2 = value,
            "membership_validity" => self.membership_validity = value,
            "company_brief" => self.company_brief = value,
            "instagram" => self.instagram = value,
            "twitter" => self.twitter = value,
            "facebook" => self.facebook = value,
            "photo" => self.photo = value,
            "logo" => self.logo = value,
            "role" => {
                if let Some(role) = value.and_then(|v| v.parse().ok()) {
                    self.role = role;
                }
            }
            _ => return false,
        }
        true
    }
}

/// Member about to be inserted by the approval workflow.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub registration_id: Option<Uuid>,
    pub unique_id: String,
    pub member_id: String,
    pub role: UserRole,
    pub profile: ApplicantProfile,
    pub membership_validity: Option<String>,
    pub photo: Option<String>,
    pub password_hash: String,
}

impl NewMember {
    /// Copy every applicant field from the registration, including the photo key verbatim.
    pub fn from_registration(
        registration: &Registration,
        unique_id: String,
        member_id: String,
        password_hash: String,
    ) -> Self {
        Self {
            registration_id: Some(registration.id),
            unique_id,
            member_id,
            role: UserRole::Member,
            profile: registration.profile.clone(),
            membership_validity: registration.membership_validity.clone(),
            photo: registration.photo.clone(),
            password_hash,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemberQuery {
    pub search: Option<String>,
    pub page: PageRequest,
}

/// Member as returned to clients: storage keys are resolved to URLs and the
/// password hash is absent.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub id: Uuid,
    pub registration_id: Option<Uuid>,
    pub unique_id: String,
    pub member_id: String,
    pub role: UserRole,
    #[serde(flatten)]
    pub profile: ApplicantProfile,
    pub membership_validity: Option<String>,
    pub company_brief: Option<String>,
    pub instagram: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub photo: Option<String>,
    pub logo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MemberResponse {
    pub fn new(member: Member, photo_url: Option<String>, logo_url: Option<String>) -> Self {
        Self {
            id: member.id,
            registration_id: member.registration_id,
            unique_id: member.unique_id,
            member_id: member.member_id,
            role: member.role,
            profile: member.profile,
            membership_validity: member.membership_validity,
            company_brief: member.company_brief,
            instagram: member.instagram,
            twitter: member.twitter,
            facebook: member.facebook,
            photo: photo_url,
            logo: logo_url,
            created_at: member.created_at,
            updated_at: member.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member() -> Member {
        Member {
            id: Uuid::new_v4(),
            registration_id: None,
            unique_id: "10001".to_string(),
            member_id: "I10000".to_string(),
            role: UserRole::Member,
            profile: ApplicantProfile {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                ..Default::default()
            },
            membership_validity: None,
            company_brief: None,
            instagram: None,
            twitter: None,
            facebook: None,
            photo: None,
            logo: None,
            password_hash: "$argon2id$secret".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let json = serde_json::to_value(member()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("argon2"));
        assert_eq!(json["memberId"], "I10000");
    }

    #[test]
    fn test_set_column_keeps_required_values_on_null() {
        let mut m = member();
        assert!(m.set_column("name", None));
        assert_eq!(m.profile.name, "Ada");
        assert!(m.set_column("company_brief", Some("Steam".to_string())));
        assert_eq!(m.company_brief.as_deref(), Some("Steam"));
        assert!(m.set_column("role", Some("admin".to_string())));
        assert_eq!(m.role, UserRole::Admin);
        assert!(!m.set_column("password_hash", Some("x".to_string())));
    }
}
