//! Submission validation.
//!
//! All checks run before anything is written so a rejected submission leaves
//! no partial state behind.

use validator::ValidateEmail;

use crate::error::AppError;
use crate::models::{ApplicantProfile, MembershipType, NewRegistration, RegistrationSubmission};

/// Trim and lower-case an email address for storage and comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validate a raw submission and turn it into an insertable registration.
///
/// Reports every missing required field at once. The membership type is
/// stored under its canonical label.
pub fn validate_submission(
    submission: RegistrationSubmission,
    photo_key: Option<String>,
) -> Result<NewRegistration, AppError> {
    let name = clean(submission.name);
    let email = clean(submission.email).map(|e| normalize_email(&e));
    let mobile = clean(submission.mobile);
    let company_name = clean(submission.company_name);
    let profession = clean(submission.profession);
    let nationality = clean(submission.nationality);
    let membership_type = clean(submission.membership_type);

    let missing: Vec<&str> = [
        ("name", name.is_none()),
        ("email", email.is_none()),
        ("mobile", mobile.is_none()),
        ("companyName", company_name.is_none()),
        ("profession", profession.is_none()),
        ("nationality", nationality.is_none()),
        ("membershipType", membership_type.is_none()),
    ]
    .into_iter()
    .filter_map(|(field, absent)| absent.then_some(field))
    .collect();

    if !missing.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let email = email.unwrap_or_default();
    if !email.validate_email() {
        return Err(AppError::InvalidInput(format!(
            "Invalid email address: {}",
            email
        )));
    }

    let profile = ApplicantProfile {
        name: name.unwrap_or_default(),
        email,
        mobile: mobile.unwrap_or_default(),
        company_name: company_name.unwrap_or_default(),
        profession: profession.unwrap_or_default(),
        nationality: nationality.unwrap_or_default(),
        membership_type: MembershipType::from_label(&membership_type.unwrap_or_default())
            .label()
            .to_string(),
        designation: clean(submission.designation),
        civil_id: clean(submission.civil_id),
        passport_number: clean(submission.passport_number),
        alternate_mobile: clean(submission.alternate_mobile),
        alternate_email: clean(submission.alternate_email).map(|e| normalize_email(&e)),
        industry_sector: clean(submission.industry_sector),
        alternate_industry_sector: clean(submission.alternate_industry_sector),
        company_address: clean(submission.company_address),
        company_website: clean(submission.company_website),
        linkedin: clean(submission.linkedin),
        expected_benefits: clean(submission.expected_benefits),
        proposed_contribution: clean(submission.proposed_contribution),
        proposer1: clean(submission.proposer1),
        proposer2: clean(submission.proposer2),
    };

    Ok(NewRegistration {
        profile,
        photo: photo_key,
        consent: submission.consent.unwrap_or(false),
    })
}

/// Check the required fields and email of a submission without consuming it.
pub fn check_submission(submission: &RegistrationSubmission) -> Result<String, AppError> {
    validate_submission(submission.clone(), None).map(|r| r.profile.email)
}
