//! Field registry and write authorization for member profile updates.
//!
//! Every writable member field is declared once in `FIELD_REGISTRY` together
//! with who may write it. Update requests are filtered against the registry:
//! keys the caller's role may not write are dropped, not rejected, so forms
//! that post a superset of fields still succeed.

use std::collections::BTreeMap;

use validator::ValidateEmail;

use crate::error::AppError;
use crate::models::{MembershipType, UserRole};

/// Who may write a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAccess {
    /// Assigned once by the system, never writable through updates.
    Locked,
    AdminOnly,
    /// Writable by admins and by the member themself.
    Shared,
}

impl FieldAccess {
    pub fn permits(self, role: UserRole) -> bool {
        match self {
            FieldAccess::Locked => false,
            FieldAccess::AdminOnly => role.is_admin(),
            FieldAccess::Shared => true,
        }
    }
}

/// How a submitted value is normalized before it is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Optional free text; blank clears the field.
    Text,
    /// Free text that may not be cleared.
    RequiredText,
    Email,
    Role,
    MembershipType,
    /// Storage key. Only uploads may set it; text input may only clear it.
    StorageKey,
    Identifier,
}

#[derive(Debug)]
pub struct FieldSpec {
    /// Name used on the wire (camelCase).
    pub name: &'static str,
    /// Column in the members table.
    pub column: &'static str,
    pub access: FieldAccess,
    pub kind: FieldKind,
}

const fn field(
    name: &'static str,
    column: &'static str,
    access: FieldAccess,
    kind: FieldKind,
) -> FieldSpec {
    FieldSpec {
        name,
        column,
        access,
        kind,
    }
}

use FieldAccess::{AdminOnly, Locked, Shared};
use FieldKind::{Email, Identifier, RequiredText, StorageKey, Text};

pub static FIELD_REGISTRY: &[FieldSpec] = &[
    field("uniqueId", "unique_id", Locked, Identifier),
    field("memberId", "member_id", Locked, Identifier),
    field("email", "email", AdminOnly, Email),
    field("role", "role", AdminOnly, FieldKind::Role),
    field(
        "membershipType",
        "membership_type",
        AdminOnly,
        FieldKind::MembershipType,
    ),
    field("membershipValidity", "membership_validity", AdminOnly, Text),
    field("name", "name", AdminOnly, RequiredText),
    field("companyName", "company_name", AdminOnly, RequiredText),
    field("profession", "profession", AdminOnly, RequiredText),
    field("nationality", "nationality", AdminOnly, RequiredText),
    field("civilId", "civil_id", AdminOnly, Text),
    field("passportNumber", "passport_number", AdminOnly, Text),
    field("expectedBenefits", "expected_benefits", AdminOnly, Text),
    field("proposedContribution", "proposed_contribution", AdminOnly, Text),
    field("proposer1", "proposer1", AdminOnly, Text),
    field("proposer2", "proposer2", AdminOnly, Text),
    field("mobile", "mobile", Shared, RequiredText),
    field("alternateMobile", "alternate_mobile", Shared, Text),
    field("alternateEmail", "alternate_email", Shared, Text),
    field("designation", "designation", Shared, Text),
    field("industrySector", "industry_sector", Shared, Text),
    field(
        "alternateIndustrySector",
        "alternate_industry_sector",
        Shared,
        Text,
    ),
    field("companyAddress", "company_address", Shared, Text),
    field("companyWebsite", "company_website", Shared, Text),
    field("companyBrief", "company_brief", Shared, Text),
    field("linkedin", "linkedin", Shared, Text),
    field("instagram", "instagram", Shared, Text),
    field("twitter", "twitter", Shared, Text),
    field("facebook", "facebook", Shared, Text),
    field("photo", "photo", Shared, StorageKey),
    field("logo", "logo", Shared, StorageKey),
];

/// Look a field up by wire name, column name, or `social.<network>` form key.
pub fn lookup(key: &str) -> Option<&'static FieldSpec> {
    let key = key.trim();
    let key = key.strip_prefix("social.").unwrap_or(key);
    FIELD_REGISTRY
        .iter()
        .find(|spec| spec.name == key || spec.column == key)
}

/// Fields the given role may write.
pub fn editable_fields(role: UserRole) -> impl Iterator<Item = &'static FieldSpec> {
    FIELD_REGISTRY
        .iter()
        .filter(move |spec| spec.access.permits(role))
}

/// A filtered, normalized set of member column updates.
#[derive(Debug, Default, Clone)]
pub struct MemberChanges {
    values: BTreeMap<&'static str, (&'static FieldSpec, Option<String>)>,
    dropped: Vec<String>,
}

impl MemberChanges {
    /// Filter `requested` down to the keys `role` may write and normalize their values.
    ///
    /// Unknown or forbidden keys are dropped. Permitted keys with unusable
    /// values (a blank required field, a malformed email, an unknown role)
    /// fail the whole request.
    pub fn authorize<I, K>(role: UserRole, requested: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (K, Option<String>)>,
        K: AsRef<str>,
    {
        let mut changes = MemberChanges::default();

        for (key, value) in requested {
            let key = key.as_ref();
            let Some(spec) = lookup(key).filter(|spec| spec.access.permits(role)) else {
                changes.dropped.push(key.to_string());
                continue;
            };

            let value = value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());

            let normalized = match spec.kind {
                FieldKind::Text => value,
                FieldKind::RequiredText => Some(value.ok_or_else(|| {
                    AppError::InvalidInput(format!("{} cannot be empty", spec.name))
                })?),
                FieldKind::Email => {
                    let email = value
                        .map(|v| v.to_lowercase())
                        .filter(|v| v.validate_email())
                        .ok_or_else(|| {
                            AppError::InvalidInput("A valid email address is required".to_string())
                        })?;
                    Some(email)
                }
                FieldKind::Role => {
                    let role: UserRole = value
                        .as_deref()
                        .unwrap_or_default()
                        .parse()
                        .map_err(AppError::InvalidInput)?;
                    Some(role.to_string())
                }
                FieldKind::MembershipType => {
                    let label = value.ok_or_else(|| {
                        AppError::InvalidInput("membershipType cannot be empty".to_string())
                    })?;
                    Some(MembershipType::from_label(&label).label().to_string())
                }
                FieldKind::StorageKey => {
                    if value.is_some() {
                        changes.dropped.push(key.to_string());
                        continue;
                    }
                    None
                }
                FieldKind::Identifier => {
                    changes.dropped.push(key.to_string());
                    continue;
                }
            };

            changes.values.insert(spec.column, (spec, normalized));
        }

        Ok(changes)
    }

    /// Record a freshly stored upload for a storage-key field.
    pub fn set_storage_key(&mut self, column: &str, key: String) -> Result<(), AppError> {
        let spec = FIELD_REGISTRY
            .iter()
            .find(|spec| spec.column == column && spec.kind == FieldKind::StorageKey)
            .ok_or_else(|| AppError::Internal(format!("{} is not a storage key field", column)))?;
        self.values.insert(spec.column, (spec, Some(key)));
        Ok(())
    }

    pub fn get(&self, column: &str) -> Option<Option<&str>> {
        self.values.get(column).map(|(_, value)| value.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static FieldSpec, Option<&str>)> + '_ {
        self.values
            .values()
            .map(|(spec, value)| (*spec, value.as_deref()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Keys that were present in the request but not applied.
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn some(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_registry_names_and_columns_are_unique() {
        let names: HashSet<_> = FIELD_REGISTRY.iter().map(|f| f.name).collect();
        let columns: HashSet<_> = FIELD_REGISTRY.iter().map(|f| f.column).collect();
        assert_eq!(names.len(), FIELD_REGISTRY.len());
        assert_eq!(columns.len(), FIELD_REGISTRY.len());
    }

    #[test]
    fn test_member_set_is_strict_subset_of_admin_set() {
        let admin: HashSet<_> = editable_fields(UserRole::Admin).map(|f| f.name).collect();
        let member: HashSet<_> = editable_fields(UserRole::Member).map(|f| f.name).collect();
        assert!(member.is_subset(&admin));
        assert!(member.len() < admin.len());
        for admin_only in ["memberId", "uniqueId", "membershipValidity", "role", "email"] {
            assert!(!member.contains(admin_only));
        }
        assert!(!admin.contains("password"));
        assert!(!admin.contains("id"));
    }

    #[test]
    fn test_member_update_drops_admin_only_keys() {
        let changes = MemberChanges::authorize(
            UserRole::Member,
            vec![
                ("memberId", some("C99999")),
                ("companyBrief", some("We build engines")),
            ],
        )
        .unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes.get("company_brief"), Some(Some("We build engines")));
        assert_eq!(changes.get("member_id"), None);
        assert_eq!(changes.dropped(), ["memberId".to_string()]);
    }

    #[test]
    fn test_identifiers_are_locked_even_for_admins() {
        let changes = MemberChanges::authorize(
            UserRole::Admin,
            vec![("uniqueId", some("10999")), ("membershipValidity", some("2027-12-31"))],
        )
        .unwrap();
        assert_eq!(changes.get("unique_id"), None);
        assert_eq!(changes.get("membership_validity"), Some(Some("2027-12-31")));
    }

    #[test]
    fn test_unknown_and_private_keys_are_dropped() {
        let changes = MemberChanges::authorize(
            UserRole::Admin,
            vec![("password", some("hunter2")), ("_id", some("x")), ("__v", some("3"))],
        )
        .unwrap();
        assert!(changes.is_empty());
        assert_eq!(changes.dropped().len(), 3);
    }

    #[test]
    fn test_social_form_keys_map_to_flat_fields() {
        let changes = MemberChanges::authorize(
            UserRole::Member,
            vec![("social.linkedin", some("https://linkedin.com/in/ada"))],
        )
        .unwrap();
        assert_eq!(
            changes.get("linkedin"),
            Some(Some("https://linkedin.com/in/ada"))
        );
    }

    #[test]
    fn test_values_are_normalized() {
        let changes = MemberChanges::authorize(
            UserRole::Admin,
            vec![
                ("email", some("  Ada@Example.COM ")),
                ("membershipType", some("CORPORATE")),
                ("role", some("Admin")),
                ("designation", some("   ")),
            ],
        )
        .unwrap();
        assert_eq!(changes.get("email"), Some(Some("ada@example.com")));
        assert_eq!(changes.get("membership_type"), Some(Some("Corporate Member")));
        assert_eq!(changes.get("role"), Some(Some("admin")));
        assert_eq!(changes.get("designation"), Some(None));
    }

    #[test]
    fn test_invalid_values_fail_the_request() {
        let bad_email =
            MemberChanges::authorize(UserRole::Admin, vec![("email", some("not-an-email"))]);
        assert!(matches!(bad_email, Err(AppError::InvalidInput(_))));

        let blank_required = MemberChanges::authorize(UserRole::Member, vec![("mobile", None)]);
        assert!(matches!(blank_required, Err(AppError::InvalidInput(_))));

        let bad_role = MemberChanges::authorize(UserRole::Admin, vec![("role", some("owner"))]);
        assert!(matches!(bad_role, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_storage_keys_only_set_through_uploads() {
        let mut changes = MemberChanges::authorize(
            UserRole::Member,
            vec![("photo", some("https://evil.example/x.jpg")), ("logo", None)],
        )
        .unwrap();
        assert_eq!(changes.get("photo"), None);
        assert_eq!(changes.get("logo"), Some(None));

        changes
            .set_storage_key("photo", "profileimages/I10000-photo.jpg".to_string())
            .unwrap();
        assert_eq!(
            changes.get("photo"),
            Some(Some("profileimages/I10000-photo.jpg"))
        );
        assert!(changes.set_storage_key("email", "x".to_string()).is_err());
    }
}
