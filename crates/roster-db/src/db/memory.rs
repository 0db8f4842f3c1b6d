//! In-memory stores.
//!
//! Enforce the same uniqueness rules as the Postgres schema so services can
//! be exercised without a database. Max-identifier scans yield to the runtime
//! after reading, which leaves the same read-then-write window concurrent
//! approvals see against a real database.

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use roster_core::models::{
    CredentialDelivery, DeliveryStatus, Member, MemberQuery, NewMember, NewRegistration,
    Registration, RegistrationQuery, RegistrationStatus, StatusFilter,
};
use roster_core::{AppError, MemberChanges};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::errors::search_term;
use super::store::{CredentialDeliveryStore, MemberStore, RegistrationStore};

#[derive(Default)]
struct MemoryState {
    registrations: Vec<Registration>,
    members: Vec<Member>,
    deliveries: Vec<CredentialDelivery>,
}

/// One in-memory database backing all three store traits.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn registration_count(&self) -> usize {
        self.state.lock().await.registrations.len()
    }

    pub async fn member_count(&self) -> usize {
        self.state.lock().await.members.len()
    }
}

fn pattern(source: &str) -> Result<Regex, AppError> {
    Regex::new(source).map_err(|e| AppError::Internal(e.to_string()))
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn page<T: Clone>(items: Vec<&T>, offset: i64, limit: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn email_in_use(&self, email: &str) -> Result<bool, AppError> {
        let email = email.to_lowercase();
        let state = self.state.lock().await;
        Ok(state.registrations.iter().any(|r| {
            r.status != RegistrationStatus::Rejected && r.profile.email.to_lowercase() == email
        }))
    }

    async fn insert(&self, registration: NewRegistration) -> Result<Registration, AppError> {
        let mut state = self.state.lock().await;
        let email = registration.profile.email.to_lowercase();
        if state.registrations.iter().any(|r| {
            r.status != RegistrationStatus::Rejected && r.profile.email.to_lowercase() == email
        }) {
            return Err(AppError::DuplicateEmail(
                "This email is already registered".to_string(),
            ));
        }

        let now = Utc::now();
        let created = Registration {
            id: Uuid::new_v4(),
            profile: registration.profile,
            photo: registration.photo,
            consent: registration.consent,
            status: RegistrationStatus::Pending,
            unique_id: None,
            member_id: None,
            membership_validity: None,
            created_at: now,
            updated_at: now,
        };
        state.registrations.push(created.clone());
        Ok(created)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Registration>, AppError> {
        let state = self.state.lock().await;
        Ok(state.registrations.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self, query: &RegistrationQuery) -> Result<(Vec<Registration>, i64), AppError> {
        let term = search_term(query.search.as_deref()).map(str::to_lowercase);
        let state = self.state.lock().await;

        let matching: Vec<&Registration> = state
            .registrations
            .iter()
            .rev()
            .filter(|r| match query.status {
                StatusFilter::All => true,
                StatusFilter::Only(status) => r.status == status,
            })
            .filter(|r| {
                term.as_deref().map_or(true, |t| {
                    contains_ci(&r.profile.name, t)
                        || contains_ci(&r.profile.email, t)
                        || contains_ci(&r.profile.company_name, t)
                })
            })
            .collect();

        let total = matching.len() as i64;
        Ok((
            page(matching, query.page.offset(), query.page.limit),
            total,
        ))
    }

    async fn mark_approved(
        &self,
        id: Uuid,
        unique_id: &str,
        member_id: &str,
    ) -> Result<bool, AppError> {
        let mut state = self.state.lock().await;
        match state
            .registrations
            .iter_mut()
            .find(|r| r.id == id && r.status != RegistrationStatus::Approved)
        {
            Some(registration) => {
                registration.status = RegistrationStatus::Approved;
                registration.unique_id = Some(unique_id.to_string());
                registration.member_id = Some(member_id.to_string());
                registration.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_rejected(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.lock().await;
        match state
            .registrations
            .iter_mut()
            .find(|r| r.id == id && r.status == RegistrationStatus::Pending)
        {
            Some(registration) => {
                registration.status = RegistrationStatus::Rejected;
                registration.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_membership_validity(
        &self,
        id: Uuid,
        validity: Option<String>,
    ) -> Result<Option<Registration>, AppError> {
        let mut state = self.state.lock().await;
        Ok(state
            .registrations
            .iter_mut()
            .find(|r| r.id == id)
            .map(|registration| {
                registration.membership_validity = validity;
                registration.updated_at = Utc::now();
                registration.clone()
            }))
    }
}

#[async_trait]
impl MemberStore for MemoryStore {
    async fn max_unique_id(&self) -> Result<Option<String>, AppError> {
        let five_digits = pattern(r"^\d{5}$")?;
        let max = {
            let state = self.state.lock().await;
            state
                .members
                .iter()
                .map(|m| m.unique_id.as_str())
                .filter(|id| five_digits.is_match(id))
                .max()
                .map(str::to_string)
        };
        tokio::task::yield_now().await;
        Ok(max)
    }

    async fn max_member_id(&self, prefix: char) -> Result<Option<String>, AppError> {
        let prefixed = pattern(&format!(
            r"^{}\d+$",
            regex::escape(&prefix.to_string())
        ))?;
        let max = {
            let state = self.state.lock().await;
            state
                .members
                .iter()
                .map(|m| m.member_id.as_str())
                .filter(|id| prefixed.is_match(id))
                .max_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
                .map(str::to_string)
        };
        tokio::task::yield_now().await;
        Ok(max)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let email = email.to_lowercase();
        let state = self.state.lock().await;
        Ok(state
            .members
            .iter()
            .any(|m| m.profile.email.to_lowercase() == email))
    }

    async fn insert(&self, member: NewMember) -> Result<Member, AppError> {
        let mut state = self.state.lock().await;

        if state.members.iter().any(|m| m.unique_id == member.unique_id) {
            return Err(AppError::IdentifierConflict(format!(
                "uniqueId {} already assigned",
                member.unique_id
            )));
        }
        if state.members.iter().any(|m| m.member_id == member.member_id) {
            return Err(AppError::IdentifierConflict(format!(
                "memberId {} already assigned",
                member.member_id
            )));
        }
        if member.registration_id.is_some()
            && state
                .members
                .iter()
                .any(|m| m.registration_id == member.registration_id)
        {
            return Err(AppError::AlreadyApproved(
                "Registration already has a member".to_string(),
            ));
        }
        let email = member.profile.email.to_lowercase();
        if state
            .members
            .iter()
            .any(|m| m.profile.email.to_lowercase() == email)
        {
            return Err(AppError::DuplicateEmail(
                "This email is already registered".to_string(),
            ));
        }

        let now = Utc::now();
        let created = Member {
            id: Uuid::new_v4(),
            registration_id: member.registration_id,
            unique_id: member.unique_id,
            member_id: member.member_id,
            role: member.role,
            profile: member.profile,
            membership_validity: member.membership_validity,
            company_brief: None,
            instagram: None,
            twitter: None,
            facebook: None,
            photo: member.photo,
            logo: None,
            password_hash: member.password_hash,
            created_at: now,
            updated_at: now,
        };
        state.members.push(created.clone());
        Ok(created)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Member>, AppError> {
        let state = self.state.lock().await;
        Ok(state.members.iter().find(|m| m.id == id).cloned())
    }

    async fn find_by_registration(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<Member>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .members
            .iter()
            .find(|m| m.registration_id == Some(registration_id))
            .cloned())
    }

    async fn list(&self, query: &MemberQuery) -> Result<(Vec<Member>, i64), AppError> {
        let term = search_term(query.search.as_deref()).map(str::to_lowercase);
        let state = self.state.lock().await;

        let mut matching: Vec<&Member> = state
            .members
            .iter()
            .filter(|m| {
                term.as_deref().map_or(true, |t| {
                    contains_ci(&m.profile.name, t)
                        || contains_ci(&m.profile.email, t)
                        || contains_ci(&m.profile.mobile, t)
                        || contains_ci(&m.member_id, t)
                        || contains_ci(&m.profile.company_name, t)
                })
            })
            .collect();
        matching.sort_by(|a, b| a.unique_id.cmp(&b.unique_id));

        let total = matching.len() as i64;
        Ok((
            page(matching, query.page.offset(), query.page.limit),
            total,
        ))
    }

    async fn update_fields(
        &self,
        id: Uuid,
        changes: &MemberChanges,
    ) -> Result<Option<Member>, AppError> {
        let mut state = self.state.lock().await;

        if let Some(Some(email)) = changes.get("email") {
            let email = email.to_lowercase();
            if state
                .members
                .iter()
                .any(|m| m.id != id && m.profile.email.to_lowercase() == email)
            {
                return Err(AppError::DuplicateEmail(
                    "This email is already registered".to_string(),
                ));
            }
        }

        Ok(state
            .members
            .iter_mut()
            .find(|m| m.id == id)
            .map(|member| {
                for (spec, value) in changes.iter() {
                    member.set_column(spec.column, value.map(str::to_string));
                }
                member.updated_at = Utc::now();
                member.clone()
            }))
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        let mut state = self.state.lock().await;
        match state.members.iter_mut().find(|m| m.id == id) {
            Some(member) => {
                member.password_hash = password_hash.to_string();
                member.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl CredentialDeliveryStore for MemoryStore {
    async fn record_failure(
        &self,
        member_ref: Uuid,
        member_id: &str,
        email: &str,
        reason: &str,
    ) -> Result<CredentialDelivery, AppError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        if let Some(entry) = state
            .deliveries
            .iter_mut()
            .find(|d| d.member_ref == member_ref)
        {
            entry.member_id = member_id.to_string();
            entry.email = email.to_string();
            entry.status = DeliveryStatus::Pending;
            entry.attempts += 1;
            entry.last_error = Some(reason.to_string());
            entry.updated_at = now;
            return Ok(entry.clone());
        }

        let entry = CredentialDelivery {
            id: Uuid::new_v4(),
            member_ref,
            member_id: member_id.to_string(),
            email: email.to_string(),
            status: DeliveryStatus::Pending,
            attempts: 1,
            last_error: Some(reason.to_string()),
            created_at: now,
            updated_at: now,
        };
        state.deliveries.push(entry.clone());
        Ok(entry)
    }

    async fn mark_delivered(&self, member_ref: Uuid) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        if let Some(entry) = state
            .deliveries
            .iter_mut()
            .find(|d| d.member_ref == member_ref)
        {
            entry.status = DeliveryStatus::Delivered;
            entry.last_error = None;
            entry.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn get(&self, member_ref: Uuid) -> Result<Option<CredentialDelivery>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .deliveries
            .iter()
            .find(|d| d.member_ref == member_ref)
            .cloned())
    }

    async fn list_pending(&self) -> Result<Vec<CredentialDelivery>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .deliveries
            .iter()
            .filter(|d| d.status == DeliveryStatus::Pending)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::models::{ApplicantProfile, PageRequest, UserRole};

    fn profile(name: &str, email: &str) -> ApplicantProfile {
        ApplicantProfile {
            name: name.to_string(),
            email: email.to_string(),
            mobile: "+96550000000".to_string(),
            company_name: format!("{} Ltd", name),
            profession: "Engineer".to_string(),
            nationality: "Kuwaiti".to_string(),
            membership_type: "Individual Member".to_string(),
            ..Default::default()
        }
    }

    fn new_member(unique_id: &str, member_id: &str, email: &str) -> NewMember {
        NewMember {
            registration_id: None,
            unique_id: unique_id.to_string(),
            member_id: member_id.to_string(),
            role: UserRole::Member,
            profile: profile("Member", email),
            membership_validity: None,
            photo: None,
            password_hash: "hash".to_string(),
        }
    }

    async fn register(store: &MemoryStore, name: &str, email: &str) -> Registration {
        RegistrationStore::insert(
            store,
            NewRegistration {
                profile: profile(name, email),
                photo: None,
                consent: true,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_member_identifiers_are_unique() {
        let store = MemoryStore::new();
        MemberStore::insert(&store, new_member("10001", "I10000", "a@x.com"))
            .await
            .unwrap();

        let same_unique = MemberStore::insert(&store, new_member("10001", "I10001", "b@x.com")).await;
        assert!(matches!(same_unique, Err(AppError::IdentifierConflict(_))));

        let same_member = MemberStore::insert(&store, new_member("10002", "I10000", "b@x.com")).await;
        assert!(matches!(same_member, Err(AppError::IdentifierConflict(_))));

        let same_email = MemberStore::insert(&store, new_member("10002", "I10001", "A@X.com")).await;
        assert!(matches!(same_email, Err(AppError::DuplicateEmail(_))));

        assert_eq!(store.member_count().await, 1);
    }

    #[tokio::test]
    async fn test_max_scans_follow_identifier_formats() {
        let store = MemoryStore::new();
        for (unique_id, member_id, email) in [
            ("10009", "I9999", "a@x.com"),
            ("10010", "I10000", "b@x.com"),
            ("legacy", "C10004", "c@x.com"),
            ("123456", "Ix", "d@x.com"),
        ] {
            MemberStore::insert(&store, new_member(unique_id, member_id, email))
                .await
                .unwrap();
        }

        assert_eq!(store.max_unique_id().await.unwrap().as_deref(), Some("10010"));
        assert_eq!(store.max_member_id('I').await.unwrap().as_deref(), Some("I10000"));
        assert_eq!(store.max_member_id('C').await.unwrap().as_deref(), Some("C10004"));
        assert_eq!(store.max_member_id('S').await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejected_registrations_release_their_email() {
        let store = MemoryStore::new();
        let first = register(&store, "Ada", "ada@x.com").await;

        assert!(store.email_in_use("ADA@x.com").await.unwrap());
        assert!(store.mark_rejected(first.id).await.unwrap());
        assert!(!store.mark_rejected(first.id).await.unwrap());
        assert!(!store.email_in_use("ada@x.com").await.unwrap());

        register(&store, "Ada", "ada@x.com").await;
        assert_eq!(store.registration_count().await, 2);
    }

    #[tokio::test]
    async fn test_mark_approved_is_conditional() {
        let store = MemoryStore::new();
        let registration = register(&store, "Ada", "ada@x.com").await;

        assert!(store.mark_approved(registration.id, "10001", "I10000").await.unwrap());
        assert!(!store.mark_approved(registration.id, "10002", "I10001").await.unwrap());

        let stored = RegistrationStore::get(&store, registration.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RegistrationStatus::Approved);
        assert_eq!(stored.unique_id.as_deref(), Some("10001"));
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates() {
        let store = MemoryStore::new();
        for i in 0..12 {
            register(&store, &format!("Applicant {}", i), &format!("a{}@x.com", i)).await;
        }
        let ada = register(&store, "Ada Lovelace", "ada@engines.com").await;
        store.mark_rejected(ada.id).await.unwrap();

        let query = RegistrationQuery {
            status: StatusFilter::Only(RegistrationStatus::Pending),
            search: None,
            page: PageRequest::new(Some(2), Some(5)),
        };
        let (items, total) = RegistrationStore::list(&store, &query).await.unwrap();
        assert_eq!(total, 12);
        assert_eq!(items.len(), 5);

        let query = RegistrationQuery {
            status: StatusFilter::All,
            search: Some("ENGINES".to_string()),
            page: PageRequest::default(),
        };
        let (items, total) = RegistrationStore::list(&store, &query).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].id, ada.id);
    }

    #[tokio::test]
    async fn test_delivery_failures_accumulate_until_delivered() {
        let store = MemoryStore::new();
        let member_ref = Uuid::new_v4();

        store
            .record_failure(member_ref, "I10000", "a@x.com", "timed out")
            .await
            .unwrap();
        let entry = store
            .record_failure(member_ref, "I10000", "a@x.com", "connection refused")
            .await
            .unwrap();
        assert_eq!(entry.attempts, 2);
        assert_eq!(entry.last_error.as_deref(), Some("connection refused"));
        assert_eq!(store.list_pending().await.unwrap().len(), 1);

        store.mark_delivered(member_ref).await.unwrap();
        assert!(store.list_pending().await.unwrap().is_empty());
    }
}
