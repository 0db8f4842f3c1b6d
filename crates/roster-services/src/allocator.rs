//! Identifier allocation by max-scan.
//!
//! Both schemes read the current greatest identifier and add one. Nothing is
//! reserved: two concurrent callers can compute the same value. The members
//! table's unique indexes reject the second insert with `IdentifierConflict`
//! and the approval workflow retries with freshly read values.

use std::sync::Arc;

use roster_core::models::MembershipType;
use roster_core::AppError;
use roster_db::MemberStore;

/// First value of the numeric `uniqueId` scheme.
pub const UNIQUE_ID_START: u32 = 10001;
const UNIQUE_ID_MAX: u32 = 99_999;
/// First number of every type-prefixed `memberId` scheme.
pub const MEMBER_ID_START: u64 = 10000;

#[derive(Clone)]
pub struct IdentifierAllocator {
    members: Arc<dyn MemberStore>,
}

impl IdentifierAllocator {
    pub fn new(members: Arc<dyn MemberStore>) -> Self {
        Self { members }
    }

    /// Next five-digit `uniqueId`.
    #[tracing::instrument(skip(self))]
    pub async fn next_unique_id(&self) -> Result<String, AppError> {
        let max = self.members.max_unique_id().await?;
        next_unique_id_after(max.as_deref())
    }

    /// Next `memberId` in the scheme selected by `membership_type`.
    #[tracing::instrument(skip(self))]
    pub async fn next_member_id(&self, membership_type: MembershipType) -> Result<String, AppError> {
        let prefix = membership_type.prefix();
        let max = self.members.max_member_id(prefix).await?;
        Ok(next_member_id_after(prefix, max.as_deref()))
    }
}

/// `max(existing + 1, 10001)`, zero-padded to five digits. Unparseable
/// values count as absent.
pub fn next_unique_id_after(max: Option<&str>) -> Result<String, AppError> {
    let next = max
        .and_then(|value| value.parse::<u32>().ok())
        .map(|n| n.saturating_add(1).max(UNIQUE_ID_START))
        .unwrap_or(UNIQUE_ID_START);

    if next > UNIQUE_ID_MAX {
        return Err(AppError::Internal(
            "Five-digit uniqueId space is exhausted".to_string(),
        ));
    }

    Ok(format!("{:05}", next))
}

/// `<prefix>max(existing + 1, 10000)`, unpadded.
pub fn next_member_id_after(prefix: char, max: Option<&str>) -> String {
    let next = max
        .and_then(|value| value.strip_prefix(prefix))
        .and_then(|digits| digits.parse::<u64>().ok())
        .map(|n| n.saturating_add(1).max(MEMBER_ID_START))
        .unwrap_or(MEMBER_ID_START);

    format!("{}{}", prefix, next)
}
