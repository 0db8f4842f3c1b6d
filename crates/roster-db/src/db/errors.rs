use roster_core::AppError;

// Names of the unique indexes created by the migrations.
const MEMBERS_UNIQUE_ID: &str = "members_unique_id_key";
const MEMBERS_MEMBER_ID: &str = "members_member_id_key";
const MEMBERS_EMAIL: &str = "members_email_key";
const MEMBERS_REGISTRATION: &str = "members_registration_id_key";
const REGISTRATIONS_ACTIVE_EMAIL: &str = "registrations_active_email_key";

/// Translate unique violations into domain errors by constraint name.
pub(crate) fn map_unique_violation(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some(MEMBERS_UNIQUE_ID) | Some(MEMBERS_MEMBER_ID) => {
                    return AppError::IdentifierConflict(format!(
                        "Identifier already assigned ({})",
                        db_err.constraint().unwrap_or_default()
                    ));
                }
                Some(MEMBERS_EMAIL) | Some(REGISTRATIONS_ACTIVE_EMAIL) => {
                    return AppError::DuplicateEmail(
                        "This email is already registered".to_string(),
                    );
                }
                Some(MEMBERS_REGISTRATION) => {
                    return AppError::AlreadyApproved(
                        "Registration already has a member".to_string(),
                    );
                }
                _ => {}
            }
        }
    }
    AppError::Database(err)
}

/// Escape a user search term for use inside an `ILIKE` pattern.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Trimmed, non-empty search term.
pub(crate) fn search_term(search: Option<&str>) -> Option<&str> {
    search.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("ada"), "%ada%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_search_term() {
        assert_eq!(search_term(Some("  ")), None);
        assert_eq!(search_term(Some(" ada ")), Some("ada"));
        assert_eq!(search_term(None), None);
    }

    #[test]
    fn test_non_database_errors_pass_through() {
        assert!(matches!(
            map_unique_violation(sqlx::Error::RowNotFound),
            AppError::Database(_)
        ));
    }
}
