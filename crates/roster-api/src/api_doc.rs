//! OpenAPI documentation, served at `/api/openapi.json` and browsable at `/docs`.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use roster_core::models;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_token",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Roster API",
        version = "0.1.0",
        description = "Membership provisioning: public registration, admin approval with identifier allocation and credential delivery, and member profile management. Resource endpoints are versioned under /api/v1/."
    ),
    modifiers(&BearerAuth),
    paths(
        handlers::health::health_check,
        // Registrations
        handlers::registrations::submit_registration,
        handlers::registrations::list_registrations,
        handlers::registrations::get_registration,
        handlers::registrations::update_registration,
        handlers::registrations::reject_registration,
        // Members
        handlers::members::list_members,
        handlers::members::get_member,
        handlers::members::update_member,
        // Files
        handlers::files::get_file,
        // Admin
        handlers::credential_deliveries::list_pending_deliveries,
        handlers::credential_deliveries::reissue_credentials,
    ),
    components(
        schemas(
            models::RegistrationSubmission,
            models::RegistrationResponse,
            models::RegistrationStatus,
            models::ApplicantProfile,
            models::MemberResponse,
            models::UserRole,
            models::Pagination,
            models::CredentialDelivery,
            models::DeliveryStatus,
            handlers::registrations::UpdateRegistrationRequest,
            handlers::registrations::ApprovalResponse,
            handlers::credential_deliveries::ReissueResponse,
            handlers::health::HealthResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "registrations", description = "Applicant submissions and admin review"),
        (name = "members", description = "Member directory and profile updates"),
        (name = "files", description = "Locally stored photos and logos"),
        (name = "admin", description = "Pending credential deliveries"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;
