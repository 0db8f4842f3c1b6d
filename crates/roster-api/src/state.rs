//! Application state shared by every handler.

use crate::auth::JwtVerifier;
use roster_core::Config;
use roster_services::{
    ApprovalWorkflow, CredentialDeliveryService, MemberService, RegistrationService,
};
use roster_storage::Storage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub registrations: RegistrationService,
    pub approvals: ApprovalWorkflow,
    pub members: MemberService,
    pub deliveries: CredentialDeliveryService,
    pub storage: Arc<dyn Storage>,
    pub jwt: Arc<JwtVerifier>,
}
