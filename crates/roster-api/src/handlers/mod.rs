pub mod credential_deliveries;
pub mod files;
pub mod health;
pub mod members;
pub mod registrations;
