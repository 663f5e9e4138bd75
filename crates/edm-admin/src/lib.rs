//! EDM Administration Module
//!
//! Company, area and user administration for the document management site.
//!
//! # Features
//! - Role transition rules for company admins, area responsibles and members
//! - Ordered lifecycle orchestration across the user, company and area lists
//!   and the document library folder tree
//! - Role-scoped navigation tree
//! - Debounced directory lookup
//! - HTTP API over all of the above

pub mod config;
pub mod error;
pub mod models;
pub mod navigation;
pub mod routes;
pub mod security;
pub mod services;
pub mod store;

pub use config::AdminConfig;
pub use error::{AdminError, AdminResult};
pub use routes::{router, AdminState};
