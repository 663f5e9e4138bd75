//! Data models for companies, areas, users and documents

pub mod area;
pub mod company;
pub mod document;
pub mod role;
pub mod user;

pub use area::*;
pub use company::*;
pub use document::*;
pub use role::*;
pub use user::*;
