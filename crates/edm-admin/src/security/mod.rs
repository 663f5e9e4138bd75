//! Security module - role rules, permissions and input validation

pub mod permission;
pub mod roles;
pub mod validator;

pub use permission::*;
pub use roles::*;
pub use validator::*;
