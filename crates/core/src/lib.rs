//! Storage-free building blocks shared by the data layer and the binary:
//! identifier types, the domain error, authorization levels, the ACL
//! registry and entity validation.

pub mod acl;
pub mod error;
pub mod roles;
pub mod types;
pub mod validation;
