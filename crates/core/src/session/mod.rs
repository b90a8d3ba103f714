#![allow(missing_docs)]

//! Admin session and access control.

mod access;

pub use access::{AccessState, AdminSession, LoginOutcome};
