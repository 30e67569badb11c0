//! Core types for Wrapkit
//!
//! Holds the error taxonomy shared by every other module. See [`error`] for the
//! variants and for [`user_friendly_error`], which `main` uses to render any
//! failure before exiting with status 1.

pub mod error;

pub use error::{ErrorContext, WrapkitError, user_friendly_error};
