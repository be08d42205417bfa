//! Core types shared across drupalkit
//!
//! - [`error`] - [`DrupalKitError`], [`ErrorContext`] and [`user_friendly_error`]
//! - [`kind`] - [`ExtensionKind`], the category every discovered extension belongs to

pub mod error;
pub mod kind;

pub use error::{DrupalKitError, ErrorContext, user_friendly_error};
pub use kind::ExtensionKind;
