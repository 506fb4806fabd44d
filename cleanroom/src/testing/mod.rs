//! Test doubles for code built on this crate.
//!
//! [`ScriptedResourceClient`] plays back scripted platform responses and
//! records every call, so lifecycle scenarios can run without a platform.

mod mocks;

pub use mocks::{ClientCall, ScriptedResourceClient};
