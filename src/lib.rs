//! Client-side console for editing canary routing rules on ingress
//! resources, with lock-guarded edits.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
pub(crate) mod util;

pub use application::Console;
