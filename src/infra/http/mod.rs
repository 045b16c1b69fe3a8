//! HTTP plumbing shared by the submit and lock flows.

mod client;

pub use client::ConsoleClient;
