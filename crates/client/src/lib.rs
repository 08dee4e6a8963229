//! Typed facade over the Slack Web API.
//!
//! One method per workspace operation, with cursor pagination folded
//! into flat listings and every failure classified into a single
//! [`ClientError`] type. The client holds no mutable state — a
//! `reqwest::Client` pool plus the bearer token — so one instance is
//! shared freely across concurrent callers.

pub mod client;
pub mod error;

pub use client::{AuthInfo, SlackClient, MAX_PAGES};
pub use error::ClientError;
