pub mod channel;
pub mod config;
pub mod message;
pub mod user;
pub mod workspace;

pub use channel::Channel;
pub use config::{Config, ConfigError};
pub use message::Message;
pub use user::User;
pub use workspace::Workspace;

/// An untyped JSON object. Slack embeds heterogeneous fragments
/// (message reactions, attachments, workspace icons) whose keys and
/// value types vary per workspace; they are carried as-is so a record
/// round-trips without loss.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;
