// Chat delivery: recipient addressing and the sender abstraction.

pub mod discord;

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed chat handle {handle:?}: {source}")]
pub struct HandleError {
    pub handle: String,
    pub source: ParseIntError,
}

/// A Discord user snowflake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

impl FromStr for UserId {
    type Err = HandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(UserId)
            .map_err(|source| HandleError {
                handle: s.to_string(),
                source,
            })
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One authenticated sending identity.
///
/// Implementations are not required to tolerate concurrent calls; the
/// dispatcher drives each sender from a single task.
#[async_trait]
pub trait ChatSender: Send + Sync {
    /// Short label for logs, e.g. `bot-0`.
    fn name(&self) -> &str;

    async fn send_direct_message(&self, recipient: UserId, body: &str) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
