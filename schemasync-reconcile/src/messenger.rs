use std::fmt;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// Operator notification channel. Write-only.
pub trait Messenger: Send + Sync {
    fn notify(&self, level: MessageLevel, message: &str);
}

/// Forwards operator messages to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMessenger;

impl Messenger for TracingMessenger {
    fn notify(&self, level: MessageLevel, message: &str) {
        match level {
            MessageLevel::Info | MessageLevel::Success => info!(target: "schemasync::operator", %level, "{message}"),
            MessageLevel::Warning => warn!(target: "schemasync::operator", "{message}"),
            MessageLevel::Error => error!(target: "schemasync::operator", "{message}"),
        }
    }
}
