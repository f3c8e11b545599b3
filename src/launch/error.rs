use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchErrorKind {
    Configuration,
    ProtocolViolation,
    UpstreamLookup,
    GuardEvaluation,
    NotFound,
    Internal,
}

impl LaunchErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::ProtocolViolation => "protocol_violation",
            Self::UpstreamLookup => "upstream_lookup",
            Self::GuardEvaluation => "guard_evaluation",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LaunchError {
    pub kind: LaunchErrorKind,
    pub message: String,
}

impl LaunchError {
    pub fn new(kind: LaunchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Client-caused failures are answered with a 4xx at the HTTP boundary.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind,
            LaunchErrorKind::ProtocolViolation | LaunchErrorKind::NotFound
        )
    }
}

pub fn configuration_error(message: impl Into<String>) -> LaunchError {
    LaunchError::new(LaunchErrorKind::Configuration, message)
}

pub fn protocol_violation(message: impl Into<String>) -> LaunchError {
    LaunchError::new(LaunchErrorKind::ProtocolViolation, message)
}

pub fn missing_parameter(name: &str) -> LaunchError {
    protocol_violation(format!("missing required launch parameter '{name}'"))
}

pub fn upstream_lookup(message: impl Into<String>) -> LaunchError {
    LaunchError::new(LaunchErrorKind::UpstreamLookup, message)
}

pub fn guard_evaluation(message: impl Into<String>) -> LaunchError {
    LaunchError::new(LaunchErrorKind::GuardEvaluation, message)
}

pub fn not_found(message: impl Into<String>) -> LaunchError {
    LaunchError::new(LaunchErrorKind::NotFound, message)
}

pub fn internal_error(message: impl Into<String>) -> LaunchError {
    LaunchError::new(LaunchErrorKind::Internal, message)
}
