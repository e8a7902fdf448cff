// Gateway error taxonomy

use crate::protocol::{
    JsonRpcError, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
    RATE_LIMITED,
};

/// Protocol-level failures, surfaced in the top-level `error` member.
///
/// Messages never carry backend detail; tool execution problems are
/// reported in-band through `ToolOutcome::Failure` instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RpcFailure {
    #[error("Parse error")]
    ParseError,

    #[error("Invalid Request")]
    InvalidRequest,

    #[error("Method not found")]
    MethodNotFound,

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid params: {0}")]
    InvalidParams(&'static str),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Internal error")]
    Internal,
}

impl RpcFailure {
    pub fn code(&self) -> i32 {
        match self {
            Self::ParseError => PARSE_ERROR,
            Self::InvalidRequest => INVALID_REQUEST,
            Self::MethodNotFound | Self::UnknownTool(_) => METHOD_NOT_FOUND,
            Self::InvalidParams(_) => INVALID_PARAMS,
            Self::RateLimited => RATE_LIMITED,
            Self::Internal => INTERNAL_ERROR,
        }
    }
}

impl From<RpcFailure> for JsonRpcError {
    fn from(failure: RpcFailure) -> Self {
        JsonRpcError::new(failure.code(), failure.to_string())
    }
}

/// Errors raised while building the tool catalog at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),
}
