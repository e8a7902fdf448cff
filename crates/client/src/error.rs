//! Error types for the Qortal client.

/// Result type for client operations.
pub type QortalResult<T> = Result<T, QortalError>;

/// Errors returned by the Qortal Core API or the transport underneath it.
///
/// The `Display` text of the node-facing variants is safe to show to end
/// users: it never contains URLs, API keys or raw response bodies.
#[derive(Debug, thiserror::Error)]
pub enum QortalError {
    /// No configured node could be reached.
    #[error("Node unreachable")]
    Unreachable,

    /// The node rejected the request for lack of credentials.
    #[error("Unauthorized or API key required.")]
    Unauthorized { status: u16 },

    /// The node reported a malformed address.
    #[error("Invalid Qortal address.")]
    InvalidAddress { status: u16, code: String },

    /// The address is well formed but unknown to the chain.
    #[error("Address not found on chain.")]
    AddressNotFound { status: u16 },

    /// The registered name does not exist.
    #[error("Name not found.")]
    NameNotFound { status: u16 },

    /// The node answered with something that is not JSON.
    #[error("Unexpected response from node.")]
    UnexpectedResponse { status: u16 },

    /// Any other error status.
    #[error("Qortal API error.")]
    Api { status: u16, code: Option<String> },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl QortalError {
    /// HTTP status reported by the node, if the node answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status }
            | Self::InvalidAddress { status, .. }
            | Self::AddressNotFound { status }
            | Self::NameNotFound { status }
            | Self::UnexpectedResponse { status }
            | Self::Api { status, .. } => Some(*status),
            Self::Unreachable | Self::Config(_) | Self::InvalidUrl(_) => None,
        }
    }

    /// Map a Qortal error payload (`{"error": "CODE"}`) and status to a variant.
    pub fn from_status(status: u16, code: Option<&str>) -> Self {
        let normalized = code.map(|c| c.trim().to_ascii_uppercase()).filter(|c| !c.is_empty());

        match normalized.as_deref() {
            Some("INVALID_ADDRESS" | "INVALID_QORTAL_ADDRESS" | "INVALID_RECIPIENT") => {
                Self::InvalidAddress {
                    status,
                    code: normalized.unwrap_or_default(),
                }
            }
            Some("NAME_UNKNOWN") => Self::NameNotFound { status },
            Some("ADDRESS_UNKNOWN" | "UNKNOWN_ADDRESS") => Self::AddressNotFound { status },
            _ if status == 404 => Self::AddressNotFound { status },
            _ if status == 401 || status == 403 => Self::Unauthorized { status },
            _ => Self::Api {
                status,
                code: normalized,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_address_codes() {
        for code in ["INVALID_ADDRESS", "invalid_qortal_address", "INVALID_RECIPIENT"] {
            let err = QortalError::from_status(400, Some(code));
            assert!(matches!(err, QortalError::InvalidAddress { status: 400, .. }));
        }
    }

    #[test]
    fn test_not_found_mapping() {
        assert!(matches!(
            QortalError::from_status(404, Some("NAME_UNKNOWN")),
            QortalError::NameNotFound { status: 404 }
        ));
        assert!(matches!(
            QortalError::from_status(404, Some("ADDRESS_UNKNOWN")),
            QortalError::AddressNotFound { status: 404 }
        ));
        assert!(matches!(
            QortalError::from_status(404, None),
            QortalError::AddressNotFound { status: 404 }
        ));
    }

    #[test]
    fn test_generic_error_keeps_status() {
        let err = QortalError::from_status(500, Some("INTERNAL_ERROR"));
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "Qortal API error.");
        match err {
            QortalError::Api { code, .. } => assert_eq!(code.as_deref(), Some("INTERNAL_ERROR")),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_forbidden_is_unauthorized() {
        assert!(matches!(
            QortalError::from_status(403, None),
            QortalError::Unauthorized { status: 403 }
        ));
    }
}
