use datatree_core_types::TransactionId;
use thiserror::Error;

/// Result type alias using DataTreeError
pub type Result<T> = std::result::Result<T, DataTreeError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// This taxonomy provides a stable, structured classification of all errors
/// raised by the tree engine. Each kind maps to a stable error code that can be
/// used for programmatic error handling, testing, and host-facing reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural
    InvalidNode,
    AlreadyAttached,
    IndexOutOfRange,
    CycleDetected,

    // Lookup
    KeyNotFound,
    InvalidIdentifier,

    // Transaction lifecycle
    TransactionAlreadyFinalized,

    // Serialization / configuration
    InvalidJson,
    Serialization,
    InvalidConfig,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidNode => "ERR_INVALID_NODE",
            ExErrorKind::AlreadyAttached => "ERR_ALREADY_ATTACHED",
            ExErrorKind::IndexOutOfRange => "ERR_INDEX_OUT_OF_RANGE",
            ExErrorKind::CycleDetected => "ERR_CYCLE_DETECTED",
            ExErrorKind::KeyNotFound => "ERR_KEY_NOT_FOUND",
            ExErrorKind::InvalidIdentifier => "ERR_INVALID_IDENTIFIER",
            ExErrorKind::TransactionAlreadyFinalized => "ERR_TRANSACTION_ALREADY_FINALIZED",
            ExErrorKind::InvalidJson => "ERR_INVALID_JSON",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
        }
    }
}

/// Canonical structured error type
///
/// Carries classification fields for programmatic handling and the context
/// (operation, node type, property key, child index) needed for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    node_type: Option<String>,
    key: Option<String>,
    index: Option<usize>,
    transaction_id: Option<TransactionId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            node_type: None,
            key: None,
            index: None,
            transaction_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add node type context
    pub fn with_node_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    /// Add property key context
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add child index context
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Add transaction correlation context
    pub fn with_transaction_id(mut self, transaction_id: TransactionId) -> Self {
        self.transaction_id = Some(transaction_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the node type context, if any
    pub fn node_type(&self) -> Option<&str> {
        self.node_type.as_deref()
    }

    /// Get the property key context, if any
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Get the child index context, if any
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Get the transaction ID context, if any
    pub fn transaction_id(&self) -> Option<&TransactionId> {
        self.transaction_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(node_type) = &self.node_type {
            write!(f, " (node_type: {})", node_type)?;
        }
        if let Some(key) = &self.key {
            write!(f, " (key: {})", key)?;
        }
        if let Some(index) = self.index {
            write!(f, " (index: {})", index)?;
        }
        if let Some(transaction_id) = &self.transaction_id {
            write!(f, " (transaction: {})", transaction_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for tree, transaction and serialization operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataTreeError {
    // ===== Structural Errors =====
    /// Mutation attempted on the invalid (null) tree sentinel
    #[error("Operation requires a valid tree node")]
    InvalidNode,

    /// Child already belongs to a parent
    #[error("Node of type '{node_type}' is already attached to a parent")]
    AlreadyAttached { node_type: String },

    /// Child index outside the valid range
    #[error("Child index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Attaching a node beneath itself or one of its descendants
    #[error("Attaching node of type '{node_type}' would create a cycle")]
    CycleDetected { node_type: String },

    // ===== Lookup Errors =====
    /// Property is absent (distinct from a stored null value)
    #[error("Property not found: {key}")]
    KeyNotFound { key: String },

    /// Identifier text is empty or whitespace-only
    #[error("Invalid identifier: {input:?}")]
    InvalidIdentifier { input: String },

    // ===== Transaction Errors =====
    /// Commit or abort called on a transaction that already finished
    #[error("Transaction already finalized")]
    TransactionAlreadyFinalized,

    // ===== Serialization Errors =====
    /// JSON input does not describe a tree
    #[error("Invalid tree JSON: {reason}")]
    InvalidJson { reason: String },

    /// Underlying serde_json failure
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    // ===== Configuration Errors =====
    /// Configuration text could not be parsed
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Conversion from DataTreeError to the structured ExError
impl From<DataTreeError> for ExError {
    fn from(err: DataTreeError) -> Self {
        match err {
            DataTreeError::InvalidNode => ExError::new(ExErrorKind::InvalidNode)
                .with_message("Operation requires a valid tree node"),

            DataTreeError::AlreadyAttached { node_type } => {
                ExError::new(ExErrorKind::AlreadyAttached)
                    .with_node_type(node_type)
                    .with_message("Node is already attached to a parent")
            }

            DataTreeError::IndexOutOfRange { index, len } => {
                ExError::new(ExErrorKind::IndexOutOfRange)
                    .with_index(index)
                    .with_message(format!("Child index out of range (len {})", len))
            }

            DataTreeError::CycleDetected { node_type } => ExError::new(ExErrorKind::CycleDetected)
                .with_node_type(node_type)
                .with_message("Attaching node would create a cycle"),

            DataTreeError::KeyNotFound { key } => ExError::new(ExErrorKind::KeyNotFound)
                .with_key(key)
                .with_message("Property not found"),

            DataTreeError::InvalidIdentifier { input } => {
                ExError::new(ExErrorKind::InvalidIdentifier)
                    .with_message(format!("Invalid identifier: {:?}", input))
            }

            DataTreeError::TransactionAlreadyFinalized => {
                ExError::new(ExErrorKind::TransactionAlreadyFinalized)
                    .with_message("Transaction already finalized")
            }

            DataTreeError::InvalidJson { reason } => {
                ExError::new(ExErrorKind::InvalidJson).with_message(reason)
            }

            DataTreeError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            DataTreeError::InvalidConfig { reason } => {
                ExError::new(ExErrorKind::InvalidConfig).with_message(reason)
            }
        }
    }
}

/// Conversion from serde_json::Error to DataTreeError
impl From<serde_json::Error> for DataTreeError {
    fn from(err: serde_json::Error) -> Self {
        DataTreeError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Conversion from toml::de::Error to DataTreeError
impl From<toml::de::Error> for DataTreeError {
    fn from(err: toml::de::Error) -> Self {
        DataTreeError::InvalidConfig {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        let cases = [
            (ExErrorKind::InvalidNode, "ERR_INVALID_NODE"),
            (ExErrorKind::AlreadyAttached, "ERR_ALREADY_ATTACHED"),
            (ExErrorKind::IndexOutOfRange, "ERR_INDEX_OUT_OF_RANGE"),
            (
                ExErrorKind::TransactionAlreadyFinalized,
                "ERR_TRANSACTION_ALREADY_FINALIZED",
            ),
            (ExErrorKind::KeyNotFound, "ERR_KEY_NOT_FOUND"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_index_out_of_range_carries_index() {
        let ex: ExError = DataTreeError::IndexOutOfRange { index: 7, len: 3 }.into();
        assert_eq!(ex.kind(), ExErrorKind::IndexOutOfRange);
        assert_eq!(ex.index(), Some(7));
        assert!(ex.to_string().contains("ERR_INDEX_OUT_OF_RANGE"));
    }

    #[test]
    fn test_key_not_found_carries_key() {
        let ex: ExError = DataTreeError::KeyNotFound {
            key: "volume".to_string(),
        }
        .into();
        assert_eq!(ex.key(), Some("volume"));
        assert_eq!(ex.code(), "ERR_KEY_NOT_FOUND");
    }

    #[test]
    fn test_serde_json_error_converts() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: DataTreeError = parse_err.into();
        assert!(matches!(err, DataTreeError::Serialization { .. }));
    }

    #[test]
    fn test_ex_error_context_builders() {
        let id = TransactionId::new();
        let ex = ExError::new(ExErrorKind::TransactionAlreadyFinalized)
            .with_op("commit")
            .with_transaction_id(id.clone());
        assert_eq!(ex.op(), Some("commit"));
        assert_eq!(ex.transaction_id(), Some(&id));
        let text = ex.to_string();
        assert!(text.starts_with("[ERR_TRANSACTION_ALREADY_FINALIZED] in operation 'commit'"));
        assert!(text.ends_with(&format!("(transaction: {})", id)));
    }
}
