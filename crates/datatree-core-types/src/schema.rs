//! Canonical field keys and event names for structured logging
//!
//! `tracing` field names are fixed at the call site, so the logging macros
//! spell these keys literally. The capture layer and log assertions look
//! fields up through these constants.

// Every boundary event
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Transactions and undo groups
pub const FIELD_TRANSACTION_ID: &str = "transaction_id";
pub const FIELD_OP_COUNT: &str = "op_count";
pub const FIELD_GROUP_NAME: &str = "group_name";
pub const FIELD_ACTION_COUNT: &str = "action_count";

// Trees
pub const FIELD_NODE_TYPE: &str = "node_type";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";
pub const FIELD_ERR_MESSAGE: &str = "err.message";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_distinct() {
        assert_ne!(EVENT_START, EVENT_END);
        assert_ne!(EVENT_START, EVENT_END_ERROR);
        assert_ne!(EVENT_END, EVENT_END_ERROR);
    }

    #[test]
    fn test_error_fields_share_prefix() {
        for key in [FIELD_ERR_KIND, FIELD_ERR_CODE, FIELD_ERR_MESSAGE] {
            assert!(key.starts_with("err."), "{}", key);
        }
    }
}
