//! Boundary logging for tree operations
//!
//! Each logged operation emits a `start` event, then either an `end` event
//! carrying `duration_ms` or an `end_error` event carrying the stable error
//! code. The field names match the keys in `datatree_core_types::schema`.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use datatree_core::{log_op_start, DataTree};
/// let tree = DataTree::new("Settings");
/// log_op_start!("commit");
/// log_op_start!("commit", node_type = %tree.get_type());
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = datatree_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = datatree_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use datatree_core::{log_op_end, DataTree};
/// use std::time::Instant;
///
/// let started = Instant::now();
/// let tree = DataTree::new("Settings");
/// log_op_end!(
///     "create",
///     duration_ms = started.elapsed().as_millis() as u64,
///     node_type = %tree.get_type()
/// );
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = datatree_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = datatree_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log a failed operation
///
/// `$err` is anything convertible into [`ExError`](crate::errors::ExError);
/// the operation name is attached to it before its kind, code and rendered
/// message are logged.
///
/// # Example
///
/// ```
/// # use datatree_core::{log_op_error, DataTree};
/// let tree = DataTree::new("Settings");
/// if let Err(err) = tree.get_property("volume") {
///     log_op_error!("get_property", err, duration_ms = 0, key = "volume");
/// }
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err = $crate::errors::ExError::from($err).with_op($op);
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = datatree_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            err.message = %ex_err,
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err = $crate::errors::ExError::from($err).with_op($op);
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = datatree_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            err.message = %ex_err,
            $($field)*
        );
    }};
}
