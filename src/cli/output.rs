//! CLI output: user-facing error messages.

use crate::error::MetricsError;

/// Render an error for the terminal, with a hint where one helps.
pub fn map_error(e: &MetricsError) -> String {
    match e {
        MetricsError::ReservedTagKey { key, .. } => {
            format!("{} (rename the tag; '{}' is used by the backend)", e, key)
        }
        MetricsError::InvalidConfig(_) => format!(
            "{} (see config/config.toml or BATCHMETRICS__* environment variables)",
            e
        ),
        _ => e.to_string(),
    }
}
