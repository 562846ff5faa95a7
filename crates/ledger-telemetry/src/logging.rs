//! Structured logging helpers.
//!
//! Every ledger event carries the same leading fields so log pipelines can
//! index them: `component` first, then whatever the call site adds.

/// Structured log entry with a component field.
#[macro_export]
macro_rules! log_event {
    (info, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (error, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_macros_expand_without_subscriber() {
        log_event!(info, "ledger", "committed", action = "claim");
        log_event!(debug, "ledger", "no fields");
        log_event!(warn, "runtime", "step rejected", index = 3, error = %"boom");
    }
}
