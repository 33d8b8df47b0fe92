use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{Middleware, Next, RequestContext, Response};
use crate::Error;

/// Logs each request's expressions and how long the round trip took.
///
/// Emits `tracing` events only; installing a subscriber is up to the
/// application. Placeholder values can carry user data and are only logged
/// when enabled with [`RequestLogger::with_values`].
#[derive(Debug, Clone, Default)]
pub struct RequestLogger {
    log_values: bool,
}

impl RequestLogger {
    /// Logger that omits placeholder values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also log the key and `:pN` placeholder values.
    pub fn with_values(mut self, enabled: bool) -> Self {
        self.log_values = enabled;
        self
    }
}

#[async_trait]
impl Middleware for RequestLogger {
    async fn invoke(&self, context: RequestContext, next: Next) -> Result<Response, Error> {
        let request = context.request();
        let operation = request.operation_name();
        let table = request.table_name().unwrap_or_default().to_string();

        tracing::debug!(
            operation,
            table = %table,
            expressions = ?request.expressions(),
            names = ?request.expression_attribute_names(),
            "sending DynamoDB request"
        );
        if self.log_values {
            tracing::debug!(
                operation,
                table = %table,
                key = ?request.key(),
                values = ?request.expression_attribute_values(),
                "DynamoDB request values"
            );
        }

        let started = Instant::now();
        let result = next.run(context).await;
        let elapsed_ms = millis(started.elapsed());

        match &result {
            Ok(_) => tracing::debug!(
                operation,
                table = %table,
                elapsed_ms,
                "DynamoDB request completed"
            ),
            Err(error) => tracing::warn!(
                operation,
                table = %table,
                elapsed_ms,
                error = %error,
                "DynamoDB request failed"
            ),
        }

        result
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis() {
        assert_eq!(millis(Duration::from_micros(2_500)), 2);
        assert_eq!(millis(Duration::from_secs(3)), 3_000);
    }

    #[test]
    fn test_millis_saturates() {
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }
}
