//! Execution Context

use crate::shared::tsid::TsidGenerator;

/// Principal recorded when the caller does not name one.
pub const SYSTEM_PRINCIPAL: &str = "system";

/// Context for one provisioning execution.
///
/// `initiated_at` is read from the clock exactly once; account and
/// authorization timestamps are all derived from it.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Unique ID for this execution (generated)
    pub execution_id: String,
    /// ID for distributed tracing (usually from the original request)
    pub correlation_id: String,
    /// ID of the principal performing the action
    pub principal_id: String,
    /// Epoch seconds when the execution was initiated
    pub initiated_at: i64,
}

impl ExecutionContext {
    /// Fresh context; the correlation ID starts as the execution ID.
    pub fn create(principal_id: impl Into<String>, now: i64) -> Self {
        let exec_id = format!("exec-{}", TsidGenerator::generate());
        Self {
            execution_id: exec_id.clone(),
            correlation_id: exec_id,
            principal_id: principal_id.into(),
            initiated_at: now,
        }
    }

    /// Context continuing an upstream correlation ID.
    pub fn with_correlation(
        principal_id: impl Into<String>,
        correlation_id: impl Into<String>,
        now: i64,
    ) -> Self {
        Self {
            execution_id: format!("exec-{}", TsidGenerator::generate()),
            correlation_id: correlation_id.into(),
            principal_id: principal_id.into(),
            initiated_at: now,
        }
    }

    pub fn now(&self) -> i64 {
        self.initiated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_context() {
        let ctx = ExecutionContext::create("ops@acme", 1_700_000_000);

        assert!(ctx.execution_id.starts_with("exec-"));
        assert_eq!(ctx.correlation_id, ctx.execution_id);
        assert_eq!(ctx.principal_id, "ops@acme");
        assert_eq!(ctx.now(), 1_700_000_000);
    }

    #[test]
    fn test_with_correlation() {
        let ctx = ExecutionContext::with_correlation(SYSTEM_PRINCIPAL, "corr-456", 42);

        assert!(ctx.execution_id.starts_with("exec-"));
        assert_eq!(ctx.correlation_id, "corr-456");
        assert_eq!(ctx.principal_id, "system");
        assert_eq!(ctx.initiated_at, 42);
    }
}
