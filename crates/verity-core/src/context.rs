//! Per-call context: auth overlay, server selection, headers, deadline and
//! cancellation.

use crate::auth::AuthContext;
use crate::error::{Error, Result};
use crate::server::ServerVariables;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Options that apply to a single call.
///
/// A default context carries no overlay, selects server 0 and never expires.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    auth: Option<AuthContext>,
    server_index: Option<usize>,
    operation_server_indices: BTreeMap<String, usize>,
    server_variables: ServerVariables,
    operation_server_variables: BTreeMap<String, ServerVariables>,
    headers: BTreeMap<String, String>,
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl CallContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an auth overlay that wins per scheme over client defaults.
    #[must_use]
    pub fn with_auth(mut self, auth: AuthContext) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Select a server index for every operation.
    #[must_use]
    pub fn with_server_index(mut self, index: usize) -> Self {
        self.server_index = Some(index);
        self
    }

    /// Select a server index for one operation.
    #[must_use]
    pub fn with_operation_server_index(
        mut self,
        operation_id: impl Into<String>,
        index: usize,
    ) -> Self {
        self.operation_server_indices
            .insert(operation_id.into(), index);
        self
    }

    /// Override server variables for every operation.
    #[must_use]
    pub fn with_server_variables(mut self, variables: ServerVariables) -> Self {
        self.server_variables = variables;
        self
    }

    /// Override server variables for one operation.
    #[must_use]
    pub fn with_operation_server_variables(
        mut self,
        operation_id: impl Into<String>,
        variables: ServerVariables,
    ) -> Self {
        self.operation_server_variables
            .insert(operation_id.into(), variables);
        self
    }

    /// Add a header sent with this call only.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Expire the call after `timeout` from now.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Expire the call at `deadline`.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Use an externally owned cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The auth overlay, if any.
    #[must_use]
    pub const fn auth(&self) -> Option<&AuthContext> {
        self.auth.as_ref()
    }

    /// Server index for an operation: the per-operation choice, then the
    /// call-wide one, then 0.
    #[must_use]
    pub fn server_index_for(&self, operation_id: &str) -> usize {
        self.operation_server_indices
            .get(operation_id)
            .copied()
            .or(self.server_index)
            .unwrap_or(0)
    }

    /// Call-wide server variable overrides.
    #[must_use]
    pub const fn server_variables(&self) -> &ServerVariables {
        &self.server_variables
    }

    /// Server variable overrides registered for an operation.
    #[must_use]
    pub fn operation_server_variables(&self, operation_id: &str) -> Option<&ServerVariables> {
        self.operation_server_variables.get(operation_id)
    }

    /// Per-call headers.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when there is no deadline.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// The cancellation token shared by clones of this context.
    #[must_use]
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel the call and every clone of this context.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once canceled or past the deadline.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fail with [`Error::Canceled`] when the call is already done.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Canceled`] after cancellation or deadline expiry.
    pub fn check(&self) -> Result<()> {
        if self.is_done() {
            Err(Error::Canceled)
        } else {
            Ok(())
        }
    }

    /// Resolves once the call is canceled or its deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.cancel.cancelled() => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancel.cancelled().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_index_precedence() {
        let ctx = CallContext::new();
        assert_eq!(ctx.server_index_for("TenantsGet"), 0);

        let ctx = ctx.with_server_index(1);
        assert_eq!(ctx.server_index_for("TenantsGet"), 1);

        let ctx = ctx.with_operation_server_index("TenantsGet", 2);
        assert_eq!(ctx.server_index_for("TenantsGet"), 2);
        assert_eq!(ctx.server_index_for("BundlesGet"), 1);
    }

    #[test]
    fn operation_variables_are_scoped() {
        let vars: ServerVariables = [("host".to_string(), "a".to_string())].into();
        let ctx = CallContext::new().with_operation_server_variables("TenantsGet", vars.clone());
        assert_eq!(ctx.operation_server_variables("TenantsGet"), Some(&vars));
        assert!(ctx.operation_server_variables("BundlesGet").is_none());
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let ctx = CallContext::new();
        let clone = ctx.clone();
        assert!(ctx.check().is_ok());
        clone.cancel();
        assert_eq!(ctx.check(), Err(Error::Canceled));
    }

    #[tokio::test]
    async fn expired_deadline_is_done() {
        let ctx = CallContext::new().with_timeout(Duration::ZERO);
        assert!(ctx.is_done());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
        ctx.done().await;
    }

    #[tokio::test]
    async fn done_resolves_on_cancel() {
        let ctx = CallContext::new();
        let token = ctx.cancellation_token().clone();
        tokio::spawn(async move { token.cancel() });
        ctx.done().await;
        assert!(ctx.is_done());
    }
}
