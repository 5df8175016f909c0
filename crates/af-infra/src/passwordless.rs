use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use af_core::ports::PasswordlessQueryPort;
use af_core::IdentityPair;

/// Passwordless directory backed by a fixed account list.
///
/// An optional latency delays every answer, which lets callers exercise
/// answers that arrive after the identity changed.
#[derive(Debug, Clone, Default)]
pub struct StaticPasswordlessDirectory {
    accounts: Vec<IdentityPair>,
    latency: Option<Duration>,
}

impl StaticPasswordlessDirectory {
    pub fn new(accounts: Vec<IdentityPair>) -> Self {
        Self {
            accounts,
            latency: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency).filter(|l| !l.is_zero());
        self
    }
}

#[async_trait]
impl PasswordlessQueryPort for StaticPasswordlessDirectory {
    async fn is_passwordless(&self, email: &str, gaia_id: &str) -> anyhow::Result<bool> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let found = self
            .accounts
            .iter()
            .any(|account| account.email.eq_ignore_ascii_case(email) && account.gaia_id == gaia_id);
        debug!(found, "passwordless lookup");
        Ok(found)
    }
}
