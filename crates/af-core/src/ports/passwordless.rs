use anyhow::Result;

/// Directory answering whether a SAML user signs in without a password.
#[async_trait::async_trait]
pub trait PasswordlessQueryPort: Send + Sync {
    /// Look up the `(email, gaia_id)` pair.
    ///
    /// The answer belongs to the pair it was asked for; the caller discards
    /// it if the flow moved on to another identity meanwhile.
    async fn is_passwordless(&self, email: &str, gaia_id: &str) -> Result<bool>;
}
