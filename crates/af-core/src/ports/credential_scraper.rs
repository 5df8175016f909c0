use crate::security::SecretString;

/// Low-level credential scraping on the hosted page.
///
/// Exposed only as counts, values and a verification query. The events the
/// scraper raises arrive separately as [`crate::flow::ScraperEvent`] inputs.
pub trait CredentialScraperPort: Send + Sync {
    /// Number of distinct passwords scraped from form submissions.
    fn scraped_password_count(&self) -> usize;

    fn first_scraped_password(&self) -> Option<SecretString>;

    /// Password submitted through the in-page credentials API, if any.
    fn api_password(&self) -> Option<SecretString>;

    /// Whether the in-page credentials API delivered a password.
    fn saml_api_used(&self) -> bool;

    /// Whether `candidate` equals one of the scraped passwords.
    fn verify_confirmed_password(&self, candidate: &SecretString) -> bool;

    /// Domain of the SAML IdP page, once one loaded.
    fn auth_domain(&self) -> String;

    /// Forget everything scraped during the cycle.
    fn reset(&self);

    fn set_block_insecure_content(&self, block: bool);
}
