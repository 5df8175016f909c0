//! Credential scraper driven by explicit calls instead of page observation.

use std::sync::{Mutex, MutexGuard, PoisonError};

use subtle::ConstantTimeEq;
use tracing::debug;

use af_core::ports::CredentialScraperPort;
use af_core::SecretString;

#[derive(Default)]
struct ScrapedCredentials {
    scraped: Vec<SecretString>,
    api_password: Option<SecretString>,
    auth_domain: String,
    block_insecure_content: bool,
    reset_count: usize,
}

/// Scraper whose observations are fed by the caller.
#[derive(Default)]
pub struct ScriptedScraper {
    inner: Mutex<ScrapedCredentials>,
}

impl ScriptedScraper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a password seen in a form submission. Duplicates count once.
    pub fn add_scraped_password(&self, password: &str) {
        let mut inner = self.lock();
        if inner.scraped.iter().any(|known| secret_eq(known, password)) {
            return;
        }
        inner.scraped.push(SecretString::from(password));
        debug!(count = inner.scraped.len(), "password scraped");
    }

    /// Record a password delivered through the in-page credentials API.
    pub fn set_api_password(&self, password: &str) {
        self.lock().api_password = Some(SecretString::from(password));
    }

    pub fn set_auth_domain(&self, domain: &str) {
        self.lock().auth_domain = domain.to_string();
    }

    pub fn blocks_insecure_content(&self) -> bool {
        self.lock().block_insecure_content
    }

    pub fn reset_count(&self) -> usize {
        self.lock().reset_count
    }

    fn lock(&self) -> MutexGuard<'_, ScrapedCredentials> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn secret_eq(secret: &SecretString, candidate: &str) -> bool {
    secret.expose().as_bytes().ct_eq(candidate.as_bytes()).into()
}

impl CredentialScraperPort for ScriptedScraper {
    fn scraped_password_count(&self) -> usize {
        self.lock().scraped.len()
    }

    fn first_scraped_password(&self) -> Option<SecretString> {
        self.lock()
            .scraped
            .first()
            .map(|password| SecretString::from(password.expose()))
    }

    fn api_password(&self) -> Option<SecretString> {
        self.lock()
            .api_password
            .as_ref()
            .map(|password| SecretString::from(password.expose()))
    }

    fn saml_api_used(&self) -> bool {
        self.lock().api_password.is_some()
    }

    fn verify_confirmed_password(&self, candidate: &SecretString) -> bool {
        // Compare against every entry so timing does not reveal the match.
        self.lock()
            .scraped
            .iter()
            .fold(false, |found, known| secret_eq(known, candidate.expose()) | found)
    }

    fn auth_domain(&self) -> String {
        self.lock().auth_domain.clone()
    }

    fn reset(&self) {
        let mut inner = self.lock();
        let resets = inner.reset_count + 1;
        let block = inner.block_insecure_content;
        *inner = ScrapedCredentials {
            block_insecure_content: block,
            reset_count: resets,
            ..ScrapedCredentials::default()
        };
    }

    fn set_block_insecure_content(&self, block: bool) {
        self.lock().block_insecure_content = block;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_scraped_passwords_count_once() {
        let scraper = ScriptedScraper::new();
        scraper.add_scraped_password("one");
        scraper.add_scraped_password("two");
        scraper.add_scraped_password("one");

        assert_eq!(scraper.scraped_password_count(), 2);
        assert_eq!(
            scraper.first_scraped_password().as_deref(),
            Some("one")
        );
    }

    #[test]
    fn verify_matches_any_scraped_password() {
        let scraper = ScriptedScraper::new();
        scraper.add_scraped_password("one");
        scraper.add_scraped_password("two");

        assert!(scraper.verify_confirmed_password(&SecretString::from("two")));
        assert!(!scraper.verify_confirmed_password(&SecretString::from("tw")));
        assert!(!scraper.verify_confirmed_password(&SecretString::from("wrong")));
    }

    #[test]
    fn api_password_marks_api_used() {
        let scraper = ScriptedScraper::new();
        assert!(!scraper.saml_api_used());

        scraper.set_api_password("api");

        assert!(scraper.saml_api_used());
        assert_eq!(scraper.api_password().as_deref(), Some("api"));
    }

    #[test]
    fn reset_forgets_credentials_but_keeps_content_policy() {
        let scraper = ScriptedScraper::new();
        scraper.set_block_insecure_content(true);
        scraper.add_scraped_password("one");
        scraper.set_api_password("api");
        scraper.set_auth_domain("idp.corp.test");

        scraper.reset();

        assert_eq!(scraper.scraped_password_count(), 0);
        assert!(!scraper.saml_api_used());
        assert_eq!(scraper.auth_domain(), "");
        assert!(scraper.blocks_insecure_content());
        assert_eq!(scraper.reset_count(), 1);
    }
}
