use std::sync::{Mutex, PoisonError};

use serde_json::Value;
use tracing::debug;

use af_core::ports::HostedPagePort;

#[derive(Debug, Default)]
struct PageRecord {
    current_url: String,
    navigations: Vec<String>,
    posted: Vec<(Value, String)>,
    focus_count: usize,
}

/// Hosted page that records every command instead of rendering.
///
/// A navigation takes effect immediately: the page shows the new URL until
/// the next one.
#[derive(Debug, Default)]
pub struct RecordingHostedPage {
    record: Mutex<PageRecord>,
}

impl RecordingHostedPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend the page followed a redirect to `url`.
    pub fn set_current_url(&self, url: &str) {
        self.lock().current_url = url.to_string();
    }

    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    /// Posted messages with their target origin.
    pub fn posted(&self) -> Vec<(Value, String)> {
        self.lock().posted.clone()
    }

    pub fn focus_count(&self) -> usize {
        self.lock().focus_count
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PageRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HostedPagePort for RecordingHostedPage {
    fn navigate(&self, url: &str) {
        debug!(url, "page navigate");
        let mut record = self.lock();
        record.current_url = url.to_string();
        record.navigations.push(url.to_string());
    }

    fn current_url(&self) -> String {
        self.lock().current_url.clone()
    }

    fn focus(&self) {
        self.lock().focus_count += 1;
    }

    fn post_message(&self, message: Value, target_origin: &str) {
        self.lock().posted.push((message, target_origin.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn navigation_updates_current_url() {
        let page = RecordingHostedPage::new();
        assert_eq!(page.current_url(), "");

        page.navigate("https://idp.test/");
        page.set_current_url("https://idp.test/redirected");

        assert_eq!(page.current_url(), "https://idp.test/redirected");
        assert_eq!(page.navigations(), vec!["https://idp.test/"]);
    }

    #[test]
    fn posted_messages_keep_target() {
        let page = RecordingHostedPage::new();
        page.post_message(json!({"method": "handshake"}), "https://idp.test/");

        assert_eq!(
            page.posted(),
            vec![(json!({"method": "handshake"}), "https://idp.test/".to_string())]
        );
    }
}
