use serde_json::Value;

/// The embedded identity-provider page.
///
/// Rendering and hosting are out of scope; the controller only issues
/// navigation commands and posts messages.
pub trait HostedPagePort: Send + Sync {
    /// Navigate the page to `url`.
    fn navigate(&self, url: &str);

    /// URL the page currently shows.
    fn current_url(&self) -> String;

    fn focus(&self);

    /// Post a message to the page, restricted to `target_origin`.
    fn post_message(&self, message: Value, target_origin: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hosted_page_port_is_object_safe() {
        fn assert_object_safe(_page: &dyn HostedPagePort) {}
        let _ = assert_object_safe;
    }
}
