/// Back/forward history of the hosting window, keyed by URL.
pub trait HistoryPort: Send + Sync {
    /// URL of the current entry, if any entry was recorded.
    fn current(&self) -> Option<String>;

    fn push(&self, url: &str);

    fn replace(&self, url: &str);
}
