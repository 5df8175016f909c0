use super::state::IdentityPair;

/// Work deferred to a later turn of the event loop.
///
/// `cycle` is the load cycle that produced the task; a task outliving its
/// cycle is dropped instead of run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledTask {
    /// Re-ask the host to confirm one of several scraped passwords.
    ConfirmPassword { cycle: u64 },
    /// Ask whether the SAML user behind `pair` has no password.
    QueryPasswordless { cycle: u64, pair: IdentityPair },
}

impl ScheduledTask {
    pub fn cycle(&self) -> u64 {
        match self {
            ScheduledTask::ConfirmPassword { cycle } => *cycle,
            ScheduledTask::QueryPasswordless { cycle, .. } => *cycle,
        }
    }
}
