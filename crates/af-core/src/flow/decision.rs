//! Completion decision routine.
//!
//! A pure function of the flow state and a snapshot of the collaborators.
//! It never performs side effects: the caller interprets the returned
//! [`CompletionDecision`] exactly once. The only state it touches is the
//! services gate, which may force an empty services list.

use serde_json::Value;
use tracing::warn;

use super::policy::ServicesPolicy;
use super::state::{FlowState, IdentityPair};

/// What the scraper knows at the moment the routine runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScraperSnapshot {
    pub saml_api_used: bool,
    pub scraped_password_count: usize,
}

/// Which optional host handlers are registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisteredHandlers {
    pub missing_info: bool,
    pub confirm_password: bool,
    pub no_password: bool,
    pub saml_api_used: bool,
    pub content_blocked: bool,
    pub passwordless_query: bool,
}

/// Inputs of one evaluation besides the flow state.
pub struct CompletionContext<'a> {
    pub scraper: ScraperSnapshot,
    pub handlers: RegisteredHandlers,
    pub need_password: bool,
    pub initial_frame_url: &'a str,
    pub services_policy: &'a dyn ServicesPolicy,
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionDecision {
    /// Identity is incomplete: notify the missing-info handler and restart
    /// from `url`.
    Renavigate { url: String },
    /// Not enough information yet.
    Defer(DeferReason),
    /// Finish the cycle with the password taken from the given source.
    Finalize(PasswordSource),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferReason {
    /// Waiting for a `userInfo` message.
    AwaitingServices,
    /// Ask whether the SAML user behind the pair is passwordless.
    PasswordlessLookup(IdentityPair),
    /// A lookup for the current pair is already pending.
    PasswordlessLookupInFlight,
    /// Nothing was scraped; the no-password handler decides what follows.
    NoPasswordScraped { email: String },
    /// Several passwords were scraped; the host must confirm one.
    ConfirmPassword { email: String, scraped_count: usize },
}

/// Where the finalized password comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordSource {
    /// Whatever the state already holds, possibly nothing.
    Current,
    /// The password submitted through the in-page credentials API.
    ApiPassword,
    /// The single scraped password.
    FirstScraped,
}

/// Ordered guards deciding whether a cycle may complete.
pub struct CompletionRoutine;

impl CompletionRoutine {
    pub fn evaluate(
        mut state: FlowState,
        ctx: &CompletionContext<'_>,
    ) -> (FlowState, CompletionDecision) {
        if !state.has_complete_identity() && !state.skip_for_now {
            let url = ctx.initial_frame_url.to_string();
            return (state, CompletionDecision::Renavigate { url });
        }

        if state.services.is_none() {
            if !ctx.services_policy.waits_for_services(state.email.as_deref()) {
                warn!("Forcing empty services");
                state.services = Some(Value::Array(Vec::new()));
            } else {
                return (state, CompletionDecision::Defer(DeferReason::AwaitingServices));
            }
        }

        let pair = state.identity_pair();

        if state.passwordless.is_none() && state.is_saml() && ctx.handlers.passwordless_query {
            if let Some(pair) = pair.clone() {
                let reason = if state.passwordless_in_flight.as_ref() == Some(&pair) {
                    DeferReason::PasswordlessLookupInFlight
                } else {
                    DeferReason::PasswordlessLookup(pair)
                };
                return (state, CompletionDecision::Defer(reason));
            }
        }

        if state.passwordless == Some(true) && state.is_saml() && pair.is_some() {
            return (state, CompletionDecision::Finalize(PasswordSource::Current));
        }

        if ctx.scraper.saml_api_used {
            return (state, CompletionDecision::Finalize(PasswordSource::ApiPassword));
        }

        let email = state.email.clone().unwrap_or_default();
        match ctx.scraper.scraped_password_count {
            0 if ctx.handlers.no_password => {
                return (
                    state,
                    CompletionDecision::Defer(DeferReason::NoPasswordScraped { email }),
                );
            }
            // Not fatal: needPassword asks for a password when one exists.
            0 => warn!("No password scraped"),
            1 if ctx.need_password => {
                return (state, CompletionDecision::Finalize(PasswordSource::FirstScraped));
            }
            scraped_count if ctx.need_password && ctx.handlers.confirm_password => {
                return (
                    state,
                    CompletionDecision::Defer(DeferReason::ConfirmPassword {
                        email,
                        scraped_count,
                    }),
                );
            }
            _ => {}
        }

        (state, CompletionDecision::Finalize(PasswordSource::Current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::policy::DomainSuffixAllowList;
    use serde_json::json;

    const INITIAL: &str = "https://accounts.google.com/embedded/setup";

    fn identified(email: &str) -> FlowState {
        let mut state = FlowState::default();
        state.set_identity(Some(email.into()), Some("123".into()), Some("s1".into()));
        state
    }

    fn with_services(email: &str) -> FlowState {
        let mut state = identified(email);
        state.services = Some(json!(["foo"]));
        state
    }

    fn saml(email: &str) -> FlowState {
        let mut state = with_services(email);
        state.mark_saml();
        state
    }

    fn evaluate(
        state: FlowState,
        scraper: ScraperSnapshot,
        handlers: RegisteredHandlers,
    ) -> (FlowState, CompletionDecision) {
        let policy = DomainSuffixAllowList::default();
        let ctx = CompletionContext {
            scraper,
            handlers,
            need_password: true,
            initial_frame_url: INITIAL,
            services_policy: &policy,
        };
        CompletionRoutine::evaluate(state, &ctx)
    }

    fn scraped(count: usize) -> ScraperSnapshot {
        ScraperSnapshot {
            saml_api_used: false,
            scraped_password_count: count,
        }
    }

    fn all_handlers() -> RegisteredHandlers {
        RegisteredHandlers {
            missing_info: true,
            confirm_password: true,
            no_password: true,
            saml_api_used: true,
            content_blocked: true,
            passwordless_query: true,
        }
    }

    #[test]
    fn missing_identity_renavigates_to_initial_frame() {
        let mut state = FlowState::default();
        state.email = Some("a@x.com".into());

        let (_, decision) = evaluate(state, scraped(1), all_handlers());

        assert_eq!(
            decision,
            CompletionDecision::Renavigate {
                url: INITIAL.to_string()
            }
        );
    }

    #[test]
    fn skip_for_now_bypasses_identity_guard() {
        let mut state = FlowState::default();
        state.skip_for_now = true;

        let (state, decision) = evaluate(state, scraped(0), RegisteredHandlers::default());

        assert_eq!(state.services, Some(json!([])));
        assert_eq!(decision, CompletionDecision::Finalize(PasswordSource::Current));
    }

    #[test]
    fn allow_listed_email_waits_for_services() {
        let state = identified("a@gmail.com");

        let (state, decision) = evaluate(state, scraped(1), all_handlers());

        assert_eq!(state.services, None);
        assert_eq!(
            decision,
            CompletionDecision::Defer(DeferReason::AwaitingServices)
        );
    }

    #[test]
    fn other_domains_get_empty_services_forced() {
        let state = identified("a@corp.test");

        let (state, decision) = evaluate(state, scraped(1), RegisteredHandlers::default());

        assert_eq!(state.services, Some(json!([])));
        assert_eq!(
            decision,
            CompletionDecision::Finalize(PasswordSource::FirstScraped)
        );
    }

    #[test]
    fn saml_without_determination_requests_lookup() {
        let (_, decision) = evaluate(saml("a@x.com"), scraped(1), all_handlers());

        assert_eq!(
            decision,
            CompletionDecision::Defer(DeferReason::PasswordlessLookup(IdentityPair::new(
                "a@x.com", "123"
            )))
        );
    }

    #[test]
    fn pending_lookup_for_same_pair_is_not_reissued() {
        let mut state = saml("a@x.com");
        state.passwordless_in_flight = Some(IdentityPair::new("a@x.com", "123"));

        let (_, decision) = evaluate(state, scraped(1), all_handlers());

        assert_eq!(
            decision,
            CompletionDecision::Defer(DeferReason::PasswordlessLookupInFlight)
        );
    }

    #[test]
    fn pending_lookup_for_old_pair_is_reissued_for_current_pair() {
        let mut state = saml("a@x.com");
        state.passwordless_in_flight = Some(IdentityPair::new("a@x.com", "999"));

        let (_, decision) = evaluate(state, scraped(1), all_handlers());

        assert_eq!(
            decision,
            CompletionDecision::Defer(DeferReason::PasswordlessLookup(IdentityPair::new(
                "a@x.com", "123"
            )))
        );
    }

    #[test]
    fn lookup_skipped_without_query_handler() {
        let handlers = RegisteredHandlers {
            passwordless_query: false,
            ..all_handlers()
        };

        let (_, decision) = evaluate(saml("a@x.com"), scraped(1), handlers);

        assert_eq!(
            decision,
            CompletionDecision::Finalize(PasswordSource::FirstScraped)
        );
    }

    #[test]
    fn passwordless_saml_user_finalizes_before_scraper_checks() {
        let mut state = saml("a@x.com");
        state.passwordless = Some(true);

        let (_, decision) = evaluate(state, scraped(3), all_handlers());

        assert_eq!(decision, CompletionDecision::Finalize(PasswordSource::Current));
    }

    #[test]
    fn api_password_wins_over_scraped_candidates() {
        let mut state = saml("a@x.com");
        state.passwordless = Some(false);
        let scraper = ScraperSnapshot {
            saml_api_used: true,
            scraped_password_count: 2,
        };

        let (_, decision) = evaluate(state, scraper, all_handlers());

        assert_eq!(
            decision,
            CompletionDecision::Finalize(PasswordSource::ApiPassword)
        );
    }

    #[test]
    fn scraped_count_table() {
        struct Case {
            count: usize,
            handlers: RegisteredHandlers,
            expected: CompletionDecision,
        }
        let none = RegisteredHandlers::default();
        let cases = [
            Case {
                count: 0,
                handlers: all_handlers(),
                expected: CompletionDecision::Defer(DeferReason::NoPasswordScraped {
                    email: "a@x.com".into(),
                }),
            },
            Case {
                count: 0,
                handlers: none,
                expected: CompletionDecision::Finalize(PasswordSource::Current),
            },
            Case {
                count: 1,
                handlers: none,
                expected: CompletionDecision::Finalize(PasswordSource::FirstScraped),
            },
            Case {
                count: 2,
                handlers: all_handlers(),
                expected: CompletionDecision::Defer(DeferReason::ConfirmPassword {
                    email: "a@x.com".into(),
                    scraped_count: 2,
                }),
            },
            Case {
                count: 2,
                handlers: none,
                expected: CompletionDecision::Finalize(PasswordSource::Current),
            },
        ];

        for case in cases {
            let mut state = saml("a@x.com");
            state.passwordless = Some(false);
            let (_, decision) = evaluate(state, scraped(case.count), case.handlers);
            assert_eq!(decision, case.expected, "count={}", case.count);
        }
    }

    #[test]
    fn password_not_needed_skips_candidate_selection() {
        let policy = DomainSuffixAllowList::default();
        let ctx = CompletionContext {
            scraper: scraped(2),
            handlers: all_handlers(),
            need_password: false,
            initial_frame_url: INITIAL,
            services_policy: &policy,
        };

        let (_, decision) = CompletionRoutine::evaluate(with_services("a@x.com"), &ctx);

        assert_eq!(decision, CompletionDecision::Finalize(PasswordSource::Current));
    }

    #[test]
    fn evaluation_is_repeatable_on_unchanged_state() {
        let (state, first) = evaluate(saml("a@x.com"), scraped(2), all_handlers());
        let (_, second) = evaluate(state, scraped(2), all_handlers());

        assert_eq!(first, second);
    }
}
