//! Flow controller.
//!
//! Owns the flow state of the current load cycle. Every collaborator input
//! lands in one handler here; handlers mutate the state, then run the
//! completion routine whenever the new information might let the cycle
//! finish. The routine only decides; this module performs the side effects.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use af_core::flow::{
    AuthMode, CompletionContext, CompletionDecision, CompletionResult, CompletionRoutine,
    DeferReason, FlowEvent, FlowInput, FlowParams, FlowState, IdentityPair, MessageError,
    PageEnvelope, PageMessage, PasswordSource, RequestDetails, ResolvedParams, ScheduledTask,
    ScraperEvent, ScraperSnapshot, ServicesPolicy, BLANK_PAGE_URL,
};
use af_core::ports::{
    CredentialScraperPort, FlowEventPort, HistoryPort, HostedPagePort, PasswordlessQueryPort,
};
use af_core::{FlowConfig, SecretString};

use super::capabilities::FlowCapabilities;
use super::scheduler::TaskQueue;

/// Errors produced by the flow controller.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("cannot complete without email, gaia id and session index unless skipped")]
    IncompleteIdentity,
}

/// The collaborators a controller drives.
#[derive(Clone)]
pub struct FlowPorts {
    pub page: Arc<dyn HostedPagePort>,
    pub scraper: Arc<dyn CredentialScraperPort>,
    pub history: Arc<dyn HistoryPort>,
    pub events: Arc<dyn FlowEventPort>,
}

/// Single-flow, single-use controller that resets itself after each
/// completion.
pub struct FlowController {
    config: FlowConfig,
    params: ResolvedParams,
    state: FlowState,
    cycle: u64,
    tasks: TaskQueue,
    capabilities: FlowCapabilities,
    services_policy: Arc<dyn ServicesPolicy>,
    ports: FlowPorts,
}

impl FlowController {
    pub fn new(
        ports: FlowPorts,
        capabilities: FlowCapabilities,
        services_policy: Arc<dyn ServicesPolicy>,
        config: FlowConfig,
    ) -> Self {
        let params = FlowParams::default().resolve(AuthMode::Default, &config);
        Self {
            config,
            params,
            state: FlowState::default(),
            cycle: 0,
            tasks: TaskQueue::new(),
            capabilities,
            services_policy,
            ports,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn params(&self) -> &ResolvedParams {
        &self.params
    }

    /// Number of resets so far. Tasks carry the cycle that produced them.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn is_current_cycle(&self, cycle: u64) -> bool {
        self.cycle == cycle
    }

    pub fn passwordless_query(&self) -> Option<Arc<dyn PasswordlessQueryPort>> {
        self.capabilities.passwordless_query.clone()
    }

    /// Dispatch one input to its handler.
    pub fn handle(&mut self, input: FlowInput) -> Result<(), FlowError> {
        match input {
            FlowInput::Load { mode, params } => self.load(mode, &params),
            FlowInput::Reload => self.reload(),
            FlowInput::ResetPage => self.reset_page(),
            FlowInput::NavigationCompleted(details) => self.on_navigation_completed(&details),
            FlowInput::HeadersReceived(details) => self.on_headers_received(&details),
            FlowInput::Message(envelope) => self.on_message(envelope),
            FlowInput::ContentLoaded => self.on_content_loaded(),
            FlowInput::LoadAborted { error, url } => self.on_load_aborted(error, url),
            FlowInput::LoadCommitted => self.on_load_committed(),
            FlowInput::PopState { url } => self.on_pop_state(url),
            FlowInput::DropLink { url } => self.emit(FlowEvent::DropLink { url }),
            FlowInput::NewWindow { url } => self.emit(FlowEvent::NewWindow { url }),
            FlowInput::Scraper(event) => self.on_scraper_event(event),
            FlowInput::VerifyConfirmedPassword(candidate) => {
                return self.verify_confirmed_password(candidate)
            }
            FlowInput::CompleteWithManualPassword(password) => {
                return self.complete_with_manual_password(password)
            }
            FlowInput::PasswordlessResolved {
                pair,
                is_passwordless,
            } => self.on_passwordless_resolved(pair, is_passwordless),
            FlowInput::Scheduled(task) => self.run_scheduled(task),
            FlowInput::Shutdown => debug!("shutdown is handled by the runtime"),
        }
        Ok(())
    }

    /// Start a new cycle with the given parameters.
    ///
    /// Malformed parameters degrade to defaults; loading never fails.
    pub fn load(&mut self, mode: AuthMode, params: &Value) {
        self.reset_states();
        self.params = FlowParams::from_value(params).resolve(mode, &self.config);
        self.ports
            .scraper
            .set_block_insecure_content(self.params.block_insecure_content);
        info!(
            ?mode,
            idp_origin = %self.params.idp_origin,
            cycle = self.cycle,
            "flow load"
        );
        self.ports.page.navigate(&self.params.reload_url);
        self.state.loaded = true;
    }

    /// Restart the cycle with the parameters of the last load.
    pub fn reload(&mut self) {
        self.reset_states();
        info!(cycle = self.cycle, "flow reload");
        self.ports.page.navigate(&self.params.reload_url);
        self.state.loaded = true;
    }

    /// Send the page to the blank page.
    pub fn reset_page(&mut self) {
        let current = self.ports.page.current_url();
        if !current.is_empty() && current != BLANK_PAGE_URL {
            self.ports.page.navigate(BLANK_PAGE_URL);
        }
    }

    pub fn on_navigation_completed(&mut self, details: &RequestDetails) {
        let url = details.url.as_str();

        if !self.params.is_new_gaia_flow
            && url.starts_with(&self.params.continue_url_without_params)
        {
            if url.contains("ntp=1") {
                self.state.skip_for_now = true;
            }
            debug!(skip_for_now = self.state.skip_for_now, "continue URL reached");
            self.maybe_complete();
            return;
        }

        if !url.starts_with("https") {
            if self.state.is_trusted() {
                warn!(url, "insecure navigation, cycle no longer trusted");
            }
            self.state.mark_untrusted();
        }

        if self.params.constrained {
            let embedded = self.params.is_idp_url(url) && details.is_embedded_form();
            if !embedded && !self.params.dont_resize_non_embedded_pages {
                self.emit(FlowEvent::Resize {
                    url: url.to_string(),
                });
                return;
            }
        }

        self.update_history(url);
    }

    fn update_history(&self, url: &str) {
        match self.ports.history.current() {
            Some(current) if current != url => self.ports.history.push(url),
            _ => self.ports.history.replace(url),
        }
    }

    /// Read identity and sync choice from IdP response headers.
    ///
    /// Once `userInfo` has already delivered services, a header that completes
    /// the identity re-runs the completion check.
    pub fn on_headers_received(&mut self, details: &RequestDetails) {
        if !self.params.is_idp_url(&details.url) {
            return;
        }

        let findings = details.scan();
        if let Some(signin) = findings.signin {
            debug!(
                email = ?signin.email,
                gaia_id = ?signin.gaia_id,
                "identity from sign-in header"
            );
            self.state
                .set_identity(signin.email, signin.gaia_id, signin.session_index);
        }
        if let Some(choose_what_to_sync) = findings.choose_what_to_sync {
            self.state.choose_what_to_sync = choose_what_to_sync;
        }
        if self.state.services.is_some() && self.state.has_complete_identity() {
            self.maybe_complete();
        }
    }

    pub fn on_message(&mut self, envelope: PageEnvelope) {
        let message = match envelope.decode(self.params.message_origin()) {
            Ok(message) => message,
            Err(err @ (MessageError::ForeignOrigin { .. } | MessageError::MissingMethod)) => {
                debug!(error = %err, "ignoring page message");
                return;
            }
            Err(err) => {
                warn!(error = %err, "Unrecognized message from identity provider");
                return;
            }
        };
        debug!(method = message.method(), "page message");

        match message {
            PageMessage::AttemptLogin {
                email,
                password,
                choose_what_to_sync,
            } => {
                self.state
                    .set_email(Some(email.clone()).filter(|e| !e.is_empty()));
                if self.params.mode == AuthMode::Desktop {
                    self.state.password = password;
                }
                self.state.choose_what_to_sync = choose_what_to_sync.unwrap_or(false);
                if self.state.announced_email.as_deref() != Some(email.as_str()) {
                    self.state.announced_email = Some(email.clone());
                    self.emit(FlowEvent::AttemptLogin { email });
                }
            }
            PageMessage::DialogShown => self.emit(FlowEvent::DialogShown),
            PageMessage::DialogHidden => self.emit(FlowEvent::DialogHidden),
            PageMessage::BackButton { show } => self.emit(FlowEvent::BackButton { show }),
            PageMessage::ShowView => self.emit(FlowEvent::ShowView),
            PageMessage::MenuItemClicked { item } => {
                self.emit(FlowEvent::MenuItemClicked { item })
            }
            PageMessage::IdentifierEntered { account_identifier } => {
                self.emit(FlowEvent::IdentifierEntered { account_identifier })
            }
            PageMessage::UserInfo { services } => {
                self.state.services = services;
                if self.state.has_complete_identity() {
                    self.maybe_complete();
                }
            }
            PageMessage::ShowIncognito => self.emit(FlowEvent::ShowIncognito),
        }
    }

    pub fn on_content_loaded(&mut self) {
        let url = self.ports.page.current_url();
        if self.params.is_idp_url(&url) {
            self.ports
                .page
                .post_message(json!({ "method": "handshake" }), &url);
            self.fire_ready();
            self.ports.page.focus();
        } else if url == BLANK_PAGE_URL {
            self.fire_ready();
        }
    }

    pub fn on_load_aborted(&mut self, error: String, url: String) {
        warn!(%error, %url, "page load aborted");
        self.emit(FlowEvent::LoadAbort { error, url });
    }

    pub fn on_load_committed(&mut self) {
        if self.state.has_gaia_id() {
            self.maybe_complete();
        }
    }

    pub fn on_pop_state(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            self.ports.page.navigate(&url);
        }
    }

    pub fn on_scraper_event(&mut self, event: ScraperEvent) {
        match event {
            ScraperEvent::AuthPageLoaded { is_saml_page } => {
                if !self.state.loaded || !is_saml_page {
                    return;
                }
                self.state.auth_domain = self.ports.scraper.auth_domain();
                self.state.mark_saml();
                info!(auth_domain = %self.state.auth_domain, "SAML page loaded");
                self.ports.page.focus();
                self.fire_ready();
            }
            ScraperEvent::ApiPasswordAdded => {
                // The API password may arrive after the load commit.
                if self.state.has_gaia_id() {
                    self.maybe_complete();
                }
            }
            ScraperEvent::InsecureContentBlocked { url } => {
                if !self.state.loaded {
                    return;
                }
                match &self.capabilities.content_blocked {
                    Some(handler) => handler(&url),
                    None => error!(%url, "Insecure content blocked"),
                }
            }
            ScraperEvent::VideoEnabled => self.state.video_enabled = true,
        }
    }

    /// Resume a cycle waiting on password confirmation.
    ///
    /// A mismatch re-asks the host on the next turn, never from inside this
    /// call.
    pub fn verify_confirmed_password(&mut self, candidate: SecretString) -> Result<(), FlowError> {
        if !self.ports.scraper.verify_confirmed_password(&candidate) {
            debug!("confirmed password matches no scraped password");
            self.tasks.schedule(ScheduledTask::ConfirmPassword { cycle: self.cycle });
            return Ok(());
        }

        self.state.password = Some(candidate);
        self.finalize()
    }

    /// Complete with a password the user typed outside the IdP page.
    pub fn complete_with_manual_password(&mut self, password: SecretString) -> Result<(), FlowError> {
        self.state.password = Some(password);
        self.finalize()
    }

    pub fn on_passwordless_resolved(&mut self, pair: IdentityPair, is_passwordless: bool) {
        if self.state.passwordless_in_flight.as_ref() == Some(&pair) {
            self.state.passwordless_in_flight = None;
        }
        if self.state.identity_pair().as_ref() != Some(&pair) {
            debug!("discarding passwordless answer for a previous identity");
            return;
        }

        debug!(is_passwordless, "passwordless determination");
        self.state.passwordless = Some(is_passwordless);
        self.maybe_complete();
    }

    /// Tasks deferred by the handlers run so far, oldest first.
    pub fn take_scheduled(&mut self) -> Vec<ScheduledTask> {
        self.tasks.drain()
    }

    /// Run a deferred task, unless its cycle has ended.
    pub fn run_scheduled(&mut self, task: ScheduledTask) {
        if !self.is_current_cycle(task.cycle()) {
            debug!(?task, current = self.cycle, "dropping task from an ended cycle");
            return;
        }

        match task {
            ScheduledTask::ConfirmPassword { .. } => {
                if let Some(handler) = &self.capabilities.confirm_password {
                    let email = self.state.email.clone().unwrap_or_default();
                    handler(&email, self.ports.scraper.scraped_password_count());
                }
            }
            ScheduledTask::QueryPasswordless { .. } => {
                debug!("passwordless lookups run on the async runtime");
            }
        }
    }

    /// Run the completion routine and act on its decision.
    fn maybe_complete(&mut self) {
        let state = std::mem::take(&mut self.state);
        let ctx = CompletionContext {
            scraper: ScraperSnapshot {
                saml_api_used: self.ports.scraper.saml_api_used(),
                scraped_password_count: self.ports.scraper.scraped_password_count(),
            },
            handlers: self.capabilities.registered(),
            need_password: self.params.need_password,
            initial_frame_url: &self.params.initial_frame_url,
            services_policy: self.services_policy.as_ref(),
        };
        let (state, decision) = CompletionRoutine::evaluate(state, &ctx);
        self.state = state;
        debug!(?decision, "completion decision");

        match decision {
            CompletionDecision::Renavigate { url } => {
                if let Some(handler) = &self.capabilities.missing_info {
                    handler();
                }
                self.ports.page.navigate(&url);
            }
            CompletionDecision::Defer(reason) => self.defer(reason),
            CompletionDecision::Finalize(source) => {
                match source {
                    PasswordSource::Current => {}
                    PasswordSource::ApiPassword => {
                        if let Some(handler) = &self.capabilities.saml_api_used {
                            handler();
                        }
                        self.state.password = self.ports.scraper.api_password();
                    }
                    PasswordSource::FirstScraped => {
                        self.state.password = self.ports.scraper.first_scraped_password();
                    }
                }
                if let Err(err) = self.finalize() {
                    error!(error = %err, "completion routine finalized an incomplete cycle");
                }
            }
        }
    }

    fn defer(&mut self, reason: DeferReason) {
        match reason {
            DeferReason::AwaitingServices | DeferReason::PasswordlessLookupInFlight => {}
            DeferReason::PasswordlessLookup(pair) => {
                self.state.passwordless_in_flight = Some(pair.clone());
                self.tasks.schedule(ScheduledTask::QueryPasswordless {
                    cycle: self.cycle,
                    pair,
                });
            }
            DeferReason::NoPasswordScraped { email } => {
                if let Some(handler) = &self.capabilities.no_password {
                    handler(&email);
                }
            }
            DeferReason::ConfirmPassword {
                email,
                scraped_count,
            } => {
                if let Some(handler) = &self.capabilities.confirm_password {
                    handler(&email, scraped_count);
                }
            }
        }
    }

    /// Emit the terminal event and start over.
    fn finalize(&mut self) -> Result<(), FlowError> {
        if !self.state.skip_for_now && !self.state.has_complete_identity() {
            return Err(FlowError::IncompleteIdentity);
        }

        let result = CompletionResult::assemble(&mut self.state);
        info!(
            using_saml = result.using_saml,
            trusted = result.trusted,
            skip_for_now = result.skip_for_now,
            services = result.services.len(),
            "flow completed"
        );
        self.emit(FlowEvent::Completed(result));
        self.reset_states();
        Ok(())
    }

    fn reset_states(&mut self) {
        self.state = FlowState::default();
        self.ports.scraper.reset();
        self.cycle += 1;
        debug!(cycle = self.cycle, "flow state reset");
    }

    fn fire_ready(&mut self) {
        if !self.state.ready_fired {
            self.state.ready_fired = true;
            self.emit(FlowEvent::Ready);
        }
    }

    fn emit(&self, event: FlowEvent) {
        debug!(event = event.name(), "emit flow event");
        self.ports.events.emit(event);
    }
}
