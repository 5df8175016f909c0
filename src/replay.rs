//! JSON-lines replay driver.
//!
//! Each script line is one step: either an input for the flow runtime or a
//! set-up action on the in-memory collaborators (scripted passwords, page
//! redirects). Set-up steps wait for every earlier input to be handled, so a
//! script reads in the order things happen. Blank lines and lines starting
//! with `#` are skipped.
//!
//! The transcript holds one JSON value per emitted lifecycle event or host
//! handler call, in emission order.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, info_span, Instrument};

use af_app::{FlowCapabilities, FlowController, FlowHandle, FlowPorts, FlowRuntime};
use af_core::flow::{
    DomainSuffixAllowList, FlowEvent, FlowInput, PageEnvelope, RequestDetails, ScraperEvent,
};
use af_core::ports::FlowEventPort;
use af_core::{AuthMode, SecretString};
use af_infra::{InMemoryHistory, RecordingHostedPage, ScriptedScraper, StaticPasswordlessDirectory};

use crate::bootstrap::AppConfig;

/// One line of a replay script.
#[derive(Debug, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ReplayStep {
    Load {
        #[serde(default)]
        mode: AuthMode,
        #[serde(default)]
        params: Value,
    },
    Reload,
    ResetPage,
    NavigationCompleted(RequestDetails),
    HeadersReceived(RequestDetails),
    Message(PageEnvelope),
    ContentLoaded,
    LoadAborted {
        error: String,
        url: String,
    },
    LoadCommitted,
    PopState {
        #[serde(default)]
        url: Option<String>,
    },
    DropLink {
        url: String,
    },
    NewWindow {
        url: String,
    },
    Scraper {
        event: ScraperEvent,
    },
    VerifyConfirmedPassword {
        password: String,
    },
    CompleteWithManualPassword {
        password: String,
    },

    // Collaborator set-up
    ScrapePassword {
        password: String,
    },
    ApiPassword {
        password: String,
    },
    AuthDomain {
        domain: String,
    },
    /// The page followed a redirect the flow did not ask for.
    PageUrl {
        url: String,
    },
    /// Let pending passwordless answers arrive.
    Wait {
        ms: u64,
    },
}

impl ReplayStep {
    fn into_input(self) -> Result<FlowInput, ReplayStep> {
        Ok(match self {
            ReplayStep::Load { mode, params } => FlowInput::Load { mode, params },
            ReplayStep::Reload => FlowInput::Reload,
            ReplayStep::ResetPage => FlowInput::ResetPage,
            ReplayStep::NavigationCompleted(details) => FlowInput::NavigationCompleted(details),
            ReplayStep::HeadersReceived(details) => FlowInput::HeadersReceived(details),
            ReplayStep::Message(envelope) => FlowInput::Message(envelope),
            ReplayStep::ContentLoaded => FlowInput::ContentLoaded,
            ReplayStep::LoadAborted { error, url } => FlowInput::LoadAborted { error, url },
            ReplayStep::LoadCommitted => FlowInput::LoadCommitted,
            ReplayStep::PopState { url } => FlowInput::PopState { url },
            ReplayStep::DropLink { url } => FlowInput::DropLink { url },
            ReplayStep::NewWindow { url } => FlowInput::NewWindow { url },
            ReplayStep::Scraper { event } => FlowInput::Scraper(event),
            ReplayStep::VerifyConfirmedPassword { password } => {
                FlowInput::VerifyConfirmedPassword(SecretString::from(password))
            }
            ReplayStep::CompleteWithManualPassword { password } => {
                FlowInput::CompleteWithManualPassword(SecretString::from(password))
            }
            setup => return Err(setup),
        })
    }
}

/// Parse a whole script up front so a typo fails before anything runs.
pub fn parse_script(script: &str) -> Result<Vec<ReplayStep>> {
    script
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid replay step on line {}", index + 1))
        })
        .collect()
}

/// Event sink writing each event into the transcript.
struct TranscriptSink {
    tx: UnboundedSender<Value>,
}

impl FlowEventPort for TranscriptSink {
    fn emit(&self, event: FlowEvent) {
        let _ = self.tx.send(render_event(&event));
    }
}

/// JSON rendering of a lifecycle event. The completion password is reduced
/// to a `hasPassword` flag.
pub fn render_event(event: &FlowEvent) -> Value {
    let name = event.name();
    match event {
        FlowEvent::AttemptLogin { email } => json!({ "event": name, "email": email }),
        FlowEvent::Completed(result) => json!({ "event": name, "result": result.summary() }),
        FlowEvent::LoadAbort { error, url } => json!({ "event": name, "error": error, "url": url }),
        FlowEvent::BackButton { show } => json!({ "event": name, "show": show }),
        FlowEvent::MenuItemClicked { item } => json!({ "event": name, "item": item }),
        FlowEvent::IdentifierEntered { account_identifier } => {
            json!({ "event": name, "accountIdentifier": account_identifier })
        }
        FlowEvent::Resize { url } | FlowEvent::DropLink { url } | FlowEvent::NewWindow { url } => {
            json!({ "event": name, "url": url })
        }
        FlowEvent::Ready
        | FlowEvent::DialogShown
        | FlowEvent::DialogHidden
        | FlowEvent::ShowView
        | FlowEvent::ShowIncognito => json!({ "event": name }),
    }
}

/// Every optional handler registered, each one writing a transcript line.
fn transcript_capabilities(tx: &UnboundedSender<Value>) -> FlowCapabilities {
    let missing_info = tx.clone();
    let confirm_password = tx.clone();
    let no_password = tx.clone();
    let saml_api_used = tx.clone();
    let content_blocked = tx.clone();
    FlowCapabilities::new()
        .with_missing_info(move || {
            let _ = missing_info.send(json!({ "handler": "missingGaiaInfo" }));
        })
        .with_confirm_password(move |email, count| {
            let _ = confirm_password.send(
                json!({ "handler": "confirmPassword", "email": email, "scrapedCount": count }),
            );
        })
        .with_no_password(move |email| {
            let _ = no_password.send(json!({ "handler": "noPassword", "email": email }));
        })
        .with_saml_api_used(move || {
            let _ = saml_api_used.send(json!({ "handler": "samlApiUsed" }));
        })
        .with_content_blocked(move |url| {
            let _ = content_blocked.send(json!({ "handler": "insecureContentBlocked", "url": url }));
        })
}

struct Session {
    handle: FlowHandle,
    page: Arc<RecordingHostedPage>,
    scraper: Arc<ScriptedScraper>,
}

impl Session {
    async fn apply(&self, step: ReplayStep) -> Result<()> {
        let setup = match step.into_input() {
            Ok(input) => return self.handle.send(input),
            Err(setup) => setup,
        };

        self.handle.barrier().await?;
        match setup {
            ReplayStep::ScrapePassword { password } => self.scraper.add_scraped_password(&password),
            ReplayStep::ApiPassword { password } => self.scraper.set_api_password(&password),
            ReplayStep::AuthDomain { domain } => self.scraper.set_auth_domain(&domain),
            ReplayStep::PageUrl { url } => self.page.set_current_url(&url),
            ReplayStep::Wait { ms } => tokio::time::sleep(Duration::from_millis(ms)).await,
            other => bail!("step {other:?} is not a set-up step"),
        }
        Ok(())
    }
}

/// Run `steps` against a fresh runtime and return the transcript.
pub async fn run_replay(config: &AppConfig, steps: Vec<ReplayStep>) -> Result<Vec<Value>> {
    let (tx, rx) = mpsc::unbounded_channel();

    let page = Arc::new(RecordingHostedPage::new());
    let scraper = Arc::new(ScriptedScraper::new());
    let ports = FlowPorts {
        page: page.clone(),
        scraper: scraper.clone(),
        history: Arc::new(InMemoryHistory::new()),
        events: Arc::new(TranscriptSink { tx: tx.clone() }),
    };
    let directory = StaticPasswordlessDirectory::new(config.passwordless.accounts.clone())
        .with_latency(Duration::from_millis(config.passwordless.latency_ms));
    let capabilities = transcript_capabilities(&tx).with_passwordless_query(Arc::new(directory));
    let policy = DomainSuffixAllowList::new(config.flow.services_allowlist.clone());
    drop(tx);

    let controller = FlowController::new(ports, capabilities, Arc::new(policy), config.flow.clone());
    let (runtime, handle) = FlowRuntime::new(controller);
    let join = tokio::spawn(runtime.start());

    let session = Session {
        handle,
        page,
        scraper,
    };
    let step_count = steps.len();
    async {
        for (index, step) in steps.into_iter().enumerate() {
            debug!(index, "replay step");
            session.apply(step).await?;
        }
        // Pending lookups land and deferred confirmations run before shutdown.
        session.handle.settle().await?;
        session.handle.shutdown()
    }
    .instrument(info_span!("replay", steps = step_count))
    .await?;

    let controller = join.await.context("flow runtime panicked")?;
    info!(
        navigations = session.page.navigations().len(),
        cycle = controller.cycle(),
        "replay finished"
    );
    drop(controller);

    Ok(drain(rx))
}

fn drain(mut rx: UnboundedReceiver<Value>) -> Vec<Value> {
    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use af_core::IdentityPair;

    const SAML_SCRIPT: &str = r#"
# SAML sign-in with a single scraped password
{"step":"load","mode":"default","params":{}}
{"step":"scraper","event":{"type":"auth_page_loaded","is_saml_page":true}}
{"step":"scrape_password","password":"hunter2"}
{"step":"headers_received","url":"https://accounts.google.com/x","responseHeaders":[{"name":"google-accounts-signin","value":"email=\"a@x.com\", obfuscatedid=\"123\", sessionindex=0"}]}
{"step":"message","origin":"https://accounts.google.com","data":{"method":"userInfo","services":["gmail"]}}
"#;

    fn completed(transcript: &[Value]) -> Vec<&Value> {
        transcript
            .iter()
            .filter(|line| line["event"] == "completed")
            .collect()
    }

    #[test]
    fn parse_script_skips_comments_and_blank_lines() {
        let steps = parse_script(SAML_SCRIPT).unwrap();

        assert_eq!(steps.len(), 5);
        assert!(matches!(steps[0], ReplayStep::Load { mode: AuthMode::Default, .. }));
        assert!(matches!(steps[2], ReplayStep::ScrapePassword { .. }));
    }

    #[test]
    fn parse_script_reports_the_bad_line() {
        let err = parse_script("{\"step\":\"reload\"}\n\n{\"step\":\"fly\"}").unwrap_err();

        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn completed_event_hides_the_password() {
        let result = af_core::CompletionResult {
            email: "a@x.com".into(),
            gaia_id: "123".into(),
            password: SecretString::from("hunter2"),
            using_saml: true,
            choose_what_to_sync: false,
            skip_for_now: false,
            session_index: "0".into(),
            trusted: true,
            services: vec![],
        };

        let line = render_event(&FlowEvent::Completed(result));

        assert_eq!(line["result"]["hasPassword"], json!(true));
        assert!(!line.to_string().contains("hunter2"));
    }

    #[tokio::test]
    async fn saml_script_completes_with_scraped_password() {
        let steps = parse_script(SAML_SCRIPT).unwrap();

        let transcript = run_replay(&AppConfig::empty(), steps).await.unwrap();

        assert_eq!(transcript[0], json!({ "event": "ready" }));
        let completed = completed(&transcript);
        assert_eq!(completed.len(), 1);
        let result = &completed[0]["result"];
        assert_eq!(result["email"], "a@x.com");
        assert_eq!(result["gaiaId"], "123");
        assert_eq!(result["usingSAML"], true);
        assert_eq!(result["hasPassword"], true);
        assert_eq!(result["services"], json!(["gmail"]));
    }

    #[tokio::test(start_paused = true)]
    async fn configured_passwordless_account_completes_without_password() {
        let mut config = AppConfig::empty();
        config.passwordless.accounts = vec![IdentityPair::new("a@x.com", "123")];
        config.passwordless.latency_ms = 50;
        let steps = parse_script(SAML_SCRIPT).unwrap();

        let transcript = run_replay(&config, steps).await.unwrap();

        let completed = completed(&transcript);
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0]["result"]["hasPassword"], false);
    }

    #[tokio::test(start_paused = true)]
    async fn answer_for_replaced_identity_is_ignored() {
        let mut config = AppConfig::empty();
        config.passwordless.accounts = vec![IdentityPair::new("a@x.com", "123")];
        config.passwordless.latency_ms = 200;
        let mut steps = parse_script(SAML_SCRIPT).unwrap();
        steps.extend(
            parse_script(
                r#"
{"step":"wait","ms":10}
{"step":"headers_received","url":"https://accounts.google.com/y","responseHeaders":[{"name":"google-accounts-signin","value":"email=\"a@x.com\", obfuscatedid=\"999\", sessionindex=0"}]}
{"step":"load_committed"}
"#,
            )
            .unwrap(),
        );

        let transcript = run_replay(&config, steps).await.unwrap();

        let completed = completed(&transcript);
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0]["result"]["gaiaId"], "999");
        assert_eq!(completed[0]["result"]["hasPassword"], true);
    }

    #[tokio::test]
    async fn several_scraped_passwords_ask_the_host() {
        let mut steps = parse_script(SAML_SCRIPT).unwrap();
        steps.insert(3, ReplayStep::ScrapePassword { password: "other".into() });

        let transcript = run_replay(&AppConfig::empty(), steps).await.unwrap();

        assert!(completed(&transcript).is_empty());
        assert!(transcript.contains(
            &json!({ "handler": "confirmPassword", "email": "a@x.com", "scrapedCount": 2 })
        ));
    }
}
