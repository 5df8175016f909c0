use std::path::PathBuf;

use serde_json::{json, Value};

use authflow_lib::{load_config, parse_script, run_replay};

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

async fn replay(script: &str) -> Vec<Value> {
    let config = load_config(demo("authflow.toml")).unwrap();
    let script = std::fs::read_to_string(demo(script)).unwrap();
    run_replay(&config, parse_script(&script).unwrap())
        .await
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn passwordless_demo_completes_without_password() {
    let transcript = replay("passwordless.jsonl").await;

    assert_eq!(transcript.first(), Some(&json!({ "event": "ready" })));
    let last = transcript.last().unwrap();
    assert_eq!(last["event"], "completed");
    assert_eq!(last["result"]["email"], "kiosk@corp.example");
    assert_eq!(last["result"]["sessionIndex"], "1");
    assert_eq!(last["result"]["hasPassword"], false);
    assert_eq!(last["result"]["services"], json!([]));
}

#[tokio::test(start_paused = true)]
async fn confirm_demo_reasks_then_completes() {
    let transcript = replay("saml_confirm.jsonl").await;

    let asked = json!({
        "handler": "confirmPassword",
        "email": "ada@corp.example",
        "scrapedCount": 2
    });
    assert_eq!(transcript.iter().filter(|line| **line == asked).count(), 2);
    let completed: Vec<_> = transcript
        .iter()
        .filter(|line| line["event"] == "completed")
        .collect();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0]["result"]["hasPassword"], true);
    assert_eq!(completed[0]["result"]["usingSAML"], true);
}
