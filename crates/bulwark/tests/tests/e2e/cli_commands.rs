//! End-to-end test: the `bulwark` command surface against on-disk state.

use std::path::{Path, PathBuf};

use bulwark_cli::{run_with_args, CliError, Outcome};
use bulwark_tests::{photo_baseline, photo_id_removed, POLICY_YAML};
use bulwark_types::Patch;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("policy.yaml"), POLICY_YAML).unwrap();
        std::fs::write(dir.path().join("bulwark.toml"), "deadline_ms = 2000\n").unwrap();
        std::fs::create_dir_all(dir.path().join("baselines")).unwrap();
        std::fs::write(
            dir.path().join("baselines/photos.json"),
            serde_json::to_string_pretty(&photo_baseline()).unwrap(),
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write_json<T: serde::Serialize>(&self, name: &str, value: &T) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        path
    }

    async fn run(&self, args: &[&str]) -> Result<Outcome, CliError> {
        let root = self.dir.path();
        let mut argv: Vec<String> = vec!["bulwark".into()];
        argv.extend(args.iter().map(|a| a.to_string()));
        argv.extend([
            "--config".into(),
            display(&root.join("bulwark.toml")),
            "--policy".into(),
            display(&root.join("policy.yaml")),
            "--state-dir".into(),
            display(&root.join("state")),
            "--baselines".into(),
            display(&root.join("baselines")),
        ]);
        run_with_args(argv).await
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn policy_commands() {
    let ws = Workspace::new();
    assert_eq!(ws.run(&["validate-policy"]).await.unwrap(), Outcome::Passed);
    assert_eq!(
        ws.run(&["get-policy-value", "risk.budget.max"]).await.unwrap(),
        Outcome::Passed
    );
    assert_eq!(
        ws.run(&["get-policy-value", "risk.nope"]).await.unwrap(),
        Outcome::Blocked
    );
    assert!(matches!(
        ws.run(&["run-invariant-check", "--baseline", "photos", "--current", "missing.json"])
            .await,
        Err(CliError::Io(_))
    ));

    std::fs::write(ws.path("policy.yaml"), POLICY_YAML.replace("bob: [security]", "bob: [root]"))
        .unwrap();
    assert_eq!(ws.run(&["validate-policy"]).await.unwrap(), Outcome::Blocked);
}

#[tokio::test]
async fn check_risk_blocks_constitutional_paths() {
    let ws = Workspace::new();
    assert_eq!(
        ws.run(&["check-risk", "src/photos/list.rs", "--insertions", "12"])
            .await
            .unwrap(),
        Outcome::Passed
    );
    assert_eq!(
        ws.run(&["check-risk", "db/migrations/0003_drop.sql"])
            .await
            .unwrap(),
        Outcome::Blocked
    );
    // Scoring alone leaves the ledger untouched.
    assert!(!ws.path("state/risk-ledger.json").exists());
}

#[tokio::test]
async fn suspend_trigger_status_unlock() {
    let ws = Workspace::new();
    assert_eq!(ws.run(&["suspend", "status"]).await.unwrap(), Outcome::Passed);

    assert_eq!(
        ws.run(&["suspend", "trigger", "--reason", "freeze", "--actor", "alice"])
            .await
            .unwrap(),
        Outcome::Passed
    );
    assert_eq!(ws.run(&["suspend", "status"]).await.unwrap(), Outcome::Blocked);

    // Refusals are answers, not failures.
    assert_eq!(
        ws.run(&["suspend", "unlock", "--actor", "dave"]).await.unwrap(),
        Outcome::Blocked
    );
    assert_eq!(ws.run(&["suspend", "status"]).await.unwrap(), Outcome::Blocked);

    assert_eq!(
        ws.run(&["suspend", "unlock", "--actor", "bob", "--note", "done"])
            .await
            .unwrap(),
        Outcome::Passed
    );
    assert_eq!(ws.run(&["suspend", "status"]).await.unwrap(), Outcome::Passed);

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(ws.path("state/suspend.json")).unwrap())
            .unwrap();
    assert_eq!(doc["value"]["history"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn signals_trip_the_suspend() {
    let ws = Workspace::new();
    for expected in [Outcome::Passed, Outcome::Passed, Outcome::Blocked] {
        assert_eq!(ws.run(&["simulate", "--failed"]).await.unwrap(), expected);
    }

    let other = Workspace::new();
    assert_eq!(other.run(&["health", "95"]).await.unwrap(), Outcome::Passed);
    assert_eq!(other.run(&["health", "42"]).await.unwrap(), Outcome::Blocked);
}

#[tokio::test]
async fn invariant_check_and_evaluate() {
    let ws = Workspace::new();
    let current = ws.write_json("current.json", &photo_id_removed());

    assert_eq!(
        ws.run(&[
            "run-invariant-check",
            "--baseline",
            "photos",
            "--current",
            &display(&current),
            "--dry-run",
        ])
        .await
        .unwrap(),
        Outcome::Blocked
    );
    // Dry runs do not feed the suspend manager.
    assert_eq!(ws.run(&["suspend", "status"]).await.unwrap(), Outcome::Passed);

    let patch = ws.write_json(
        "patch.json",
        &Patch::new(["src/photos/caption.rs"]).with_projected(photo_baseline()),
    );
    assert_eq!(
        ws.run(&["evaluate", "--baseline", "photos", "--patch", &display(&patch)])
            .await
            .unwrap(),
        Outcome::Passed
    );

    let breaking = ws.write_json(
        "breaking.json",
        &Patch::new(["src/photos/upload.rs"]).with_projected(photo_id_removed()),
    );
    assert_eq!(
        ws.run(&["evaluate", "--baseline", "photos", "--patch", &display(&breaking)])
            .await
            .unwrap(),
        Outcome::Blocked
    );
    assert_eq!(ws.run(&["suspend", "status"]).await.unwrap(), Outcome::Blocked);
}

#[tokio::test]
async fn whitelist_and_baseline_commands() {
    let ws = Workspace::new();
    assert_eq!(
        ws.run(&["whitelist", "check", "config_typo", "--tier", "A"])
            .await
            .unwrap(),
        Outcome::Blocked
    );
    assert_eq!(
        ws.run(&["whitelist", "check", "config_typo", "--tier", "B"])
            .await
            .unwrap(),
        Outcome::Passed
    );
    assert_eq!(
        ws.run(&["whitelist", "approve", "feature_flag_rollback", "--actor", "carol"])
            .await
            .unwrap(),
        Outcome::Passed
    );
    assert_eq!(
        ws.run(&["whitelist", "check", "feature_flag_rollback", "--tier", "C"])
            .await
            .unwrap(),
        Outcome::Passed
    );

    let snapshot = ws.write_json("next.json", &photo_baseline());
    assert_eq!(
        ws.run(&[
            "baseline", "promote", "photos-v2", "--snapshot", &display(&snapshot), "--actor",
            "bob",
        ])
        .await
        .unwrap(),
        Outcome::Blocked
    );
    assert_eq!(
        ws.run(&[
            "baseline", "promote", "photos-v2", "--snapshot", &display(&snapshot), "--actor",
            "carol",
        ])
        .await
        .unwrap(),
        Outcome::Passed
    );
    assert!(ws.path("baselines/photos-v2.json").exists());
}
