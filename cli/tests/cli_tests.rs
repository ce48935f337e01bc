use clap::Parser;
use clustergate_cli::{execute, resolve_config, Args, Command, LegacyCommand};
use clustergate_crypto::{encrypt_string, pack_token};
use clustergate_license::LicenseToken;
use pretty_assertions::assert_eq;
use std::path::Path;

fn args(dir: &Path, rest: &[&str]) -> Args {
    let store = dir.join("config");
    let db = dir.join("legacy.db");
    let mut argv = vec![
        "clustergate".to_string(),
        "--store-dir".to_string(),
        store.display().to_string(),
        "--legacy-db".to_string(),
        db.display().to_string(),
        "--cluster-id".to_string(),
        "cluster-cli".to_string(),
    ];
    argv.extend(rest.iter().map(|s| s.to_string()));
    Args::try_parse_from(argv).unwrap()
}

#[test]
fn parses_subcommands() {
    let parsed = Args::try_parse_from([
        "clustergate",
        "activate",
        "--code",
        "abc",
        "--enterprise",
        "ent-1",
    ])
    .unwrap();
    assert_eq!(
        parsed.command,
        Command::Activate {
            code: "abc".to_string(),
            enterprise: "ent-1".to_string(),
        }
    );

    let parsed = Args::try_parse_from(["clustergate", "-v", "legacy", "issue-token"]).unwrap();
    assert!(parsed.verbose);
    assert_eq!(parsed.command, Command::Legacy(LegacyCommand::IssueToken));

    assert!(Args::try_parse_from(["clustergate", "activate", "--code", "abc"]).is_err());
}

#[test]
fn flags_override_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clustergate.json");
    std::fs::write(&path, r#"{"namespace":"ops","cluster_id":"from-file"}"#).unwrap();

    let parsed = Args::try_parse_from([
        "clustergate",
        "--config",
        path.to_str().unwrap(),
        "--cluster-id",
        "from-flag",
        "status",
    ])
    .unwrap();
    let config = resolve_config(&parsed).unwrap();
    assert_eq!(config.namespace, "ops");
    assert_eq!(config.cluster_id.as_deref(), Some("from-flag"));
}

#[test]
fn missing_config_file_is_an_error() {
    let parsed =
        Args::try_parse_from(["clustergate", "--config", "/nonexistent/cg.json", "status"]).unwrap();
    let err = resolve_config(&parsed).unwrap_err();
    assert!(err.to_string().contains("Failed to load config"));
}

#[test]
fn status_without_license() {
    let dir = tempfile::tempdir().unwrap();
    let report = execute(&args(dir.path(), &["status"])).unwrap();
    assert!(!report.ok);
    assert_eq!(report.body["reason"], "no license configured");
}

#[test]
fn activate_rejects_foreign_signature() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = "eyJjb2RlIjoiWCIsImNvbXBhbnkiOiJZIiwiZW50ZXJwcmlzZV9pZCI6ImUiLCJzdGFydF9hdCI6MCwiZXhwaXJlX2F0Ijo0MTAyNDQ0ODAwLCJzaWduYXR1cmUiOiIifQ==";
    let report = execute(&args(dir.path(), &["activate", "--code", artifact, "--enterprise", "e"]))
        .unwrap();
    assert!(!report.ok);
    assert_eq!(report.body["reason"], "invalid signature");

    let report = execute(&args(dir.path(), &["status"])).unwrap();
    assert_eq!(report.body["reason"], "no license configured");
}

#[test]
fn inspect_reports_fields_and_signature() {
    // {"code":"X","company":"Y","enterprise_id":"e","start_at":0,"expire_at":4102444800,"signature":""}
    let artifact = "eyJjb2RlIjoiWCIsImNvbXBhbnkiOiJZIiwiZW50ZXJwcmlzZV9pZCI6ImUiLCJzdGFydF9hdCI6MCwiZXhwaXJlX2F0Ijo0MTAyNDQ0ODAwLCJzaWduYXR1cmUiOiIifQ==";
    let parsed = Args::try_parse_from(["clustergate", "inspect", artifact]).unwrap();
    let report = execute(&parsed).unwrap();
    assert!(!report.ok);
    assert_eq!(report.body["token"]["code"], "X");
    assert_eq!(report.body["token"]["enterprise_id"], "e");
    assert!(report.body["signature"].as_str().unwrap().contains("malformed"));
}

#[test]
fn inspect_reports_signature_mismatch() {
    let zero_signature = "A".repeat(86) + "==";
    let json = format!(
        r#"{{"code":"X","company":"Y","enterprise_id":"e","start_at":0,"expire_at":4102444800,"signature":"{zero_signature}"}}"#
    );
    let artifact = serde_json::from_str::<LicenseToken>(&json)
        .unwrap()
        .to_artifact();

    let parsed = Args::try_parse_from(["clustergate", "inspect", artifact.as_str()]).unwrap();
    let report = execute(&parsed).unwrap();
    assert!(!report.ok);
    assert_eq!(report.body["signature"], "signature does not match");
}

#[test]
fn inspect_rejects_garbage() {
    let parsed = Args::try_parse_from(["clustergate", "inspect", "%%%"]).unwrap();
    assert!(execute(&parsed).is_err());
}

#[test]
fn legacy_store_then_list() {
    let dir = tempfile::tempdir().unwrap();
    let token = "client-token";
    let sealed = encrypt_string(
        &pack_token(token),
        r#"{"code":"L-9","company":"Legacy Co","node":4}"#,
    )
    .unwrap();

    let report = execute(&args(
        dir.path(),
        &["legacy", "store", "--token", token, "--license", &sealed],
    ))
    .unwrap();
    assert!(report.ok);

    let report = execute(&args(dir.path(), &["legacy", "list"])).unwrap();
    assert!(report.ok);
    assert_eq!(report.body[token]["company"], "Legacy Co");
    assert_eq!(report.body[token]["node"], 4);
}

#[test]
fn issue_token_needs_no_stores() {
    let parsed = Args::try_parse_from(["clustergate", "legacy", "issue-token"]).unwrap();
    let report = execute(&parsed).unwrap();
    assert_eq!(report.body["token"].as_str().unwrap().len(), 32);
}
