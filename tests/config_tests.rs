use clap::Parser;
use notemeter::engine::arg_parser::Cli;
use std::fs;
use std::path::{Path, PathBuf};

fn cli(config: &Path, extra: &[&str]) -> Cli {
    let mut args = vec![
        "notemeter".to_string(),
        "--config".to_string(),
        config.display().to_string(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));
    Cli::parse_from(args)
}

#[test]
fn test_defaults_without_config_file() {
    let tmp = tempfile::tempdir().unwrap();
    let settings = cli(&tmp.path().join("absent.yaml"), &["--vault-path", "/v"])
        .settings()
        .unwrap();
    assert_eq!(settings.vault_path, Some(PathBuf::from("/v")));
    assert_eq!(settings.metrics_port, 8080);
    assert!(!settings.start_metrics_server);
    assert!(settings.output_file.ends_with("obsidian_logs.json"));
    assert_eq!(settings.log_level, "info");
    assert_eq!(settings.scan_interval_secs, None);
}

#[test]
fn test_missing_vault_path_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let err = cli(&tmp.path().join("absent.yaml"), &[]).settings().unwrap_err();
    assert!(err.to_string().contains("Vault path must be specified"));
}

#[test]
fn test_yaml_config_applies() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.yaml");
    fs::write(
        &path,
        "vault_path: /notes\nmetrics_port: 9100\nexclude:\n  - templates\n  - \"*.excalidraw.md\"\nlog_level: DEBUG\n",
    )
    .unwrap();
    let settings = cli(&path, &[]).settings().unwrap();
    assert_eq!(settings.vault_path, Some(PathBuf::from("/notes")));
    assert_eq!(settings.metrics_port, 9100);
    assert_eq!(settings.exclude, ["templates", "*.excalidraw.md"]);
    assert_eq!(settings.log_level, "DEBUG");
}

#[test]
fn test_toml_config_by_extension() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("notemeter.toml");
    fs::write(
        &path,
        "vault_path = \"/notes\"\nstart_metrics_server = true\nscan_interval = 30\n",
    )
    .unwrap();
    let settings = cli(&path, &[]).settings().unwrap();
    assert!(settings.start_metrics_server);
    assert_eq!(settings.scan_interval_secs, Some(30));
}

#[test]
fn test_flags_override_config_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.yaml");
    fs::write(
        &path,
        "vault_path: /from-file\nmetrics_port: 9100\noutput_file: /tmp/file.json\nexclude: [a]\n",
    )
    .unwrap();
    let settings = cli(
        &path,
        &[
            "--vault-path",
            "/from-flag",
            "--metrics-port",
            "9200",
            "--metrics",
            "-e",
            "b",
            "c",
        ],
    )
    .settings()
    .unwrap();
    assert_eq!(settings.vault_path, Some(PathBuf::from("/from-flag")));
    assert_eq!(settings.metrics_port, 9200);
    assert!(settings.start_metrics_server);
    assert_eq!(settings.exclude, ["b", "c"]);
    assert_eq!(settings.output_file, PathBuf::from("/tmp/file.json"));
}

#[test]
fn test_malformed_config_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.yaml");
    fs::write(&path, "metrics_port: [not, a, port]\n").unwrap();
    assert!(cli(&path, &["--vault-path", "/v"]).settings().is_err());
}

#[test]
fn test_empty_config_file_is_fine() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.yaml");
    fs::write(&path, "\n").unwrap();
    let settings = cli(&path, &["--vault-path", "/v"]).settings().unwrap();
    assert_eq!(settings.metrics_port, 8080);
}
