//! Loading configuration from a TOML file.

use std::io::Write;
use std::time::Duration;

use clusterwatch::{ClusterState, Config, ConfigError};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_from_file() {
    let file = write_config(
        r#"
        cluster_host = "login.hpc.example.org"
        cluster_port = 2222
        cluster_user = "monitor"
        cluster_password = "secret"
        cluster_connect_retries = 2
        discord_bot_token = "token"
        discord_bot_channel_id = "100"
        discord_bot_debug_channel_id = "200"
        discord_bot_retry_delay = 5
        discord_channel_topic_off = "cluster unreachable"
        discord_rename_channel = false
        timezone = "Europe/London"
        "#,
    );

    let config = Config::load(Some(file.path())).unwrap();

    assert_eq!(config.cluster.host, "login.hpc.example.org");
    assert_eq!(config.cluster.port, 2222);
    assert_eq!(config.cluster.connect_policy().attempts, 2);
    assert_eq!(config.discord.retry_delay, Duration::from_secs(5));
    assert_eq!(config.discord.retry_policy().delay_after(2), Duration::from_secs(10));
    assert_eq!(config.discord.active_channel(), "100");
    assert!(!config.display.rename_channel);
    assert_eq!(
        config.display.topic(ClusterState::Offline),
        Some("cluster unreachable")
    );
    assert_eq!(config.display.timezone, chrono_tz::Europe::London);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}

#[test]
fn test_incomplete_file_names_missing_key() {
    let file = write_config(
        r#"
        cluster_host = "login"
        cluster_user = "monitor"
        cluster_password = "secret"
        discord_bot_token = "token"
        discord_bot_channel_id = "100"
        "#,
    );

    let err = Config::load(Some(file.path())).unwrap_err();
    assert_eq!(
        err.to_string(),
        "missing required setting: DISCORD_BOT_DEBUG_CHANNEL_ID"
    );
}
