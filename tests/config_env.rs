//! Loading configuration from environment variables.
//!
//! The environment is process-wide, so every test holds `ENV_LOCK` while its
//! variables are set and removes them again on drop.

use std::io::Write;

use parking_lot::Mutex;

use clusterwatch::Config;

static ENV_LOCK: Mutex<()> = Mutex::new(());

struct EnvVars {
    keys: Vec<&'static str>,
}

impl EnvVars {
    fn set(vars: &[(&'static str, &str)]) -> Self {
        for (key, value) in vars {
            std::env::set_var(key, value);
        }
        Self {
            keys: vars.iter().map(|(key, _)| *key).collect(),
        }
    }
}

impl Drop for EnvVars {
    fn drop(&mut self) {
        for key in &self.keys {
            std::env::remove_var(key);
        }
    }
}

const REQUIRED: &[(&str, &str)] = &[
    ("CLUSTER_HOST", "login.hpc.example.org"),
    ("CLUSTER_USER", "monitor"),
    ("CLUSTER_PASSWORD", "secret"),
    ("DISCORD_BOT_TOKEN", "token"),
    ("DISCORD_BOT_CHANNEL_ID", "123456789012345678"),
    ("DISCORD_BOT_DEBUG_CHANNEL_ID", "876543210987654321"),
];

#[test]
fn test_environment_values_are_coerced() {
    let _lock = ENV_LOCK.lock();
    let mut vars = REQUIRED.to_vec();
    vars.extend([
        ("CLUSTER_PORT", "2222"),
        ("DISCORD_BOT_DEBUG", "true"),
        ("DISCORD_MSG_INFO", "False"),
    ]);
    let _env = EnvVars::set(&vars);

    let config = Config::load(None).unwrap();

    assert_eq!(config.cluster.port, 2222);
    assert!(config.discord.debug);
    assert_eq!(config.discord.active_channel(), "876543210987654321");
    assert_eq!(config.discord.channel_id, "123456789012345678");
    assert!(!config.display.append_info);
}

#[test]
fn test_environment_overrides_file() {
    let _lock = ENV_LOCK.lock();
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(
        br#"
        cluster_host = "from-file"
        cluster_port = 2200
        cluster_user = "file-user"
        "#,
    )
    .unwrap();
    let _env = EnvVars::set(REQUIRED);

    let config = Config::load(Some(file.path())).unwrap();

    assert_eq!(config.cluster.host, "login.hpc.example.org");
    assert_eq!(config.cluster.username, "monitor");
    assert_eq!(config.cluster.port, 2200);
}
