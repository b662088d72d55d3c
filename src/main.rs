use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use clusterwatch::{Config, Monitor};
use clusterwatch_adapters::discord::DiscordAdapter;
use clusterwatch_adapters::ssh::SshAdapter;

#[derive(Parser, Debug)]
#[command(name = "clusterwatch")]
#[command(about = "Check cluster reachability and update the status message in a chat channel")]
struct Args {
    /// Optional TOML file; environment variables take precedence over it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log the action that would be taken without writing to the channel
    #[arg(long)]
    dry_run: bool,

    /// Post to the debug channel instead of the production one
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(args.config.as_deref())
        .context("Failed to load configuration")?
        .with_overrides(args.dry_run, args.debug);

    let shell = SshAdapter::builder()
        .host(&config.cluster.host)
        .port(config.cluster.port)
        .credentials(&config.cluster.username, &config.cluster.password)
        .connect_timeout(config.cluster.connect_timeout)
        .host_key_fingerprint(config.cluster.host_key.clone())
        .build();

    let channel = DiscordAdapter::builder()
        .api_base(&config.discord.api_base)
        .token(&config.discord.token)
        .webhook_name(&config.discord.webhook_name)
        .timeout(config.discord.timeout)
        .build()
        .context("Failed to create Discord client")?;

    info!(
        host = %config.cluster.host,
        channel_id = config.discord.active_channel(),
        debug = config.discord.debug,
        dry_run = config.discord.dry_run,
        "Starting status check"
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let monitor = Monitor::new(config, shell, channel);
    match rt.block_on(monitor.run_once()) {
        Ok(outcome) => {
            info!(
                state = %outcome.state,
                action = %outcome.action,
                message_id = outcome.message_id.as_deref().unwrap_or("-"),
                "Status check complete"
            );
            Ok(())
        }
        Err(e) => {
            error!("Status check failed: {}", e);
            Err(e.into())
        }
    }
}
