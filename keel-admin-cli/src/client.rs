use anyhow::Context;
use clap::Args;
use keel_admin::{parse_name_servers, AdminConfig, AdminService, NAME_SERVERS_ENV};
use std::env;
use std::path::PathBuf;

/// YAML configuration file used when `--config` is not given.
pub(crate) const CONFIG_ENV: &str = "KEEL_ADMIN_CONFIG";

const DEFAULT_NAME_SERVER: &str = "127.0.0.1:9493";

#[derive(Debug, Args)]
pub(crate) struct ConnectArgs {
    #[arg(long, global = true, help = "Path to the admin YAML configuration")]
    config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Comma separated name servers (host:port), overrides the configuration"
    )]
    name_servers: Option<String>,
}

pub(crate) fn load_config(args: &ConnectArgs) -> anyhow::Result<AdminConfig> {
    let config_path = args
        .config
        .clone()
        .or_else(|| env::var(CONFIG_ENV).ok().map(PathBuf::from));

    let mut config = match config_path {
        Some(path) => AdminConfig::load(&path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => {
            let list = env::var(NAME_SERVERS_ENV).unwrap_or_else(|_| DEFAULT_NAME_SERVER.to_string());
            AdminConfig::new(parse_name_servers(&list)?)
        }
    };

    if let Some(list) = &args.name_servers {
        config.name_servers = parse_name_servers(list)?;
    }
    config.validate()?;
    Ok(config)
}

/// Builds the service and connects it to the name servers.
pub(crate) async fn connect(config: AdminConfig) -> AdminService {
    let service = AdminService::from_config(config);
    service.start().await;
    service
}
