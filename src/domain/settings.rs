use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use regex::Regex;

use crate::api::settings_dto::{AnsibleDto, CommandsDto, PlaybooksDto, SettingsDto, SshDto};
use crate::domain::hostname::HostnameAllocator;
use crate::domain::node::Node;
use crate::domain::release::ReleaseVersion;
use crate::error::{Error, Result};
use crate::loader::parser::parse_config_file;

/// Names accepted for the join token group of the join pattern.
pub const JOIN_TOKEN_GROUPS: [&str; 2] = ["token", "token_first"];
/// Names accepted for the optional API endpoint group of the join pattern.
pub const JOIN_ENDPOINT_GROUPS: [&str; 2] = ["endpoint", "endpoint_last"];
pub const JOIN_HASH_GROUP: &str = "hash";

/// What the workflow does with nodes that failed the liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LivenessPolicy {
    /// Flag unreachable nodes in the report and keep them in every later step.
    #[default]
    Report,
    /// Leave unreachable nodes out of every later step. An unreachable master is fatal.
    Exclude,
}

impl LivenessPolicy {
    /// Nodes that were never probed are admitted.
    pub fn admits(&self, node: &Node) -> bool {
        match self {
            LivenessPolicy::Report => true,
            LivenessPolicy::Exclude => node.alive != Some(false),
        }
    }
}

impl FromStr for LivenessPolicy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "report" => Ok(LivenessPolicy::Report),
            "exclude" => Ok(LivenessPolicy::Exclude),
            other => Err(Error::ConfigError(format!("unknown liveness policy '{}'", other))),
        }
    }
}

/// Validated run settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub hostnames: HostnameAllocator,
    pub minimum_os_release: ReleaseVersion,
    pub pool_size: usize,
    pub remote_timeout: Duration,
    pub liveness_policy: LivenessPolicy,
    pub kubeconfig_path: PathBuf,
    pub remote_kubeconfig_path: String,
    pub api_server_port: u16,
    pub join_pattern: Regex,
    pub ssh: SshDto,
    pub ansible: AnsibleDto,
    pub commands: CommandsDto,
    pub playbooks: PlaybooksDto,
}

impl Settings {
    /// Reads a settings file, or falls back to defaults when `file_path` is `None`.
    pub fn load_dto(file_path: Option<&Path>) -> Result<SettingsDto> {
        match file_path {
            Some(path) => {
                let dto: SettingsDto = parse_config_file(path)?;
                log::info!("Loaded settings from '{}'.", path.display());
                Ok(dto)
            }
            None => Ok(SettingsDto::default()),
        }
    }
}

impl TryFrom<SettingsDto> for Settings {
    type Error = Error;

    fn try_from(dto: SettingsDto) -> Result<Self> {
        if dto.pool_size == 0 {
            return Err(Error::ConfigError("pool_size must be at least 1".to_string()));
        }
        if dto.remote_timeout_secs == 0 {
            return Err(Error::ConfigError("remote_timeout_secs must be at least 1".to_string()));
        }

        let hostnames = HostnameAllocator::new(dto.master_hostname, dto.worker_hostname, dto.worker_hostname_pattern.as_deref())?;

        let minimum_os_release = dto
            .minimum_os_release
            .parse::<ReleaseVersion>()
            .map_err(|e| Error::ConfigError(format!("minimum_os_release: {}", e)))?;

        let join_pattern = Regex::new(&dto.commands.join_pattern)
            .map_err(|e| Error::ConfigError(format!("invalid join_pattern: {}", e)))?;
        let group_names: Vec<&str> = join_pattern.capture_names().flatten().collect();
        if let Some(unknown) = group_names
            .iter()
            .copied()
            .find(|name| !JOIN_TOKEN_GROUPS.contains(name) && !JOIN_ENDPOINT_GROUPS.contains(name) && *name != JOIN_HASH_GROUP)
        {
            return Err(Error::ConfigError(format!("join_pattern has unknown group '{}'", unknown)));
        }
        let has_token = group_names.iter().any(|name| JOIN_TOKEN_GROUPS.contains(name));
        if !has_token || !group_names.contains(&JOIN_HASH_GROUP) {
            return Err(Error::ConfigError("join_pattern needs named groups 'token' (or 'token_first') and 'hash'".to_string()));
        }

        Ok(Settings {
            hostnames,
            minimum_os_release,
            pool_size: dto.pool_size,
            remote_timeout: Duration::from_secs(dto.remote_timeout_secs),
            liveness_policy: dto.liveness_policy.parse()?,
            kubeconfig_path: PathBuf::from(dto.kubeconfig_path),
            remote_kubeconfig_path: dto.remote_kubeconfig_path,
            api_server_port: dto.api_server_port,
            join_pattern,
            ssh: dto.ssh,
            ansible: dto.ansible,
            commands: dto.commands,
            playbooks: dto.playbooks,
        })
    }
}
