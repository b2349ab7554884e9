use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use declarative::Intent;
use fusionkit::EndpointType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fusionctl")]
#[command(version)]
#[command(about = "Reconcile Fusion volumes and storage endpoints with a declared state", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/fusionctl/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Fusion API host
    #[arg(long, global = true, env = "FUSION_API_HOST")]
    pub api_host: Option<String>,

    /// Access token for the Fusion API
    #[arg(long, global = true, env = "FUSION_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Report what would change without changing anything
    #[arg(long, global = true)]
    pub check: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage a volume
    Volume(VolumeArgs),

    /// Manage a storage endpoint
    #[command(name = "storage-endpoint", alias = "se")]
    StorageEndpoint(StorageEndpointArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum State {
    #[default]
    Present,
    Absent,
}

impl From<State> for Intent {
    fn from(state: State) -> Self {
        match state {
            State::Present => Intent::Present,
            State::Absent => Intent::Absent,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum EndpointKind {
    #[default]
    Iscsi,
}

impl From<EndpointKind> for EndpointType {
    fn from(kind: EndpointKind) -> Self {
        match kind {
            EndpointKind::Iscsi => EndpointType::Iscsi,
        }
    }
}

// ============================================================================
// Volume
// ============================================================================

#[derive(Debug, Args)]
pub struct VolumeArgs {
    /// Volume name
    #[arg(short, long)]
    pub name: String,

    /// Tenant the volume belongs to
    #[arg(long)]
    pub tenant: String,

    /// Tenant space the volume belongs to
    #[arg(long)]
    pub tenant_space: String,

    /// Human-readable name (defaults to the name on create)
    #[arg(long)]
    pub display_name: Option<String>,

    /// New name for an existing volume
    #[arg(long)]
    pub rename: Option<String>,

    /// Size with an optional K, M, G, T or P suffix (base 1024)
    #[arg(short, long)]
    pub size: Option<String>,

    /// Storage class
    #[arg(long)]
    pub storage_class: Option<String>,

    /// Placement group
    #[arg(long)]
    pub placement_group: Option<String>,

    /// Protection policy
    #[arg(long)]
    pub protection_policy: Option<String>,

    /// Host access policies to add (present) or remove (absent), comma-separated
    #[arg(long, value_delimiter = ',')]
    pub host_access_policies: Vec<String>,

    /// Eradicate the volume on delete instead of leaving it in the trash
    #[arg(long)]
    pub eradicate: bool,

    /// Whether the volume should exist
    #[arg(long, value_enum, default_value_t = State::Present)]
    pub state: State,
}

// ============================================================================
// Storage Endpoint
// ============================================================================

#[derive(Debug, Args)]
pub struct StorageEndpointArgs {
    /// Storage endpoint name
    #[arg(short, long)]
    pub name: String,

    /// Region
    #[arg(long)]
    pub region: String,

    /// Availability zone within the region
    #[arg(long, visible_alias = "az")]
    pub availability_zone: String,

    /// Human-readable name (defaults to the name on create)
    #[arg(long)]
    pub display_name: Option<String>,

    /// Endpoint type
    #[arg(long, value_enum, default_value_t = EndpointKind::Iscsi)]
    pub endpoint_type: EndpointKind,

    /// Network interface groups, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub network_interface_groups: Vec<String>,

    /// Interface addresses in CIDR notation, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub addresses: Vec<String>,

    /// Subnet gateway address
    #[arg(long)]
    pub gateway: Option<String>,

    /// Whether the endpoint should exist
    #[arg(long, value_enum, default_value_t = State::Present)]
    pub state: State,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_volume() {
        let cli = Cli::try_parse_from([
            "fusionctl",
            "volume",
            "--name",
            "db01",
            "--tenant",
            "acme",
            "--tenant-space",
            "prod",
            "--size",
            "10G",
            "--host-access-policies",
            "h1,h2",
            "--state",
            "absent",
            "--check",
        ])
        .unwrap();

        assert!(cli.check);
        match cli.command {
            Command::Volume(args) => {
                assert_eq!(args.name, "db01");
                assert_eq!(args.size.as_deref(), Some("10G"));
                assert_eq!(args.host_access_policies, vec!["h1", "h2"]);
                assert_eq!(args.state, State::Absent);
            }
            _ => panic!("Expected volume command"),
        }
    }

    #[test]
    fn test_parse_storage_endpoint_alias() {
        let cli = Cli::try_parse_from([
            "fusionctl",
            "--output",
            "json",
            "se",
            "--name",
            "se1",
            "--region",
            "us-west",
            "--az",
            "az1",
            "--addresses",
            "10.0.0.5/24,10.0.1.5/24",
        ])
        .unwrap();

        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Command::StorageEndpoint(args) => {
                assert_eq!(args.availability_zone, "az1");
                assert_eq!(args.addresses.len(), 2);
                assert_eq!(args.endpoint_type, EndpointKind::Iscsi);
                assert_eq!(args.state, State::Present);
            }
            _ => panic!("Expected storage-endpoint command"),
        }
    }

    #[test]
    fn test_volume_requires_scope() {
        let result = Cli::try_parse_from(["fusionctl", "volume", "--name", "db01"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_state() {
        let result = Cli::try_parse_from([
            "fusionctl",
            "se",
            "--name",
            "se1",
            "--region",
            "r",
            "--az",
            "z",
            "--state",
            "gone",
        ]);
        assert!(result.is_err());
    }
}
