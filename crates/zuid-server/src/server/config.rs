use anyhow::{Context, bail};
use clap::Parser;
use zuid::{MachineId, ZuidId};

/// Address used when neither `--bind` nor `BIND_ADDRESS` is given.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Port used when neither `--port` nor `PORT` is given.
pub const DEFAULT_PORT: u16 = 5656;

/// Default number of workers; one per value of the 3-bit worker field.
pub const DEFAULT_NUM_WORKERS: usize = ZuidId::MAX_WORKER_ID as usize + 1;

/// Default per-request limit on the number of identifiers.
pub const DEFAULT_MAX_IDS_PER_REQUEST: u64 = i32::MAX as u64;

/// Runtime configuration for the `zuid-server` binary.
///
/// Every value can be given as a CLI flag or an environment variable (which
/// may come from a `.env` file). Flags win over the environment.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "zuid-server",
    version,
    about = "A TCP service minting time-ordered 64-bit ids"
)]
pub struct CliArgs {
    /// Machine number embedded in every id, `0..=15`.
    ///
    /// Every server in a cluster must use a distinct value; nothing checks
    /// this.
    ///
    /// Environment variable: `MACHINE_ID`
    #[arg(short = 'm', long, env = "MACHINE_ID", allow_negative_numbers = true)]
    pub machine_id: i64,

    /// Address to listen on.
    ///
    /// Environment variable: `BIND_ADDRESS`
    #[arg(short = 'b', long = "bind", env = "BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// TCP port to listen on, `1..=65535`.
    ///
    /// Environment variable: `PORT`
    #[arg(short = 'p', long, env = "PORT", allow_negative_numbers = true)]
    pub port: Option<i64>,

    /// Number of worker tasks. Each gets a distinct worker id, so at most 8.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = DEFAULT_NUM_WORKERS)]
    pub num_workers: usize,

    /// Reset the sequence every millisecond and wait instead of wrapping.
    ///
    /// Without this flag a worker asked for more than 2048 ids within one
    /// millisecond can repeat an id.
    ///
    /// Environment variable: `STRICT_SEQUENCE`
    #[arg(long, env = "STRICT_SEQUENCE", default_value_t = false)]
    pub strict_sequence: bool,

    /// Largest count a single request may ask for. Larger requests are
    /// dropped without a reply.
    ///
    /// A reply is built in memory, so the default allows a single request to
    /// exhaust memory.
    ///
    /// Environment variable: `MAX_IDS_PER_REQUEST`
    #[arg(long, env = "MAX_IDS_PER_REQUEST", default_value_t = DEFAULT_MAX_IDS_PER_REQUEST)]
    pub max_ids_per_request: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub machine_id: MachineId,
    pub bind_address: String,
    pub port: u16,
    pub num_workers: usize,
    pub strict_sequence: bool,
    pub max_ids_per_request: u64,
    /// Whether `bind_address` came from [`DEFAULT_BIND_ADDRESS`].
    pub default_bind: bool,
    /// Whether `port` came from [`DEFAULT_PORT`].
    pub default_port: bool,
}

impl ServerConfig {
    /// A configuration with every optional setting at its default.
    pub fn new(machine_id: MachineId) -> Self {
        Self {
            machine_id,
            bind_address: DEFAULT_BIND_ADDRESS.to_owned(),
            port: DEFAULT_PORT,
            num_workers: DEFAULT_NUM_WORKERS,
            strict_sequence: false,
            max_ids_per_request: DEFAULT_MAX_IDS_PER_REQUEST,
            default_bind: true,
            default_port: true,
        }
    }

    /// The `host:port` string to bind, bracketing bare IPv6 hosts.
    pub fn server_addr(&self) -> String {
        if self.bind_address.contains(':') && !self.bind_address.starts_with('[') {
            format!("[{}]:{}", self.bind_address, self.port)
        } else {
            format!("{}:{}", self.bind_address, self.port)
        }
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let machine_id = MachineId::try_from(args.machine_id)
            .with_context(|| format!("invalid machine number: {}", args.machine_id))?;

        let (port, default_port) = match args.port {
            None => (DEFAULT_PORT, true),
            Some(port) => match u16::try_from(port) {
                Ok(port) if port > 0 => (port, false),
                _ => bail!("invalid port number: {port} (expected 1..=65535)"),
            },
        };

        let (bind_address, default_bind) = match args.bind_address {
            Some(address) if !address.is_empty() => (address, false),
            _ => (DEFAULT_BIND_ADDRESS.to_owned(), true),
        };

        if args.num_workers == 0 {
            bail!("NUM_WORKERS must be greater than 0");
        }

        if args.num_workers > DEFAULT_NUM_WORKERS {
            bail!(
                "NUM_WORKERS ({}) exceeds available worker ID space (max = {})",
                args.num_workers,
                DEFAULT_NUM_WORKERS
            );
        }

        if args.max_ids_per_request == 0 {
            bail!("MAX_IDS_PER_REQUEST must be greater than 0");
        }

        Ok(Self {
            machine_id,
            bind_address,
            port,
            num_workers: args.num_workers,
            strict_sequence: args.strict_sequence,
            max_ids_per_request: args.max_ids_per_request,
            default_bind,
            default_port,
        })
    }
}
