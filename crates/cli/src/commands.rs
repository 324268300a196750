//! Subcommands.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use bootstrap::{bootstrap_tokens, BootstrapConfig, CheckTokenEndpoint};
use clap::{Args, Subcommand};
use corelib::{
    Endpoint, MembershipView, Murmur3Token, RingBuilder, StaticMembership, TokenMetadata,
    TokenRange,
};
use replication::{ReplicationStrategy, SimpleStrategy};
use streaming::{
    FailureDetectorSourceFilter, MemoryTransport, RangePlan, RangeStreamer, StreamReason,
};
use tracing::debug;

/// Keyspace name used for `plan` previews.
const PREVIEW_KEYSPACE: &str = "preview";

/// Token selection inputs shared by every subcommand.
#[derive(Debug, Args)]
pub struct TokenArgs {
    /// JSON bootstrap config (`initial_token`, `num_tokens`, ...)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Explicit tokens, separated by commas and/or whitespace
    #[arg(long)]
    pub initial_token: Option<String>,

    /// Number of random tokens when no explicit tokens are given
    #[arg(long, allow_hyphen_values = true)]
    pub num_tokens: Option<i64>,

    /// JSON ring file: {"<address>": ["<token>", ...], ...}
    #[arg(long)]
    pub ring: Option<PathBuf>,

    /// Accept tokens that existing nodes already own
    #[arg(long)]
    pub no_collision_check: bool,
}

impl TokenArgs {
    fn bootstrap_config(&self) -> anyhow::Result<BootstrapConfig> {
        let mut config = match &self.config {
            Some(path) => BootstrapConfig::load(path)?,
            None => BootstrapConfig::default(),
        };
        if let Some(tokens) = &self.initial_token {
            config = config.with_initial_token(tokens.clone());
        }
        if let Some(n) = self.num_tokens {
            config = config.with_num_tokens(n);
        }
        Ok(config)
    }

    fn load_ring(&self) -> anyhow::Result<TokenMetadata> {
        match &self.ring {
            Some(path) => load_ring(path),
            None => Ok(TokenMetadata::new()),
        }
    }

    fn check(&self) -> CheckTokenEndpoint {
        if self.no_collision_check {
            CheckTokenEndpoint::No
        } else {
            CheckTokenEndpoint::Yes
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Pick the tokens a joining node would own
    Tokens(TokenArgs),

    /// Preview the ranges a joining node would stream, and their sources
    Plan {
        #[command(flatten)]
        tokens: TokenArgs,

        /// Address of the joining node
        #[arg(long)]
        address: Endpoint,

        /// Replication factor of the previewed keyspace
        #[arg(long, default_value_t = 3)]
        replication_factor: usize,

        /// Endpoints to treat as unreachable
        #[arg(long = "down")]
        down: Vec<Endpoint>,
    },
}

/// Output of a subcommand.
#[derive(Debug)]
pub enum CommandResult {
    Tokens(BTreeSet<Murmur3Token>),
    Plan {
        tokens: BTreeSet<Murmur3Token>,
        sources: BTreeMap<Endpoint, Vec<TokenRange>>,
    },
}

impl Command {
    pub async fn execute(self) -> anyhow::Result<CommandResult> {
        match self {
            Command::Tokens(args) => {
                let config = args.bootstrap_config()?;
                let ring = args.load_ring()?;
                let tokens = bootstrap_tokens(&ring, &config, args.check())?;
                Ok(CommandResult::Tokens(tokens))
            }
            Command::Plan {
                tokens: args,
                address,
                replication_factor,
                down,
            } => {
                let config = args.bootstrap_config()?;
                let ring = Arc::new(args.load_ring()?);
                let tokens = bootstrap_tokens(&ring, &config, args.check())?;
                let sources = preview(
                    ring,
                    tokens.clone(),
                    address,
                    replication_factor,
                    down,
                    config.consistent_range_movement,
                )
                .await?;
                Ok(CommandResult::Plan { tokens, sources })
            }
        }
    }
}

async fn preview(
    ring: Arc<TokenMetadata>,
    tokens: BTreeSet<Murmur3Token>,
    address: Endpoint,
    replication_factor: usize,
    down: Vec<Endpoint>,
    consistent_range_movement: bool,
) -> anyhow::Result<BTreeMap<Endpoint, Vec<TokenRange>>> {
    let strategy: Arc<dyn ReplicationStrategy> = Arc::new(SimpleStrategy::new(replication_factor));

    let ranges = strategy
        .get_pending_address_ranges(&ring, &tokens, address)
        .await?;
    debug!(ranges = ranges.len(), "computed pending ranges");

    let membership = StaticMembership::with_down(down);
    let mut streamer = RangeStreamer::new(
        Arc::new(MemoryTransport::new()),
        ring,
        tokens,
        address,
        "Preview",
        StreamReason::Bootstrap,
        consistent_range_movement,
    );
    streamer.add_source_filter(Box::new(FailureDetectorSourceFilter::new(
        membership.unreachable_members(),
    )));
    streamer
        .add_ranges(PREVIEW_KEYSPACE, strategy, ranges, &membership, false)
        .await?;

    Ok(streamer
        .fetch_map(PREVIEW_KEYSPACE)
        .cloned()
        .unwrap_or_default())
}

/// Reads a ring file mapping each address to the tokens it owns.
pub fn load_ring(path: &Path) -> anyhow::Result<TokenMetadata> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading ring file {}", path.display()))?;
    let owners: BTreeMap<Endpoint, Vec<Murmur3Token>> = serde_json::from_str(&text)
        .with_context(|| format!("parsing ring file {}", path.display()))?;

    let ring = owners
        .into_iter()
        .fold(RingBuilder::new(), |builder, (endpoint, tokens)| {
            builder.add_tokens(endpoint, tokens)
        })
        .build()?;
    Ok(ring)
}

fn join_tokens(tokens: &BTreeSet<Murmur3Token>) -> String {
    tokens
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandResult::Tokens(tokens) => write!(f, "{}", join_tokens(tokens)),
            CommandResult::Plan { tokens, sources } => {
                writeln!(f, "tokens: {}", join_tokens(tokens))?;
                if sources.is_empty() {
                    return write!(f, "nothing to stream");
                }
                let mut first = true;
                for (source, ranges) in sources {
                    for range in ranges {
                        if !first {
                            writeln!(f)?;
                        }
                        first = false;
                        write!(f, "{} <- {}", range, source)?;
                    }
                }
                Ok(())
            }
        }
    }
}
