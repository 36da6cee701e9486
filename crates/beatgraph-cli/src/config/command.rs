//! Subcommands and their arguments.

use std::path::PathBuf;

use beatgraph_core::NodeId;
use beatgraph_reqwest::ReqwestConfig;
use beatgraph_runtime::registry::{PortDirection, SemanticType};
use beatgraph_runtime::run::RunConfig;
use clap::{Args, Subcommand};

use crate::TRACING_TARGET_STARTUP;

/// Available commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the node kind catalog as JSON.
    Kinds,
    /// Print the kinds that can be auto-wired to a port.
    Candidates(CandidatesArgs),
    /// Sanitize a document and print its schedule and rhythm analysis.
    Analyze(AnalyzeArgs),
    /// Run nodes of a document on a job service and wait for the results.
    Execute(ExecuteArgs),
}

impl Command {
    /// Returns the command name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Kinds => "kinds",
            Self::Candidates(_) => "candidates",
            Self::Analyze(_) => "analyze",
            Self::Execute(_) => "execute",
        }
    }
}

/// Arguments of `beatgraph candidates`.
#[derive(Debug, Clone, Args)]
pub struct CandidatesArgs {
    /// Semantic type of the origin port (e.g. `image-asset`)
    #[arg(long = "type")]
    pub semantic_type: SemanticType,

    /// Direction of the origin port (`input` or `output`)
    #[arg(long)]
    pub direction: PortDirection,

    /// Case-insensitive filter on kind labels and tags
    #[arg(long)]
    pub query: Option<String>,
}

/// Arguments of `beatgraph analyze`.
#[derive(Debug, Clone, Args)]
pub struct AnalyzeArgs {
    /// Path of the graph document
    pub document: PathBuf,
}

/// Arguments of `beatgraph execute`.
#[derive(Debug, Clone, Args)]
pub struct ExecuteArgs {
    /// Path of the graph document
    pub document: PathBuf,

    /// Node to run; repeat for several nodes
    #[arg(long = "node", required = true)]
    pub nodes: Vec<NodeId>,

    /// Write the document back with the produced assets
    #[arg(long)]
    pub write: bool,

    /// Submit without checking the job service health first
    #[arg(long)]
    pub skip_health_check: bool,

    /// Polling configuration.
    #[command(flatten)]
    pub run: RunConfig,

    /// Job service connection.
    #[command(flatten)]
    pub http: ReqwestConfig,
}

impl ExecuteArgs {
    /// Logs the execution configuration.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_STARTUP,
            document = %self.document.display(),
            node_count = self.nodes.len(),
            job_url = %self.http.base_url,
            http_timeout_secs = self.http.effective_timeout().as_secs(),
            poll_interval_ms = self.run.poll_interval_ms,
            max_poll_secs = self.run.max_poll_secs,
            write = self.write,
            skip_health_check = self.skip_health_check,
            "Execution configuration"
        );
    }
}
