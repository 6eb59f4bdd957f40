use crate::demo::{run_analyze, run_compare, run_demo, run_query};
use crate::demo::{AnalyzeArgs, CompareArgs, DemoArgs, QueryArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use finterm::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "finterm",
    about = "Normalize, cost, and compare financial documents from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Analyze one document: cost model, anomaly flags, and risk profile
    Analyze(AnalyzeArgs),
    /// Rank a set of documents of one category
    Compare(CompareArgs),
    /// List the terms of a document that match a predicate
    Query(QueryArgs),
    /// Compare two sample loans end to end
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Analyze(args) => run_analyze(args),
        Command::Compare(args) => run_compare(args),
        Command::Query(args) => run_query(args),
        Command::Demo(args) => run_demo(args),
    }
}
