use crate::demo::{run_agents, run_demo, AgentsArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use rental_intake::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Rental Intake",
    about = "Run the rental application intake service or walk through it from the command line",
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
    /// Walk a scripted application from instructions to handoff
    Demo(DemoArgs),
    /// Print the agent directory for a locale
    Agents(AgentsArgs),
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
        Command::Demo(args) => run_demo(args),
        Command::Agents(args) => run_agents(args),
    }
}
