use std::process::ExitCode;

use clap::Parser;
use gpt_git::{
   CommitOptions, CompletionClient, GitCli, GptConfig, Result, commit, style,
   types::{Cli, Command, CommitArgs, GitCommand},
};
use tracing_subscriber::EnvFilter;

/// Log to stderr so stdout only carries the command's JSON output.
/// `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
   let default_level = if verbose { "debug" } else { "warn" };
   let filter =
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

   tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(std::io::stderr)
      .with_target(false)
      .init();
}

/// Load config from args or default
fn load_config(cli: &Cli) -> Result<GptConfig> {
   if let Some(ref config_path) = cli.config {
      GptConfig::from_file(config_path)
   } else {
      GptConfig::load()
   }
}

fn run_commit(args: &CommitArgs, config: GptConfig) -> Result<()> {
   let repo = GitCli::open(&args.dir)?;
   let completion = CompletionClient::new(config)?;

   let response = commit::commit(&repo, &completion, &CommitOptions::from(args))?;
   println!("{}", serde_json::to_string_pretty(&response)?);
   Ok(())
}

fn run(cli: &Cli) -> Result<()> {
   let config = load_config(cli)?;

   match &cli.command {
      Command::Git(GitCommand::Commit(args)) => run_commit(args, config),
   }
}

fn main() -> ExitCode {
   // A missing .env is fine; keys may come from the environment or config
   dotenvy::dotenv().ok();

   let cli = Cli::parse();
   init_logging(cli.verbose);

   match run(&cli) {
      Ok(()) => ExitCode::SUCCESS,
      Err(err) => {
         style::report_error(&err);
         ExitCode::FAILURE
      },
   }
}
