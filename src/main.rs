use std::process::ExitCode;

use clap::Parser;
use vault_note::{Cli, Command, VaultConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over -v
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let ctx = cmd::Context {
        config: VaultConfig::from_env().with_overrides(cli.vault.as_deref(), cli.strict),
        json: cli.json,
    };

    let result = match cli.command {
        Command::Create { filename, content, folder } => {
            cmd::note::create(&ctx, &filename, content, folder.as_deref())
        }
        Command::Read { filename, folder } => cmd::note::read(&ctx, &filename, folder.as_deref()),
        Command::Edit { filename, content, folder, operation } => {
            cmd::note::edit(&ctx, &filename, content, folder.as_deref(), &operation)
        }
        Command::Delete { filename, folder } => {
            cmd::note::delete(&ctx, &filename, folder.as_deref())
        }
        Command::Vaults => cmd::vault::run(&ctx),
        Command::Search { query, search_type, case_sensitive, path, limit } => {
            cmd::search::run(&ctx, query, &search_type, case_sensitive, path, limit)
        }
        Command::Tags => cmd::tag::list(&ctx),
        Command::Tag(tag_cmd) => cmd::tag::run(&ctx, tag_cmd),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

mod cmd {
    pub mod note;
    pub mod search;
    pub mod tag;
    pub mod vault;

    use std::error::Error;
    use std::fmt::Display;

    use serde::Serialize;
    use vault_note::{VaultConfig, VaultEngine};

    pub type CmdResult = Result<(), Box<dyn Error>>;

    /// Settings shared by every command
    pub struct Context {
        pub config: VaultConfig,
        pub json: bool,
    }

    impl Context {
        pub fn engine(&self) -> vault_note::Result<VaultEngine> {
            VaultEngine::open(&self.config)
        }

        /// Print an outcome as text, or as JSON in `--json` mode
        pub fn emit<T: Serialize + Display>(&self, outcome: &T) -> CmdResult {
            if self.json {
                println!("{}", serde_json::to_string_pretty(outcome)?);
            } else {
                println!("{}", outcome);
            }
            Ok(())
        }
    }
}
