use crate::{
    browse::BrowseOptions,
    error::CliError,
    shutdown::Interrupt,
};
use clap::Parser;
use collation::{BuiltinCollators, Collator, CollatorProvider, Locale};
use commands::Commands;
use engine_config::settings::CursorSettings;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod browse;
mod commands;
mod error;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "rolodex",
    version = "0.0.1",
    about = "Browse an address book in locale order"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let interrupt = Interrupt::default();
    match run(cli, &interrupt).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::ShutdownRequested) => interrupt.exit_code(),
        Err(err) if interrupt.fired() => {
            error!(error = %err, "stopped after interrupt");
            interrupt.exit_code()
        }
        Err(err) => {
            error!(error = %err, "rolodex failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, interrupt: &Interrupt) -> Result<(), CliError> {
    match cli.command {
        Commands::Browse {
            contacts,
            settings,
            locale,
            sort,
            filter,
            page_size,
            letter,
            switch_locale,
            json,
        } => {
            let mut settings = match settings {
                Some(path) => CursorSettings::load(path)?,
                None => CursorSettings::default(),
            };
            if let Some(locale) = locale {
                settings.locale = locale;
            }
            init_tracing(settings.log_level.as_deref());
            interrupt.listen();

            let options = BrowseOptions {
                contacts,
                settings,
                sort,
                filter,
                page_size,
                letter,
                switch_locale,
                json,
            };
            browse::run(options, interrupt.token()).await
        }
        Commands::Alphabet { locale } => {
            init_tracing(None);
            let locale = Locale::parse(&locale)?;
            let collator = BuiltinCollators::shared().collator(&locale)?;
            for (index, label) in collator.labels().iter().enumerate() {
                println!("{index:>3}  {label}");
            }
            Ok(())
        }
    }
}

/// `RUST_LOG` wins over the configured level, which wins over `info`.
fn init_tracing(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
