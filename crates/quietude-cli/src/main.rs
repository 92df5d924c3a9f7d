use clap::{CommandFactory, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quietude-cli", version, about = "Quietude CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Battery level and activity logging
    Battery {
        #[command(subcommand)]
        action: commands::battery::BatteryAction,
    },
    /// Sleep quality recording
    Sleep {
        #[command(subcommand)]
        action: commands::sleep::SleepAction,
    },
    /// Scheduled event management
    Event {
        #[command(subcommand)]
        action: commands::event::EventAction,
    },
    /// Battery history
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Run the overnight check and the reconciler loop, printing
    /// notifications
    Watch {
        /// Seconds between reconciler ticks (defaults to the configured
        /// interval)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Battery { action } => commands::battery::run(action),
        Commands::Sleep { action } => commands::sleep::run(action),
        Commands::Event { action } => commands::event::run(action),
        Commands::History { action } => commands::history::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Watch { interval } => commands::watch::run(interval),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "quietude-cli",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
