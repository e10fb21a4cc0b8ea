use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "pact", version, about = "Pact progression engine CLI")]
struct Cli {
    /// Act as this user (defaults to `user_id` from config)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record an app login
    Login {
        /// Local time of the login, "YYYY-MM-DD HH:MM" (default: now)
        #[arg(long)]
        at: Option<String>,
    },
    /// Pact management
    Pact {
        #[command(subcommand)]
        action: commands::pact::PactAction,
    },
    /// Goal and step management
    Goal {
        #[command(subcommand)]
        action: commands::goal::GoalAction,
    },
    /// Rank ladder and XP
    Rank {
        #[command(subcommand)]
        action: commands::rank::RankAction,
    },
    /// Achievement evaluation and listing
    Achievements {
        #[command(subcommand)]
        action: commands::achievements::AchievementsAction,
    },
    /// Pact analysis insights
    Insights {
        /// Evaluate as of this date (default: today)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },
    /// Daily health check-in
    Checkin {
        /// Check in for this date (default: today)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },
    /// Promo codes
    Promo {
        #[command(subcommand)]
        action: commands::promo::PromoAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let user = cli.user;
    let result = match cli.command {
        Commands::Login { at } => commands::login::run(user, at),
        Commands::Pact { action } => commands::pact::run(user, action),
        Commands::Goal { action } => commands::goal::run(user, action),
        Commands::Rank { action } => commands::rank::run(user, action),
        Commands::Achievements { action } => commands::achievements::run(user, action),
        Commands::Insights { date } => commands::insights::run(user, date),
        Commands::Checkin { date } => commands::checkin::run(user, date),
        Commands::Promo { action } => commands::promo::run(user, action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "pact", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
