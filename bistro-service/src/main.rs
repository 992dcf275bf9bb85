use anyhow::Context;
use bistro_service::{auth, establish_connection, reservations, run_migrations, seed, timefmt};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Bistro administration tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Load demo menu, blog, reviews and two weeks of time slots
    Seed,
    /// Create an admin account for the API
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Create time slots from the configured opening hours
    GenerateSlots {
        /// First day, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        from: Option<String>,
        #[arg(long, default_value_t = 14)]
        days: u32,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let conn = &mut establish_connection()?;

    match cli.command {
        Commands::Migrate => {
            let applied = run_migrations(conn)?;
            info!(applied, "migrations applied");
        }
        Commands::Seed => {
            run_migrations(conn)?;
            let report = seed::run(conn, reservations::local_now().date())?;
            println!("{report:#?}");
        }
        Commands::CreateAdmin { username, password } => {
            let admin = auth::create_admin(conn, &username, &password)
                .with_context(|| format!("Cannot create admin {username}"))?;
            println!("Created admin {} ({})", admin.username, admin.id);
        }
        Commands::GenerateSlots { from, days } => {
            let from = match from {
                Some(value) => timefmt::parse_date(&value)?,
                None => reservations::local_now().date(),
            };
            let inserted = reservations::generate_slots(conn, from, days)?;
            println!("Inserted {inserted} time slot(s) starting {from}");
        }
    }
    Ok(())
}
