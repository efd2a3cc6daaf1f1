use anyhow::Context;
use clap::{Parser, Subcommand};
use storefront::{AppState, DatabaseConfig, seed, setup_environment};

#[derive(Parser, Debug)]
#[command(name = "storefront", version)]
#[command(about = "Music store database maintenance")]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database file and apply migrations
    Init,
    /// Reset the database and load demo data
    Seed,
    /// Drop and recreate every table
    Reset,
    /// Print row counts per table
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 日志)
    let mut config = setup_environment();
    let cli = Cli::parse();
    if let Some(path) = cli.database {
        config.database = DatabaseConfig::with_path(path);
    }

    // 2. 打开数据库 (执行迁移)
    let state = AppState::initialize(&config)
        .await
        .with_context(|| format!("failed to open database at {}", config.database.path))?;

    match cli.command {
        Command::Init => {
            println!("Database ready: {}", config.database.path);
        }
        Command::Seed => {
            let report = seed::seed_all(&state).await.context("seeding failed")?;
            for warning in &report.warnings {
                println!("  ⚠️  {warning}");
            }
            println!(
                "✅ Seeded {} users, {} categories, {} products",
                report.users, report.categories, report.products
            );
            println!("  Admin: admin / admin123");
            println!("  Customer: customer / customer123");
        }
        Command::Reset => {
            state.db.reset().await.context("reset failed")?;
            println!("🗑️  Database reset: {}", config.database.path);
        }
        Command::Stats { json } => {
            let counts = state.db.table_counts().await.context("stats failed")?;
            if json {
                let map: serde_json::Map<String, serde_json::Value> = counts
                    .into_iter()
                    .map(|(table, count)| (table.to_string(), count.into()))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                for (table, count) in counts {
                    println!("{table:<12} {count}");
                }
            }
        }
    }

    state.db.pool.close().await;
    Ok(())
}
