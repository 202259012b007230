use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use rollcall::cli::monitor::monitor_auth;
use rollcall::cli::seeder::{SeedConfig, seed_database};

#[derive(Parser)]
#[command(name = "rollcall-cli")]
#[command(about = "Rollcall CLI - Administrative tools for Rollcall", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the database with fake teachers, students and attendance
    Seed {
        /// Number of teachers to create
        #[arg(short = 't', long, default_value = "3")]
        teachers: usize,

        /// Number of students per teacher
        #[arg(short = 's', long, default_value = "10")]
        students: usize,

        /// Number of announcements per teacher
        #[arg(short = 'a', long, default_value = "2")]
        announcements: usize,
    },
    /// Monitor the verification audit log in real time
    MonitorAuth {
        /// Number of recent log lines to show
        #[arg(long, default_value = "10")]
        tail: usize,

        /// Keep following the file for new entries
        #[arg(short = 'f', long)]
        follow: bool,

        /// Path to the audit log
        #[arg(long, default_value = "logs/auth.log")]
        log_file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Seed {
            teachers,
            students,
            announcements,
        } => {
            let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await
                .expect("Failed to connect to database");

            let config = SeedConfig {
                teachers,
                students_per_teacher: students,
                announcements_per_teacher: announcements,
            };

            if let Err(e) = seed_database(&pool, config).await {
                eprintln!("❌ Error seeding database: {}", e);
                std::process::exit(1);
            }
        }
        Commands::MonitorAuth {
            tail,
            follow,
            log_file,
        } => {
            if !log_file.exists() {
                eprintln!("❌ Log file not found: {}", log_file.display());
                std::process::exit(1);
            }

            if let Err(e) = monitor_auth(&log_file, tail, follow) {
                eprintln!("❌ Error reading log file: {}", e);
                std::process::exit(1);
            }
        }
    }
}
