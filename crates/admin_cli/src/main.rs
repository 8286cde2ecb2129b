use std::{error::Error, sync::Arc};

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use engine::{Engine, MemoryObjectStore};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "expensa_admin")]
#[command(about = "Admin utilities for Expensa (departments, scheduler runs)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./expensa.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Department(Department),
    Recurring(Recurring),
    Lookup(Lookup),
}

#[derive(Args, Debug)]
struct Department {
    #[command(subcommand)]
    command: DepartmentCommand,
}

#[derive(Subcommand, Debug)]
enum DepartmentCommand {
    Add(DepartmentAddArgs),
}

#[derive(Args, Debug)]
struct DepartmentAddArgs {
    name: String,
}

#[derive(Args, Debug)]
struct Recurring {
    #[command(subcommand)]
    command: RecurringCommand,
}

#[derive(Subcommand, Debug)]
enum RecurringCommand {
    /// Runs the recurring-expense scheduler once.
    Check(RecurringCheckArgs),
}

#[derive(Args, Debug)]
struct RecurringCheckArgs {
    /// Day to run for (`YYYY-MM-DD`), defaults to today in `--timezone`.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// IANA zone that decides what "today" is.
    #[arg(long, env = "EXPENSA__APP__TIMEZONE", default_value = "Asia/Bangkok")]
    timezone: Tz,
}

#[derive(Args, Debug)]
struct Lookup {
    #[command(subcommand)]
    command: LookupCommand,
}

#[derive(Subcommand, Debug)]
enum LookupCommand {
    List,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    // Nothing here touches attachments.
    let engine = Engine::builder()
        .database(db)
        .object_store(Arc::new(MemoryObjectStore::new("")))
        .build()
        .await?;

    match cli.command {
        Command::Department(Department {
            command: DepartmentCommand::Add(args),
        }) => match engine.create_department(&args.name).await {
            Ok(department) => println!("created department: {} ({})", department.name, department.id),
            Err(err) => {
                eprintln!("{err}");
                std::process::exit(1);
            }
        },
        Command::Recurring(Recurring {
            command: RecurringCommand::Check(args),
        }) => {
            let date = args
                .date
                .unwrap_or_else(|| Utc::now().with_timezone(&args.timezone).date_naive());
            let processed = engine.check_recurring(date).await?;
            println!("processed {processed} recurring expense(s) for {date}");
        }
        Command::Lookup(Lookup {
            command: LookupCommand::List,
        }) => {
            let lookups = engine.lookups().await?;
            println!("categories:");
            for category in lookups.categories {
                println!("  {} {} ({})", category.icon, category.name, category.id);
            }
            println!("departments:");
            for department in lookups.departments {
                println!("  {} ({})", department.name, department.id);
            }
            println!("payment methods:");
            for method in lookups.payment_methods {
                println!("  {} {} ({})", method.icon, method.name, method.id);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recurring_check_defaults_to_bangkok() {
        let cli = Cli::try_parse_from(["expensa_admin", "recurring", "check"]).unwrap();
        let Command::Recurring(Recurring {
            command: RecurringCommand::Check(args),
        }) = cli.command
        else {
            panic!("expected recurring check");
        };
        assert_eq!(args.timezone, chrono_tz::Asia::Bangkok);
        assert_eq!(args.date, None);
    }

    #[test]
    fn recurring_check_accepts_zone_and_date() {
        let cli = Cli::try_parse_from([
            "expensa_admin",
            "recurring",
            "check",
            "--timezone",
            "UTC",
            "--date",
            "2024-05-01",
        ])
        .unwrap();
        let Command::Recurring(Recurring {
            command: RecurringCommand::Check(args),
        }) = cli.command
        else {
            panic!("expected recurring check");
        };
        assert_eq!(args.timezone, chrono_tz::UTC);
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2024, 5, 1));
    }
}
