use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use pocket_ledger::{
    account::{NewAccount, create_account},
    expense::{NewExpense, create_expense},
    initialize_db,
    money::Money,
    owner::OwnerId,
};

/// A utility for creating a test database for the REST API server of pocket_ledger.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The owner identifier to create the sample records for.
    ///
    /// A random UUID is generated if not given.
    #[arg(long, short = 'u')]
    user_id: Option<String>,
}

const SAMPLE_ACCOUNTS: [(&str, &str); 3] = [
    ("Everyday", "1250.40"),
    ("Savings", "8000"),
    ("Wallet", "42.5"),
];

const SAMPLE_EXPENSES: [(&str, &str, i64); 5] = [
    ("Groceries", "86.15", 1),
    ("Coffee", "4.5", 1),
    ("Rent", "450", 3),
    ("Bus fare", "2.40", 6),
    ("Movie tickets", "32", 10),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    let user_id = args
        .user_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let owner = OwnerId::new(&user_id)?;

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating sample accounts for user {owner}...");
    let mut account_ids = Vec::new();

    for (name, balance) in SAMPLE_ACCOUNTS {
        let account = create_account(
            &NewAccount {
                user_id: owner.clone(),
                name: name.to_owned(),
                balance: Money::parse(balance).ok_or("invalid sample balance")?,
            },
            &conn,
        )?;
        account_ids.push(account.id);
    }

    println!("Creating sample expenses...");
    let today = OffsetDateTime::now_utc().date();

    for (index, (title, amount, days_ago)) in SAMPLE_EXPENSES.into_iter().enumerate() {
        create_expense(
            &NewExpense {
                user_id: owner.clone(),
                title: title.to_owned(),
                amount: Money::parse(amount).ok_or("invalid sample amount")?,
                date: today - Duration::days(days_ago),
                account_id: (index % 2 == 0).then(|| account_ids[index % account_ids.len()]),
            },
            &conn,
        )?;
    }

    println!("Success! Use userId={owner} to query the sample data.");

    Ok(())
}
