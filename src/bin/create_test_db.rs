use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use subtrack::{
    CategoryForm, PasswordHash, RegisterForm, SubscriptionForm, create_category, create_charge,
    create_subscription, initialize_db, pay_charge, register_user,
};

/// A utility for creating a test database for the REST API server of subtrack.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
///
/// The demo user logs in with "test@example.com" and "averysafeandsecurepassword".
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    let now = OffsetDateTime::now_utc();

    println!("Creating test user...");
    let user = register_user(
        RegisterForm {
            name: Some("Test User".to_owned()),
            email: Some("test@example.com".to_owned()),
            password: Some("averysafeandsecurepassword".to_owned()),
        },
        PasswordHash::DEFAULT_COST,
        now,
        &conn,
    )?;

    println!("Creating categories...");
    let streaming = create_category(
        user.id,
        CategoryForm {
            name: "Streaming".to_owned(),
            color: Some("#e50914".to_owned()),
        },
        now,
        &conn,
    )?;
    let software = create_category(
        user.id,
        CategoryForm {
            name: "Software".to_owned(),
            color: None,
        },
        now,
        &conn,
    )?;

    println!("Creating subscriptions...");
    let subscriptions = [
        (streaming.id, "Netflix", 39.9, "monthly", 3),
        (streaming.id, "Spotify", 21.9, "monthly", 10),
        (software.id, "GitHub", 480.0, "yearly", 40),
    ];

    for (category_id, service_name, amount, billing_cycle, days_ahead) in subscriptions {
        let next_billing_date = (now + Duration::days(days_ahead)).date();
        let subscription = create_subscription(
            user.id,
            SubscriptionForm {
                category_id: Some(category_id),
                service_name: Some(service_name.to_owned()),
                amount: Some(amount),
                billing_cycle: Some(billing_cycle.to_owned()),
                next_billing_date: Some(next_billing_date.to_string()),
            },
            now,
            &conn,
        )?;

        let charge = create_charge(user.id, subscription.id, now, &conn)?;
        if billing_cycle == "yearly" {
            pay_charge(user.id, charge.id, &conn)?;
        }
    }

    println!("Success!");

    Ok(())
}
