//! Loads transactions from a CSV file into the database.
//!
//! Usage: `import_transactions <file.csv>`

use std::env;
use std::fs::File;

use dotenvy::dotenv;

use pilot::db::establish_connection_pool;
use pilot::forms::import::parse_transactions_csv;
use pilot::models::config::ServerConfig;
use pilot::repository::DieselRepository;
use pilot::services::transactions::import_transactions;

fn main() {
    dotenv().ok(); // Load .env file
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let Some(path) = env::args().nth(1) else {
        log::error!("Usage: import_transactions <file.csv>");
        std::process::exit(2);
    };

    let server_config = match ServerConfig::load() {
        Ok(server_config) => server_config,
        Err(err) => {
            log::error!("Error loading server config: {err}");
            std::process::exit(1);
        }
    };

    let file = match File::open(&path) {
        Ok(file) => file,
        Err(err) => {
            log::error!("Cannot open {path}: {err}");
            std::process::exit(1);
        }
    };

    let transactions = match parse_transactions_csv(file) {
        Ok(transactions) => transactions,
        Err(err) => {
            log::error!("Failed to parse {path}: {err}");
            std::process::exit(1);
        }
    };

    let pool = match establish_connection_pool(&server_config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let repo = DieselRepository::new(pool);

    match import_transactions(&repo, &transactions) {
        Ok(inserted) => log::info!("Imported {inserted} of {} rows from {path}", transactions.len()),
        Err(err) => {
            log::error!("Import failed: {err}");
            std::process::exit(1);
        }
    }
}
