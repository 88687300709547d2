//! Utility to inspect the database schema and print table structures.

use contact_enrichment_api::config::Config;
use contact_enrichment_api::db::Database;

/// Main entry point for the schema inspection utility.
///
/// Opens the configured SQLite database (creating the schema if needed) and
/// lists every table with its columns and row count.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let db = Database::new(&config.database_url).await?;

    let tables: Vec<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(&db.pool)
    .await?;

    println!("Tables in {}:", config.database_url);
    for (table,) in &tables {
        let (rows,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM \"{}\"", table))
            .fetch_one(&db.pool)
            .await?;
        println!("- {} ({} rows)", table, rows);

        let columns: Vec<(String, String, i64)> = sqlx::query_as(
            "SELECT name, type, \"notnull\" FROM pragma_table_info($1) ORDER BY cid",
        )
        .bind(table)
        .fetch_all(&db.pool)
        .await?;

        for (col, type_, not_null) in columns {
            let nullability = if not_null != 0 { "NOT NULL" } else { "NULL" };
            println!("  - {}: {} {}", col, type_, nullability);
        }
        println!();
    }

    Ok(())
}
