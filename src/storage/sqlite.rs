use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use crate::models::{PriceSample, Product};
use crate::storage::Storage;

pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).context("Failed to open SQLite database")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Private database, useful for tests and one-off CLI invocations that
    /// should not touch the real history file.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        link: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        rating: row.get(4)?,
    })
}

fn sample_from_row(row: &Row<'_>) -> rusqlite::Result<PriceSample> {
    let created_at: String = row.get(3)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);

    Ok(PriceSample {
        id: row.get(0)?,
        product_id: row.get(1)?,
        price: row.get(2)?,
        created_at,
    })
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                link TEXT NOT NULL UNIQUE,
                name TEXT,
                description TEXT,
                rating REAL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS price_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id INTEGER NOT NULL REFERENCES products(id),
                price REAL NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_price_history_product
             ON price_history(product_id, created_at)",
            [],
        )?;

        info!("Database migration completed");
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, link, name, description, rating FROM products ORDER BY id",
        )?;
        let products = stmt
            .query_map([], product_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(products)
    }

    async fn get_product(&self, product_id: i64) -> Result<Option<Product>> {
        let conn = self.conn.lock().unwrap();

        let product = conn
            .query_row(
                "SELECT id, link, name, description, rating FROM products WHERE id = ?1",
                params![product_id],
                product_from_row,
            )
            .optional()?;

        Ok(product)
    }

    async fn find_product_by_link(&self, link: &str) -> Result<Option<Product>> {
        let conn = self.conn.lock().unwrap();

        let product = conn
            .query_row(
                "SELECT id, link, name, description, rating FROM products WHERE link = ?1",
                params![link],
                product_from_row,
            )
            .optional()?;

        Ok(product)
    }

    async fn insert_product(
        &self,
        link: &str,
        name: Option<String>,
        description: Option<String>,
        rating: Option<f64>,
    ) -> Result<Product> {
        let conn = self.conn.lock().unwrap();

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM products WHERE link = ?1",
                params![link],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            bail!("product with this link is already tracked: {link}");
        }

        conn.execute(
            "INSERT INTO products (link, name, description, rating) VALUES (?1, ?2, ?3, ?4)",
            params![link, name, description, rating],
        )?;
        let id = conn.last_insert_rowid();

        Ok(Product {
            id,
            link: link.to_string(),
            name,
            description,
            rating,
        })
    }

    async fn delete_product(&self, product_id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "DELETE FROM price_history WHERE product_id = ?1",
            params![product_id],
        )?;
        let deleted = conn.execute("DELETE FROM products WHERE id = ?1", params![product_id])?;

        Ok(deleted > 0)
    }

    async fn append_price_sample(
        &self,
        product_id: i64,
        price: f64,
        at: DateTime<Utc>,
    ) -> Result<PriceSample> {
        let conn = self.conn.lock().unwrap();

        let known: Option<i64> = conn
            .query_row(
                "SELECT id FROM products WHERE id = ?1",
                params![product_id],
                |row| row.get(0),
            )
            .optional()?;
        if known.is_none() {
            bail!("product not found: {product_id}");
        }

        conn.execute(
            "INSERT INTO price_history (product_id, price, created_at) VALUES (?1, ?2, ?3)",
            params![product_id, price, at.to_rfc3339()],
        )?;

        Ok(PriceSample {
            id: conn.last_insert_rowid(),
            product_id,
            price,
            created_at: at,
        })
    }

    async fn price_history(&self, product_id: i64) -> Result<Vec<PriceSample>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, product_id, price, created_at FROM price_history
             WHERE product_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;
        let samples = stmt
            .query_map(params![product_id], sample_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(samples)
    }

    async fn latest_price(&self, product_id: i64) -> Result<Option<f64>> {
        let conn = self.conn.lock().unwrap();

        let price = conn
            .query_row(
                "SELECT price FROM price_history
                 WHERE product_id = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT 1",
                params![product_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(price)
    }
}
