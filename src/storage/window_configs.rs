//! Window-config repository
//!
//! One row per `window_id`. Writes are upserts: update first, insert only if
//! nothing was updated.

use rusqlite::Row;
use rusqlite::types::Value;

use super::schema::WINDOW_CONFIG_COLUMNS;
use super::sqlite::{self, Database};
use crate::window::{Geometry, WindowConfig};
use crate::{Error, Result};

/// Stateless view over the `window_configs` table
#[derive(Debug, Clone)]
pub struct WindowConfigRepository {
    db: Database,
}

impl WindowConfigRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Saved config for a window, if any
    pub async fn get(&self, window_id: &str) -> Result<Option<WindowConfig>> {
        let handle = self.db.handle().await?;
        handle
            .query_optional(
                format!("SELECT {} FROM window_configs WHERE window_id = ?1", WINDOW_CONFIG_COLUMNS),
                vec![Value::from(window_id.to_string())],
                row_to_config,
            )
            .await
    }

    /// All saved configs, ordered by window id
    pub async fn list(&self) -> Result<Vec<WindowConfig>> {
        let handle = self.db.handle().await?;
        handle
            .query(
                format!("SELECT {} FROM window_configs ORDER BY window_id", WINDOW_CONFIG_COLUMNS),
                vec![],
                row_to_config,
            )
            .await
    }

    /// Upsert a window's geometry. `x`/`y` of `None` are stored as NULL.
    pub async fn save(&self, window_id: &str, width: u32, height: u32, x: Option<i32>, y: Option<i32>) -> Result<()> {
        if window_id.is_empty() {
            return Err(Error::InvalidInput("window id must not be empty".to_string()));
        }
        if width == 0 || height == 0 {
            return Err(Error::InvalidInput(format!(
                "window size must be positive, got {}x{}",
                width, height
            )));
        }

        let handle = self.db.handle().await?;
        let now = sqlite::timestamp(sqlite::now());

        let updated = handle
            .execute(
                r#"
                UPDATE window_configs
                SET width = ?1, height = ?2, x = ?3, y = ?4, updated_at = ?5
                WHERE window_id = ?6
                "#,
                vec![
                    Value::from(i64::from(width)),
                    Value::from(i64::from(height)),
                    Value::from(x.map(i64::from)),
                    Value::from(y.map(i64::from)),
                    now.clone(),
                    Value::from(window_id.to_string()),
                ],
            )
            .await?;

        if updated.rows_affected == 0 {
            handle
                .execute(
                    r#"
                    INSERT INTO window_configs (window_id, width, height, x, y, created_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    "#,
                    vec![
                        Value::from(window_id.to_string()),
                        Value::from(i64::from(width)),
                        Value::from(i64::from(height)),
                        Value::from(x.map(i64::from)),
                        Value::from(y.map(i64::from)),
                        now.clone(),
                        now,
                    ],
                )
                .await?;
        }

        tracing::debug!(window_id, width, height, ?x, ?y, "Window config saved");
        Ok(())
    }

    /// Upsert from a geometry value
    pub async fn save_geometry(&self, window_id: &str, geometry: Geometry) -> Result<()> {
        let (x, y) = match geometry.position {
            Some(p) => (Some(p.x), Some(p.y)),
            None => (None, None),
        };
        self.save(window_id, geometry.size.width, geometry.size.height, x, y).await
    }

    /// Remove a window's config. Missing keys are not an error; returns
    /// whether a row was removed.
    pub async fn delete(&self, window_id: &str) -> Result<bool> {
        let handle = self.db.handle().await?;
        let outcome = handle
            .execute(
                "DELETE FROM window_configs WHERE window_id = ?1",
                vec![Value::from(window_id.to_string())],
            )
            .await?;
        if outcome.rows_affected > 0 {
            tracing::debug!(window_id, "Window config deleted");
        }
        Ok(outcome.rows_affected > 0)
    }
}

fn row_to_config(row: &Row<'_>) -> rusqlite::Result<WindowConfig> {
    Ok(WindowConfig {
        id: row.get(0)?,
        window_id: row.get(1)?,
        width: row.get(2)?,
        height: row.get(3)?,
        x: row.get(4)?,
        y: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
