//! Shopping list storage: categories, the catalog and the list itself.
//!
//! Catalog and category ids are integers handed out as `last id + 1`.
//! A shopping item reuses the id of the catalog entry it was added from.

use chrono::Utc;
use hearth_core::shopping::validate_quantity;
use hearth_core::{CatalogEntry, Category, Error, NewCatalogEntry, ShoppingItem};
use turso::params;

use crate::db::{parse_timestamp, Database, DbError, Result};

const CATALOG_COLUMNS: &str =
    "id, name, category_id, location, weight, price, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, name, quantity, category_id, checked, price, created_at";

impl Database {
    // ===== Categories =====

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut rows = self
            .conn
            .query("SELECT id, name FROM categories ORDER BY id ASC", params![])
            .await?;

        let mut categories = Vec::new();
        while let Some(row) = rows.next().await? {
            categories.push(Category {
                id: row.get(0)?,
                name: row.get(1)?,
            });
        }
        Ok(categories)
    }

    pub async fn create_category(&self, name: &str) -> Result<Category> {
        if name.trim().is_empty() {
            return Err(hearth_core::Error::Validation("name is required".to_string()).into());
        }
        let id = self.next_id("categories").await?;
        self.conn
            .execute(
                "INSERT INTO categories (id, name) VALUES (?, ?)",
                params![id, name],
            )
            .await?;
        Ok(Category {
            id,
            name: name.to_string(),
        })
    }

    // ===== Catalog =====

    pub async fn list_catalog(&self) -> Result<Vec<CatalogEntry>> {
        let query = format!("SELECT {} FROM catalog ORDER BY id ASC", CATALOG_COLUMNS);
        self.query_catalog(&query, Vec::new()).await
    }

    /// Catalog entries whose name contains `term`.
    pub async fn search_catalog(&self, term: &str) -> Result<Vec<CatalogEntry>> {
        let query = format!(
            "SELECT {} FROM catalog WHERE name LIKE ? ORDER BY id ASC",
            CATALOG_COLUMNS
        );
        self.query_catalog(&query, vec![format!("%{}%", term).into()])
            .await
    }

    /// Catalog entries not currently on the shopping list, most used first.
    pub async fn list_catalog_not_on_list(&self) -> Result<Vec<CatalogEntry>> {
        let query = format!(
            "SELECT {} FROM catalog
             WHERE id NOT IN (SELECT id FROM shopping_items)
             ORDER BY weight DESC, id ASC",
            CATALOG_COLUMNS
        );
        self.query_catalog(&query, Vec::new()).await
    }

    pub async fn get_catalog_entry(&self, id: i64) -> Result<CatalogEntry> {
        let query = format!("SELECT {} FROM catalog WHERE id = ?", CATALOG_COLUMNS);
        self.query_catalog(&query, vec![id.into()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| catalog_not_found(id))
    }

    pub async fn get_catalog_entry_by_name(&self, name: &str) -> Result<CatalogEntry> {
        let query = format!(
            "SELECT {} FROM catalog WHERE name = ? ORDER BY id ASC LIMIT 1",
            CATALOG_COLUMNS
        );
        self.query_catalog(&query, vec![name.to_string().into()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound {
                entity: "catalog entry",
                id: name.to_string(),
            })
    }

    /// Create a catalog entry and, if requested, put it on the shopping list too.
    pub async fn create_catalog_entry(
        &self,
        entry: &NewCatalogEntry,
        add_to_list: bool,
    ) -> Result<CatalogEntry> {
        entry.validate()?;

        let id = self.next_id("catalog").await?;
        let now = Utc::now();
        let created = CatalogEntry {
            id,
            name: entry.name.clone(),
            category_id: entry.category_id,
            location: None,
            weight: 1,
            price: 0.0,
            created_at: now,
            updated_at: now,
        };

        self.conn
            .execute(
                "INSERT INTO catalog (id, name, category_id, location, weight, price, created_at, updated_at)
                 VALUES (?, ?, ?, NULL, ?, ?, ?, ?)",
                params![
                    created.id,
                    created.name.clone(),
                    created.category_id,
                    created.weight,
                    created.price,
                    now.to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )
            .await?;

        if add_to_list {
            self.insert_item(&created, entry.quantity).await?;
        }

        Ok(created)
    }

    /// Reset every catalog weight to 1.
    pub async fn reset_catalog_weights(&self) -> Result<()> {
        self.conn
            .execute(
                "UPDATE catalog SET weight = 1, updated_at = ?",
                params![Utc::now().to_rfc3339()],
            )
            .await?;
        Ok(())
    }

    pub async fn set_catalog_weight(&self, id: i64, weight: i64) -> Result<CatalogEntry> {
        self.update_catalog_column(id, "weight", weight.into()).await
    }

    pub async fn set_catalog_price(&self, id: i64, price: f64) -> Result<CatalogEntry> {
        if !price.is_finite() || price < 0.0 {
            return Err(hearth_core::Error::Validation(format!("invalid price {}", price)).into());
        }
        self.update_catalog_column(id, "price", price.into()).await
    }

    pub async fn delete_catalog_entry(&self, id: i64) -> Result<CatalogEntry> {
        let entry = self.get_catalog_entry(id).await?;
        self.conn
            .execute("DELETE FROM catalog WHERE id = ?", params![id])
            .await?;
        Ok(entry)
    }

    // ===== Shopping items =====

    /// Items on the list, oldest first.
    pub async fn list_items(&self) -> Result<Vec<ShoppingItem>> {
        let query = format!(
            "SELECT {} FROM shopping_items ORDER BY created_at ASC, id ASC",
            ITEM_COLUMNS
        );
        self.query_items(&query, Vec::new()).await
    }

    /// Items on the list ordered by the weight of their catalog entry, heaviest first.
    ///
    /// Items without a catalog entry keep their creation order at the end.
    pub async fn list_items_by_weight(&self) -> Result<Vec<ShoppingItem>> {
        let query = format!(
            "SELECT {} FROM shopping_items s
             ORDER BY (SELECT weight FROM catalog c WHERE c.id = s.id) IS NULL,
                      (SELECT weight FROM catalog c WHERE c.id = s.id) DESC,
                      created_at ASC, id ASC",
            ITEM_COLUMNS
        );
        self.query_items(&query, Vec::new()).await
    }

    /// Put a catalog entry on the list and bump its weight.
    ///
    /// An entry already on the list is a validation error.
    pub async fn add_item_to_list(&self, catalog_id: i64, quantity: i64) -> Result<ShoppingItem> {
        validate_quantity(quantity)?;
        let entry = self.get_catalog_entry(catalog_id).await?;
        match self.get_item(entry.id).await {
            Ok(_) => {
                return Err(Error::Validation(format!(
                    "{} is already on the shopping list",
                    entry.name
                ))
                .into())
            }
            Err(DbError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        let item = self.insert_item(&entry, quantity).await?;
        self.set_catalog_weight(entry.id, entry.weight + 1).await?;
        Ok(item)
    }

    pub async fn set_item_checked(&self, id: i64, checked: bool) -> Result<ShoppingItem> {
        self.update_item_column(id, "checked", (checked as i64).into())
            .await
    }

    pub async fn check_all_items(&self) -> Result<()> {
        self.conn
            .execute("UPDATE shopping_items SET checked = 1", params![])
            .await?;
        Ok(())
    }

    pub async fn update_item_quantity(&self, id: i64, quantity: i64) -> Result<ShoppingItem> {
        validate_quantity(quantity)?;
        self.update_item_column(id, "quantity", quantity.into()).await
    }

    pub async fn delete_item(&self, id: i64) -> Result<ShoppingItem> {
        let item = self.get_item(id).await?;
        self.conn
            .execute("DELETE FROM shopping_items WHERE id = ?", params![id])
            .await?;
        Ok(item)
    }

    /// Remove every item from the list. Returns how many were removed.
    pub async fn clear_items(&self) -> Result<u64> {
        Ok(self
            .conn
            .execute("DELETE FROM shopping_items", params![])
            .await?)
    }

    pub async fn get_item(&self, id: i64) -> Result<ShoppingItem> {
        let query = format!("SELECT {} FROM shopping_items WHERE id = ?", ITEM_COLUMNS);
        self.query_items(&query, vec![id.into()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| item_not_found(id))
    }

    // ===== Helpers =====

    async fn insert_item(&self, entry: &CatalogEntry, quantity: i64) -> Result<ShoppingItem> {
        let item = ShoppingItem {
            id: entry.id,
            name: entry.name.clone(),
            quantity,
            category_id: entry.category_id,
            checked: false,
            price: 0.0,
            created_at: Utc::now(),
        };

        self.conn
            .execute(
                "INSERT INTO shopping_items (id, name, quantity, category_id, checked, price, created_at)
                 VALUES (?, ?, ?, ?, 0, ?, ?)",
                params![
                    item.id,
                    item.name.clone(),
                    item.quantity,
                    item.category_id,
                    item.price,
                    item.created_at.to_rfc3339(),
                ],
            )
            .await?;

        Ok(item)
    }

    async fn next_id(&self, table: &str) -> Result<i64> {
        let query = format!("SELECT COALESCE(MAX(id), 0) + 1 FROM {}", table);
        let mut rows = self.conn.query(&query, params![]).await?;
        if let Some(row) = rows.next().await? {
            Ok(row.get(0)?)
        } else {
            Ok(1)
        }
    }

    async fn update_catalog_column(
        &self,
        id: i64,
        column: &'static str,
        value: turso::Value,
    ) -> Result<CatalogEntry> {
        let query = format!(
            "UPDATE catalog SET {} = ?, updated_at = ? WHERE id = ?",
            column
        );
        let changed = self
            .conn
            .execute(
                &query,
                vec![value, Utc::now().to_rfc3339().into(), id.into()],
            )
            .await?;
        if changed == 0 {
            return Err(catalog_not_found(id));
        }
        self.get_catalog_entry(id).await
    }

    async fn update_item_column(
        &self,
        id: i64,
        column: &'static str,
        value: turso::Value,
    ) -> Result<ShoppingItem> {
        let query = format!("UPDATE shopping_items SET {} = ? WHERE id = ?", column);
        let changed = self.conn.execute(&query, vec![value, id.into()]).await?;
        if changed == 0 {
            return Err(item_not_found(id));
        }
        self.get_item(id).await
    }

    async fn query_catalog(
        &self,
        query: &str,
        params_vec: Vec<turso::Value>,
    ) -> Result<Vec<CatalogEntry>> {
        let mut rows = self.conn.query(query, params_vec).await?;
        let mut entries = Vec::new();

        while let Some(row) = rows.next().await? {
            let created_at: String = row.get(6)?;
            let updated_at: String = row.get(7)?;
            entries.push(CatalogEntry {
                id: row.get(0)?,
                name: row.get(1)?,
                category_id: row.get(2)?,
                location: row.get(3)?,
                weight: row.get(4)?,
                price: row.get(5)?,
                created_at: parse_timestamp(&created_at, "created_at")?,
                updated_at: parse_timestamp(&updated_at, "updated_at")?,
            });
        }
        Ok(entries)
    }

    async fn query_items(
        &self,
        query: &str,
        params_vec: Vec<turso::Value>,
    ) -> Result<Vec<ShoppingItem>> {
        let mut rows = self.conn.query(query, params_vec).await?;
        let mut items = Vec::new();

        while let Some(row) = rows.next().await? {
            let checked: i64 = row.get(4)?;
            let created_at: String = row.get(6)?;
            items.push(ShoppingItem {
                id: row.get(0)?,
                name: row.get(1)?,
                quantity: row.get(2)?,
                category_id: row.get(3)?,
                checked: checked != 0,
                price: row.get(5)?,
                created_at: parse_timestamp(&created_at, "created_at")?,
            });
        }
        Ok(items)
    }
}

fn catalog_not_found(id: i64) -> DbError {
    DbError::NotFound {
        entity: "catalog entry",
        id: id.to_string(),
    }
}

fn item_not_found(id: i64) -> DbError {
    DbError::NotFound {
        entity: "shopping item",
        id: id.to_string(),
    }
}
