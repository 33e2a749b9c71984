//! Product repository backed by `storefront.product`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use dorodango_core::{Product, ProductId};

use super::RepositoryError;
use crate::remote::CatalogRemote;

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    artisan: String,
    price: Decimal,
    image: String,
    images: Vec<String>,
    tag: Option<String>,
    description: String,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            artisan: row.artisan,
            price: row.price,
            image: row.image,
            images: row.images,
            tag: row.tag,
            description: row.description,
            updated_at: row.updated_at,
        }
    }
}

/// `PostgreSQL` adapter for [`CatalogRemote`].
#[derive(Clone)]
pub struct PgCatalogRemote {
    pool: PgPool,
}

impl PgCatalogRemote {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRemote for PgCatalogRemote {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, artisan, price, image, images, tag, description, updated_at
            FROM storefront.product
            ORDER BY created_at DESC, id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn create(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.product
                (id, name, artisan, price, image, images, tag, description, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.artisan)
        .bind(product.price)
        .bind(&product.image)
        .bind(&product.images)
        .bind(&product.tag)
        .bind(&product.description)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "product"))?;

        Ok(())
    }

    async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.product WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
