//! Catalogue queries.

use async_trait::async_trait;
use rust_decimal::Decimal;

use mercato_core::ProductId;

use super::{PgStore, ProductStore, RepositoryError};
use crate::models::{NewProduct, Product};

const PRODUCT_COLUMNS: &str = "id, name, description, price, image, category, is_featured";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    price: Decimal,
    image: String,
    category: String,
    is_featured: bool,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            image: row.image,
            category: row.category,
            is_featured: row.is_featured,
        }
    }
}

impl PgStore {
    async fn fetch_products(
        &self,
        query: sqlx::query::QueryAs<'_, sqlx::Postgres, ProductRow, sqlx::postgres::PgArguments>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM storefront.product ORDER BY id");
        self.fetch_products(sqlx::query_as(&sql)).await
    }

    async fn list_featured(&self) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE is_featured ORDER BY id"
        );
        self.fetch_products(sqlx::query_as(&sql)).await
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE category = $1 ORDER BY id"
        );
        self.fetch_products(sqlx::query_as(&sql).bind(category)).await
    }

    async fn sample(&self, limit: usize) -> Result<Vec<Product>, RepositoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product ORDER BY random() LIMIT $1"
        );
        self.fetch_products(sqlx::query_as(&sql).bind(limit)).await
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO storefront.product (name, description, price, image, category)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image)
        .bind(&product.category)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn toggle_featured(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE storefront.product SET is_featured = NOT is_featured
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.product WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM storefront.product")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
