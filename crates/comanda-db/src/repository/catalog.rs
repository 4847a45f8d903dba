//! # Catalog Repository
//!
//! Products and quantities as the order workflow reads them. The catalog is
//! managed elsewhere; the insert methods here exist for seeding and tests.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use comanda_core::repository::{ProductRepository, QuantityRepository};
use comanda_core::{
    Category, CoreResult, Money, Multiplier, Product, Quantity, RequestContext, Size, TenantSchema,
};

use crate::error::{DbError, DbResult};

/// Product joined with its category and size.
#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    code: String,
    name: String,
    description: Option<String>,
    price_cents: i64,
    cost_cents: i64,
    is_available: bool,
    category_id: Uuid,
    size_id: Option<Uuid>,
    category_name: Option<String>,
    category_need_print: Option<bool>,
    size_name: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let category = row.category_name.map(|name| Category {
            id: row.category_id,
            name,
            need_print: row.category_need_print.unwrap_or(false),
        });
        let size = match (row.size_id, row.size_name) {
            (Some(id), Some(name)) => Some(Size {
                id,
                name,
                category_id: row.category_id,
            }),
            _ => None,
        };

        Product {
            id: row.id,
            code: row.code,
            name: row.name,
            description: row.description,
            price: Money::from_cents(row.price_cents),
            cost: Money::from_cents(row.cost_cents),
            is_available: row.is_available,
            category_id: row.category_id,
            category,
            size_id: row.size_id,
            size,
        }
    }
}

#[derive(Debug, FromRow)]
struct QuantityRow {
    id: Uuid,
    category_id: Uuid,
    thousandths: i64,
}

/// Repository for catalog reads (and seeding writes).
#[derive(Debug, Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        PgCatalogRepository { pool }
    }

    pub async fn get_product(&self, schema: &TenantSchema, id: Uuid) -> DbResult<Product> {
        let sql = format!(
            "SELECT p.id, p.code, p.name, p.description, p.price_cents, p.cost_cents, \
             p.is_available, p.category_id, p.size_id, \
             c.name AS category_name, c.need_print AS category_need_print, \
             s.name AS size_name \
             FROM {} p \
             LEFT JOIN {} c ON c.id = p.category_id \
             LEFT JOIN {} s ON s.id = p.size_id \
             WHERE p.id = $1",
            schema.qualify("products"),
            schema.qualify("categories"),
            schema.qualify("sizes")
        );

        let row: ProductRow = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("product", id))?;

        Ok(row.into())
    }

    pub async fn get_quantity(&self, schema: &TenantSchema, id: Uuid) -> DbResult<Quantity> {
        let sql = format!(
            "SELECT id, category_id, thousandths FROM {} WHERE id = $1",
            schema.qualify("quantities")
        );

        let row: QuantityRow = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("quantity", id))?;

        Ok(Quantity {
            id: row.id,
            category_id: row.category_id,
            value: Multiplier::from_thousandths(row.thousandths),
        })
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    pub async fn count_products(&self, schema: &TenantSchema) -> DbResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", schema.qualify("products"));
        Ok(sqlx::query_scalar(&sql).fetch_one(&self.pool).await?)
    }

    pub async fn insert_category(&self, schema: &TenantSchema, category: &Category) -> DbResult<()> {
        debug!(schema = %schema, name = %category.name, "Inserting category");
        let sql = format!(
            "INSERT INTO {} (id, name, need_print) VALUES ($1, $2, $3)",
            schema.qualify("categories")
        );
        sqlx::query(&sql)
            .bind(category.id)
            .bind(&category.name)
            .bind(category.need_print)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_size(&self, schema: &TenantSchema, size: &Size) -> DbResult<()> {
        let sql = format!(
            "INSERT INTO {} (id, name, category_id) VALUES ($1, $2, $3)",
            schema.qualify("sizes")
        );
        sqlx::query(&sql)
            .bind(size.id)
            .bind(&size.name)
            .bind(size.category_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_quantity(&self, schema: &TenantSchema, quantity: &Quantity) -> DbResult<()> {
        let sql = format!(
            "INSERT INTO {} (id, category_id, thousandths) VALUES ($1, $2, $3)",
            schema.qualify("quantities")
        );
        sqlx::query(&sql)
            .bind(quantity.id)
            .bind(quantity.category_id)
            .bind(quantity.value.thousandths())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Inserts a product. `category` and `size` are ignored; only their ids
    /// are stored.
    pub async fn insert_product(&self, schema: &TenantSchema, product: &Product) -> DbResult<()> {
        debug!(schema = %schema, code = %product.code, "Inserting product");
        let sql = format!(
            "INSERT INTO {} (id, code, name, description, price_cents, cost_cents, \
             is_available, category_id, size_id) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            schema.qualify("products")
        );
        sqlx::query(&sql)
            .bind(product.id)
            .bind(&product.code)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price.cents())
            .bind(product.cost.cents())
            .bind(product.is_available)
            .bind(product.category_id)
            .bind(product.size_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for PgCatalogRepository {
    async fn get_product_by_id(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<Product> {
        Ok(self.get_product(ctx.schema()?, id).await?)
    }
}

#[async_trait]
impl QuantityRepository for PgCatalogRepository {
    async fn get_quantity_by_id(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<Quantity> {
        Ok(self.get_quantity(ctx.schema()?, id).await?)
    }
}
