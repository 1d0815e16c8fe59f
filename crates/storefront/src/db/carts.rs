//! `PostgreSQL` cart store.
//!
//! Each cart is a single row whose `items` column holds the whole line list
//! as JSONB. Saving replaces the document; there is no per-line table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use cartline_core::{AccountId, Cart, CartItem};

use super::{CartStore, RepositoryError};

#[derive(sqlx::FromRow)]
struct CartRow {
    account_id: i64,
    items: Json<Vec<CartItem>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            owner: AccountId::new(row.account_id),
            items: row.items.0,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        }
    }
}

/// Cart repository backed by `storefront.cart`.
#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    /// Create a new cart store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn get(&self, owner: AccountId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT account_id, items, created_at, updated_at
            FROM storefront.cart
            WHERE account_id = $1
            ",
        )
        .bind(owner.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Cart::from))
    }

    async fn save(&self, cart: &Cart) -> Result<(), RepositoryError> {
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO storefront.cart (account_id, items, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (account_id) DO UPDATE
            SET items = EXCLUDED.items,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(cart.owner.as_i64())
        .bind(Json(&cart.items))
        .bind(cart.created_at.unwrap_or(now))
        .bind(cart.updated_at.unwrap_or(now))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
