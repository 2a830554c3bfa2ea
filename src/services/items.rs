use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func, OnConflict};
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::{
    db::DbPool,
    entities::item::{self, Column as ItemColumn, Entity as Item},
    errors::ServiceError,
    ident::ItemId,
};

/// Normalizes a monetary value to exactly two fractional digits.
pub fn to_money(value: Decimal) -> Decimal {
    let mut normalized = value.round_dp(2);
    normalized.rescale(2);
    normalized
}

/// Input of the upsert-by-name write.
#[derive(Debug, Clone)]
pub struct UpsertItem {
    pub name: String,
    pub category: String,
    pub price: Decimal,
}

/// Result of an upsert: the row's stable identifier, and whether the write
/// inserted a new row rather than updating an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub id: ItemId,
    pub created: bool,
}

/// Date-range query result. `NoMatch` is an explicit marker, distinct from
/// a found-but-empty list (which cannot occur); callers branch on it.
#[derive(Debug, Clone, PartialEq)]
pub enum DateRangeResult {
    Found(Vec<item::Model>),
    NoMatch,
}

/// One aggregated category group.
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total_price: Decimal,
    pub count: i64,
}

/// Category aggregation result, with the same explicit empty marker.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryTotalsResult {
    Found(Vec<CategoryTotal>),
    NoMatch,
}

/// Which categories to aggregate over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySelector {
    All,
    /// Lower-cased; matched case-insensitively against stored values.
    Named(String),
}

impl CategorySelector {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.to_lowercase();
        if normalized == "all" {
            CategorySelector::All
        } else {
            CategorySelector::Named(normalized)
        }
    }
}

/// Service for managing inventory items
#[derive(Clone)]
pub struct ItemService {
    db_pool: Arc<DbPool>,
}

impl ItemService {
    /// Creates a new item service instance
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Creates or updates the item with the given name.
    ///
    /// Identity is the `name` business key. The write is a single atomic
    /// conditional insert: a conflict on the unique name index updates
    /// `category`, `price`, and `last_updated_dt` in place and leaves the
    /// original id untouched, so two concurrent writers for the same new
    /// name still produce exactly one row.
    #[instrument(skip(self))]
    pub async fn upsert(&self, input: UpsertItem) -> Result<UpsertOutcome, ServiceError> {
        let db = &*self.db_pool;

        let name = input.name.trim().to_string();
        let category = input.category.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::validation("name must not be empty"));
        }
        if category.is_empty() {
            return Err(ServiceError::validation("category must not be empty"));
        }
        if input.price < Decimal::ZERO {
            return Err(ServiceError::validation("price cannot be negative"));
        }

        let candidate = ItemId::generate();
        let new_item = item::ActiveModel {
            id: Set(candidate.to_storage()),
            name: Set(name.clone()),
            category: Set(category),
            price: Set(to_money(input.price)),
            last_updated_dt: Set(Utc::now()),
        };

        let stored = Item::insert(new_item)
            .on_conflict(
                OnConflict::column(ItemColumn::Name)
                    .update_columns([
                        ItemColumn::Category,
                        ItemColumn::Price,
                        ItemColumn::LastUpdatedDt,
                    ])
                    .to_owned(),
            )
            .exec_with_returning(db)
            .await
            .map_err(|e| {
                error!(name = %name, error = %e, "Failed to upsert item");
                ServiceError::db_error(e)
            })?;

        let created = stored.id == candidate.to_storage();
        let id = ItemId::from_bytes(&stored.id)?;
        info!(item_id = %id, name = %name, created, "Item upserted");

        Ok(UpsertOutcome { id, created })
    }

    /// Returns every item whose `last_updated_dt` falls within
    /// `[from, to]`, inclusive on both ends. Callers supply the bounds in
    /// order; they are not reordered here.
    #[instrument(skip(self))]
    pub async fn query_by_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<DateRangeResult, ServiceError> {
        let db = &*self.db_pool;

        let items = Item::find()
            .filter(ItemColumn::LastUpdatedDt.between(from, to))
            .order_by_asc(ItemColumn::LastUpdatedDt)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to query items by date range");
                ServiceError::db_error(e)
            })?;

        if items.is_empty() {
            return Ok(DateRangeResult::NoMatch);
        }
        Ok(DateRangeResult::Found(items))
    }

    /// Aggregates items into per-category groups, each with the sum of its
    /// prices and its row count. A named selector filters to a single group,
    /// matching case-insensitively. Groups are ordered lexicographically by
    /// category.
    #[instrument(skip(self))]
    pub async fn aggregate_by_category(
        &self,
        selector: CategorySelector,
    ) -> Result<CategoryTotalsResult, ServiceError> {
        let db = &*self.db_pool;

        let mut query = Item::find()
            .select_only()
            .column(ItemColumn::Category)
            .column_as(Expr::col(ItemColumn::Price).sum(), "total_price")
            .column_as(Expr::col(ItemColumn::Id).count(), "count")
            .group_by(ItemColumn::Category)
            .order_by_asc(ItemColumn::Category);

        if let CategorySelector::Named(category) = &selector {
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(ItemColumn::Category))).eq(category.clone()),
            );
        }

        let groups = query
            .into_model::<CategoryTotal>()
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to aggregate items by category");
                ServiceError::db_error(e)
            })?;

        if groups.is_empty() {
            return Ok(CategoryTotalsResult::NoMatch);
        }
        Ok(CategoryTotalsResult::Found(groups))
    }
}
