use axum::{
    extract::{Query, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::{Validate, ValidationError};

use crate::{
    entities::item,
    errors::ServiceError,
    handlers::common::{created_response, success_response, validate_input},
    ident::ItemId,
    services::items::{
        to_money, CategorySelector, CategoryTotal, CategoryTotalsResult, DateRangeResult,
        UpsertItem,
    },
    AppState,
};

/// In-band replacement for an item id that fails to decode; the row is
/// still returned.
const INVALID_ENCODING_MARKER: &str = "Invalid encoding";

const NO_ITEMS_IN_RANGE: &str = "No items found within the specified date range";

pub fn items_routes() -> Router<AppState> {
    Router::new()
        .route("/items/", post(create_item).get(query_items_within_date_range))
        .route("/items-by-category/", get(query_items_by_category))
}

fn validate_decimal_min_zero(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("decimal_min_zero"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "category must not be empty"))]
    pub category: String,
    #[validate(custom = "validate_decimal_min_zero")]
    pub price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeParams {
    pub dt_from: DateTime<Utc>,
    pub dt_to: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryParams {
    pub category: String,
}

#[derive(Debug, Serialize)]
pub struct ItemDto {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub last_updated_dt: DateTime<Utc>,
}

impl ItemDto {
    fn from_model(model: item::Model) -> Self {
        let id = match ItemId::from_bytes(&model.id) {
            Ok(id) => id.to_string(),
            Err(_) => INVALID_ENCODING_MARKER.to_string(),
        };
        Self {
            id,
            name: model.name,
            category: model.category,
            price: to_money(model.price),
            last_updated_dt: model.last_updated_dt,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DateRangeItemsResponse {
    pub items: Vec<ItemDto>,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CategoryItemsResponse {
    pub items: Vec<CategoryTotal>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Create or update an item, keyed by name. Responds 201 for a newly
/// created item and 200 for an update; the id is in canonical form on
/// both paths.
async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateItemRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    debug!(name = %payload.name, "Creating item");

    let outcome = state
        .item_service()
        .upsert(UpsertItem {
            name: payload.name,
            category: payload.category,
            price: payload.price,
        })
        .await?;

    let body = ItemResponse {
        id: outcome.id.to_string(),
    };
    if outcome.created {
        Ok(created_response(body))
    } else {
        Ok(success_response(body))
    }
}

/// List items whose last update falls within the inclusive range, along
/// with the sum of their prices.
async fn query_items_within_date_range(
    State(state): State<AppState>,
    Query(params): Query<DateRangeParams>,
) -> Result<Response, ServiceError> {
    match state
        .item_service()
        .query_by_date_range(params.dt_from, params.dt_to)
        .await?
    {
        DateRangeResult::Found(models) => {
            let total_price = to_money(models.iter().map(|m| m.price).sum());
            let items: Vec<ItemDto> = models.into_iter().map(ItemDto::from_model).collect();
            Ok(success_response(DateRangeItemsResponse { items, total_price }))
        }
        DateRangeResult::NoMatch => Ok(success_response(MessageResponse {
            message: NO_ITEMS_IN_RANGE.to_string(),
        })),
    }
}

/// Aggregate items by category, or for one category when the query names
/// it. The literal category "all" selects every group.
async fn query_items_by_category(
    State(state): State<AppState>,
    Query(params): Query<CategoryParams>,
) -> Result<Response, ServiceError> {
    debug!(category = %params.category, "Aggregating items by category");

    let selector = CategorySelector::parse(&params.category);
    match state.item_service().aggregate_by_category(selector).await? {
        CategoryTotalsResult::Found(mut groups) => {
            for group in &mut groups {
                group.total_price = to_money(group.total_price);
            }
            Ok(success_response(CategoryItemsResponse { items: groups }))
        }
        CategoryTotalsResult::NoMatch => Ok(success_response(MessageResponse {
            message: format!("No items found for category: {}", params.category),
        })),
    }
}
