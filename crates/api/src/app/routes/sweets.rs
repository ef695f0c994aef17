use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post, put},
};

use sweetshop_auth::Identity;
use sweetshop_core::{DomainError, ItemId};
use sweetshop_infra::DispatchOutcome;
use sweetshop_inventory::{InventoryCommand, InventoryItem, Operation};

use crate::app::dto::{CreateItemRequest, ItemResponse, MessageResponse, RestockRequest, UpdateItemRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:id", put(update_item).delete(delete_item))
        .route("/:id/restock", post(restock_item))
        .route("/:id/purchase", post(purchase_item))
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    match services.dispatcher.dispatch(&identity, InventoryCommand::List).await? {
        DispatchOutcome::Items(items) => Ok(Json(items)),
        other => Err(unexpected(other)),
    }
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    services.dispatcher.authorize(&identity, Operation::Create)?;
    let Json(body) = payload?;
    let command = InventoryCommand::Create(body.into_new_item()?);

    match services.dispatcher.dispatch(&identity, command).await? {
        DispatchOutcome::Created(item) => Ok((
            StatusCode::CREATED,
            Json(ItemResponse {
                message: "Sweet added successfully!",
                item,
            }),
        )),
        other => Err(unexpected(other)),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<Json<ItemResponse>, ApiError> {
    services.dispatcher.authorize(&identity, Operation::UpdateFields)?;
    let id: ItemId = id.parse()?;
    let Json(body) = payload?;
    let command = InventoryCommand::UpdateFields {
        id,
        patch: body.into_patch()?,
    };

    updated(&services, &identity, command, "Sweet updated successfully!").await
}

pub async fn restock_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    payload: Result<Json<RestockRequest>, JsonRejection>,
) -> Result<Json<ItemResponse>, ApiError> {
    services.dispatcher.authorize(&identity, Operation::Restock)?;
    let id: ItemId = id.parse()?;
    let Json(body) = payload?;
    let command = InventoryCommand::Restock {
        id,
        amount: body.amount()?,
    };

    updated(&services, &identity, command, "Sweet restocked successfully!").await
}

pub async fn purchase_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, ApiError> {
    let id: ItemId = id.parse()?;
    updated(&services, &identity, InventoryCommand::Purchase { id }, "Sweet purchased successfully!").await
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    services.dispatcher.authorize(&identity, Operation::Delete)?;
    let id: ItemId = id.parse()?;
    match services.dispatcher.dispatch(&identity, InventoryCommand::Delete { id }).await? {
        DispatchOutcome::Deleted(_) => Ok(Json(MessageResponse::new("Sweet deleted successfully."))),
        other => Err(unexpected(other)),
    }
}

async fn updated(
    services: &AppServices,
    identity: &Identity,
    command: InventoryCommand,
    message: &'static str,
) -> Result<Json<ItemResponse>, ApiError> {
    match services.dispatcher.dispatch(identity, command).await? {
        DispatchOutcome::Updated(item) => Ok(Json(ItemResponse { message, item })),
        other => Err(unexpected(other)),
    }
}

fn unexpected(outcome: DispatchOutcome) -> ApiError {
    ApiError(DomainError::internal(format!("unexpected dispatch outcome: {outcome:?}")))
}
