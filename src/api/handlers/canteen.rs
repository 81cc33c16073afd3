//! Every route here acts for the canteen manager named by [`Caller`].

use crate::{
    api::{
        AppState,
        extract::{ApiJson, ApiPath, Caller},
        response::{ApiResult, Reply, ResultExt},
    },
    core::{
        canteen::{self, NewCanteen, require_canteen_manager},
        child::list_all_children,
        product::{self, NewProduct, ProductUpdate},
        transaction::{PurchaseReceipt, PurchaseRequest, process_purchase},
    },
    entities::{canteen as canteen_entity, child_profile, product as product_entity},
};
use axum::extract::State;

/// `POST /canteen` - register the caller's canteen.
pub async fn register_canteen(
    State(state): State<AppState>,
    Caller(manager_id): Caller,
    ApiJson(body): ApiJson<NewCanteen>,
) -> ApiResult<canteen_entity::Model> {
    let canteen = canteen::create_canteen(state.db.as_ref(), manager_id, body)
        .await
        .or_respond("Failed to register canteen")?;
    Ok(Reply::created(canteen))
}

/// `GET /canteen/children`
pub async fn list_children(
    State(state): State<AppState>,
    Caller(manager_id): Caller,
) -> ApiResult<Vec<child_profile::Model>> {
    let context = "Failed to fetch children";
    require_canteen_manager(state.db.as_ref(), manager_id)
        .await
        .or_respond(context)?;
    let children = list_all_children(state.db.as_ref()).await.or_respond(context)?;
    Ok(Reply::ok(children))
}

/// `GET /canteen/products`
pub async fn list_products(
    State(state): State<AppState>,
    Caller(manager_id): Caller,
) -> ApiResult<Vec<product_entity::Model>> {
    let context = "Failed to fetch products";
    let (_, canteen) = require_canteen_manager(state.db.as_ref(), manager_id)
        .await
        .or_respond(context)?;
    let products = product::list_products_for_canteen(state.db.as_ref(), canteen.id)
        .await
        .or_respond(context)?;
    Ok(Reply::ok(products))
}

/// `POST /canteen/products`
pub async fn create_product(
    State(state): State<AppState>,
    Caller(manager_id): Caller,
    ApiJson(body): ApiJson<NewProduct>,
) -> ApiResult<product_entity::Model> {
    let context = "Failed to create product";
    let (_, canteen) = require_canteen_manager(state.db.as_ref(), manager_id)
        .await
        .or_respond(context)?;
    let product = product::create_product(state.db.as_ref(), canteen.id, body)
        .await
        .or_respond(context)?;
    Ok(Reply::created(product))
}

/// `PATCH /canteen/products/{id}`
pub async fn update_product(
    State(state): State<AppState>,
    Caller(manager_id): Caller,
    ApiPath(product_id): ApiPath<i64>,
    ApiJson(body): ApiJson<ProductUpdate>,
) -> ApiResult<product_entity::Model> {
    let context = "Failed to update product";
    let (_, canteen) = require_canteen_manager(state.db.as_ref(), manager_id)
        .await
        .or_respond(context)?;
    let product = product::update_product(state.db.as_ref(), canteen.id, product_id, body)
        .await
        .or_respond(context)?;
    Ok(Reply::ok(product))
}

/// `POST /canteen/transaction` - check out a basket against a child's card.
pub async fn checkout(
    State(state): State<AppState>,
    Caller(manager_id): Caller,
    ApiJson(body): ApiJson<PurchaseRequest>,
) -> ApiResult<PurchaseReceipt> {
    let receipt = process_purchase(state.db.as_ref(), manager_id, body)
        .await
        .or_respond("Failed to process transaction")?;
    Ok(Reply::created(receipt))
}
