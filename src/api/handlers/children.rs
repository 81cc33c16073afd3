use crate::{
    api::{
        AppState,
        extract::{ApiJson, ApiPath},
        response::{ApiResult, OptionExt, Reply, ResultExt},
    },
    core::child::{self, ChildDetails, ChildUpdate, ChildWithTransactions, NewChild},
    entities::child_profile,
};
use axum::extract::State;

/// `POST /children`
pub async fn create_child(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewChild>,
) -> ApiResult<child_profile::Model> {
    let child = child::create_child(state.db.as_ref(), body)
        .await
        .or_respond("Failed to create a new child")?;
    Ok(Reply::created(child))
}

/// `GET /children/{id}`
pub async fn get_child(
    State(state): State<AppState>,
    ApiPath(child_id): ApiPath<i64>,
) -> ApiResult<ChildDetails> {
    let details = child::get_child_details(state.db.as_ref(), child_id)
        .await
        .or_respond("Failed to fetch child")?
        .or_not_found("Child")?;
    Ok(Reply::ok(details))
}

/// `PATCH /children/{id}`
pub async fn update_child(
    State(state): State<AppState>,
    ApiPath(child_id): ApiPath<i64>,
    ApiJson(body): ApiJson<ChildUpdate>,
) -> ApiResult<child_profile::Model> {
    let child = child::update_child(state.db.as_ref(), child_id, body)
        .await
        .or_respond("Failed to update child")?;
    Ok(Reply::ok(child))
}

/// `DELETE /children/{id}`
pub async fn delete_child(
    State(state): State<AppState>,
    ApiPath(child_id): ApiPath<i64>,
) -> ApiResult<child_profile::Model> {
    let child = child::delete_child(state.db.as_ref(), child_id)
        .await
        .or_respond("Failed to delete child")?;
    Ok(Reply::ok(child))
}

/// `GET /children/parent/{id}`
pub async fn children_of_parent(
    State(state): State<AppState>,
    ApiPath(parent_id): ApiPath<i64>,
) -> ApiResult<Vec<ChildWithTransactions>> {
    let children = child::list_children_by_parent(state.db.as_ref(), parent_id)
        .await
        .or_respond("Failed to fetch children")?;
    Ok(Reply::ok(children))
}
