use super::ListQuery;
use crate::{
    api::{
        AppState,
        extract::{ApiJson, ApiPath, ApiQuery},
        response::{ApiResult, OptionExt, Reply, ResultExt},
    },
    core::{
        user::{self, CreatedUser, NewUser, UserWithWallet},
        wallet::get_wallet_for_user,
    },
};
use axum::extract::State;
use serde_json::{Value, json};

/// `POST /users` - sign up. The only write that needs no API key.
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewUser>,
) -> ApiResult<CreatedUser> {
    let created = user::create_user(state.db.as_ref(), input)
        .await
        .or_respond("Failed to create user")?;
    Ok(Reply::created(created))
}

/// `GET /users`
pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Vec<UserWithWallet>> {
    let page = user::list_users(
        state.db.as_ref(),
        query.search.as_deref(),
        query.page_request(&state),
    )
    .await
    .or_respond("Failed to fetch users")?;
    Ok(Reply::page(page))
}

/// `GET /users/{id}`
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
) -> ApiResult<UserWithWallet> {
    let context = "Failed to fetch user";
    let user = user::get_user_by_id(state.db.as_ref(), user_id)
        .await
        .or_respond(context)?
        .or_not_found("User")?;
    let wallet = get_wallet_for_user(state.db.as_ref(), user_id)
        .await
        .or_respond(context)?;
    Ok(Reply::ok(UserWithWallet { user, wallet }))
}

/// `DELETE /users/{id}`
pub async fn delete_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
) -> ApiResult<Value> {
    user::delete_user(state.db.as_ref(), user_id)
        .await
        .or_respond("Failed to delete user")?;
    Ok(Reply::ok(json!({ "id": user_id })))
}
