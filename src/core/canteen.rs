//! Canteen business logic - Registration of canteens and the manager access check.
//!
//! Each canteen manager runs exactly one canteen. Every `/canteen/*` operation first
//! resolves the caller through [`require_canteen_manager`].

use crate::{
    core::{role::RoleName, user::get_user_with_role},
    entities::{Canteen, canteen, user},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

const ALREADY_RUNS_CANTEEN: &str = "This manager already runs a canteen";

/// Input for [`create_canteen`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewCanteen {
    pub name: String,
    pub location: Option<String>,
}

/// Loads the caller and fails unless they hold the canteen manager role.
async fn require_manager_role(db: &DatabaseConnection, user_id: i64) -> Result<user::Model> {
    let (user, role) = get_user_with_role(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;
    if role != RoleName::CanteenManager {
        return Err(Error::Forbidden {
            message: "Only canteen managers can access this data".to_string(),
        });
    }
    Ok(user)
}

/// Registers the canteen run by `manager_id`.
///
/// # Errors
/// - `Validation` when the name is blank
/// - `NotFound` when the manager does not exist
/// - `Forbidden` when the user is not a canteen manager
/// - `Conflict` when the manager already runs a canteen
#[instrument(skip(db, new_canteen))]
pub async fn create_canteen(
    db: &DatabaseConnection,
    manager_id: i64,
    new_canteen: NewCanteen,
) -> Result<canteen::Model> {
    let name = new_canteen.name.trim();
    if name.is_empty() {
        return Err(Error::validation("Canteen name is required"));
    }

    require_manager_role(db, manager_id).await?;
    if get_canteen_for_manager(db, manager_id).await?.is_some() {
        return Err(Error::Conflict {
            message: ALREADY_RUNS_CANTEEN.to_string(),
        });
    }

    let canteen = canteen::ActiveModel {
        name: Set(name.to_string()),
        location: Set(new_canteen
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())),
        manager_id: Set(manager_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| Error::conflict_on_duplicate(e, ALREADY_RUNS_CANTEEN))?;

    info!("Registered canteen {} for manager {}", canteen.id, manager_id);
    Ok(canteen)
}

/// Finds the canteen run by `manager_id`.
pub async fn get_canteen_for_manager<C>(db: &C, manager_id: i64) -> Result<Option<canteen::Model>>
where
    C: ConnectionTrait,
{
    Canteen::find()
        .filter(canteen::Column::ManagerId.eq(manager_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Resolves a canteen manager and the canteen they run.
///
/// # Errors
/// - `NotFound` when the user does not exist or has no canteen yet
/// - `Forbidden` when the user is not a canteen manager
pub async fn require_canteen_manager(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<(user::Model, canteen::Model)> {
    let user = require_manager_role(db, user_id).await?;
    let canteen = get_canteen_for_manager(db, user.id)
        .await?
        .ok_or_else(|| Error::not_found("Canteen", user.id))?;
    Ok((user, canteen))
}
