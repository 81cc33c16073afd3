//! Role business logic - Seeding and lookup of the three access levels.

use crate::{
    entities::{Role, role},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use std::fmt;
use std::str::FromStr;
use tracing::{info, instrument};

/// The roles a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleName {
    Admin,
    Parent,
    CanteenManager,
}

impl RoleName {
    /// All roles, in seeding order.
    pub const ALL: [Self; 3] = [Self::Admin, Self::Parent, Self::CanteenManager];

    /// Name stored in the `roles` table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Parent => "PARENT",
            Self::CanteenManager => "CANTEEN_MANAGER",
        }
    }

    const fn description(self) -> &'static str {
        match self {
            Self::Admin => "System administrator with full access to all features",
            Self::Parent => "Parent user who can manage funds and child profiles",
            Self::CanteenManager => "User who manages canteen operations and products",
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "PARENT" => Ok(Self::Parent),
            // Older clients still send the operator spelling
            "CANTEEN_MANAGER" | "CANTEEN_OPERATOR" => Ok(Self::CanteenManager),
            other => Err(Error::validation(format!("Unknown role '{other}'"))),
        }
    }
}

/// Permissions granted to every seeded role.
pub const DEFAULT_PERMISSIONS: &str = "create,delete,update";

/// Inserts any of the default roles that are missing. Safe to run on every start.
#[instrument(skip(db))]
pub async fn seed_default_roles<C>(db: &C) -> Result<Vec<role::Model>>
where
    C: ConnectionTrait,
{
    let mut roles = Vec::with_capacity(RoleName::ALL.len());
    for name in RoleName::ALL {
        if let Some(existing) = get_role_by_name(db, name).await? {
            roles.push(existing);
            continue;
        }

        let model = role::ActiveModel {
            name: Set(name.as_str().to_string()),
            description: Set(name.description().to_string()),
            permissions: Set(DEFAULT_PERMISSIONS.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        info!("Seeded role {}", name);
        roles.push(model);
    }
    Ok(roles)
}

/// Finds a role by name.
pub async fn get_role_by_name<C>(db: &C, name: RoleName) -> Result<Option<role::Model>>
where
    C: ConnectionTrait,
{
    Role::find()
        .filter(role::Column::Name.eq(name.as_str()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Resolves the name of the role with the given id.
pub async fn role_name_of<C>(db: &C, role_id: i64) -> Result<Option<RoleName>>
where
    C: ConnectionTrait,
{
    let Some(role) = Role::find_by_id(role_id).one(db).await? else {
        return Ok(None);
    };
    Ok(role.name.parse().ok())
}
