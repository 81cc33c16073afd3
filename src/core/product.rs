//! Product business logic - The menu of a canteen.
//!
//! Products belong to exactly one canteen and carry a fixed price. Managers only ever see
//! and edit the products of their own canteen; a product marked unavailable stays listed
//! but cannot be sold.

use crate::{
    entities::{Product, product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Shortest accepted product name, after trimming.
pub const MIN_PRODUCT_NAME_LEN: usize = 2;

/// Input for [`create_product`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
}

/// Fields a manager may change on a product.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub is_available: Option<bool>,
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.chars().count() < MIN_PRODUCT_NAME_LEN {
        return Err(Error::validation(format!(
            "Product name must be at least {MIN_PRODUCT_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn validate_price(price: f64) -> Result<f64> {
    if !price.is_finite() || price <= 0.0 {
        return Err(Error::InvalidAmount { amount: price });
    }
    Ok(price)
}

/// Retrieves the products of a canteen, newest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_products_for_canteen(
    db: &DatabaseConnection,
    canteen_id: i64,
) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::CanteenId.eq(canteen_id))
        .order_by_desc(product::Column::CreatedAt)
        .order_by_desc(product::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific product by its unique ID.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Adds a product to a canteen's menu. New products are available immediately.
///
/// # Errors
/// Returns an error if:
/// - The trimmed name is shorter than [`MIN_PRODUCT_NAME_LEN`]
/// - The price is zero, negative or not finite
/// - The database insert operation fails
#[instrument(skip(db, new_product))]
pub async fn create_product(
    db: &DatabaseConnection,
    canteen_id: i64,
    new_product: NewProduct,
) -> Result<product::Model> {
    let name = validate_name(&new_product.name)?;
    let price = validate_price(new_product.price)?;
    let now = chrono::Utc::now();

    let product = product::ActiveModel {
        name: Set(name),
        price: Set(price),
        canteen_id: Set(canteen_id),
        is_available: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Added product {} to canteen {}", product.id, canteen_id);
    Ok(product)
}

/// Applies a partial update to a product of the given canteen.
///
/// # Errors
/// Returns an error if:
/// - A new name or price fails the same checks as [`create_product`]
/// - The product does not exist or belongs to another canteen
/// - The database update operation fails
#[instrument(skip(db, update))]
pub async fn update_product(
    db: &DatabaseConnection,
    canteen_id: i64,
    product_id: i64,
    update: ProductUpdate,
) -> Result<product::Model> {
    let name = update.name.as_deref().map(validate_name).transpose()?;
    let price = update.price.map(validate_price).transpose()?;

    let product = get_product_by_id(db, product_id)
        .await?
        .filter(|p| p.canteen_id == canteen_id)
        .ok_or_else(|| Error::not_found("Product", product_id))?;

    let mut product: product::ActiveModel = product.into();
    if let Some(name) = name {
        product.name = Set(name);
    }
    if let Some(price) = price {
        product.price = Set(price);
    }
    if let Some(is_available) = update.is_available {
        product.is_available = Set(is_available);
    }
    product.updated_at = Set(chrono::Utc::now());

    product.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn new_product(name: &str, price: f64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price,
        }
    }

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        for name in ["", "   ", " A "] {
            let result = create_product(&db, 1, new_product(name, 10.0)).await;
            assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));
        }

        let result = create_product(&db, 1, new_product("Juice", -10.0)).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: -10.0 }
        ));

        for price in [0.0, f64::NAN, f64::INFINITY] {
            let result = create_product(&db, 1, new_product("Juice", price)).await;
            assert!(matches!(result.unwrap_err(), Error::InvalidAmount { amount: _ }));
        }

        let update = ProductUpdate {
            price: Some(0.0),
            ..Default::default()
        };
        let result = update_product(&db, 1, 1, update).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { amount: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_list_products() -> Result<()> {
        let (db, canteen) = setup_with_canteen().await?;

        let rice = create_product(&db, canteen.id, new_product(" Rice and beans ", 3.5)).await?;
        assert_eq!(rice.name, "Rice and beans");
        assert_eq!(rice.price, 3.5);
        assert!(rice.is_available);
        let juice = create_product(&db, canteen.id, new_product("Juice", 1.0)).await?;

        let products = list_products_for_canteen(&db, canteen.id).await?;
        assert_eq!(products, vec![juice, rice]);

        assert!(list_products_for_canteen(&db, canteen.id + 1).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_integration() -> Result<()> {
        let (db, canteen) = setup_with_canteen().await?;
        let product = create_test_product(&db, canteen.id, "Samosa", 1.5).await?;

        let updated = update_product(
            &db,
            canteen.id,
            product.id,
            ProductUpdate {
                price: Some(2.0),
                is_available: Some(false),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.name, "Samosa");
        assert_eq!(updated.price, 2.0);
        assert!(!updated.is_available);

        let retrieved = get_product_by_id(&db, product.id).await?.unwrap();
        assert_eq!(retrieved, updated);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_of_another_canteen() -> Result<()> {
        let (db, canteen) = setup_with_canteen().await?;
        let product = create_test_product(&db, canteen.id, "Chapati", 0.5).await?;

        let update = ProductUpdate {
            name: Some("Stolen".to_string()),
            ..Default::default()
        };
        let result = update_product(&db, canteen.id + 1, product.id, update.clone()).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { entity: "Product", .. }));

        let result = update_product(&db, canteen.id, 999, update).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        let unchanged = get_product_by_id(&db, product.id).await?.unwrap();
        assert_eq!(unchanged.name, "Chapati");

        Ok(())
    }
}
