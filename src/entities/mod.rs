//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod api_key;
pub mod canteen;
pub mod child_profile;
pub mod product;
pub mod role;
pub mod transaction;
pub mod user;
pub mod wallet;

// Re-export specific types to avoid conflicts
pub use api_key::{Column as ApiKeyColumn, Entity as ApiKey, Model as ApiKeyModel};
pub use canteen::{Column as CanteenColumn, Entity as Canteen, Model as CanteenModel};
pub use child_profile::{
    Column as ChildProfileColumn, Entity as ChildProfile, Model as ChildProfileModel,
};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use role::{Column as RoleColumn, Entity as Role, Model as RoleModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
    TransactionStatus, TransactionType,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use wallet::{Column as WalletColumn, Entity as Wallet, Model as WalletModel};
