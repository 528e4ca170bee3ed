// hertrade/src/models/mod.rs

//! Data structures representing database entities and the joined views built from them.

pub mod account;
pub mod cart_item;
pub mod order;
pub mod product;
pub mod profile;

pub use account::{Account, Session};
pub use cart_item::{CartItem, CartLine};
pub use order::{BuyerOrderView, NewOrder, Order, OrderStatus, SupplierOrderView};
pub use product::{NewProduct, Product, ProductFilter, ProductListing, ProductStatus};
pub use profile::{NewAccount, Profile, Role};
