//! # Repositories
//!
//! One repository per aggregate, all backed by the shared pool:
//!
//! - [`product::ProductRepository`] - catalog reads/writes (never stock)
//! - [`customer::CustomerRepository`] - customer records
//! - [`user::UserRepository`] - operator accounts and roles
//! - [`stock::StockLedger`] - the only writer of `stock_on_hand`
//! - [`sale::SaleRepository`] - the sale commit protocol and sale reads

pub mod customer;
pub mod product;
pub mod sale;
pub mod stock;
pub mod user;
