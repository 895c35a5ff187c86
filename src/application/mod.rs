pub mod articles;
pub mod categories;
pub mod clients;
pub mod error;
pub mod products;
