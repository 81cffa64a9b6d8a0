pub mod catalog;
pub mod db;
pub mod news;
pub mod users;

pub use catalog::{load_catalog_file, TickerCatalogEntry};
pub use db::NewsDb;
pub use news::NewArticle;
