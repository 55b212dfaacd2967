//! Card collection: models and the in-memory repository.

mod models;
mod repository;

pub use models::*;
pub use repository::CardRepository;
