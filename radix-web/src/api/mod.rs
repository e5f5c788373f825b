//! JSON endpoints

pub mod health;
pub mod revalidate;
pub mod search;

pub use health::health_routes;
pub use revalidate::revalidate;
pub use search::search_people;
