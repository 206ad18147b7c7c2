//! Business logic services for the Bakehouse Inventory Platform

pub mod activity;
pub mod ingredient;
pub mod production;

pub use activity::ActivityService;
pub use ingredient::IngredientService;
pub use production::ProductionService;
