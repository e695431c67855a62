pub mod evaluator;
pub mod events;
pub mod listing;
pub mod model;
pub mod resolution;
pub mod status;
