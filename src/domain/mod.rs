pub mod models;
pub mod results;
