pub mod listing;
pub mod middleware;
pub mod threading;
pub mod validation;
