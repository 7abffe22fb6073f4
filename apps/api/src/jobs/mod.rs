pub mod finn;
pub mod handlers;
pub mod repository;
pub mod timeframe;
