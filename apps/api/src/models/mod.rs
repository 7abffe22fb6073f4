pub mod cv;
pub mod ids;
pub mod job;
pub mod search;
pub mod user;
