pub mod ai;
pub mod pulse;
