pub mod ai;
pub mod auth;
pub mod entries;
pub mod groups;
pub mod health;
