pub mod entry;
pub mod group;
pub mod user;
