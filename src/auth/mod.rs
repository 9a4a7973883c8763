pub mod password;
pub mod rate_limit;
