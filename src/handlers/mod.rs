pub mod auth;
pub mod db;
#[cfg(test)]
pub mod memory_repository;
pub mod password;
pub mod repository;
