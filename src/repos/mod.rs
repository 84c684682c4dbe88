pub mod error;
#[cfg(test)]
pub mod memory;
pub mod product_repo;
pub mod user_repo;
