pub mod auth_service;
pub mod bid_service;
pub mod identity_service;
pub mod policy;
pub mod product_service;
pub mod session_service;
pub mod user_service;

#[cfg(test)]
pub mod testing;
