pub mod access;
pub mod auth;
pub mod catalog;
pub mod crypto;
pub mod event;
pub mod export;
pub mod filter;
pub mod legacy;
pub mod log;
pub mod pagination;
pub mod status;
pub mod user;

#[cfg(test)]
pub(crate) mod fixtures;
