pub mod events;
pub mod filter;
pub mod pagination;
pub mod records;
