pub mod cart;
pub mod filter;
pub mod model;
pub mod storage;
