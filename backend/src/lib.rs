pub mod api;
pub mod db_model;
pub mod executable;
pub mod media;
pub mod store;
