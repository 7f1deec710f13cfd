pub mod clock;
pub mod evaluation_service;
pub mod models;
pub mod stores;
