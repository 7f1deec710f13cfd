pub mod mentions;
pub mod message;
pub mod models;
pub mod senders;
pub mod service;
