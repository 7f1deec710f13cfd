pub mod db;
pub mod server;
pub mod web;

pub mod alerting;
pub mod notifications;
pub mod version;
