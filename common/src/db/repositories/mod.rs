// Repository layer for the connector tables

pub mod connection;
pub mod log;
pub mod message;
pub mod organization;
pub mod webhook;

pub use connection::ConnectionRepository;
pub use log::LogRepository;
pub use message::{MessageRepository, PgMessageResolver};
pub use organization::OrganizationRepository;
pub use webhook::WebhookRepository;
