mod auth;

pub use auth::{webhook_auth_middleware, API_KEY_HEADER, WEBHOOK_NAME_HEADER};
