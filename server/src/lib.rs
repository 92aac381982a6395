pub mod server_state;
pub mod updates;
pub mod webhook_endpoint;
