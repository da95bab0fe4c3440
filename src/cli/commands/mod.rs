pub mod config;
pub mod demo;
pub mod session;

pub use config::ConfigCommand;
pub use demo::DemoCommand;
pub use session::{handle_request_line, SessionCommand, SessionRequest, SessionResponse};
