// threatdesk: terminal threat-intelligence dashboard
//
// This is the library root. The session layer holds all client state and
// the dashboard controller; backends, storage and output sit around it.

pub mod backend;
pub mod config;
pub mod error;
pub mod export;
pub mod output;
pub mod scoring;
pub mod session;
pub mod status;
pub mod store;
pub mod target;

pub use error::DeskError;
