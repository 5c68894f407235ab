pub mod capture;
pub mod config;
pub mod events;
pub mod init;

pub use capture::*;
pub use config::*;
pub use events::TauriReporter;
pub use init::*;
