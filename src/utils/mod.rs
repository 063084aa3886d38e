pub mod client_tools;
pub mod databases;
pub mod prompt;
pub mod report;
pub mod selection;
pub mod server;
