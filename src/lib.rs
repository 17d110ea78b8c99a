pub mod commands;
pub mod files;
pub mod http;
pub mod input;
pub mod lifecycle;
pub mod output;
pub mod runtime;
pub mod store;
pub mod ui;
pub mod version;
