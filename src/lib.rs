// Core infrastructure modules
pub mod core;

// Application modules
pub mod config;
pub mod scripts;
pub mod server;

// Scriptable mock driver shared by the unit and integration test suites
pub mod test_utils;
