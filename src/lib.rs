// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod logging;
pub mod options;
pub mod runtime;
pub mod spinner;
pub mod timer;
pub mod ui;
