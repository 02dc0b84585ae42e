pub mod cli;
pub mod command;
pub mod config;
pub mod models;
pub mod server;
pub mod store;
pub mod ui {
    pub mod browser;
}

pub use cli::run;
pub use ui::browser;
