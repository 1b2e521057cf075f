pub mod banner;
pub mod commands;
pub mod config;
pub mod consts;
pub mod events;
pub mod executor;
pub mod history;
pub mod inspect;
pub mod printer;
pub mod session;
