pub mod browser;
pub mod command;
pub mod config;
pub mod dom;
pub mod error;
pub mod events;
pub mod fetch;
pub mod i18n;
pub mod interaction;
pub mod loader;
pub mod retry;
pub mod site;
pub mod storage;
pub mod widgets;
