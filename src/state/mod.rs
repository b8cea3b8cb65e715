pub mod app_settings;
pub mod app_state;
pub mod entry;
pub mod messages;
pub mod network;
