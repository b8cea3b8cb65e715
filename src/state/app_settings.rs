use log::LevelFilter;

pub const ENV_DEFAULT_TEAM: &str = "COURTSIDE_DEFAULT_TEAM";

#[derive(Debug, Default, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    /// Team id pre-selected on the roster and history tabs.
    pub default_team: Option<String>,
}

impl AppSettings {
    pub fn load() -> Self {
        let default_team = std::env::var(ENV_DEFAULT_TEAM)
            .ok()
            .filter(|v| !v.trim().is_empty());
        Self { full_screen: false, log_level: None, default_team }
    }
}
