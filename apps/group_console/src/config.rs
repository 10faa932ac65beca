use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::DEFAULT_PAGE_SIZE;

pub const DEFAULT_CONFIG_FILE: &str = "group_console.toml";
pub const DEFAULT_DEVICE_PAGE_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub access_token: Option<String>,
    pub page_size: u32,
    pub device_page_size: usize,
    pub log_level: String,
    pub refresh_on_form_cancel: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8848/jetlinks".into(),
            access_token: None,
            page_size: DEFAULT_PAGE_SIZE,
            device_page_size: DEFAULT_DEVICE_PAGE_SIZE,
            log_level: "info".into(),
            refresh_on_form_cancel: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    base_url: Option<String>,
    access_token: Option<String>,
    page_size: Option<u32>,
    device_page_size: Option<usize>,
    log_level: Option<String>,
    refresh_on_form_cancel: Option<bool>,
}

/// Defaults, then the TOML file, then `APP__*` environment variables.
///
/// An explicitly named file must exist; the default file is optional.
pub fn load_settings(explicit: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    match fs::read_to_string(&path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
            apply_file(&mut settings, file_cfg);
        }
        Err(err) if explicit.is_some() => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()));
        }
        Err(_) => {}
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.base_url {
        settings.base_url = v;
    }
    if let Some(v) = file_cfg.access_token {
        settings.access_token = Some(v);
    }
    if let Some(v) = file_cfg.page_size.filter(|v| *v > 0) {
        settings.page_size = v;
    }
    if let Some(v) = file_cfg.device_page_size.filter(|v| *v > 0) {
        settings.device_page_size = v;
    }
    if let Some(v) = file_cfg.log_level {
        settings.log_level = v;
    }
    if let Some(v) = file_cfg.refresh_on_form_cancel {
        settings.refresh_on_form_cancel = v;
    }
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("APP__BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = lookup("APP__ACCESS_TOKEN") {
        settings.access_token = Some(v);
    }
    if let Some(v) = lookup("APP__PAGE_SIZE") {
        if let Ok(parsed) = v.parse::<u32>() {
            if parsed > 0 {
                settings.page_size = parsed;
            }
        }
    }
    if let Some(v) = lookup("APP__LOG_LEVEL") {
        settings.log_level = v;
    }
    if let Some(v) = lookup("APP__REFRESH_ON_FORM_CANCEL") {
        if let Ok(parsed) = v.parse::<bool>() {
            settings.refresh_on_form_cancel = parsed;
        }
    }
}
