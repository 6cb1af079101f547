use thiserror::Error;

pub const ENV_DICT_MENU_TYPE_MENU: &str = "CONSOLE_DICT_MENU_TYPE_MENU";
pub const ENV_DICT_MENU_TYPE_BUTTON: &str = "CONSOLE_DICT_MENU_TYPE_BUTTON";
pub const ENV_DICT_VISIBLE_TRUE: &str = "CONSOLE_DICT_VISIBLE_TRUE";
pub const ENV_APP_TITLE: &str = "CONSOLE_APP_TITLE";

pub const DEFAULT_MENU_TYPE_MENU: &str = "1";
pub const DEFAULT_MENU_TYPE_BUTTON: &str = "2";
pub const DEFAULT_VISIBLE_TRUE: &str = "1";
pub const DEFAULT_APP_TITLE: &str = "Console";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    EmptySentinel(&'static str),
    #[error("menu and button sentinels must differ (both are {0:?})")]
    AmbiguousMenuType(String),
}

/// Dictionary codes the menu service uses to tag raw nodes.
///
/// The server encodes node kind and visibility as opaque dictionary values, so
/// classification only ever compares against these sentinels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuDictionary {
    pub menu_type_menu: String,
    pub menu_type_button: String,
    pub visible_true: String,
}

impl Default for MenuDictionary {
    fn default() -> Self {
        Self {
            menu_type_menu: DEFAULT_MENU_TYPE_MENU.to_string(),
            menu_type_button: DEFAULT_MENU_TYPE_BUTTON.to_string(),
            visible_true: DEFAULT_VISIBLE_TRUE.to_string(),
        }
    }
}

impl MenuDictionary {
    pub fn new(
        menu_type_menu: impl Into<String>,
        menu_type_button: impl Into<String>,
        visible_true: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let dictionary = Self {
            menu_type_menu: menu_type_menu.into().trim().to_string(),
            menu_type_button: menu_type_button.into().trim().to_string(),
            visible_true: visible_true.into().trim().to_string(),
        };
        dictionary.validate()?;
        Ok(dictionary)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`MenuDictionary::from_env`], reading through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &'static str, default: &str| -> Result<String, ConfigError> {
            match lookup(key) {
                Some(value) => {
                    let value = value.trim().to_string();
                    if value.is_empty() {
                        return Err(ConfigError::EmptySentinel(key));
                    }
                    Ok(value)
                }
                None => Ok(default.to_string()),
            }
        };

        Self::new(
            read(ENV_DICT_MENU_TYPE_MENU, DEFAULT_MENU_TYPE_MENU)?,
            read(ENV_DICT_MENU_TYPE_BUTTON, DEFAULT_MENU_TYPE_BUTTON)?,
            read(ENV_DICT_VISIBLE_TRUE, DEFAULT_VISIBLE_TRUE)?,
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.menu_type_menu.is_empty() {
            return Err(ConfigError::EmptySentinel(ENV_DICT_MENU_TYPE_MENU));
        }
        if self.menu_type_button.is_empty() {
            return Err(ConfigError::EmptySentinel(ENV_DICT_MENU_TYPE_BUTTON));
        }
        if self.visible_true.is_empty() {
            return Err(ConfigError::EmptySentinel(ENV_DICT_VISIBLE_TRUE));
        }
        if self.menu_type_menu == self.menu_type_button {
            return Err(ConfigError::AmbiguousMenuType(self.menu_type_menu.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub dictionary: MenuDictionary,
    pub app_title: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            dictionary: MenuDictionary::default(),
            app_title: DEFAULT_APP_TITLE.to_string(),
        }
    }
}

impl ShellConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let app_title = lookup(ENV_APP_TITLE)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_APP_TITLE.to_string());
        Ok(Self {
            dictionary: MenuDictionary::from_lookup(lookup)?,
            app_title,
        })
    }

    /// Document title for a route, `"<app> | <route>"` or just the app title.
    pub fn document_title(&self, route_title: Option<&str>) -> String {
        match route_title.map(str::trim).filter(|title| !title.is_empty()) {
            Some(title) => format!("{} | {title}", self.app_title),
            None => self.app_title.clone(),
        }
    }
}
