use crate::error::{Error, Result};
use crate::remover::RemovalList;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up next to the executable.
pub const CONFIG_FILE_NAME: &str = "settings-scrub.toml";
pub const SETTINGS_FILE_NAME: &str = "settings.xml";
/// Camera settings folder cleaned after the base directory.
pub const PSEYE_SUBFOLDER: &str = "pseyesettings";

/// Cleaner configuration. Every field is optional in the TOML source.
///
/// ```toml
/// directory = "/opt/visuals"
/// subfolders = ["pseyesettings"]
/// settings_file = "settings.xml"
/// isolate_failures = true
/// indent = 4
/// generic = ["fullscreen__F_", ".//settings_transition/Transition_time"]
/// settings = ["fullscreen__F_"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base directory. `None` means the directory containing the executable.
    pub directory: Option<PathBuf>,
    /// Folders below `directory` cleaned after `directory` itself.
    pub subfolders: Vec<String>,
    pub settings_file: String,
    /// Record a failing file and continue instead of aborting the run.
    pub isolate_failures: bool,
    pub indent: usize,
    /// Overrides the built-in generic removal list.
    pub generic: Option<Vec<String>>,
    /// Overrides the built-in `settings.xml` removal list.
    pub settings: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            directory: None,
            subfolders: vec![PSEYE_SUBFOLDER.to_string()],
            settings_file: SETTINGS_FILE_NAME.to_string(),
            isolate_failures: true,
            indent: 4,
            generic: None,
            settings: None,
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Config> {
        let config: Config = toml::from_str(s).map_err(|err| Error::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("{}: {}", path.display(), err)))?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.settings_file.is_empty() || self.settings_file.contains(&['/', '\\'][..]) {
            return Err(Error::Config(format!(
                "settings_file must be a plain file name, got '{}'",
                self.settings_file
            )));
        }
        if let Some(sub) = self.subfolders.iter().find(|s| s.is_empty()) {
            return Err(Error::Config(format!("empty subfolder name '{}'", sub)));
        }
        self.generic_list()?;
        self.settings_list()?;
        Ok(())
    }

    pub fn generic_list(&self) -> Result<RemovalList> {
        match &self.generic {
            Some(entries) => RemovalList::parse(entries),
            None => Ok(RemovalList::generic()),
        }
    }

    pub fn settings_list(&self) -> Result<RemovalList> {
        match &self.settings {
            Some(entries) => RemovalList::parse(entries),
            None => Ok(RemovalList::settings()),
        }
    }

    /// `directory`, or the folder the running executable lives in.
    pub fn base_directory(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.directory {
            return Ok(dir.clone());
        }
        let exe = std::env::current_exe()?;
        exe.parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::Config(format!("{} has no parent", exe.display())))
    }
}
