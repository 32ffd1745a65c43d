//! INI file configuration adapter.

use std::fs;
use std::path::Path;

use configparser::ini::Ini;

use crate::domain::error::TradebenchError;
use crate::ports::config_port::ConfigPort;

/// Section and key names are case-insensitive; `;` and `#` start
/// full-line comments.
pub struct FileConfigAdapter {
    ini: Ini,
}

impl FileConfigAdapter {
    /// Read failures surface as `Io`, malformed INI as `ConfigParse`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TradebenchError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::from_string(&content).map_err(|reason| TradebenchError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut ini = Ini::new();
        ini.read(content.to_string())?;
        Ok(Self { ini })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.ini
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn sections(&self) -> Vec<String> {
        let mut sections = self.ini.sections();
        sections.sort();
        sections
    }
}
