use anyhow::{anyhow, bail, Context, Result};
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub const PROJECT_FILE_NAME: &str = ".logtallyrc";
const MAX_ALIAS_DEPTH: usize = 10;

/// Argument defaults and aliases read from `.logtallyrc` / `config.ini`.
///
/// ```ini
/// defaults = --workers 4 --stats
///
/// [aliases]
/// gateway = --status 502,503,504
/// slow = --slow-threshold 1000 -a gateway
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub defaults: Option<String>,
    pub aliases: BTreeMap<String, String>,
}

/// Where a loaded configuration came from
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigSources {
    pub project: Option<PathBuf>,
    pub user: Option<PathBuf>,
}

impl ConfigFile {
    /// Walk up from `start` looking for a project `.logtallyrc`
    pub fn find_project_config_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(PROJECT_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    pub fn find_project_config() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        Self::find_project_config_from(&cwd)
    }

    /// User-level locations, most preferred first
    pub fn user_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("logtally").join("config.ini"));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(PROJECT_FILE_NAME));
        }
        paths
    }

    /// Load with precedence project > user. Only the first existing user file is read.
    pub fn load() -> Result<(Self, ConfigSources)> {
        let user = Self::user_config_paths().into_iter().find(|p| p.is_file());
        let project = Self::find_project_config();
        Self::load_layers(user.as_deref(), project.as_deref())
    }

    fn load_layers(user: Option<&Path>, project: Option<&Path>) -> Result<(Self, ConfigSources)> {
        let mut config = Self::default();
        if let Some(path) = user {
            config = config.overlay(Self::load_from_path(path)?);
        }
        if let Some(path) = project {
            config = config.overlay(Self::load_from_path(path)?);
        }
        let sources = ConfigSources {
            project: project.map(Path::to_path_buf),
            user: user.map(Path::to_path_buf),
        };
        Ok((config, sources))
    }

    /// `--config-file` replaces discovery entirely
    pub fn load_with_custom_path(custom_path: Option<&Path>) -> Result<(Self, ConfigSources)> {
        match custom_path {
            Some(path) => {
                let config = Self::load_from_path(path)?;
                let sources = ConfigSources {
                    project: Some(path.to_path_buf()),
                    user: None,
                };
                Ok((config, sources))
            }
            None => Self::load(),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse the INI subset we understand: a root `defaults` key and an
    /// `[aliases]` section. Unknown keys and sections are ignored.
    pub fn parse(content: &str) -> Result<Self> {
        let mut config = Self::default();
        let mut section: Option<&str> = None;

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = Some(name.trim());
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .map(|(k, v)| (k.trim(), v.trim()))
                .ok_or_else(|| anyhow!("line {}: expected 'key = value'", idx + 1))?;
            if key.is_empty() {
                bail!("line {}: empty key", idx + 1);
            }

            match section {
                None if key == "defaults" => config.defaults = Some(value.to_string()),
                Some("aliases") => {
                    config.aliases.insert(key.to_string(), value.to_string());
                }
                _ => {}
            }
        }

        Ok(config)
    }

    /// `other` wins for defaults and for aliases defined in both
    fn overlay(mut self, other: Self) -> Self {
        if other.defaults.is_some() {
            self.defaults = other.defaults;
        }
        self.aliases.extend(other.aliases);
        self
    }

    fn resolve_alias(&self, name: &str, chain: &mut HashSet<String>) -> Result<Vec<String>> {
        if chain.len() >= MAX_ALIAS_DEPTH {
            bail!("Alias chain too deep: {} levels", chain.len());
        }
        if !chain.insert(name.to_string()) {
            bail!("Circular dependency detected in alias: {}", name);
        }

        let value = self
            .aliases
            .get(name)
            .ok_or_else(|| anyhow!("Unknown alias: {}", name))?;
        let words = shell_words::split(value)
            .with_context(|| format!("Invalid alias '{}': failed to parse arguments", name))?;
        let expanded = self.expand_aliases(words, chain)?;

        chain.remove(name);
        Ok(expanded)
    }

    fn expand_aliases(&self, args: Vec<String>, chain: &mut HashSet<String>) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(args.len());
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            let name = if arg == "-a" || arg == "--alias" {
                match iter.next() {
                    Some(name) => name,
                    None => {
                        out.push(arg);
                        break;
                    }
                }
            } else if let Some(name) = arg.strip_prefix("--alias=") {
                name.to_string()
            } else {
                out.push(arg);
                continue;
            };
            out.extend(self.resolve_alias(&name, chain)?);
        }
        Ok(out)
    }

    /// Insert `defaults` after the program name, then expand every alias
    pub fn process_args(&self, args: Vec<String>) -> Result<Vec<String>> {
        let mut args = args.into_iter();
        let mut merged: Vec<String> = args.next().into_iter().collect();

        if let Some(defaults) = &self.defaults {
            let words = shell_words::split(defaults)
                .context("Invalid defaults: failed to parse arguments")?;
            merged.extend(words);
        }
        merged.extend(args);

        self.expand_aliases(merged, &mut HashSet::new())
    }

    /// Report for `--show-config`
    pub fn describe(&self, sources: &ConfigSources) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Configuration precedence: CLI > project {} > user config > defaults\n",
            PROJECT_FILE_NAME
        );

        match (&sources.project, &sources.user) {
            (None, None) => {
                let _ = writeln!(out, "No configuration files found. Using defaults.");
            }
            (project, user) => {
                let _ = writeln!(out, "Configuration loaded from:");
                if let Some(path) = project {
                    let _ = writeln!(out, "  Project: {}", path.display());
                }
                if let Some(path) = user {
                    let _ = writeln!(out, "  User: {}", path.display());
                }
            }
        }

        if let Some(defaults) = &self.defaults {
            let _ = writeln!(out, "\nActive defaults:\n  defaults = {}", defaults);
        }
        if !self.aliases.is_empty() {
            let _ = writeln!(out, "\nActive aliases:");
            for (name, value) in &self.aliases {
                let _ = writeln!(out, "  {} = {}", name, value);
            }
        }

        let _ = writeln!(out, "\nUser configuration search locations:");
        for (i, path) in Self::user_config_paths().iter().enumerate() {
            let status = if path.is_file() { "found" } else { "not found" };
            let _ = writeln!(out, "  {}. {} ({})", i + 1, path.display(), status);
        }
        out
    }
}
