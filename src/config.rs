use crate::error::{Result, VineOpsError};
use crate::models::{Block, StartRule};
use dialoguer::Input;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub vineyard: VineyardConfig,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub season: SeasonConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VineyardConfig {
    pub name: String,
    pub region: Option<String>,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct WeatherConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_base_url() -> String {
    "https://archive-api.open-meteo.com/v1".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
        }
    }
}

impl std::fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SeasonConfig {
    #[serde(default)]
    pub start_rule: StartRule,
}

impl Config {
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => p,
            None => Self::find_config_path()?,
        };

        if !config_path.exists() {
            return Err(VineOpsError::Config(format!(
                "Config file not found at {:?}. Run `vineops init` to set up.",
                config_path
            )));
        }

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| VineOpsError::Config(format!("Failed to read config: {}", e)))?;

        // Substitute environment variables
        let config_str = Self::substitute_env_vars(&config_str);

        let config: Config = serde_yaml::from_str(&config_str)
            .map_err(|e| VineOpsError::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Search for config.yaml in standard locations.
    /// Returns the path of the first found config, or the XDG default path if none found.
    fn find_config_path() -> Result<PathBuf> {
        // Try current directory first
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        // Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("vineops").join("config.yaml");
            if xdg_config.exists() {
                return Ok(xdg_config);
            }
        }

        // Return XDG path as the default (will trigger "not found" in load)
        let default_path = dirs::config_dir()
            .ok_or_else(|| VineOpsError::Config("Cannot determine config directory".into()))?
            .join("vineops")
            .join("config.yaml");
        Ok(default_path)
    }

    /// Returns true if a config file can be found in any standard location.
    pub fn exists(config_override: Option<&PathBuf>) -> bool {
        match config_override {
            Some(p) => p.exists(),
            None => Self::find_config_path()
                .map(|p| p.exists())
                .unwrap_or(false),
        }
    }

    /// Default path for writing new config files (~/.config/vineops/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| VineOpsError::Config("Cannot determine config directory".into()))?
            .join("vineops");
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    /// Returns the loaded Config and the path it was written to.
    pub fn setup_interactive() -> Result<(Self, PathBuf)> {
        println!();
        println!("No configuration found. Let's set up VineOps!");
        println!();

        // --- Vineyard ---
        println!("Vineyard");
        let vineyard_name: String = Input::new()
            .with_prompt("  Vineyard name")
            .default("My Vineyard".into())
            .interact_text()
            .map_err(|e| VineOpsError::Config(format!("Input error: {}", e)))?;

        let region: String = Input::new()
            .with_prompt("  Region (blank to skip)")
            .default(String::new())
            .allow_empty(true)
            .interact_text()
            .map_err(|e| VineOpsError::Config(format!("Input error: {}", e)))?;

        println!();

        // --- Blocks ---
        println!("Blocks (leave name blank to finish)");
        let mut blocks = Vec::new();
        loop {
            let default_name = if blocks.is_empty() {
                "Home block".to_string()
            } else {
                String::new()
            };
            let name: String = Input::new()
                .with_prompt("  Block name")
                .default(default_name)
                .allow_empty(true)
                .interact_text()
                .map_err(|e| VineOpsError::Config(format!("Input error: {}", e)))?;
            if name.is_empty() {
                break;
            }

            let latitude_raw: String = Input::new()
                .with_prompt("    Latitude (blank to skip coordinates)")
                .default(String::new())
                .allow_empty(true)
                .interact_text()
                .map_err(|e| VineOpsError::Config(format!("Input error: {}", e)))?;

            let block = match latitude_raw.trim().parse::<f64>() {
                Ok(latitude) => {
                    let longitude: f64 = Input::new()
                        .with_prompt("    Longitude")
                        .interact_text()
                        .map_err(|e| VineOpsError::Config(format!("Input error: {}", e)))?;
                    Block::new(&name).with_coordinates(latitude, longitude)
                }
                Err(_) => Block::new(&name),
            };
            blocks.push(block);
        }

        println!();

        // --- Open-Meteo (optional key) ---
        println!("Open-Meteo (leave API key blank for the free tier)");
        let api_key: String = Input::new()
            .with_prompt("  API key")
            .default(String::new())
            .allow_empty(true)
            .interact_text()
            .map_err(|e| VineOpsError::Config(format!("Input error: {}", e)))?;

        println!();

        let config = Config {
            vineyard: VineyardConfig {
                name: vineyard_name,
                region: if region.is_empty() { None } else { Some(region) },
            },
            blocks,
            weather: WeatherConfig {
                base_url: default_base_url(),
                api_key: if api_key.is_empty() { None } else { Some(api_key) },
            },
            season: SeasonConfig::default(),
        };

        // Write to default config path
        let config_path = Self::default_config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(&config)
            .map_err(|e| VineOpsError::Config(format!("Failed to serialize config: {}", e)))?;

        // Write with a header comment
        let content = format!(
            "# VineOps Configuration\n# Generated by `vineops init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(&config_path, content)?;

        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    fn substitute_env_vars(content: &str) -> String {
        let mut result = content.to_string();

        // Find all ${VAR_NAME} patterns and substitute
        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        result
    }

    pub fn data_dir(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        // CLI override takes priority
        if let Some(dir) = data_dir_override {
            std::fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }

        // Then check env var
        if let Ok(dir) = std::env::var("VINEOPS_DATA_DIR") {
            let p = PathBuf::from(dir);
            std::fs::create_dir_all(&p)?;
            return Ok(p);
        }

        // Use XDG data directory
        let data_dir = dirs::data_dir()
            .ok_or_else(|| VineOpsError::Config("Cannot determine data directory".into()))?
            .join("vineops");

        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    pub fn cache_path(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        Ok(Self::data_dir(data_dir_override)?.join("weather_cache.json"))
    }

    pub fn diary_path(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        Ok(Self::data_dir(data_dir_override)?.join("diary.json"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vineyard: VineyardConfig {
                name: "My Vineyard".into(),
                region: None,
            },
            blocks: vec![Block::new("Home block")],
            weather: WeatherConfig::default(),
            season: SeasonConfig::default(),
        }
    }
}
