/***************************************/
/*        3rd party libraries          */
/***************************************/
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub elevator: ElevatorConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SystemConfig {
    pub n_floors: u8,
    pub n_cars: usize,
}

/// Timings are in milliseconds, the threshold in kilograms.
#[derive(Deserialize, Clone, Debug)]
pub struct ElevatorConfig {
    pub floor_travel_time: u64,
    pub door_open_time: u64,
    pub load_threshold: u32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DispatcherConfig {
    pub retry_backoff: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            n_floors: 13,
            n_cars: 3,
        }
    }
}

impl Default for ElevatorConfig {
    fn default() -> Self {
        ElevatorConfig {
            floor_travel_time: 200,
            door_open_time: 300,
            load_threshold: 1000,
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig { retry_backoff: 200 }
    }
}

/***************************************/
/*             Public API              */
/***************************************/
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
    parse_config(&config_str)
}

pub fn parse_config(config_str: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(config_str).context("Failed to parse configuration file")?;
    if config.system.n_floors == 0 {
        anyhow::bail!("system.n_floors must be at least 1");
    }
    Ok(config)
}

/***************************************/
/*             Unit tests              */
/***************************************/
