use serde::{Deserialize, Serialize};
use serde_json;
use std::fs;
use std::fs::File;
use std::io::prelude::*;
use std::io::Error;
use std::path;

/// A structure to hold environment settings. Backed by a settings.json file
/// in the same directory as the executable.
#[derive(Serialize, Deserialize, Debug)]
pub struct Configs {
    pub verbose_mode: bool,
    pub working_directory: String,
}

impl Configs {
    pub fn new() -> Configs {
        Configs {
            verbose_mode: true,
            working_directory: String::new(),
        }
    }
}

pub fn get_configs() -> std::result::Result<Configs, Error> {
    let exe_path = std::env::current_dir()?
        .to_str()
        .unwrap_or("No exe path found.")
        .to_string();
    let config_file = exe_path + &path::MAIN_SEPARATOR.to_string() + "settings.json";
    let configs: Configs = match fs::read_to_string(config_file) {
        Ok(contents) => {
            serde_json::from_str(&contents).expect("Failed to parse settings.json file.")
        }
        Err(_) => Configs::new(),
    };
    Ok(configs)
}

pub fn save_configs(configs: &Configs) -> std::result::Result<(), Error> {
    let configs_json =
        serde_json::to_string_pretty(&configs).expect("Error converting Configs object to JSON.");
    let exe_path = std::env::current_dir()?
        .to_str()
        .unwrap_or("No exe path found.")
        .to_string();
    let config_file = exe_path + &path::MAIN_SEPARATOR.to_string() + "settings.json";
    let mut file = File::create(config_file)?;
    file.write_all(configs_json.as_bytes())?;
    Ok(())
}
