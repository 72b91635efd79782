//
//  bb-cloud
//  cli/config.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! CLI configuration commands
//!
//! Reads and writes the settings in `config.yml`. Run `bb config list` to
//! see every key with its current value.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::style;

use crate::config::{config_dir, Config, CONFIG_FILE, CONFIG_KEYS};
use crate::output::{write_json, OutputWriter};

use super::GlobalOptions;

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Print the value of a setting
    Get(GetArgs),

    /// Update a setting; an empty value clears optional settings
    Set(SetArgs),

    /// Print every setting
    #[command(visible_alias = "ls")]
    List,

    /// Print the path of the config file
    Path,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    pub key: String,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    pub key: String,

    pub value: String,
}

impl ConfigCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        match &self.command {
            ConfigSubcommand::Get(args) => self.get(args, global),
            ConfigSubcommand::Set(args) => self.set(args, global),
            ConfigSubcommand::List => self.list(global),
            ConfigSubcommand::Path => self.path(),
        }
    }

    fn get(&self, args: &GetArgs, global: &GlobalOptions) -> Result<()> {
        let config = Config::load()?;
        let value = config.get(&args.key)?;

        if global.json {
            write_json(&serde_json::json!({
                "key": args.key,
                "value": value,
            }))?;
        } else if let Some(v) = value {
            println!("{}", v);
        }
        Ok(())
    }

    fn set(&self, args: &SetArgs, global: &GlobalOptions) -> Result<()> {
        let mut config = Config::load()?;
        config.set(&args.key, &args.value)?;
        config.save()?;

        if global.json {
            write_json(&serde_json::json!({
                "key": args.key,
                "value": config.get(&args.key)?,
            }))?;
        } else {
            let output = OutputWriter::from_flag(false);
            if output.color_enabled() {
                println!("{} Set {} = {}", style("✓").green(), style(&args.key).cyan(), args.value);
            } else {
                println!("✓ Set {} = {}", args.key, args.value);
            }
        }
        Ok(())
    }

    fn list(&self, global: &GlobalOptions) -> Result<()> {
        let config = Config::load()?;

        if global.json {
            return write_json(&config);
        }

        for key in CONFIG_KEYS {
            let value = config.get(key)?.unwrap_or_default();
            println!("{}={}", key, value);
        }
        Ok(())
    }

    fn path(&self) -> Result<()> {
        println!("{}", config_dir()?.join(CONFIG_FILE).display());
        Ok(())
    }
}
