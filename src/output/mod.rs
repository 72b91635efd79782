//
//  bb-cloud
//  output/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Output Module
//!
//! Renders command results either as human-readable tables or as JSON.
//!
//! - **Table format**: `comfy_table` tables for lists, `key: value` listings for single items
//! - **JSON format**: Pretty-printed JSON of the API types (`--json`)
//!
//! ## Core Components
//!
//! - [`OutputFormat`]: Enum representing the available output formats
//! - [`OutputWriter`]: Main entry point for writing formatted output
//! - [`TableOutput`]: Items that print themselves as a detail view
//! - [`TableRow`]: Items that print as one row of a list
//!
//! ## Example
//!
//! ```rust,ignore
//! use bb_cloud::output::{OutputFormat, OutputWriter};
//!
//! let writer = OutputWriter::new(OutputFormat::Json);
//! writer.write(&repository)?;
//! writer.write_success("Repository created");
//! ```

mod json;
mod table;

pub use json::*;
pub use table::*;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub struct OutputWriter {
    format: OutputFormat,
    color: bool,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            color: console::colors_enabled(),
        }
    }

    /// Picks JSON when `json` is set, tables otherwise.
    pub fn from_flag(json: bool) -> Self {
        Self::new(if json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        })
    }

    pub fn color_enabled(&self) -> bool {
        self.color
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    pub fn write<T: Serialize + TableOutput>(&self, value: &T) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => write_json(value)?,
            OutputFormat::Table => value.print_table(self.color),
        }
        Ok(())
    }

    /// Writes a list as one table, or as a JSON array.
    pub fn write_list<T: Serialize + TableRow>(&self, values: &[T]) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => write_json(values)?,
            OutputFormat::Table => {
                if values.is_empty() {
                    println!("{}", T::empty_message());
                    return Ok(());
                }

                let mut builder = TableBuilder::new().color(self.color).headers(T::headers());
                for value in values {
                    builder = builder.row(value.row(self.color));
                }
                builder.print();
            }
        }
        Ok(())
    }

    pub fn write_warning(&self, msg: &str) {
        use console::style;
        if self.color {
            eprintln!("{} {}", style("warning:").yellow().bold(), msg);
        } else {
            eprintln!("warning: {}", msg);
        }
    }

    /// Prints a success line. Suppressed in JSON mode so stdout stays parseable.
    pub fn write_success(&self, msg: &str) {
        if self.is_json() {
            return;
        }

        use console::style;
        if self.color {
            println!("{} {}", style("✓").green().bold(), msg);
        } else {
            println!("✓ {}", msg);
        }
    }
}

/// Detail view of a single item.
pub trait TableOutput {
    fn print_table(&self, color: bool);
}

/// One row of a list table.
pub trait TableRow {
    fn headers() -> Vec<&'static str>;

    fn row(&self, color: bool) -> Vec<String>;

    fn empty_message() -> &'static str {
        "No results"
    }
}

pub fn print_field(key: &str, value: &str, color: bool) {
    use console::style;
    if color {
        println!("{}: {}", style(key).dim(), value);
    } else {
        println!("{}: {}", key, value);
    }
}

/// Prints a field only when it has a value.
pub fn print_optional_field(key: &str, value: Option<&str>, color: bool) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        print_field(key, value, color);
    }
}
