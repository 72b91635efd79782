//
//  bb-cloud
//  output/json.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # JSON Output Formatting
//!
//! Pretty-printed JSON for `--json` and `bb api`, suitable for piping to `jq`.

use serde::Serialize;
use std::io::Write;

pub fn write_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    write_json_to(&mut stdout.lock(), value)
}

pub fn write_json_to<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

/// Pretty-prints a raw response body if it is JSON, otherwise writes it unchanged.
pub fn write_raw_body<W: Write>(writer: &mut W, body: &[u8]) -> anyhow::Result<()> {
    if body.is_empty() {
        return Ok(());
    }

    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => write_json_to(writer, &value),
        Err(_) => {
            writer.write_all(body)?;
            if !body.ends_with(b"\n") {
                writeln!(writer)?;
            }
            Ok(())
        }
    }
}
