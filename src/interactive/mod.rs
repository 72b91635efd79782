//
//  bb-cloud
//  interactive/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Interactive prompts built on `dialoguer`.
//!
//! Commands only prompt when stdin/stdout are a terminal and prompting has
//! not been disabled with `--no-prompt`, `BB_NO_PROMPT` or `prompt: disabled`.

mod prompt;

pub use prompt::*;
