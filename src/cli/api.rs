//
//  bb-cloud
//  cli/api.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Direct API access command
//!
//! Sends an authenticated request to any Bitbucket Cloud endpoint, similar to
//! `gh api` for GitHub. Useful for endpoints no other command covers.
//!
//! ## Examples
//!
//! ```bash
//! # Get repository info
//! bb api /repositories/acme/widgets
//!
//! # Create an issue (POST is implied by -F)
//! bb api /repositories/acme/widgets/issues \
//!     -F title="Bug report" -F content.raw="Description here"
//!
//! # Collect every page of a list
//! bb api /repositories/acme --paginate
//! ```

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::{Map, Value};

use crate::api::{ClientError, Method, Query, Request, Response};
use crate::output::write_raw_body;

use super::{GlobalOptions, Session};

/// Stop following `next` links after this many pages.
const MAX_PAGES: usize = 100;

/// Make an authenticated API request
#[derive(Args, Debug)]
pub struct ApiCommand {
    /// Endpoint path relative to the API root, e.g. /repositories/acme
    pub endpoint: String,

    /// HTTP method; defaults to GET, or POST when a body is given
    #[arg(long, short = 'X')]
    pub method: Option<String>,

    /// Body field as key=value; dotted keys nest (repeatable). Sent as query
    /// parameters for GET
    #[arg(long, short = 'F', action = clap::ArgAction::Append)]
    pub field: Vec<String>,

    /// Header as "Name: value" (repeatable)
    #[arg(long, short = 'H', action = clap::ArgAction::Append)]
    pub header: Vec<String>,

    /// Read a JSON body from a file (`-` for stdin)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Follow `next` links and print every `values` entry as one array
    #[arg(long)]
    pub paginate: bool,

    /// Print the status line and response headers
    #[arg(long, short = 'i')]
    pub include: bool,
}

impl ApiCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let session = Session::new(global)?;
        let request = self.build_request()?;
        tracing::debug!("{} {}", request.method, request.path);

        if self.paginate {
            if request.method != Method::Get {
                bail!("--paginate only works with GET requests");
            }
            let values = collect_pages(&session, request).await?;
            return crate::output::write_json(&values);
        }

        let response = match session.client.execute(request).await {
            Ok(response) => response,
            Err(ClientError::Api { error, response }) => {
                // Show what the server said before failing.
                self.print_response(&response)?;
                return Err(ClientError::Api { error, response }.into());
            }
            Err(e) => return Err(e.into()),
        };

        self.print_response(&response)
    }

    fn build_request(&self) -> Result<Request> {
        let path = normalize_endpoint(&self.endpoint);
        let fields = self
            .field
            .iter()
            .map(|f| parse_field(f))
            .collect::<Result<Vec<_>>>()?;

        let input = match &self.input {
            Some(path) => Some(read_input(path)?),
            None => None,
        };

        let method = match &self.method {
            Some(m) => m.parse::<Method>()?,
            None if input.is_some() || !fields.is_empty() => Method::Post,
            None => Method::Get,
        };

        let mut request = Request::new(method, path);

        if method == Method::Get {
            if input.is_some() {
                bail!("--input cannot be used with GET");
            }
            let mut query = Query::new();
            for (key, value) in &fields {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                query.append(key.clone(), text);
            }
            request = request.query(query);
        } else if let Some(body) = input {
            if !fields.is_empty() {
                bail!("--input and --field cannot be combined");
            }
            request = request.body(body);
        } else if !fields.is_empty() {
            let mut body = Map::new();
            for (key, value) in fields {
                set_nested_value(&mut body, &key, value);
            }
            request = request.body(Value::Object(body));
        }

        for header in &self.header {
            let (name, value) = parse_header(header)?;
            request = request.header(name, value);
        }

        Ok(request)
    }

    fn print_response(&self, response: &Response) -> Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();

        if self.include {
            writeln!(out, "HTTP {}", response.status_code)?;
            for (name, value) in &response.headers {
                writeln!(out, "{}: {}", name, value.to_str().unwrap_or("<binary>"))?;
            }
            writeln!(out)?;
        }

        write_raw_body(&mut out, &response.body)
    }
}

async fn collect_pages(session: &Session<'_>, first: Request) -> Result<Vec<Value>> {
    let mut values = Vec::new();
    let mut request = first;

    for _ in 0..MAX_PAGES {
        let headers = request.headers.clone();
        let response = session.client.execute(request).await?;
        let page: Value = serde_json::from_slice(&response.body)
            .context("Response is not JSON and cannot be paginated")?;

        match page.get("values").and_then(Value::as_array) {
            Some(items) => values.extend(items.iter().cloned()),
            None => bail!("Response has no `values` array; drop --paginate"),
        }

        let Some(next) = page.get("next").and_then(Value::as_str) else {
            return Ok(values);
        };

        request = Request::get(next);
        for (name, value) in headers {
            request = request.header(name, value);
        }
    }

    tracing::warn!("Stopped after {} pages", MAX_PAGES);
    Ok(values)
}

/// Accepts `/repositories/x`, `repositories/x` and `/2.0/repositories/x`.
fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return trimmed.to_string();
    }

    let path = trimmed.trim_start_matches('/');
    let path = path.strip_prefix("2.0/").unwrap_or(path);
    format!("/{}", path)
}

/// Splits `key=value`, typing literal booleans, null, numbers and JSON.
fn parse_field(field: &str) -> Result<(String, Value)> {
    let Some((key, raw)) = field.split_once('=') else {
        bail!("Invalid field '{}'. Expected key=value", field);
    };
    if key.is_empty() {
        bail!("Invalid field '{}'. The key is empty", field);
    }

    let value = match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ if raw.starts_with('[') || raw.starts_with('{') => {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
        }
        _ => match raw.parse::<i64>() {
            Ok(n) => Value::Number(n.into()),
            Err(_) => Value::String(raw.to_string()),
        },
    };

    Ok((key.to_string(), value))
}

fn set_nested_value(obj: &mut Map<String, Value>, key: &str, value: Value) {
    match key.split_once('.') {
        None => {
            obj.insert(key.to_string(), value);
        }
        Some((first, rest)) => {
            let entry = obj
                .entry(first.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(nested) = entry {
                set_nested_value(nested, rest, value);
            }
        }
    }
}

fn parse_header(header: &str) -> Result<(String, String)> {
    match header.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => bail!("Invalid header '{}'. Expected 'Name: value'", header),
    }
}

fn read_input(path: &PathBuf) -> Result<Value> {
    let text = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read request body from standard input")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };

    serde_json::from_str(&text).context("Request body is not valid JSON")
}
