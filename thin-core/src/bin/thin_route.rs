//! Thin Route CLI - resolve a request path against a route table
//!
//! Usage:
//!     thin-route /users --config app.json
//!     thin-route --config app.json --query do=/users
//!     thin-route --json /missing

use clap::Parser;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

use thin_core::{deep_merge, App, RequestSources};

#[derive(Parser, Debug)]
#[command(name = "thin-route")]
#[command(about = "Resolve a request path against a Thin route table")]
#[command(version)]
struct Args {
    /// Path to resolve (defaults to the path computed from request data)
    path: Option<String>,

    /// JSON config file layered over the baseline defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Query parameter, key=value (repeatable)
    #[arg(short, long)]
    query: Vec<String>,

    /// Form parameter, key=value (repeatable)
    #[arg(short, long)]
    form: Vec<String>,

    /// Output the matched route as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output (show the effective configuration)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let user_config = match load_config(args.config.as_deref()) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    // The CLI prints the result itself, so exit-on-run is always disabled.
    let overrides = deep_merge(&user_config, &json!({ "thin": { "run_and_exit": false } }));

    let sources = RequestSources::new()
        .query(pairs_to_tree(&args.query))
        .form(pairs_to_tree(&args.form));

    let mut app = match App::with_sources(Some(overrides), sources) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error building application: {}", e);
            std::process::exit(1);
        }
    };

    if args.verbose {
        eprintln!("Effective config:");
        eprintln!("{}", thin_core::dump::dump_string(app.config().borrow().config()));
        eprintln!();
    }

    match app.run(args.path.as_deref(), None).cloned() {
        Some(route) => {
            if args.json {
                println!("{}", thin_core::dump::dump_string(&json!(route)));
            } else {
                println!("matched: {}", route.pattern);
                println!("config:  {}", route.config);
            }
        }
        None => {
            eprintln!("no route matched");
            std::process::exit(1);
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Value, String> {
    let Some(path) = path else {
        return Ok(json!({}));
    };
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("failed to parse {}: {}", path.display(), e))
}

/// Parse repeated key=value arguments into a flat tree. A bare key becomes
/// a boolean flag.
fn pairs_to_tree(pairs: &[String]) -> Value {
    let mut tree = Map::new();
    for pair in pairs {
        match pair.split_once('=') {
            Some((key, value)) => {
                tree.insert(key.to_string(), Value::String(value.to_string()));
            }
            None => {
                tree.insert(pair.clone(), Value::Bool(true));
            }
        }
    }
    Value::Object(tree)
}
