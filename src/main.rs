// Copyright 2024 The DocAssert Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use recursive_compare::{compare, CompareError, DifferenceReport, Path, RuleSet, Value};

#[doc(hidden)]
#[macro_export]
macro_rules! handle_error {
    ($code:expr, $msg:expr, $($arg:tt)*) => {
        eprintln!($msg, $($arg)*);
        std::process::exit($code);
    };

    ($code:expr, $msg:expr) => {
        eprintln!($msg);
        std::process::exit($code);
    };
}

#[doc(hidden)]
struct Code;

impl Code {
    const SUCCESS: i32 = 0;
    const INTERNAL_ERROR: i32 = 1;
    const INVALID_ARGUMENT: i32 = 2;
    const PARSING_ERROR: i32 = 3;
    const DIFFERENCES_FOUND: i32 = 4;
}

#[doc(hidden)]
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON document under test
    actual: PathBuf,

    /// JSON document it should match
    expected: PathBuf,

    /// Path to leave out of the comparison, e.g. `items[*].id`
    #[clap(long = "ignore-path", value_name = "PATH")]
    ignore_paths: Vec<Path>,

    /// Field name to leave out wherever it appears
    #[clap(long = "ignore-field", value_name = "FIELD")]
    ignore_fields: Vec<String>,

    /// Compare every array as an unordered collection
    #[clap(long)]
    ignore_order: bool,

    /// Report values of different JSON types as type mismatches
    #[clap(long)]
    strict_types: bool,

    /// Print the differences as JSON
    #[clap(long)]
    json: bool,
}

fn read_document(file: &PathBuf) -> Value {
    let content = match std::fs::read_to_string(file) {
        Ok(content) => content,
        Err(err) => {
            handle_error!(
                Code::INVALID_ARGUMENT,
                "Error reading {}: {}",
                file.display(),
                err
            );
        }
    };

    match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(json) => Value::from(json),
        Err(err) => {
            handle_error!(
                Code::PARSING_ERROR,
                "Error parsing {}: {}",
                file.display(),
                err
            );
        }
    }
}

fn print_report(report: &DifferenceReport, json: bool) {
    if !json {
        println!("{}", report);
        return;
    }

    match serde_json::to_string_pretty(report) {
        Ok(out) => println!("{}", out),
        Err(err) => {
            handle_error!(Code::INTERNAL_ERROR, "Error: {}", err);
        }
    }
}

#[doc(hidden)]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("recursive_compare=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let actual = read_document(&cli.actual);
    let expected = read_document(&cli.expected);

    let rules = RuleSet::new()
        .ignore_paths(cli.ignore_paths)
        .ignore_fields(cli.ignore_fields)
        .ignore_collection_order(cli.ignore_order)
        .with_strict_type_checking(cli.strict_types);

    debug!(
        actual = %cli.actual.display(),
        expected = %cli.expected.display(),
        "comparing documents"
    );

    match compare(&actual, &expected, &rules) {
        Ok(report) => {
            print_report(&report, cli.json);
            if report.is_empty() {
                std::process::exit(Code::SUCCESS);
            }
            std::process::exit(Code::DIFFERENCES_FOUND);
        }
        Err(err @ CompareError::Configuration(_)) => {
            handle_error!(Code::INVALID_ARGUMENT, "Error: {}", err);
        }
        Err(err) => {
            handle_error!(Code::INTERNAL_ERROR, "Error: {}", err);
        }
    }
}
