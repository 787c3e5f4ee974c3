//! Extended CSS command-line tool
//!
//! Parses extended selectors, queries JSON document fixtures with them and
//! parses style blocks.
//!
//! Run with: cargo run --bin extcss -- parse 'div:has(> a:contains(Ad))'

mod render;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use extcss::{ExtCssDocument, ParseOptions, parse_style_block, parse_with_options};
use extcss_common::warning;
use extcss_dom::fixture::load_fixture;
use owo_colors::OwoColorize;

/// Extended CSS selector engine: parse, query and inspect selectors
#[derive(Parser, Debug)]
#[command(name = "extcss")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Print the AST of a selector
    extcss parse 'div:has(> a:contains(Ad))'

    # Print the AST as JSON, without folding standard :not()/:is()
    extcss parse --json --no-optimize 'p:not(.x)'

    # Query a JSON document fixture
    extcss query extcss-cli/fixtures/page.json 'div:contains(Sponsored)'

    # Parse a style block
    extcss style '{ display: none !important; }'

Set EXTCSS_DEBUG=1 to trace parsing and selection.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a selector and print its AST
    Parse {
        /// Selector to parse
        selector: String,

        /// Keep standard :not()/:is() arguments as extended pseudo-classes
        #[arg(long)]
        no_optimize: bool,

        /// Print the AST as JSON
        #[arg(long)]
        json: bool,
    },

    /// Select elements of a JSON document fixture
    Query {
        /// Path to the fixture
        #[arg(value_name = "FIXTURE.json")]
        fixture: PathBuf,

        /// Selector to query
        selector: String,
    },

    /// Parse a style block and print its declarations
    Style {
        /// Declarations, with or without the surrounding braces
        block: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Parse {
            selector,
            no_optimize,
            json,
        } => parse_command(&selector, !no_optimize, json),
        Command::Query { fixture, selector } => query_command(&fixture, &selector),
        Command::Style { block } => style_command(&block),
    }
}

fn parse_command(selector: &str, optimize: bool, json: bool) -> anyhow::Result<()> {
    let ast = parse_with_options(selector, ParseOptions { optimize })?;
    if json {
        println!("{}", serde_json::to_string_pretty(&ast)?);
        return Ok(());
    }
    println!("{}", "=== AST ===".bold());
    print!("{}", render::ast_tree(&ast));
    println!();
    println!("{} {ast}", "Selector:".bold());
    Ok(())
}

fn query_command(fixture: &Path, selector: &str) -> anyhow::Result<()> {
    let json = fs::read_to_string(fixture)
        .with_context(|| format!("Error reading '{}'", fixture.display()))?;
    let tree = load_fixture(&json)
        .with_context(|| format!("Error loading '{}'", fixture.display()))?;
    let document = ExtCssDocument::new(tree);

    let found = document.query_selector_all(selector)?;
    println!("{}", format!("=== {} matched ===", found.len()).bold());
    for node in found {
        println!("  {}", render::element(document.host(), node).green());
    }

    let warnings = warning::warning_count();
    if warnings > 0 {
        eprintln!("{}", format!("{warnings} warning(s)").yellow());
    }
    Ok(())
}

fn style_command(block: &str) -> anyhow::Result<()> {
    let declarations = parse_style_block(block)?;
    println!("{}", format!("=== {} declaration(s) ===", declarations.len()).bold());
    print!("{}", render::declarations(&declarations));
    Ok(())
}
