// Command-line interface for expression documents
//
// exprx reads documents written by the expr-babel encoder, checks them, and rewrites them.
// Every command goes through the full decode, so a file that passes is one the library can
// rebuild into an expression tree.
//
// Usage:
//  exprx inspect <path> [--from <format>]                         - Print an outline of the tree
//  exprx validate <path> [--from <format>]                        - Schema check, then decode
//  exprx roundtrip <path> [--from <format>] [--to <format>]       - Decode and encode again
//  exprx convert <input> --to <format> [--from <format>] [-o <file>]
//
// The source format is detected from the file extension unless --from is given.
// Logging goes to stderr and is controlled by EXPRX_LOG (defaults to "warn").

use clap::{Arg, ArgMatches, Command, ValueHint};
use expr_babel::expr::outline;
use expr_babel::io::{self, Schema};
use expr_babel::{TransformOptions, Transformer};
use expr_config::{ExprConfig, Loader};
use std::fs;
use tracing_subscriber::EnvFilter;

const CONVENTIONS: &[&str] = &["short", "full", "assembly-qualified"];
const FORMATS: &[&str] = &["xml", "json"];

fn from_arg() -> Arg {
    Arg::new("from")
        .long("from")
        .help("Source format (auto-detected from file extension if not specified)")
        .value_parser(clap::builder::PossibleValuesParser::new(FORMATS))
        .value_hint(ValueHint::Other)
}

fn path_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .help(help)
        .required(true)
        .index(1)
        .value_hint(ValueHint::FilePath)
}

fn build_cli() -> Command {
    Command::new("exprx")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for inspecting and converting expression documents")
        .long_about(
            "exprx works with expression-tree documents written by expr-babel.\n\n\
            Commands:\n  \
            - inspect:   Print the decoded tree as an indented outline\n  \
            - validate:  Check a document against the built-in schema and decode it\n  \
            - roundtrip: Decode a document and encode it again\n  \
            - convert:   Rewrite a document in another format (xml, json)\n\n\
            Examples:\n  \
            exprx inspect tree.xml\n  \
            exprx validate tree.xml\n  \
            exprx roundtrip tree.xml --convention full\n  \
            exprx convert tree.xml --to json -o tree.json",
        )
        .arg_required_else_help(true)
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to an exprx.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("convention")
                .long("convention")
                .help("Type naming convention used when encoding")
                .value_parser(clap::builder::PossibleValuesParser::new(CONVENTIONS))
                .global(true),
        )
        .subcommand(
            Command::new("inspect")
                .about("Print an outline of the expression tree in a document")
                .arg(path_arg("path", "Path to the document"))
                .arg(from_arg()),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate a document against the built-in schema")
                .long_about(
                    "Checks the tag vocabulary and required attributes of every element,\n\
                    then decodes the document to catch dangling references, unknown types\n\
                    and malformed literals.\n\n\
                    Exits with status 1 if anything is wrong.",
                )
                .arg(path_arg("path", "Path to the document"))
                .arg(from_arg()),
        )
        .subcommand(
            Command::new("roundtrip")
                .about("Decode a document and encode it again")
                .arg(path_arg("path", "Path to the document"))
                .arg(from_arg())
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Output format (defaults to output.format from the configuration)")
                        .value_parser(clap::builder::PossibleValuesParser::new(FORMATS)),
                ),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert a document between formats")
                .arg(path_arg("input", "Input file path"))
                .arg(from_arg())
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Target format (required)")
                        .required(true)
                        .value_parser(clap::builder::PossibleValuesParser::new(FORMATS)),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Output file path (defaults to stdout)")
                        .value_hint(ValueHint::FilePath),
                ),
        )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("EXPRX_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let matches = build_cli().get_matches();

    let config = load_cli_config(
        matches.get_one::<String>("config").map(|s| s.as_str()),
        matches.get_one::<String>("convention").map(|s| s.as_str()),
    );
    tracing::debug!(
        convention = ?config.naming.convention,
        validation = ?config.validation.mode,
        "configuration loaded"
    );
    let mut transformer = Transformer::new(TransformOptions::from(&config));

    match matches.subcommand() {
        Some(("inspect", sub_matches)) => {
            let path = required(sub_matches, "path");
            let from = source_format(&transformer, sub_matches, path);
            handle_inspect_command(&mut transformer, path, &from);
        }
        Some(("validate", sub_matches)) => {
            let path = required(sub_matches, "path");
            let from = source_format(&transformer, sub_matches, path);
            handle_validate_command(&mut transformer, path, &from);
        }
        Some(("roundtrip", sub_matches)) => {
            let path = required(sub_matches, "path");
            let from = source_format(&transformer, sub_matches, path);
            let to = sub_matches
                .get_one::<String>("to")
                .cloned()
                .unwrap_or_else(|| config.output.format.clone());
            handle_convert_command(&mut transformer, path, &from, &to, None);
        }
        Some(("convert", sub_matches)) => {
            let input = required(sub_matches, "input");
            let from = source_format(&transformer, sub_matches, input);
            let to = required(sub_matches, "to");
            let output = sub_matches.get_one::<String>("output").map(|s| s.as_str());
            handle_convert_command(&mut transformer, input, &from, to, output);
        }
        _ => {
            eprintln!("Unknown subcommand. Use --help for usage information.");
            std::process::exit(1);
        }
    }
}

fn required<'m>(matches: &'m ArgMatches, name: &str) -> &'m str {
    matches
        .get_one::<String>(name)
        .map(|s| s.as_str())
        .unwrap_or_else(|| {
            eprintln!("Error: missing argument '{name}'");
            std::process::exit(2);
        })
}

/// `--from` if given, else detected from the file extension.
fn source_format(transformer: &Transformer, matches: &ArgMatches, path: &str) -> String {
    if let Some(from) = matches.get_one::<String>("from") {
        return from.clone();
    }
    match transformer.formats().detect(path) {
        Some(detected) => detected.to_string(),
        None => {
            eprintln!("Error: Could not detect format from filename '{path}'");
            eprintln!("Please specify --from explicitly");
            std::process::exit(1);
        }
    }
}

fn read_input(path: &str) -> Vec<u8> {
    fs::read(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{path}': {e}");
        std::process::exit(1);
    })
}

fn handle_inspect_command(transformer: &mut Transformer, path: &str, from: &str) {
    let bytes = read_input(path);
    let expr = transformer.from_bytes(&bytes, from).unwrap_or_else(|e| {
        eprintln!("Decode error: {e}");
        std::process::exit(1);
    });
    print!("{}", outline(&expr));
}

/// Schema problems are all reported before giving up; decode errors stop at the first.
fn handle_validate_command(transformer: &mut Transformer, path: &str, from: &str) {
    let bytes = read_input(path);
    let document = transformer.formats().parse(&bytes, from).unwrap_or_else(|e| {
        eprintln!("Parse error: {e}");
        std::process::exit(1);
    });

    let schema = transformer
        .options()
        .schema
        .clone()
        .unwrap_or_else(|| std::sync::Arc::new(Schema::builtin()));
    let errors = io::validate(&document, &schema);
    if !errors.is_empty() {
        for error in &errors {
            println!("{error}");
        }
        eprintln!("{path}: {} schema error(s)", errors.len());
        std::process::exit(1);
    }

    if let Err(e) = transformer.decode(&document) {
        println!("{e}");
        eprintln!("{path}: does not decode");
        std::process::exit(1);
    }
    println!("{path}: ok");
}

fn handle_convert_command(
    transformer: &mut Transformer,
    input: &str,
    from: &str,
    to: &str,
    output: Option<&str>,
) {
    let bytes = read_input(input);
    let expr = transformer.from_bytes(&bytes, from).unwrap_or_else(|e| {
        eprintln!("Decode error: {e}");
        std::process::exit(1);
    });
    let result = transformer.to_bytes(&expr, to).unwrap_or_else(|e| {
        eprintln!("Encode error: {e}");
        std::process::exit(1);
    });

    match output {
        Some(path) => {
            fs::write(path, result).unwrap_or_else(|e| {
                eprintln!("Error writing file '{path}': {e}");
                std::process::exit(1);
            });
        }
        None => print!("{}", String::from_utf8_lossy(&result)),
    }
}

fn load_cli_config(explicit_path: Option<&str>, convention: Option<&str>) -> ExprConfig {
    let loader = Loader::new().with_optional_file("exprx.toml");
    let loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };
    let loader = match convention {
        Some(convention) => loader.set_override("naming.convention", convention),
        None => Ok(loader),
    };

    loader.and_then(Loader::build).unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use expr_babel::NamingConvention;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn convention_flag_overrides_config() {
        let config = load_cli_config(None, Some("full"));
        assert_eq!(config.naming.convention, NamingConvention::Full);
        let config = load_cli_config(None, None);
        assert_eq!(config.naming.convention, NamingConvention::Short);
    }

    #[test]
    fn convert_requires_target() {
        let result = build_cli().try_get_matches_from(["exprx", "convert", "tree.xml"]);
        assert!(result.is_err());
        let matches = build_cli()
            .try_get_matches_from(["exprx", "convert", "tree.xml", "--to", "json", "-o", "out.json"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "convert");
        assert_eq!(required(sub, "to"), "json");
        assert_eq!(required(sub, "output"), "out.json");
    }
}
