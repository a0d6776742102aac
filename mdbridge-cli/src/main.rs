// Command-line interface for mdbridge
//
// Converts between Markdown and editor JSON trees and normalizes Markdown
// under a flavor. All conversion work happens in mdbridge-babel; this binary
// wires files, configuration and logging around it.
//
// Usage:
//  mdbridge <input> --to <format> [--from <format>] [--flavor <f>] [-o <file>]   - Convert (default)
//  mdbridge convert <input> --to <format> ...                                     - Same as above (explicit)
//  mdbridge normalize <input> [--flavor <f>] [-o <file>]                          - Re-emit Markdown under a flavor
//  mdbridge --list-formats | --list-flavors
//
// Configuration: built-in defaults, then ./mdbridge.toml when present, then
// --config <path>. Command-line flags win over all of them.
//
// Extra Parameters:
//
// Format-specific parameters can be passed using --extra-<parameter-name> <value>.
// The "extra-" prefix is stripped and the pair goes to the target format.
// Example:
//  mdbridge doc.md --to json --extra-pretty false

mod logging;

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use mdbridge_babel::formats::{JsonFormat, MarkdownFormat};
use mdbridge_babel::{ExtensionRegistry, Flavor, Format, FormatRegistry};
use mdbridge_config::{Loader, MdbridgeConfig, LOCAL_CONFIG_FILE};
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use tracing::{debug, warn};

const SUBCOMMANDS: &[&str] = &["convert", "normalize", "help"];

/// Parse extra-* arguments from command line args
/// Returns (cleaned_args_without_extras, extra_params_map)
///
/// `--extra-<key> <value>` sets a value; a bare `--extra-<key>` means "true".
fn parse_extra_args(args: &[String]) -> (Vec<String>, HashMap<String, String>) {
    let mut cleaned_args = Vec::new();
    let mut extra_params = HashMap::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        if let Some(key) = arg.strip_prefix("--extra-") {
            let value = args.get(i + 1).filter(|next| !next.starts_with('-'));
            match value {
                Some(value) => {
                    extra_params.insert(key.to_string(), value.clone());
                    i += 2;
                }
                None => {
                    extra_params.insert(key.to_string(), "true".to_string());
                    i += 1;
                }
            }
            continue;
        }

        cleaned_args.push(arg.clone());
        i += 1;
    }

    (cleaned_args, extra_params)
}

fn flavor_arg() -> Arg {
    Arg::new("flavor")
        .long("flavor")
        .value_name("FLAVOR")
        .help("Markdown output flavor: commonmark, gfm, obsidian, docusaurus")
        .long_help(
            "Markdown output flavor.\n\n\
            Flavors only change how callouts and wiki links are written;\n\
            every flavor is accepted on input. Unknown names fall back to gfm.",
        )
        .value_hint(ValueHint::Other)
}

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .help("Output file path (defaults to stdout)")
        .value_hint(ValueHint::FilePath)
}

fn build_cli() -> Command {
    Command::new("mdbridge")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert between Markdown and editor document trees")
        .long_about(
            "mdbridge converts Markdown with callouts, mentions, math, wiki links\n\
            and diagrams to and from editor JSON document trees.\n\n\
            Examples:\n  \
            mdbridge notes.md --to json                  # Markdown to JSON (stdout)\n  \
            mdbridge tree.json --to markdown -o out.md   # JSON tree to Markdown file\n  \
            mdbridge normalize notes.md --flavor obsidian",
        )
        .arg_required_else_help(true)
        .subcommand_required(false)
        .arg(
            Arg::new("list-formats")
                .long("list-formats")
                .help("List available conversion formats")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("list-flavors")
                .long("list-flavors")
                .help("List Markdown output flavors")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to an mdbridge.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Increase log verbosity (-v debug, -vv trace)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert between document formats (default command)")
                .long_about(
                    "Convert documents between formats.\n\n\
                    Supported formats:\n  \
                    - markdown: Markdown (.md, .markdown)\n  \
                    - json:     Editor document tree (.json)\n\n\
                    The source format is auto-detected from the file extension.\n\
                    Output goes to stdout by default, or use -o to specify a file.",
                )
                .arg(
                    Arg::new("input")
                        .help("Input file path")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("Source format (auto-detected from file extension if not specified)")
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Target format (required)")
                        .required(true)
                        .value_hint(ValueHint::Other),
                )
                .arg(flavor_arg())
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("normalize")
                .about("Parse Markdown and write it back under a flavor")
                .long_about(
                    "Parse a Markdown file and re-serialize it.\n\n\
                    Any callout spelling is read; the output uses the spelling of the\n\
                    configured flavor. Useful for moving notes between tools.\n\n\
                    Examples:\n  \
                    mdbridge normalize notes.md                      # gfm to stdout\n  \
                    mdbridge normalize notes.md --flavor docusaurus  # ::: directives",
                )
                .arg(
                    Arg::new("input")
                        .help("Input Markdown file")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(flavor_arg())
                .arg(output_arg()),
        )
}

/// Prepend `convert` when the first argument is an input path.
fn inject_default_subcommand(args: &[String]) -> Option<Vec<String>> {
    let first = args.get(1)?;
    if first.starts_with('-') || SUBCOMMANDS.contains(&first.as_str()) {
        return None;
    }
    let mut injected = vec![args[0].clone(), "convert".to_string()];
    injected.extend_from_slice(&args[1..]);
    Some(injected)
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let (cleaned_args, extra_params) = parse_extra_args(&args);

    let cli = build_cli();
    let matches = match cli.clone().try_get_matches_from(&cleaned_args) {
        Ok(m) => m,
        Err(e) => match inject_default_subcommand(&cleaned_args) {
            Some(injected) => match cli.try_get_matches_from(&injected) {
                Ok(m) => m,
                Err(e2) => e2.exit(),
            },
            None => e.exit(),
        },
    };

    logging::init_logging(&logging::LogConfig::from_verbosity(
        matches.get_count("verbose"),
    ));

    if matches.get_flag("list-formats") {
        handle_list_formats_command();
        return;
    }
    if matches.get_flag("list-flavors") {
        handle_list_flavors_command();
        return;
    }

    match matches.subcommand() {
        Some(("convert", sub_matches)) => {
            let config = load_cli_config(&matches, sub_matches);
            let registry = registry_from_config(&config);
            let Some(input) = sub_matches.get_one::<String>("input") else {
                fail("an input file is required");
            };
            let Some(to) = sub_matches.get_one::<String>("to") else {
                fail("--to is required");
            };

            let from = match sub_matches.get_one::<String>("from") {
                Some(from) => from.clone(),
                None => registry
                    .detect_format_from_filename(input)
                    .unwrap_or_else(|| {
                        eprintln!("Error: Could not detect format from filename '{input}'");
                        eprintln!("Please specify --from explicitly");
                        std::process::exit(1);
                    }),
            };

            let output = sub_matches.get_one::<String>("output").map(|s| s.as_str());
            handle_convert_command(&registry, input, &from, to, output, &extra_params);
        }
        Some(("normalize", sub_matches)) => {
            let config = load_cli_config(&matches, sub_matches);
            let registry = registry_from_config(&config);
            let Some(input) = sub_matches.get_one::<String>("input") else {
                fail("an input file is required");
            };
            let output = sub_matches.get_one::<String>("output").map(|s| s.as_str());
            handle_convert_command(&registry, input, "markdown", "markdown", output, &extra_params);
        }
        _ => {
            eprintln!("Unknown subcommand. Use --help for usage information.");
            std::process::exit(1);
        }
    }
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {message}");
    std::process::exit(1);
}

/// Handle the convert and normalize commands
fn handle_convert_command(
    registry: &FormatRegistry,
    input: &str,
    from: &str,
    to: &str,
    output: Option<&str>,
    extra_params: &HashMap<String, String>,
) {
    // Validate formats exist before touching the filesystem
    if let Err(e) = registry.get(from) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    if let Err(e) = registry.get(to) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let source = fs::read_to_string(input).unwrap_or_else(|e| {
        eprintln!("Error reading file '{input}': {e}");
        std::process::exit(1);
    });

    debug!(input, from, to, "converting");
    let doc = registry.parse(&source, from).unwrap_or_else(|e| {
        eprintln!("Parse error: {e}");
        std::process::exit(1);
    });

    let result = registry
        .serialize_with_options(&doc, to, extra_params)
        .unwrap_or_else(|e| {
            eprintln!("Serialization error: {e}");
            std::process::exit(1);
        });

    match output {
        Some(path) => {
            fs::write(path, result).unwrap_or_else(|e| {
                eprintln!("Error writing file '{path}': {e}");
                std::process::exit(1);
            });
            debug!(path, "wrote output");
        }
        None => print!("{result}"),
    }
}

fn handle_list_formats_command() {
    let registry = FormatRegistry::default();
    println!("Conversion formats:");
    for name in registry.list_formats() {
        let (extensions, description) = match registry.get(&name) {
            Ok(format) => (
                format
                    .file_extensions()
                    .iter()
                    .map(|ext| format!(".{ext}"))
                    .collect::<Vec<_>>()
                    .join(", "),
                format.description().to_string(),
            ),
            Err(_) => continue,
        };
        println!("  {name:<10} {description} ({extensions})");
    }
}

fn handle_list_flavors_command() {
    println!("Markdown flavors:");
    for flavor in Flavor::ALL {
        let marker = if flavor == Flavor::default() {
            " (default)"
        } else {
            ""
        };
        println!("  {:<11} {}{marker}", flavor.as_str(), describe_flavor(flavor));
    }
}

fn describe_flavor(flavor: Flavor) -> &'static str {
    match flavor {
        Flavor::CommonMark => "callouts as plain blockquotes, wiki links as links",
        Flavor::Gfm => "callouts as > [!NOTE] alerts, wiki links as links",
        Flavor::Obsidian => "callouts as > [!note] callouts, [[wiki links]] kept",
        Flavor::Docusaurus => "callouts as :::note directives, wiki links as links",
    }
}

/// Resolve a `--flavor` value, warning when it falls back to the default.
fn flavor_from_arg(raw: &str) -> Flavor {
    let flavor = Flavor::parse_lenient(raw);
    if !flavor.as_str().eq_ignore_ascii_case(raw.trim()) {
        warn!(requested = raw, using = %flavor, "unknown flavor");
    }
    flavor
}

fn load_cli_config(matches: &ArgMatches, sub_matches: &ArgMatches) -> MdbridgeConfig {
    let explicit_path = matches
        .get_one::<String>("config")
        .or_else(|| sub_matches.get_one::<String>("config"));
    let flavor = sub_matches
        .get_one::<String>("flavor")
        .map(|raw| flavor_from_arg(raw));

    build_config(explicit_path.map(|s| s.as_str()), flavor).unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    })
}

fn build_config(
    explicit_path: Option<&str>,
    flavor: Option<Flavor>,
) -> Result<MdbridgeConfig, mdbridge_config::ConfigError> {
    let mut loader = Loader::new().with_optional_file(LOCAL_CONFIG_FILE);
    if let Some(path) = explicit_path {
        loader = loader.with_file(path);
    }
    if let Some(flavor) = flavor {
        loader = loader.set_override("markdown.flavor", flavor.as_str())?;
    }
    loader.build()
}

fn registry_from_config(config: &MdbridgeConfig) -> FormatRegistry {
    let extensions = Arc::new(ExtensionRegistry::with_defaults());
    let mut registry = FormatRegistry::new();
    registry.register(
        MarkdownFormat::new(extensions, config.markdown.flavor)
            .with_diagram_transform(config.sync.transform_diagrams_on_import),
    );
    registry.register(JsonFormat::new(config.convert.pretty_json));
    registry
}
