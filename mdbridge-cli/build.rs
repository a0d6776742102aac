use clap::{Arg, ArgAction, Command, ValueHint};
use clap_complete::{generate_to, shells::*};
use std::env;
use std::io::Error;

// Mirror of the flavor and format names known to mdbridge-babel.
// Build scripts can't depend on the library they are building for.
const FLAVORS: &[&str] = &["commonmark", "gfm", "obsidian", "docusaurus"];
const FORMATS: &[&str] = &["json", "markdown"];

fn flavor_arg() -> Arg {
    Arg::new("flavor")
        .long("flavor")
        .help("Markdown output flavor")
        .value_parser(clap::builder::PossibleValuesParser::new(FLAVORS))
}

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .help("Output file path")
        .value_hint(ValueHint::FilePath)
}

fn input_arg() -> Arg {
    Arg::new("input")
        .help("Input file path")
        .required(true)
        .index(1)
        .value_hint(ValueHint::FilePath)
}

fn main() -> Result<(), Error> {
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };

    let mut cmd = Command::new("mdbridge")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert between Markdown and editor document trees")
        .arg(
            Arg::new("list-formats")
                .long("list-formats")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-flavors")
                .long("list-flavors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert between document formats")
                .arg(input_arg())
                .arg(
                    Arg::new("from")
                        .long("from")
                        .value_parser(clap::builder::PossibleValuesParser::new(FORMATS)),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .value_parser(clap::builder::PossibleValuesParser::new(FORMATS)),
                )
                .arg(flavor_arg())
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("normalize")
                .about("Parse Markdown and write it back under a flavor")
                .arg(input_arg())
                .arg(flavor_arg())
                .arg(output_arg()),
        );

    generate_to(Bash, &mut cmd, "mdbridge", &outdir)?;
    generate_to(Zsh, &mut cmd, "mdbridge", &outdir)?;
    generate_to(Fish, &mut cmd, "mdbridge", &outdir)?;

    println!("cargo:warning=Shell completions generated in {outdir:?}");

    Ok(())
}
