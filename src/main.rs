#![recursion_limit = "128"]

#[macro_use]
extern crate combine;

mod codegen;
mod emit;
mod error;
mod instr;
mod parser;
mod symtab;
mod syntax;

#[cfg(test)]
mod machine;

use crate::error::Error;
use clap::{App, Arg};
use std::fs;
use std::process;

fn compile(code: &str) -> Result<emit::Artifact, Error> {
    let program = parser::parse(code)?;
    let instrs = codegen::compile(&program)?;
    emit::emit(&instrs)
}

fn app() -> App<'static, 'static> {
    App::new("mipsc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compiles a source file to MIPS-like machine words")
        .arg(
            Arg::with_name("INPUT")
                .value_name("FILENAME")
                .help("Sets the input file to use")
                .required(true)
                .index(1),
        ).arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .value_name("FILE")
                .default_value("a.out")
                .help("Sets the binary output file")
                .takes_value(true),
        ).arg(
            Arg::with_name("textoutput")
                .short("t")
                .long("text-output")
                .value_name("FILE")
                .default_value("a.txt")
                .help("Sets the bit-string output file")
                .takes_value(true),
        ).arg(
            Arg::with_name("listing")
                .short("l")
                .long("listing")
                .help("Prints an assembly listing of the generated code"),
        ).arg(
            Arg::with_name("loglevel")
                .long("log-level")
                .value_name("FILTER")
                .default_value("warn")
                .help("Sets the log filter, e.g. debug or mipsc=trace")
                .takes_value(true),
        )
}

fn main_result() -> Result<String, Error> {
    let args = app().get_matches();

    tracing_subscriber::fmt()
        .with_env_filter(args.value_of("loglevel").unwrap_or("warn"))
        .with_writer(std::io::stderr)
        .init();

    let path = args
        .value_of("INPUT")
        .ok_or_else(|| Error::Usage("no input file given".to_string()))?;
    let output = args.value_of("output").unwrap_or("a.out");
    let text_output = args.value_of("textoutput").unwrap_or("a.txt");

    let code = fs::read_to_string(path)?;
    let artifact = compile(&code)?;
    if args.is_present("listing") {
        print!("{}", artifact.listing());
    }
    artifact.write(output, text_output)?;
    Ok(format!(
        "Wrote {} instructions to {} and {}",
        artifact.len(),
        output,
        text_output
    ))
}

fn main() {
    match main_result() {
        Ok(summary) => println!("{}", summary),
        Err(err) => {
            println!("An error occurred.\n{}", err);
            process::exit(1)
        }
    }
}
