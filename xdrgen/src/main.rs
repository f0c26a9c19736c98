use clap::{Parser, ValueEnum};
use codespan_reporting::term::termcolor::ColorChoice;
use std::path::PathBuf;

use xdrgen::codegen::Options;
use xdrgen::{Driver, Status};

/// Compile XDR and ONC RPC interface descriptions to Rust
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Path to the `.x` file to compile, or `-` for standard input
    #[clap(short = 'i', long = "input", name = "INPUT", display_order = 0)]
    input: PathOrStd,
    /// Path of the Rust file to write, or `-` for standard output
    #[clap(short = 'o', long = "output", name = "OUTPUT", display_order = 1)]
    output: PathOrStd,
    /// Wrap the generated code in a public module of this name
    #[clap(short = 'p', long = "module", name = "MODULE", display_order = 2)]
    module: Option<String>,
    /// Log tokens and generation steps to standard error
    #[clap(short = 'd', long = "debug")]
    debug: bool,
    /// Represent enumerations as `u32` instead of `i32`
    #[clap(long = "unsigned-enums")]
    unsigned_enums: bool,
    /// The Rust type of `const` definitions
    #[clap(long = "const-type", name = "TYPE", default_value = "i64")]
    const_type: String,
    /// Path of the runtime crate in generated code
    #[clap(long = "runtime", name = "PATH", default_value = "::xdrgen_runtime")]
    runtime: String,
    /// When to use colours in diagnostics
    #[clap(long = "color", value_enum, default_value = "auto")]
    color: ColorOption,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorOption {
    Auto,
    Always,
    Never,
}

#[derive(Clone, Debug)]
enum PathOrStd {
    Std,
    Path(PathBuf),
}

impl std::str::FromStr for PathOrStd {
    type Err = std::convert::Infallible;

    fn from_str(src: &str) -> Result<PathOrStd, std::convert::Infallible> {
        match src {
            "-" => Ok(PathOrStd::Std),
            _ => Ok(PathOrStd::Path(PathBuf::from(src))),
        }
    }
}

/// Check the options that are spliced into generated code.
fn options(cli: &Cli) -> anyhow::Result<Options> {
    if let Some(module) = &cli.module {
        syn::parse_str::<syn::Ident>(module)
            .map_err(|_| anyhow::anyhow!("`{module}` is not a valid module name"))?;
    }
    syn::parse_str::<syn::Type>(&cli.const_type)
        .map_err(|_| anyhow::anyhow!("`{}` is not a valid Rust type", cli.const_type))?;
    syn::parse_str::<syn::Path>(&cli.runtime)
        .map_err(|_| anyhow::anyhow!("`{}` is not a valid Rust path", cli.runtime))?;

    Ok(Options {
        module: cli.module.clone(),
        unsigned_enums: cli.unsigned_enums,
        const_type: cli.const_type.clone(),
        runtime: cli.runtime.clone(),
    })
}

fn run(cli: Cli) -> anyhow::Result<Status> {
    let level = match cli.debug {
        true => tracing::Level::DEBUG,
        false => tracing::Level::WARN,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut driver = Driver::new();
    driver.install_panic_hook();
    match cli.color {
        ColorOption::Auto => {}
        ColorOption::Always => driver.set_color_choice(ColorChoice::Always),
        ColorOption::Never => driver.set_color_choice(ColorChoice::Never),
    }
    driver.set_options(options(&cli)?);

    let file_id = match &cli.input {
        PathOrStd::Std => driver.load_source("<stdin>".to_owned(), std::io::stdin()),
        PathOrStd::Path(path) => driver.load_source_path(path),
    };
    let file_id = match file_id {
        Some(file_id) => file_id,
        None => return Ok(Status::Error),
    };

    Ok(match &cli.output {
        PathOrStd::Std => driver.compile_and_print(file_id),
        PathOrStd::Path(path) => driver.compile_and_write(file_id, path),
    })
}

fn main() -> ! {
    let status = match run(Cli::parse()) {
        Ok(status) => status,
        Err(error) => {
            eprintln!("error: {error:#}");
            Status::Error
        }
    };

    std::process::exit(status.exit_code());
}
