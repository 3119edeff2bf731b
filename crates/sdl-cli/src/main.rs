//! Command-line front door for the SDL compiler: reads a `.dsl` file from
//! disk and either writes the IR as JSON to stdout, or prints diagnostics
//! (spec.md §6's in-process API is the contract this wraps; the HTTP
//! boundary in the same section is a separate, out-of-scope collaborator).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use sdl_common::SourceFile;
use sdl_compiler::Compiler;
use sdl_diagnostics::format_terminal;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// The `Exxx: message / --> file:line:col` gutter form (spec.md §4.1).
    Text,
    /// The machine-readable diagnostic/IR JSON wire form (spec.md §6).
    Json,
}

/// Compiles an SDL scene description into IR.
#[derive(Parser)]
#[command(name = "sdlc")]
#[command(version)]
#[command(about = "Compiles an SDL scene description into IR", long_about = None)]
struct Cli {
    /// Path to the `.dsl` source file.
    #[arg(value_name = "FILE")]
    path: PathBuf,

    /// Additional TOML file of library -> provided type names, merged on
    /// top of the four built-in libraries before compiling.
    #[arg(long, value_name = "TOML")]
    library_registry: Option<PathBuf>,

    /// Diagnostic/output rendering format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Print W4xx warnings even on a successful compile.
    #[arg(long)]
    emit_warnings: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    run(&cli).unwrap_or_else(|err| {
        eprintln!("sdlc: {}", err);
        ExitCode::FAILURE
    })
}

fn run(cli: &Cli) -> sdl_common::Result<ExitCode> {
    let source = std::fs::read_to_string(&cli.path)
        .map_err(|err| sdl_common::Error::FileIo(format!("{}: {}", cli.path.display(), err)))?;
    let file_id = cli.path.display().to_string();

    let mut compiler = Compiler::new();
    if let Some(path) = &cli.library_registry {
        let extension = sdl_compiler::config::load_library_registry_file(path)?;
        compiler = compiler.with_library_registry(extension);
    }

    match compiler.compile(&source, &file_id) {
        Ok(output) => {
            if cli.emit_warnings && !output.warnings.is_empty() {
                print_diagnostics(&output.warnings, &source, &file_id, cli.format);
            }
            // The IR's only wire shape is JSON (spec.md §6); `--format`
            // governs diagnostic rendering, not a second IR serialization.
            let json = serde_json::to_string_pretty(&output.ir)
                .map_err(|err| sdl_common::Error::InvalidArgument(err.to_string()))?;
            println!("{}", json);
            Ok(ExitCode::SUCCESS)
        }
        Err(diagnostics) => {
            print_diagnostics(&diagnostics, &source, &file_id, cli.format);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_diagnostics(
    diagnostics: &[sdl_diagnostics::Diagnostic],
    source: &str,
    file_id: &str,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Text => {
            let source_file = SourceFile::new(file_id, source);
            for diagnostic in diagnostics {
                eprintln!("{}", format_terminal(diagnostic, &source_file));
                eprintln!();
            }
        }
        OutputFormat::Json => {
            let wire: Vec<_> = diagnostics.iter().map(|d| d.to_wire()).collect();
            match serde_json::to_string_pretty(&wire) {
                Ok(json) => eprintln!("{}", json),
                Err(err) => eprintln!("sdlc: failed to serialize diagnostics: {}", err),
            }
        }
    }
}
