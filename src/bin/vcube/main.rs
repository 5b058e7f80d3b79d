//! vcube CLI - inspect and convert volumetric cube containers.

use std::env;
use std::path::{Path, PathBuf};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vcube::prelude::*;
use vcube::ocmbin::read_header_text;

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "warn";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-q" | "--quiet" => level = "error",
            _ => filtered_args.push(arg),
        }
    }
    init_logging(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    match filtered_args[0] {
        // Header command - dump the embedded header text as JSON
        "header" | "h" => {
            if filtered_args.len() < 2 {
                eprintln!("Error: missing file argument");
                eprintln!("Usage: vcube header <file.ocmbin>");
                std::process::exit(1);
            }
            cmd_header(filtered_args[1]);
        }

        // Info command - show cube summary
        "info" | "i" => {
            if filtered_args.len() < 2 {
                eprintln!("Error: missing file argument");
                eprintln!("Usage: vcube info <path>");
                std::process::exit(1);
            }
            cmd_info(filtered_args[1]);
        }

        // Convert command - load one container, save as another
        "convert" | "c" => {
            if filtered_args.len() < 3 {
                eprintln!("Error: missing arguments");
                eprintln!("Usage: vcube convert <source> <dest>");
                std::process::exit(1);
            }
            cmd_convert(filtered_args[1], filtered_args[2]);
        }

        "help" | "--help" => print_help(),

        other => {
            eprintln!("Error: unknown command '{}'", other);
            print_help();
            std::process::exit(1);
        }
    }
}

fn print_help() {
    println!("vcube - volumetric cube container tool");
    println!();
    println!("Usage: vcube [flags] <command> [args]");
    println!();
    println!("Commands:");
    println!("  header, h <file>           Extract the embedded header to <file stem>.json");
    println!("  info, i <path>             Show container format, datasets and shapes");
    println!("  convert, c <src> <dest>    Load <src> and save it as <dest>");
    println!("  help                       Show this help");
    println!();
    println!("Flags:");
    println!("  -v, --verbose              Debug logging");
    println!("  -q, --quiet                Errors only");
}

/// Extract the raw header text of a legacy container and write it, with
/// line endings normalized, to a `.json` file next to the input.
fn cmd_header(file: &str) {
    let path = Path::new(file);
    let text = match read_header_text(path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut output: PathBuf = path.to_path_buf();
    output.set_extension("json");
    if let Err(e) = std::fs::write(&output, text.replace("\r\n", "\n")) {
        eprintln!("Error: cannot write {}: {}", output.display(), e);
        std::process::exit(1);
    }
    println!("Wrote {}", output.display());
}

fn cmd_info(file: &str) {
    let cube = match open_cube(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("Path:    {}", file);
    println!("Format:  {}", cube.format());
    if let Some(name) = &cube.name {
        println!("Name:    {}", name);
    }
    if let Some(desc) = &cube.desc {
        println!("Desc:    {}", desc);
    }
    println!("Datasets:");
    for d in cube.descriptors() {
        let order = if d.order_defaulted {
            format!("{} (assumed)", d.order)
        } else {
            d.order.to_string()
        };
        println!("  {:<12} {:<8} {} {}", d.name, d.dtype, d.shape, order);
    }
    for (name, report) in cube.overlap_reports() {
        if report.overlapped {
            println!("Warning: dataset '{}' overlaps by {} bytes", name, report.overbyte);
        }
    }
}

fn cmd_convert(src: &str, dest: &str) {
    let cube = match open_cube(src) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = cube.save(dest) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    println!("Wrote {}", dest);
}
