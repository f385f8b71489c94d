//! Formbatch command line
//!
//! Fills a PDF form template once per CSV row, flattens every filled copy
//! and merges them into one document.
//!
//! Usage:
//!   formbatch <template.pdf> <input.csv> [output_dir] [--config <config.json>]
//!   formbatch --write-csv-template <dest.csv>
//!   formbatch --write-schema <template.pdf> <dest.json>
//!
//! Logging is controlled with `RUST_LOG` (default `info`).

use anyhow::{bail, Context};
use formbatch::{process_csv, write_csv_template, BatchConfig};
use pdf_core::PdfDocument;
use template::SchemaFile;

fn usage(program: &str) {
    eprintln!("Usage: {program} <template.pdf> <input.csv> [output_dir] [--config <config.json>]");
    eprintln!("       {program} --write-csv-template <dest.csv>");
    eprintln!("       {program} --write-schema <template.pdf> <dest.json>");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {program} template.pdf invoices.csv out");
    eprintln!("  {program} template.pdf invoices.csv --config rasterize.json");
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let code = match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };
    std::process::exit(code);
}

fn run(args: &[String]) -> anyhow::Result<i32> {
    let program = args.first().map(String::as_str).unwrap_or("formbatch");

    match args.get(1).map(String::as_str) {
        Some("--write-csv-template") => {
            let Some(dest) = args.get(2) else {
                usage(program);
                return Ok(1);
            };
            write_csv_template(dest)
                .with_context(|| format!("Failed to save template to '{dest}'"))?;
            println!("CSV template saved to {dest}");
            return Ok(0);
        }
        Some("--write-schema") => {
            let (Some(template_path), Some(dest)) = (args.get(2), args.get(3)) else {
                usage(program);
                return Ok(1);
            };
            let doc = PdfDocument::open(template_path)
                .with_context(|| format!("Failed to read template '{template_path}'"))?;
            let schema = SchemaFile::from_field_names(&doc.form_field_names()?);
            std::fs::write(dest, schema.to_json()?)
                .with_context(|| format!("Failed to write schema '{dest}'"))?;
            println!("Schema with {} fields saved to {dest}", schema.fields.len());
            return Ok(0);
        }
        Some("-h") | Some("--help") => {
            usage(program);
            return Ok(0);
        }
        _ => {}
    }

    let mut positional = Vec::new();
    let mut config_path = None;
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--config" => match rest.next() {
                Some(path) => config_path = Some(path.clone()),
                None => bail!("--config needs a file argument"),
            },
            flag if flag.starts_with("--") => bail!("Unknown option '{flag}'"),
            _ => positional.push(arg.clone()),
        }
    }

    if positional.len() < 2 || positional.len() > 3 {
        usage(program);
        return Ok(1);
    }
    let template_path = &positional[0];
    let csv_path = &positional[1];

    let mut config = match &config_path {
        Some(path) => BatchConfig::from_file(path)?,
        None => BatchConfig::default(),
    };
    // An explicit output directory wins over the config file
    if let Some(output_dir) = positional.get(2) {
        config = config.with_output_dir(output_dir);
    }

    match process_csv(csv_path, template_path, &config) {
        Ok(summary) => {
            if !summary.row_outputs_removed {
                for output in &summary.outputs {
                    println!("Row {} -> {}", output.row, output.path.display());
                }
            }
            if let Some(merged) = &summary.merged {
                println!("Merged PDF: {}", merged.display());
            }
            println!("{}", summary.status_message());
            Ok(0)
        }
        Err(failure) => {
            eprintln!("{}", failure.status_message());
            Ok(1)
        }
    }
}
