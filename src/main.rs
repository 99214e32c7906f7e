use anyhow::{Context, Result, bail};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;
use shapebook::editor::operations;
use shapebook::model::ArrowStyle;
use shapebook::model::style::names;
use shapebook::{Document, Item, Point, PropertyValue, Rect, format, render};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Create, inspect and export shapebook diagram documents",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a small sample document
    New {
        #[arg(value_name = "FILE")]
        file: Utf8PathBuf,
    },
    /// Print a page, item and connection summary
    Info {
        #[arg(value_name = "FILE")]
        file: Utf8PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export one page as SVG to stdout
    Svg {
        #[arg(value_name = "FILE")]
        file: Utf8PathBuf,
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Load every document under a directory and verify its connections
    Check {
        #[arg(value_name = "DIR")]
        dir: Utf8PathBuf,
    },
}

#[derive(Serialize, Debug)]
struct PageSummary {
    name: String,
    items: usize,
    connections: usize,
    kinds: Vec<&'static str>,
}

#[derive(Serialize, Debug)]
struct Summary {
    units: &'static str,
    page_width: f64,
    page_height: f64,
    pages: Vec<PageSummary>,
}

fn summarize(doc: &Document) -> Summary {
    let pages = doc
        .pages()
        .iter()
        .map(|page| PageSummary {
            name: page.name.clone(),
            items: page.len(),
            connections: page
                .items()
                .flat_map(|i| i.points.iter())
                .map(|p| p.connections.len())
                .sum::<usize>()
                / 2,
            kinds: page.items().map(|i| i.type_name()).collect(),
        })
        .collect();
    Summary {
        units: doc.settings.units.name(),
        page_width: doc.settings.page_width,
        page_height: doc.settings.page_height,
        pages,
    }
}

fn sample() -> Document {
    let mut doc = Document::new();
    let frame = doc.new_item_id();
    operations::place_items(&mut doc, vec![Item::rect(frame, Rect::new(20.0, 20.0, 80.0, 60.0))]);
    let wire = doc.new_item_id();
    operations::place_items(
        &mut doc,
        vec![
            Item::line(wire, Point::new(80.0, 20.0), Point::new(140.0, 20.0))
                .with_property(names::END_ARROW, PropertyValue::Arrow(ArrowStyle::TriangleFilled)),
        ],
    );
    let label = doc.new_item_id();
    operations::place_items(&mut doc, vec![Item::text(label, "Start").at(Point::new(50.0, 40.0))]);
    doc
}

fn check_dir(dir: &Utf8PathBuf) -> Result<()> {
    let files: Vec<std::path::PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|x| x == format::EXTENSION))
        .collect();
    info!(count = files.len(), %dir, "checking documents");

    let reports: Vec<(std::path::PathBuf, Result<Vec<String>>)> = files
        .par_iter()
        .map(|path| (path.clone(), format::load(path).map(|doc| doc.check_connections())))
        .collect();

    let mut failed = 0;
    for (path, report) in &reports {
        match report {
            Ok(problems) if problems.is_empty() => println!("ok      {}", path.display()),
            Ok(problems) => {
                failed += 1;
                println!("BROKEN  {}", path.display());
                for problem in problems {
                    println!("        {}", problem);
                }
            }
            Err(e) => {
                failed += 1;
                warn!(path = %path.display(), "failed to load");
                println!("ERROR   {}: {:#}", path.display(), e);
            }
        }
    }
    if failed > 0 {
        bail!("{} of {} documents failed", failed, reports.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::New { file } => {
            let mut doc = sample();
            doc.save_to(&file).with_context(|| format!("Failed to write {}", file))?;
            println!("wrote {}", file);
        }
        Command::Info { file, json } => {
            let doc = format::load(&file)?;
            let summary = summarize(&doc);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "{} x {} {}, {} page(s)",
                    summary.page_width,
                    summary.page_height,
                    summary.units,
                    summary.pages.len()
                );
                for (i, page) in summary.pages.iter().enumerate() {
                    println!(
                        "  {}. {}: {} item(s), {} connection(s)",
                        i + 1,
                        page.name,
                        page.items,
                        page.connections
                    );
                }
            }
        }
        Command::Svg { file, page } => {
            let doc = format::load(&file)?;
            let Some(selected) = page.checked_sub(1).and_then(|i| doc.page(i)) else {
                bail!("{} has no page {}", file, page);
            };
            println!("{}", render::page_to_svg(&doc, selected));
        }
        Command::Check { dir } => check_dir(&dir)?,
    }
    Ok(())
}
