//! snapdoc - Save rendered pages as PDF, images and text
//!
//! A command line front end for the `export` crate. Every export command
//! prints a single `Success: <path>` or `Failed: <reason>` line and exits
//! non-zero on failure.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use export::{ExportConfig, ExportStatus, ImageFormat, ImageOptions, RasterPages};
use log::debug;
use pdf_core::{PageSize, ParsedState};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "snapdoc")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue, global = true)]
    debug: bool,

    /// JSON configuration file
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Save images as PDF pages, one page per image
    Pdf {
        /// Images to place on the pages, in order
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Output file name without extension
        #[arg(short, long)]
        name: String,

        /// Output directory (defaults to the configured documents directory)
        #[arg(short = 'o', long)]
        dir: Option<PathBuf>,

        /// Page size as WIDTHxHEIGHT (defaults to the first image's size)
        #[arg(short, long, value_parser = parse_size)]
        size: Option<PageSize>,

        /// Replace an existing file
        #[arg(long, conflicts_with = "append")]
        overwrite: bool,

        /// Append to an existing file
        #[arg(long)]
        append: bool,

        /// JPEG quality 1-100
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: Option<u8>,
    },

    /// Save an image, scaled to a size of at least 15x15
    Image {
        image: PathBuf,

        #[arg(short, long)]
        name: String,

        #[arg(short = 'o', long)]
        dir: Option<PathBuf>,

        /// Image size as WIDTHxHEIGHT (defaults to the image's size)
        #[arg(short, long, value_parser = parse_size)]
        size: Option<PageSize>,

        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// Replace an existing file instead of numbering a copy
        #[arg(long, conflicts_with = "keep")]
        overwrite: bool,

        /// Never replace; write name1, name2, ... instead
        #[arg(long)]
        keep: bool,
    },

    /// Save text to a file
    Text {
        text: String,

        #[arg(short, long)]
        name: String,

        #[arg(short = 'o', long)]
        dir: Option<PathBuf>,

        /// Append on a new line instead of replacing
        #[arg(long)]
        append: bool,

        /// File extension (defaults to the configured one)
        #[arg(short, long)]
        extension: Option<String>,
    },

    /// Print the contents of a text file
    Load {
        #[arg(short, long)]
        name: String,

        #[arg(short = 'o', long)]
        dir: Option<PathBuf>,

        #[arg(short, long)]
        extension: Option<String>,
    },

    /// Delete a file
    Delete { path: PathBuf },

    /// Remove everything inside a directory
    Clear { dir: PathBuf },

    /// Print page sizes and object offsets of a snapdoc PDF as JSON
    Inspect { file: PathBuf },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Png,
    #[value(alias = "jpg")]
    Jpeg,
    Bmp,
}

impl From<FormatArg> for ImageFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => ImageFormat::Png,
            FormatArg::Jpeg => ImageFormat::Jpeg,
            FormatArg::Bmp => ImageFormat::Bmp,
        }
    }
}

/// Parse `WIDTHxHEIGHT`
fn parse_size(s: &str) -> std::result::Result<PageSize, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let width = w.trim().parse().map_err(|_| format!("invalid width {w:?}"))?;
    let height = h
        .trim()
        .parse()
        .map_err(|_| format!("invalid height {h:?}"))?;
    Ok(PageSize::new(width, height))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Inspection {
    page_count: usize,
    pages: Vec<InspectedPage>,
    image_container_offset: usize,
    carried_bytes: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InspectedPage {
    width: u32,
    height: u32,
    image_offset: usize,
}

impl From<&ParsedState> for Inspection {
    fn from(state: &ParsedState) -> Self {
        let entries = state.xref_entries();
        Self {
            page_count: state.page_count(),
            pages: state
                .page_sizes()
                .iter()
                .zip(state.image_entries())
                .map(|(size, entry)| InspectedPage {
                    width: size.width,
                    height: size.height,
                    image_offset: entry.offset,
                })
                .collect(),
            image_container_offset: entries[state.page_count()].offset,
            carried_bytes: state.carried_section().len(),
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ExportConfig> {
    match path {
        Some(path) => ExportConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(ExportConfig::default()),
    }
}

/// Size to render at: the requested one or the first page's own size
fn resolve_size(requested: Option<PageSize>, pages: &RasterPages) -> PageSize {
    requested
        .or_else(|| pages.native_size(0))
        .unwrap_or(PageSize::new(0, 0))
}

/// Print the status line and turn it into an exit code
fn report(status: ExportStatus) -> ExitCode {
    println!("{status}");
    if status.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let mut config = load_config(args.config.as_deref())?;
    debug!("configuration: {config:?}");

    let code = match args.command {
        Command::Pdf {
            images,
            name,
            dir,
            size,
            overwrite,
            append,
            quality,
        } => {
            if let Some(quality) = quality {
                config.jpeg_quality = quality;
            }
            let overwrite = match (overwrite, append) {
                (true, _) => true,
                (_, true) => false,
                _ => config.overwrite_pdf,
            };
            let pages = RasterPages::from_files(&images)?;
            let size = resolve_size(size, &pages);
            let dir = dir.unwrap_or_else(|| config.documents_dir.clone());

            report(
                export::save_pages_to_pdf(&pages, size, &dir, &name, overwrite, &config).into(),
            )
        }
        Command::Image {
            image,
            name,
            dir,
            size,
            format,
            overwrite,
            keep,
        } => {
            let mut options = ImageOptions::from_config(&config);
            if let Some(format) = format {
                options.format = format.into();
            }
            if overwrite || keep {
                options.overwrite = overwrite;
            }
            let pages = RasterPages::from_files(&[image])?;
            let size = resolve_size(size, &pages);
            let dir = dir.unwrap_or_else(|| config.documents_dir.clone());

            report(export::save_image(&pages, size, &dir, &name, &options).into())
        }
        Command::Text {
            text,
            name,
            dir,
            append,
            extension,
        } => {
            let dir = dir.unwrap_or_else(|| config.documents_dir.clone());
            let extension = extension.unwrap_or_else(|| config.text_extension.clone());
            let overwrite = !append && config.overwrite_text;

            report(export::save_text(&text, &dir, &name, overwrite, &extension).into())
        }
        Command::Load {
            name,
            dir,
            extension,
        } => {
            let dir = dir.unwrap_or_else(|| config.documents_dir.clone());
            let extension = extension.unwrap_or_else(|| config.text_extension.clone());

            match export::load_text(&dir, &name, &extension) {
                Ok(text) => {
                    println!("{text}");
                    ExitCode::SUCCESS
                }
                Err(e) => report(ExportStatus::Failed(e.to_string())),
            }
        }
        Command::Delete { path } => report(export::delete_file(&path).into()),
        Command::Clear { dir } => report(export::clear_directory(&dir).into()),
        Command::Inspect { file } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let state = pdf_core::parse(&bytes)
                .with_context(|| format!("Failed to inspect {}", file.display()))?;
            println!(
                "{}",
                serde_json::to_string_pretty(&Inspection::from(&state))?
            );
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    run(args)
}
