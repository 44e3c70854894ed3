//! usfmconv CLI - scripture conversion tool

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use usfmconv::{
    collect_input_files, convert, ChannelObserver, ConvertRequest, DuplicateBookPolicy,
    JsonFormat, OutputFormat, RawOptions, Usfmconv,
};

#[derive(Parser)]
#[command(name = "usfmconv")]
#[command(version)]
#[command(about = "Convert USFM scripture files to DOCX and HTML", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge input files and write one output document
    Convert {
        /// Input files or directories, in merge order
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format (DOCX or HTML)
        #[arg(short, long, env = "USFMCONV_FORMAT")]
        format: Option<String>,

        /// Fail when a book appears more than once
        #[arg(long)]
        reject_duplicates: bool,

        #[command(flatten)]
        layout: FormatArgs,
    },

    /// Show statistics of the merged document
    Info {
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Print the table of contents
    Toc {
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Dump the layout tree as JSON
    Layout {
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        layout: FormatArgs,
    },

    /// Show version information
    Version,
}

/// Formatting selectors; flags override values from `--options`.
#[derive(Args)]
struct FormatArgs {
    /// JSON file with formatting options
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Text size (small, medium, large)
    #[arg(long)]
    text_size: Option<String>,

    /// Line spacing (single, one-and-half, double)
    #[arg(long)]
    line_spacing: Option<String>,

    /// Justify paragraphs
    #[arg(long)]
    justified: bool,

    /// Right-to-left text direction
    #[arg(long)]
    rtl: bool,

    /// Number of text columns
    #[arg(long, value_name = "N")]
    columns: Option<i64>,

    /// Start every chapter on a new page
    #[arg(long)]
    chapter_break: bool,

    /// Start every verse on a new line
    #[arg(long)]
    verse_break: bool,

    /// Include footnotes
    #[arg(long)]
    footnotes: bool,

    /// Generate a table of contents
    #[arg(long)]
    toc: bool,
}

impl FormatArgs {
    fn raw_options(&self) -> usfmconv::Result<RawOptions> {
        let mut raw = match &self.options {
            Some(path) => RawOptions::from_json_file(path)?,
            None => RawOptions::new(),
        };
        if let Some(size) = &self.text_size {
            raw = raw.with_text_size(size.as_str());
        }
        if let Some(spacing) = &self.line_spacing {
            raw = raw.with_line_spacing(spacing.as_str());
        }
        if let Some(columns) = self.columns {
            raw = raw.with_columns(columns);
        }
        if self.justified {
            raw = raw.with_justified(true);
        }
        if self.rtl {
            raw = raw.with_left_to_right(false);
        }
        if self.chapter_break {
            raw = raw.with_chapter_break(true);
        }
        if self.verse_break {
            raw = raw.with_verse_break(true);
        }
        if self.footnotes {
            raw = raw.with_footnotes(true);
        }
        if self.toc {
            raw = raw.with_table_of_contents(true);
        }
        Ok(raw)
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            inputs,
            output,
            format,
            reject_duplicates,
            layout,
        } => cmd_convert(
            &inputs,
            output.as_deref(),
            format.as_deref(),
            reject_duplicates,
            &layout,
        ),
        Commands::Info { inputs } => cmd_info(&inputs),
        Commands::Toc { inputs } => cmd_toc(&inputs),
        Commands::Layout {
            inputs,
            output,
            compact,
            layout,
        } => cmd_layout(&inputs, output.as_deref(), compact, &layout),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Default output path: first input's stem with the format's extension.
fn default_output(files: &[PathBuf], format: Option<&str>) -> PathBuf {
    let ext = format
        .and_then(|f| f.parse::<OutputFormat>().ok())
        .unwrap_or(OutputFormat::Docx)
        .extension();
    let stem = files
        .first()
        .and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    PathBuf::from(format!("{}.{}", stem, ext))
}

fn cmd_convert(
    inputs: &[PathBuf],
    output: Option<&Path>,
    format: Option<&str>,
    reject_duplicates: bool,
    layout: &FormatArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let files = collect_input_files(inputs)?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(&files, format));

    let mut request = ConvertRequest::new(files.clone(), &output)
        .with_options(layout.raw_options()?);
    if let Some(format) = format {
        request = request.with_format(format);
    }
    if reject_duplicates {
        request = request.with_duplicate_policy(DuplicateBookPolicy::Reject);
    }

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_message(format!("Converting {} files...", files.len()));

    let (mut observer, progress) = ChannelObserver::channel();
    let worker = thread::spawn(move || convert(&request, &mut observer));

    // The channel closes when the worker drops its observer
    for percent in progress.iter() {
        pb.set_position(percent as u64);
    }

    let summary = match worker.join() {
        Ok(result) => result?,
        Err(_) => return Err("conversion thread panicked".into()),
    };
    pb.set_position(100);
    pb.finish_with_message("Done!");

    println!(
        "\n{} {} ({}, {} bytes)",
        "Saved to".green(),
        summary.output.display(),
        summary.format,
        summary.bytes_written
    );
    println!("  {} {} books", "├─".dimmed(), summary.stats.book_count);
    println!("  {} {} chapters", "├─".dimmed(), summary.stats.chapter_count);
    println!("  {} {} footnotes", "├─".dimmed(), summary.footnotes);
    println!("  {} {} TOC entries", "└─".dimmed(), summary.toc_entries);

    Ok(())
}

fn cmd_info(inputs: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let files = collect_input_files(inputs)?;
    let conversion = Usfmconv::new().assemble(&files)?;
    let doc = &conversion.document;
    let stats = conversion.stats();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Title".bold(), doc.metadata.display_title());
    println!("{}: {}", "Books".bold(), doc.metadata.books.join(", "));
    for file in doc.files() {
        println!(
            "  {} {} ({} top-level markers)",
            "─".dimmed(),
            file.path().display(),
            file.len()
        );
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Files".bold(), stats.file_count);
    println!("{}: {}", "Chapters".bold(), stats.chapter_count);
    println!("{}: {}", "Verses".bold(), stats.verse_count);
    println!("{}: {}", "Paragraphs".bold(), stats.paragraph_count);
    println!("{}: {}", "Footnotes".bold(), stats.footnote_count);
    println!("{}: {}", "Cross-references".bold(), stats.cross_reference_count);
    println!("{}: {}", "Words".bold(), stats.word_count);
    println!("{}: {}", "Characters".bold(), stats.char_count);

    Ok(())
}

fn cmd_toc(inputs: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let files = collect_input_files(inputs)?;
    let conversion = Usfmconv::new()
        .with_options(RawOptions::new().with_table_of_contents(true))
        .assemble(&files)?;

    for entry in &conversion.toc {
        let indent = "  ".repeat(entry.level as usize);
        let title = if entry.level == 0 {
            entry.title.bold()
        } else {
            entry.title.normal()
        };
        println!("{}{} {}", indent, title, entry.anchor.to_string().dimmed());
    }

    Ok(())
}

fn cmd_layout(
    inputs: &[PathBuf],
    output: Option<&Path>,
    compact: bool,
    layout: &FormatArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let files = collect_input_files(inputs)?;
    let conversion = Usfmconv::new()
        .with_options(layout.raw_options()?)
        .assemble(&files)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = conversion.to_json(format)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "usfmconv".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Scripture conversion tool (DOCX, HTML)");
    println!();
    println!("License: MIT");
}
