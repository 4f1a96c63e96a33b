use clap::{Parser, Subcommand};
use mango::app::Application;
use mango::{config, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mango")]
#[command(about = "Flat-file content engine")]
#[command(long_about = "\
Flat-file content engine

A directory of text files becomes a linked page graph: directories are
sections, files are pages, headers are parameters.

Content structure:

  site/
  ├── mango.toml                   # Engine config (optional)
  └── content/
      ├── .subdefaults             # Inherited by everything below
      ├── 1_en/                    # Language root (last two chars = language)
      │   ├── .dir                 # Parameters of the directory page itself
      │   ├── 1_Hello.md           # Page (sort prefix 1, slug \"hello\")
      │   └── 2_top-menu/          # Section, slug \"en-top-menu\"
      │       ├── .defaults        # Defaults for pages in this directory
      │       └── 1_Simple.md
      └── 2_lv/

Page file format:

  Title: Weather report
  Tags: rain, snow
  +++
  Markdown content.

Run 'mango gen-config' to generate a documented mango.toml.")]
#[command(version)]
struct Cli {
    /// Site directory holding mango.toml
    #[arg(long, default_value = ".", global = true)]
    base: PathBuf,

    /// Worker threads for parsing (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the listed page tree
    Tree,
    /// List every registered page, including unlisted ones
    Pages,
    /// Show one page's parameters
    Show {
        slug: String,
        /// Print parameters as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search pages below a root slug
    Search { root: String, term: String },
    /// Show a collection, or one of its entries
    Collection { name: String, key: Option<String> },
    /// Print a stock mango.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    init_thread_pool(cli.threads);
    let app = Application::from_dir(&cli.base)?;

    match cli.command {
        Command::Tree => {
            output::print_tree(&app.pages());
            output::print_summary(&app);
        }
        Command::Pages => {
            output::print_page_list(&app.pages_where(|_| true));
        }
        Command::Show { slug, json } => {
            let page = app
                .page(&slug)
                .ok_or_else(|| format!("no page with slug {slug:?}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&page.params())?);
            } else {
                output::print_page(&page);
            }
        }
        Command::Search { root, term } => {
            if app.page(&root).is_none() {
                return Err(format!("no page with slug {root:?}").into());
            }
            output::print_search(&term, &app.search(&root, &term));
        }
        Command::Collection { name, key } => {
            let collection = app.collection(&name).ok_or_else(|| {
                format!(
                    "unknown collection {name:?}, configured: {}",
                    app.collection_names().join(", ")
                )
            })?;
            output::print_collection(&name, &collection, key.as_deref());
        }
        Command::GenConfig => unreachable!("handled before loading"),
    }

    Ok(())
}

/// Initialize the rayon thread pool.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(requested: Option<usize>) {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let threads = requested.map(|n| n.clamp(1, cores)).unwrap_or(cores);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
