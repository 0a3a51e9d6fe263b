use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tools::{LoadedMap, MapDocument};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Render and probe JSON map documents")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// SVG markup (vector pass)
    Svg,
    /// JSON array of canvas draw commands
    DisplayList,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a map document
    Render {
        /// Map document (JSON)
        doc: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::Svg)]
        format: Format,

        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Zoom factor applied about the content centre before rendering
        #[arg(long)]
        zoom: Option<f64>,
    },

    /// Print the topmost feature under a container point
    Pick {
        /// Map document (JSON)
        doc: PathBuf,

        #[arg(long)]
        x: f64,

        #[arg(long)]
        y: f64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();
    match args.command {
        Command::Render {
            doc,
            format,
            out,
            zoom,
        } => cmd_render(&doc, format, out.as_deref(), zoom),
        Command::Pick { doc, x, y } => cmd_pick(&doc, x, y),
    }
}

fn load(doc: &Path) -> Result<LoadedMap, String> {
    MapDocument::load(doc).map_err(|e| format!("{}: {e}", doc.display()))
}

fn cmd_render(
    doc: &Path,
    format: Format,
    out: Option<&Path>,
    zoom: Option<f64>,
) -> Result<(), String> {
    let mut loaded = load(doc)?;
    if let Some(factor) = zoom {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(format!("--zoom must be a positive number, got {factor}"));
        }
        if !loaded.map.options().zoom.enabled {
            return Err("--zoom needs zoom enabled in the document options".to_string());
        }
        loaded.map.zoom_by(factor);
    }

    let payload = match format {
        Format::Svg => loaded.svg_markup(),
        Format::DisplayList => loaded.display_list().map_err(|e| e.to_string())?,
    };

    match out {
        Some(path) => {
            fs::write(path, &payload).map_err(|e| format!("write {}: {e}", path.display()))?;
            info!(path = %path.display(), bytes = payload.len(), "wrote render");
        }
        None => println!("{payload}"),
    }
    Ok(())
}

fn cmd_pick(doc: &Path, x: f64, y: f64) -> Result<(), String> {
    let loaded = load(doc)?;
    match loaded.pick(x, y) {
        Some(feature) => {
            let payload =
                serde_json::to_string_pretty(&feature).map_err(|e| format!("json: {e}"))?;
            println!("{payload}");
        }
        None => println!("null"),
    }
    Ok(())
}
