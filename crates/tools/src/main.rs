use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use choropleth::MapConfig;
use formats::topology::Topology;
use tools::{RenderOptions, extract_geojson, parse_layer, render_svg};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Choropleth map tooling for topology files")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render layers of a topology into an SVG document
    Render {
        /// Topology JSON file
        topology: PathBuf,

        /// Layer as NAME:OBJECT[:feature|mesh[:all|disputed|non-disputed|selected]];
        /// repeatable, in paint order. Defaults to one feature layer per object.
        #[arg(long = "layer")]
        layers: Vec<String>,

        #[arg(long, default_value_t = 960.0)]
        width: f64,

        #[arg(long, default_value_t = 500.0)]
        height: f64,

        /// Selected location id (repeatable)
        #[arg(long = "select")]
        selection: Vec<String>,

        /// Zoom factor applied around the viewport center after fitting
        #[arg(long)]
        zoom: Option<f64>,

        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Dump extracted layers as GeoJSON, keyed by layer name
    Extract {
        /// Topology JSON file
        topology: PathBuf,

        /// Layers, same syntax as `render`
        #[arg(long = "layer")]
        layers: Vec<String>,

        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    match Args::parse().command {
        Command::Render {
            topology,
            layers,
            width,
            height,
            selection,
            zoom,
            out,
        } => {
            let topo = load(&topology)?;
            let layers = layer_specs(&topo, &layers)?;
            let options = RenderOptions {
                width,
                height,
                selection,
                zoom,
            };
            let svg = render_svg(MapConfig::from_env(), topo, layers, &options)
                .map_err(|e| e.to_string())?;
            write_output(out, &svg)
        }
        Command::Extract {
            topology,
            layers,
            out,
        } => {
            let topo = load(&topology)?;
            let layers = layer_specs(&topo, &layers)?;
            let value = extract_geojson(&topo, &layers);
            let json = serde_json::to_string_pretty(&value).map_err(|e| format!("encode: {e}"))?;
            write_output(out, &json)
        }
    }
}

fn load(path: &Path) -> Result<Arc<Topology>, String> {
    let topo = Topology::load(path).map_err(|e| format!("load {path:?}: {e}"))?;
    info!(
        objects = topo.objects.len(),
        arcs = topo.arc_count(),
        "loaded topology"
    );
    Ok(Arc::new(topo))
}

fn layer_specs(topo: &Topology, args: &[String]) -> Result<Vec<layers::layer::LayerSpec>, String> {
    if args.is_empty() {
        return Ok(tools::default_layers(topo));
    }
    args.iter().map(|a| parse_layer(a)).collect()
}

fn write_output(out: Option<PathBuf>, text: &str) -> Result<(), String> {
    match out {
        Some(path) => {
            fs::write(&path, text).map_err(|e| format!("write {path:?}: {e}"))?;
            info!(path = ?path, bytes = text.len(), "wrote output");
            Ok(())
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}
