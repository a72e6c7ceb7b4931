//! Render a Tiled JSON map to PNG, JPEG or GIF.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use tiled_raster::{GifOptions, JpegOptions, Map, Renderer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Png,
    Jpeg,
    Gif,
}

impl OutputFormat {
    fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "gif" => Some(OutputFormat::Gif),
            _ => None,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Gif => "gif",
        }
    }
}

#[derive(Parser)]
#[command(name = "tiled-render")]
#[command(about = "Render Tiled map layers into an image", long_about = None)]
struct Args {
    /// Tiled JSON map
    map: PathBuf,

    /// Output image path
    #[arg(short, long, default_value = "map.png")]
    output: PathBuf,

    /// Output format (inferred from the output extension when omitted)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// JPEG quality (1-100)
    #[arg(long, default_value = "75")]
    quality: u8,

    /// GIF palette speed (1 best - 30 fastest)
    #[arg(long, default_value = "10")]
    gif_speed: i32,

    /// Layer index to render; repeat for several. Defaults to all visible layers
    #[arg(long = "layer")]
    layers: Vec<usize>,

    /// Write one image per layer, named <output-stem>-<index>.<ext>
    #[arg(long)]
    per_layer: bool,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let format = match args.format.or_else(|| OutputFormat::from_extension(&args.output)) {
        Some(format) => format,
        None => bail!(
            "cannot infer an image format from {}; pass --format",
            args.output.display()
        ),
    };

    let map = Map::load(&args.map).with_context(|| format!("Loading map {}", args.map.display()))?;
    info!(
        width = map.width,
        height = map.height,
        layers = map.layers.len(),
        "loaded {}",
        args.map.display()
    );

    let mut renderer = Renderer::new(&map).context("Creating renderer")?;

    let layers: Vec<usize> = if args.layers.is_empty() {
        (0..map.layers.len()).filter(|&i| map.layers[i].visible).collect()
    } else {
        args.layers.clone()
    };

    if args.per_layer {
        for &index in &layers {
            renderer.clear();
            renderer
                .render_layer(index)
                .with_context(|| format!("Rendering layer {index}"))?;
            let path = per_layer_path(&args.output, index, format);
            save(&renderer, &path, format, &args)?;
        }
    } else {
        for &index in &layers {
            renderer
                .render_layer(index)
                .with_context(|| format!("Rendering layer {index}"))?;
        }
        save(&renderer, &args.output, format, &args)?;
    }

    let stats = renderer.cache_stats();
    info!(
        cached_tiles = stats.entries,
        decodes = stats.decodes,
        hits = stats.hits,
        "done"
    );
    Ok(())
}

fn per_layer_path(output: &Path, index: usize, format: OutputFormat) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("map");
    output.with_file_name(format!("{stem}-{index}.{}", format.extension()))
}

fn save(
    renderer: &Renderer<'_>,
    path: &Path,
    format: OutputFormat,
    args: &Args,
) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("Creating {}", path.display()))?;
    let mut w = BufWriter::new(file);
    match format {
        OutputFormat::Png => renderer.save_as_png(&mut w),
        OutputFormat::Jpeg => {
            let options = JpegOptions { quality: args.quality };
            renderer.save_as_jpeg(&mut w, &options)
        }
        OutputFormat::Gif => {
            let options = GifOptions { speed: args.gif_speed };
            renderer.save_as_gif(&mut w, &options)
        }
    }
    .with_context(|| format!("Writing {}", path.display()))?;
    w.flush().with_context(|| format!("Flushing {}", path.display()))?;
    info!(path = %path.display(), ?format, "saved");
    Ok(())
}
