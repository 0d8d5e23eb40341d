use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use terrain_generator::biomes::{BandLayout, BiomeKind};
use terrain_generator::config::TerrainSettings;
use terrain_generator::error::Result;
use terrain_generator::pipeline::TerrainPipeline;
use terrain_generator::render::RenderMode;
use terrain_generator::viewer;

#[derive(Parser, Debug)]
#[command(name = "terrain_generator")]
#[command(about = "Generate, shade and explore procedural noise terrain")]
struct Args {
    /// JSON settings file (missing fields use defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Window width in pixels
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// Window height in pixels
    #[arg(short = 'H', long)]
    height: Option<usize>,

    /// Texture size relative to the window
    #[arg(long)]
    texture_factor: Option<f64>,

    /// Noise sampling scale (smaller = larger features)
    #[arg(long)]
    scale: Option<f64>,

    /// Number of noise octaves (1-10)
    #[arg(long)]
    octaves: Option<u32>,

    /// Amplitude falloff per octave
    #[arg(long)]
    persistence: Option<f64>,

    /// Frequency growth per octave
    #[arg(long)]
    lacunarity: Option<f64>,

    /// Noise seed
    #[arg(short, long)]
    seed: Option<u32>,

    /// Sea level (-0.3 to 0.3)
    #[arg(long, allow_hyphen_values = true)]
    sea_level: Option<f64>,

    /// Biome thresholds: fixed, or sea-level (derived from --sea-level)
    #[arg(long)]
    band_layout: Option<BandLayout>,

    /// Light direction in degrees
    #[arg(long)]
    light_angle: Option<f64>,

    /// Directional light intensity (0-1)
    #[arg(long)]
    light_intensity: Option<f64>,

    /// Ambient light floor (0-1)
    #[arg(long)]
    ambient: Option<f64>,

    /// Render mode: flat, shaded or heightmap
    #[arg(short, long)]
    mode: Option<RenderMode>,

    /// Generate once and exit without opening a window
    #[arg(long)]
    headless: bool,

    /// Save the generated frame as PNG (implies --headless)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the effective settings as JSON
    #[arg(long)]
    dump_config: Option<PathBuf>,
}

impl Args {
    /// Settings file (or defaults) with command-line values layered on top
    fn settings(&self) -> Result<TerrainSettings> {
        let mut settings = match &self.config {
            Some(path) => TerrainSettings::load(path)?,
            None => TerrainSettings::default(),
        };

        if let Some(v) = self.width { settings.window_width = v; }
        if let Some(v) = self.height { settings.window_height = v; }
        if let Some(v) = self.texture_factor { settings.texture_factor = v; }
        if let Some(v) = self.scale { settings.noise.scale = v; }
        if let Some(v) = self.octaves { settings.noise.octaves = v; }
        if let Some(v) = self.persistence { settings.noise.persistence = v; }
        if let Some(v) = self.lacunarity { settings.noise.lacunarity = v; }
        if let Some(v) = self.seed { settings.noise.seed = v; }
        if let Some(v) = self.sea_level { settings.sea_level = v; }
        if let Some(v) = self.band_layout { settings.band_layout = v; }
        if let Some(v) = self.light_angle { settings.light.angle_degrees = v.rem_euclid(360.0); }
        if let Some(v) = self.light_intensity { settings.light.intensity = v; }
        if let Some(v) = self.ambient { settings.light.ambient = v; }
        if let Some(v) = self.mode { settings.render_mode = v; }

        settings.validate()?;
        Ok(settings)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let settings = args.settings()?;

    if let Some(path) = &args.dump_config {
        std::fs::write(path, settings.to_json()?)?;
        println!("Settings written to: {}", path.display());
    }

    let mut pipeline = TerrainPipeline::new(settings)?;

    if !args.headless && args.output.is_none() {
        return viewer::run_viewer(pipeline);
    }

    pipeline.regenerate()?;
    let frame = pipeline.frame().ok_or("no frame was published")?;
    println!("Generated {}x{} terrain (frame {})", frame.width(), frame.height(), frame.generation);
    if let Some((min_h, max_h)) = frame.height_field.min_max() {
        println!("Height range: {:.3} to {:.3}", min_h, max_h);
    }

    let total = frame.height_field.as_slice().len().max(1) as f64;
    let biomes = pipeline.biomes();
    for kind in BiomeKind::all() {
        let count = frame
            .height_field
            .as_slice()
            .iter()
            .filter(|&&h| biomes.band_for(h).kind == *kind)
            .count();
        println!("  {:<10} {:>5.1}%", kind.to_string(), 100.0 * count as f64 / total);
    }

    if let Some(path) = &args.output {
        frame.pixels.save(path)?;
        println!("Saved {} view to: {}", frame.mode.label(), path.display());
    }

    Ok(())
}
