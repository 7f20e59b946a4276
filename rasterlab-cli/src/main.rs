use clap::Parser;
use rasterlab::color::to_gray;
use rasterlab::dispatch::{
    BlurParams, ColorSpaceParams, ContourParams, EdgeParams, GeometricParams, TemplateParams,
    ThresholdParams,
};
use rasterlab::io::{load_raster, save_raster};
use rasterlab::matching::{find_matches, match_template};
use rasterlab::{
    CannyConfig, ContourSet, MarkerMap, MatchResult, Outcome, Overlay, Params, RasterU8, Technique,
    WatershedConfig,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "rasterlab CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// List the technique names and exit.
    #[arg(long)]
    list_techniques: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ThresholdJson {
    method: String,
    cutoff: u8,
    max_value: u8,
    block_size: usize,
    c: f32,
}

impl Default for ThresholdJson {
    fn default() -> Self {
        let p = ThresholdParams::default();
        Self {
            method: "binary".into(),
            cutoff: p.cutoff,
            max_value: p.max_value,
            block_size: p.block_size,
            c: p.c,
        }
    }
}

impl ThresholdJson {
    fn to_params(&self) -> Result<ThresholdParams, Box<dyn std::error::Error>> {
        Ok(ThresholdParams {
            method: self.method.parse()?,
            cutoff: self.cutoff,
            max_value: self.max_value,
            block_size: self.block_size,
            c: self.c,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct BlurJson {
    method: String,
    kernel_size: usize,
    sigma: Option<f32>,
}

impl Default for BlurJson {
    fn default() -> Self {
        let p = BlurParams::default();
        Self {
            method: "gaussian".into(),
            kernel_size: p.kernel_size,
            sigma: p.sigma,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct EdgesJson {
    method: String,
    low: f32,
    high: f32,
    blur_size: usize,
    sigma: Option<f32>,
}

impl Default for EdgesJson {
    fn default() -> Self {
        let cfg = CannyConfig::default();
        Self {
            method: "canny".into(),
            low: cfg.low,
            high: cfg.high,
            blur_size: cfg.blur_size,
            sigma: cfg.sigma,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ContoursJson {
    retrieval: String,
    cutoff: Option<u8>,
    color: [u8; 3],
    thickness: usize,
}

impl Default for ContoursJson {
    fn default() -> Self {
        let p = ContourParams::default();
        Self {
            retrieval: "tree".into(),
            cutoff: p.cutoff,
            color: p.color,
            thickness: p.thickness,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct TemplateJson {
    template_path: String,
    method: String,
    max_matches: usize,
    nms_radius: Option<usize>,
    color: [u8; 3],
    thickness: usize,
}

impl Default for TemplateJson {
    fn default() -> Self {
        let p = TemplateParams::default();
        Self {
            template_path: String::new(),
            method: "ccoeff_normed".into(),
            max_matches: 1,
            nms_radius: None,
            color: p.color,
            thickness: p.thickness,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct WatershedJson {
    kernel_size: usize,
    open_iterations: usize,
    dilate_iterations: usize,
    foreground_ratio: f32,
    elevation: String,
    boundary_color: [u8; 3],
}

impl Default for WatershedJson {
    fn default() -> Self {
        let cfg = WatershedConfig::default();
        Self {
            kernel_size: cfg.kernel_size,
            open_iterations: cfg.open_iterations,
            dilate_iterations: cfg.dilate_iterations,
            foreground_ratio: cfg.foreground_ratio,
            elevation: "gradient".into(),
            boundary_color: cfg.boundary_color,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ColorSpaceJson {
    target: String,
}

impl Default for ColorSpaceJson {
    fn default() -> Self {
        Self {
            target: "gray".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct GeometricJson {
    scale_percent: f32,
    alpha: f32,
    beta: f32,
}

impl Default for GeometricJson {
    fn default() -> Self {
        let p = GeometricParams::default();
        Self {
            scale_percent: p.scale_percent,
            alpha: p.alpha,
            beta: p.beta,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    image_path: String,
    technique: String,
    output_path: Option<String>,
    overlay_path: Option<String>,
    threshold: ThresholdJson,
    blur: BlurJson,
    edges: EdgesJson,
    contours: ContoursJson,
    template: TemplateJson,
    watershed: WatershedJson,
    color_space: ColorSpaceJson,
    geometric: GeometricJson,
}

impl Config {
    fn params(&self, technique: Technique) -> Result<Params, Box<dyn std::error::Error>> {
        let params = match technique {
            Technique::Thresholding => Params::Threshold(self.threshold.to_params()?),
            Technique::Blur => Params::Blur(BlurParams {
                method: self.blur.method.parse()?,
                kernel_size: self.blur.kernel_size,
                sigma: self.blur.sigma,
            }),
            Technique::EdgeDetection => Params::Edge(EdgeParams {
                method: self.edges.method.parse()?,
                canny: CannyConfig {
                    low: self.edges.low,
                    high: self.edges.high,
                    blur_size: self.edges.blur_size,
                    sigma: self.edges.sigma,
                },
            }),
            Technique::Contours => Params::Contours(ContourParams {
                retrieval: self.contours.retrieval.parse()?,
                cutoff: self.contours.cutoff,
                color: self.contours.color,
                thickness: self.contours.thickness,
            }),
            Technique::TemplateMatching => {
                if self.template.template_path.is_empty() {
                    return Err("template.template_path must be set for template matching".into());
                }
                Params::TemplateMatching(TemplateParams {
                    template: Some(load_raster(&self.template.template_path)?),
                    method: self.template.method.parse()?,
                    color: self.template.color,
                    thickness: self.template.thickness,
                })
            }
            Technique::Watershed => Params::Watershed(WatershedConfig {
                kernel_size: self.watershed.kernel_size,
                open_iterations: self.watershed.open_iterations,
                dilate_iterations: self.watershed.dilate_iterations,
                foreground_ratio: self.watershed.foreground_ratio,
                elevation: self.watershed.elevation.parse()?,
                boundary_color: self.watershed.boundary_color,
            }),
            Technique::ColorSpace => Params::ColorSpace(ColorSpaceParams {
                target: self.color_space.target.parse()?,
            }),
            Technique::Geometric => Params::Geometric(GeometricParams {
                scale_percent: self.geometric.scale_percent,
                alpha: self.geometric.alpha,
                beta: self.geometric.beta,
            }),
        };
        Ok(params)
    }
}

#[derive(Debug, Serialize)]
struct RectRecord {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
}

#[derive(Debug, Serialize)]
struct ContourRecord {
    kind: &'static str,
    parent: Option<usize>,
    points: usize,
    area: f64,
    bbox: RectRecord,
}

#[derive(Debug, Serialize)]
struct MatchRecord {
    x: usize,
    y: usize,
    score: f32,
    bbox: RectRecord,
}

impl From<MatchResult> for MatchRecord {
    fn from(value: MatchResult) -> Self {
        Self {
            x: value.x,
            y: value.y,
            score: value.score,
            bbox: RectRecord {
                x: value.bbox.x,
                y: value.bbox.y,
                width: value.bbox.width,
                height: value.bbox.height,
            },
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct Output {
    technique: String,
    width: usize,
    height: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    contours: Option<Vec<ContourRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    best: Option<MatchRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    matches: Vec<MatchRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    regions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    boundary_pixels: Option<usize>,
    warnings: Vec<String>,
}

fn contour_records(set: &ContourSet) -> Vec<ContourRecord> {
    set.iter()
        .map(|c| {
            let bbox = c.bounding_box();
            ContourRecord {
                kind: if c.is_hole() { "hole" } else { "outer" },
                parent: c.parent,
                points: c.points.len(),
                area: c.area(),
                bbox: RectRecord {
                    x: bbox.x,
                    y: bbox.y,
                    width: bbox.width,
                    height: bbox.height,
                },
            }
        })
        .collect()
}

fn marker_summary(markers: &MarkerMap) -> (usize, usize) {
    (markers.region_count(), markers.boundary_count())
}

/// Ranked, separated matches beyond the single best one.
fn ranked_matches(
    image: &RasterU8,
    params: &Params,
    cfg: &TemplateJson,
) -> Result<Vec<MatchRecord>, Box<dyn std::error::Error>> {
    let Params::TemplateMatching(p) = params else {
        return Ok(Vec::new());
    };
    let Some(tpl) = p.template.as_ref() else {
        return Ok(Vec::new());
    };
    let score_map = if tpl.channels() == image.channels() {
        match_template(image, tpl, p.method)?
    } else {
        match_template(&to_gray(image), &to_gray(tpl), p.method)?
    };
    let radius = cfg
        .nms_radius
        .unwrap_or_else(|| tpl.width().max(tpl.height()) / 2);
    let matches = find_matches(
        &score_map,
        p.method,
        tpl.width(),
        tpl.height(),
        cfg.max_matches,
        radius,
    )?;
    Ok(matches.into_iter().map(MatchRecord::from).collect())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("rasterlab=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }
    if cli.list_techniques {
        for t in Technique::ALL {
            println!("{t}");
        }
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.image_path.is_empty() || config.technique.is_empty() {
        return Err("image_path and technique must be set in the config".into());
    }
    if config.template.max_matches == 0 {
        return Err("template.max_matches must be at least 1".into());
    }

    let technique: Technique = config.technique.parse()?;
    let image = load_raster(&config.image_path)?;
    let params = config.params(technique)?;
    let matches = if technique == Technique::TemplateMatching && config.template.max_matches > 1 {
        ranked_matches(&image, &params, &config.template)?
    } else {
        Vec::new()
    };

    let Outcome {
        processed,
        overlay,
        warnings,
        ..
    } = rasterlab::run_technique(&image, technique, params)?;
    for warning in &warnings {
        tracing::warn!("{warning}");
    }

    let mut output = Output {
        technique: technique.to_string(),
        width: processed.width(),
        height: processed.height(),
        matches,
        warnings: warnings.iter().map(ToString::to_string).collect(),
        ..Output::default()
    };
    match overlay {
        Some(Overlay::Contours(set)) => output.contours = Some(contour_records(&set)),
        Some(Overlay::Match(best)) => output.best = Some(best.into()),
        Some(Overlay::Markers(markers)) => {
            let (regions, boundary) = marker_summary(&markers);
            output.regions = Some(regions);
            output.boundary_pixels = Some(boundary);
        }
        None => {}
    }

    if let Some(path) = &config.output_path {
        save_raster(&processed, path)?;
    }
    let json = serde_json::to_string_pretty(&output)?;
    match config.overlay_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
