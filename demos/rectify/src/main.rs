use std::path::{Path, PathBuf};
use std::process::ExitCode;

use argh::FromArgs;
use ortho::{
    geometry::{BoundingBox, Point2d, MIN_CORRESPONDENCES},
    image::ImageSize,
    io::{read_image_any, write_image_any},
    rectify_any, RectifyConfig,
};
use serde::Deserialize;

/// Ortho-rectify a raster image from a set of image control points.
#[derive(Debug, FromArgs)]
struct Args {
    /// path to the incoming image
    #[argh(option, short = 'i')]
    incoming_image: Option<PathBuf>,

    /// path of the rectified image to write; the encoder follows the extension
    #[argh(option, short = 'r')]
    rectified_image: Option<PathBuf>,

    /// size of the rectified image as WIDTHxHEIGHT
    #[argh(option, short = 's', from_str_fn(parse_size))]
    image_size: Option<ImageSize>,

    /// original control point as X,Y; repeat for every point
    #[argh(option, short = 'o', from_str_fn(parse_point))]
    original_icp: Vec<Point2d>,

    /// mapped control point as X,Y; repeat for every point
    #[argh(option, short = 'm', from_str_fn(parse_point))]
    mapped_icp: Vec<Point2d>,

    /// bounding box of the image in metres as XMIN,YMIN,XMAX,YMAX
    #[argh(option, short = 'b', from_str_fn(parse_bbox))]
    bbox: Option<BoundingBox>,

    /// a JSON file with the estimator and resampler parameters
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// a JSON file holding the control points as {"original": [[x, y], ..], "mapped": [[x, y], ..]}
    #[argh(option, short = 'p')]
    points: Option<PathBuf>,

    /// print the version and exit
    #[argh(switch, short = 'v')]
    version: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing parameter --{0}")]
    MissingParameter(&'static str),

    #[error("the incoming image file '{0}' does not exist")]
    InputNotFound(PathBuf),

    #[error("the work path '{0}' does not exist")]
    OutputDirNotFound(PathBuf),

    #[error("control points given both on the command line and in '{0}'")]
    DuplicatePoints(PathBuf),

    #[error("need at least {min} original and mapped control points, got {0} and {1}", min = MIN_CORRESPONDENCES)]
    TooFewPoints(usize, usize),

    #[error("lists of original ({0}) and mapped ({1}) control points differ in length")]
    PointCountMismatch(usize, usize),

    #[error("invalid bounding box {0:?}")]
    InvalidBoundingBox(BoundingBox),

    #[error("failed to read the control points: {0}")]
    PointsFile(String),
}

#[derive(Debug, Deserialize)]
struct PointsFile {
    original: Vec<Point2d>,
    mapped: Vec<Point2d>,
}

fn parse_numbers<const N: usize>(value: &str, what: &str) -> Result<[f64; N], String> {
    let parts = value
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid {what} '{value}': {e}"))?;
    <[f64; N]>::try_from(parts)
        .map_err(|p| format!("invalid {what} '{value}': expected {N} values, got {}", p.len()))
}

fn parse_point(value: &str) -> Result<Point2d, String> {
    parse_numbers::<2>(value, "point").map(Point2d::from)
}

fn parse_bbox(value: &str) -> Result<BoundingBox, String> {
    let [xmin, ymin, xmax, ymax] = parse_numbers::<4>(value, "bounding box")?;
    Ok(BoundingBox::new(xmin, ymin, xmax, ymax))
}

fn parse_size(value: &str) -> Result<ImageSize, String> {
    let (w, h) = value
        .split_once(['x', 'X', ','])
        .ok_or_else(|| format!("invalid image size '{value}': expected WIDTHxHEIGHT"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid image size '{value}': {e}"))
    };
    Ok(ImageSize {
        width: parse(w)?,
        height: parse(h)?,
    })
}

fn read_points(path: &Path) -> Result<PointsFile, CliError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| CliError::PointsFile(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&json).map_err(|e| CliError::PointsFile(format!("{}: {e}", path.display())))
}

/// Validated inputs of one rectification.
struct Job {
    incoming: PathBuf,
    rectified: PathBuf,
    size: ImageSize,
    original: Vec<Point2d>,
    mapped: Vec<Point2d>,
    bbox: Option<BoundingBox>,
    config: RectifyConfig,
}

fn validate(args: Args) -> Result<Job, Box<dyn std::error::Error>> {
    let incoming = args
        .incoming_image
        .ok_or(CliError::MissingParameter("incoming-image"))?;
    let rectified = args
        .rectified_image
        .ok_or(CliError::MissingParameter("rectified-image"))?;
    let size = args
        .image_size
        .filter(|s| !s.is_empty())
        .ok_or(CliError::MissingParameter("image-size"))?;

    let (original, mapped) = match &args.points {
        Some(path) => {
            if !args.original_icp.is_empty() || !args.mapped_icp.is_empty() {
                return Err(CliError::DuplicatePoints(path.clone()).into());
            }
            let points = read_points(path)?;
            (points.original, points.mapped)
        }
        None => (args.original_icp, args.mapped_icp),
    };
    if original.len() < MIN_CORRESPONDENCES || mapped.len() < MIN_CORRESPONDENCES {
        return Err(CliError::TooFewPoints(original.len(), mapped.len()).into());
    }
    if original.len() != mapped.len() {
        return Err(CliError::PointCountMismatch(original.len(), mapped.len()).into());
    }

    if let Some(bbox) = args.bbox {
        if !bbox.is_valid() {
            return Err(CliError::InvalidBoundingBox(bbox).into());
        }
    }

    let work_dir = match rectified.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !work_dir.is_dir() {
        return Err(CliError::OutputDirNotFound(work_dir).into());
    }
    if !incoming.exists() {
        return Err(CliError::InputNotFound(incoming).into());
    }

    let config = match &args.config {
        Some(path) => RectifyConfig::from_json_file(path)?,
        None => RectifyConfig::default(),
    };

    Ok(Job {
        incoming,
        rectified,
        size,
        original,
        mapped,
        bbox: args.bbox,
        config,
    })
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("read cli");
    let job = validate(args)?;

    if let Some((rx, ry)) = job
        .bbox
        .and_then(|b| b.ground_resolution(job.size.width, job.size.height))
    {
        log::info!("ground resolution {rx:.4} x {ry:.4} m/px");
    }

    log::info!("read input {}", job.incoming.display());
    let src = read_image_any(&job.incoming)?;
    log::info!("decoded {} image of size {}", src.format_name(), src.size());

    let dst = rectify_any(
        &src,
        &job.original,
        &job.mapped,
        job.size.width,
        job.size.height,
        &job.config,
    )?;

    log::info!("write mapped {}", job.rectified.display());
    write_image_any(&job.rectified, &dst)?;

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();

    if args.version {
        println!(
            "{} {}\n{}",
            env!("CARGO_BIN_NAME"),
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_DESCRIPTION")
        );
        return ExitCode::SUCCESS;
    }

    match run(args) {
        Ok(()) => {
            log::info!("ortho calculation ok");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::from(255)
        }
    }
}
