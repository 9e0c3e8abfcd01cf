use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use pano_projector::input::format::require_jpeg_output;
use pano_projector::project::diagram::DEFAULT_SAMPLES;
use pano_projector::{
    DiagramMode, EncoderOptions, Face, FaceOpts, MemoryBudget, Metadata, OutputImage,
    PyramidOpts, render_face_diagram,
};

#[derive(Parser, Debug)]
#[command(name = "pano-projector", version, about = "Equirectangular panorama to cube faces and tile pyramids")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract a cube face from an equirectangular source image.
    Face(FaceArgs),
    /// Generate an equirectangular image coloured by cube face.
    FaceDiagram(FaceDiagramArgs),
    /// Extract one or all faces into a tiled multiresolution pyramid.
    Pyramid(PyramidArgs),
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// The approximate maximum memory usage in MiB. It must cover the decoded
    /// source image as well as the cropped buffer and the encoder buffers.
    #[arg(long)]
    mem_limit: Option<u64>,

    /// The encoder quality, as a percentage.
    #[arg(long, default_value_t = 80)]
    quality: u32,
}

impl EncodeArgs {
    fn budget(&self) -> Rc<MemoryBudget> {
        let budget = MemoryBudget::new();
        if let Some(mib) = self.mem_limit {
            budget.set_limit(mib.saturating_mul(1 << 20));
        }
        Rc::new(budget)
    }

    fn encoder(&self) -> EncoderOptions {
        EncoderOptions::with_quality(self.quality)
    }
}

#[derive(Args, Debug)]
struct FaceArgs {
    /// Input equirectangular image.
    input: PathBuf,

    /// Output JPEG path.
    output: PathBuf,

    /// Which face to extract: b, l, f, r, u, d, a name or an index.
    #[arg(long, value_parser = parse_face)]
    face: Face,

    /// The output width and height (default: full resolution).
    #[arg(long)]
    size: Option<u32>,

    /// The format of the input image, if not given by its extension.
    #[arg(long)]
    input_format: Option<String>,

    /// The format of the output image, if not given by its extension.
    #[arg(long)]
    output_format: Option<String>,

    /// Copy the ICC color profile.
    #[arg(long, default_value_t = false)]
    copy_icc: bool,

    #[command(flatten)]
    encode: EncodeArgs,
}

#[derive(Args, Debug)]
struct FaceDiagramArgs {
    /// Output JPEG path.
    output: PathBuf,

    /// The output image width, rounded up to an even number.
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Invert the transformation numerically, not analytically.
    #[arg(long, default_value_t = false)]
    numerical: bool,

    /// Samples per face edge in numerical mode.
    #[arg(long, default_value_t = DEFAULT_SAMPLES)]
    samples: u32,

    #[command(flatten)]
    encode: EncodeArgs,
}

#[derive(Args, Debug)]
struct PyramidArgs {
    /// Input equirectangular image.
    input: PathBuf,

    /// Output directory.
    out_dir: PathBuf,

    /// Extract only this face (default: all six).
    #[arg(long, value_parser = parse_face)]
    face: Option<Face>,

    /// The cube face size at full resolution.
    #[arg(long)]
    cube_size: Option<u32>,

    /// The tile width and height.
    #[arg(long, default_value_t = pano_projector::pipeline::DEFAULT_TILE_SIZE)]
    tile_size: u32,

    /// The number of resolution levels (default: last level has a single tile).
    #[arg(long)]
    levels: Option<u32>,

    /// The format of the input image, if not given by its extension.
    #[arg(long)]
    input_format: Option<String>,

    /// Copy the ICC color profile into every tile.
    #[arg(long, default_value_t = false)]
    copy_icc: bool,

    /// Also write a Pannellum config.json.
    #[arg(long, default_value_t = false)]
    manifest: bool,

    #[command(flatten)]
    encode: EncodeArgs,
}

fn parse_face(s: &str) -> Result<Face, String> {
    s.parse::<Face>().map_err(|e| e.to_string())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Face(args) => cmd_face(args),
        Command::FaceDiagram(args) => cmd_face_diagram(args),
        Command::Pyramid(args) => cmd_pyramid(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_face(args: FaceArgs) -> anyhow::Result<()> {
    let budget = args.encode.budget();
    let opts = FaceOpts {
        face: args.face,
        size: args.size,
        input_format: args.input_format,
        output_format: args.output_format,
        copy_icc: args.copy_icc,
        encoder: args.encode.encoder(),
    };
    pano_projector::extract_face_file(&args.input, &args.output, &opts, &budget)
        .with_context(|| format!("extract {} face from '{}'", opts.face, args.input.display()))?;

    eprintln!("wrote {}", args.output.display());
    Ok(())
}

fn cmd_face_diagram(args: FaceDiagramArgs) -> anyhow::Result<()> {
    require_jpeg_output(&args.output, None)?;
    let budget = args.encode.budget();
    let width = args.width + args.width % 2;
    let height = width / 2;

    let mode = if args.numerical {
        DiagramMode::Numerical {
            samples: args.samples,
        }
    } else {
        DiagramMode::Analytic
    };

    let mut sink = OutputImage::create(
        &args.output,
        width,
        height,
        &Metadata::default(),
        &args.encode.encoder(),
        &budget,
    )?;
    render_face_diagram(&mut sink, mode, &budget)?;

    eprintln!("wrote {}", args.output.display());
    Ok(())
}

fn cmd_pyramid(args: PyramidArgs) -> anyhow::Result<()> {
    let budget = args.encode.budget();
    let opts = PyramidOpts {
        face: args.face,
        cube_size: args.cube_size,
        tile_size: args.tile_size,
        levels: args.levels,
        input_format: args.input_format,
        copy_icc: args.copy_icc,
        encoder: args.encode.encoder(),
        manifest: args.manifest,
    };
    let summary = pano_projector::build_pyramid(&args.input, &args.out_dir, &opts, &budget)
        .with_context(|| format!("build pyramid from '{}'", args.input.display()))?;

    eprintln!(
        "wrote {} face(s), {} levels of {}px cube in {}",
        summary.faces.len(),
        summary.levels,
        summary.cube_size,
        args.out_dir.display()
    );
    Ok(())
}
