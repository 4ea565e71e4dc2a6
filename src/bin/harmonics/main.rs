//! Harmonics CLI - vibration modes of polygon meshes from the command line.
//!
//! Usage: harmonics <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `harmonics --help` for available commands. Set `RUST_LOG=debug` for
//! algorithm progress.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use nalgebra::{DMatrix, Point3, Vector3};

use harmonics::algo::analysis::{back_calculate, AnalysisOptions, ModeSelection};
use harmonics::algo::features::mode_features;
use harmonics::algo::laplacian::{
    apply_fixed_points, cotangent_laplacian, graph_laplacian, AreaWeighting, CotangentOptions,
};
use harmonics::algo::normals::{vertex_normals, vertex_normals_sequential};
use harmonics::algo::spectrum::{decompose, Spectrum};
use harmonics::algo::synthesis::{colour_map, synthesize_or_uniform};
use harmonics::diagnostic::Diagnostics;
use harmonics::io;
use harmonics::mesh::HalfEdgeMesh;

#[derive(Parser)]
#[command(name = "harmonics")]
#[command(author, version, about = "Manifold harmonics CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Compute vibration modes and report their peaks and troughs
    Modes {
        /// Input mesh file
        input: PathBuf,

        #[command(flatten)]
        spectrum: SpectrumArgs,

        /// Number of modes to compute
        #[arg(short, long, default_value = "10")]
        count: usize,

        /// Write the mode matrix as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Displace a mesh by a weighted sum of modes
    Synthesize {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        #[command(flatten)]
        spectrum: SpectrumArgs,

        /// Mode weights, lowest mode first
        #[arg(short, long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
        weights: Vec<f64>,

        /// Displacement scale
        #[arg(short, long, default_value = "1.0", allow_hyphen_values = true)]
        scale: f64,
    },

    /// Back-calculate mode weights from a distance signal
    Analyze {
        /// Input mesh file
        input: PathBuf,

        /// Text file with one signed distance per vertex
        #[arg(long)]
        signal: PathBuf,

        #[command(flatten)]
        spectrum: SpectrumArgs,

        /// Size of the mode basis to project onto
        #[arg(short, long, default_value = "20")]
        basis: usize,

        /// Number of modes to keep
        #[arg(short, long, default_value = "5")]
        count: usize,

        /// Keep the first modes instead of the most significant ones
        #[arg(long)]
        first: bool,

        /// Do not round weights and scale to 2 decimals
        #[arg(long)]
        no_round: bool,
    },
}

/// Laplacian construction flags shared by every spectral command.
#[derive(Args)]
struct SpectrumArgs {
    /// Laplacian operator
    #[arg(short, long, value_enum, default_value = "cotangent")]
    laplacian: LaplacianKind,

    /// Vertex area weighting for the cotangent operator
    #[arg(short, long, value_enum, default_value = "voronoi")]
    area: AreaKind,

    /// Fixed point as x,y,z (repeatable)
    #[arg(long = "fixed", value_parser = parse_point, allow_hyphen_values = true)]
    fixed: Vec<Point3<f64>>,

    /// Use single-threaded execution (for benchmarking)
    #[arg(long)]
    sequential: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum LaplacianKind {
    /// Combinatorial graph Laplacian
    Graph,
    /// Cotangent-weighted Laplace-Beltrami operator
    Cotangent,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum AreaKind {
    /// Mixed Voronoi areas
    Voronoi,
    /// One third of each incident triangle
    Barycentric,
    /// No area normalization
    Unweighted,
}

impl From<AreaKind> for AreaWeighting {
    fn from(kind: AreaKind) -> Self {
        match kind {
            AreaKind::Voronoi => AreaWeighting::Voronoi,
            AreaKind::Barycentric => AreaWeighting::Barycentric,
            AreaKind::Unweighted => AreaWeighting::Unweighted,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => {
            cmd_info(&input)?;
        }

        Commands::Modes {
            input,
            spectrum,
            count,
            output,
        } => {
            cmd_modes(&input, &spectrum, count, output.as_deref())?;
        }

        Commands::Synthesize {
            input,
            output,
            spectrum,
            weights,
            scale,
        } => {
            cmd_synthesize(&input, &output, &spectrum, &weights, scale)?;
        }

        Commands::Analyze {
            input,
            signal,
            spectrum,
            basis,
            count,
            first,
            no_round,
        } => {
            let selection = if first {
                ModeSelection::First
            } else {
                ModeSelection::MostSignificant
            };
            let options = AnalysisOptions::default()
                .with_count(count)
                .with_selection(selection)
                .with_round(!no_round);
            cmd_analyze(&input, &signal, &spectrum, basis, &options)?;
        }
    }

    Ok(())
}

fn parse_point(s: &str) -> Result<Point3<f64>, String> {
    let coords: Vec<f64> = s
        .split(',')
        .map(|c| c.trim().parse::<f64>().map_err(|e| format!("{}: {}", c, e)))
        .collect::<Result<_, _>>()?;
    match coords.as_slice() {
        [x, y, z] => Ok(Point3::new(*x, *y, *z)),
        _ => Err(format!("expected x,y,z but got {} values", coords.len())),
    }
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    for d in diagnostics {
        println!("{}", d);
    }
}

/// Build the requested Laplacian, apply fixities and decompose it.
fn compute_spectrum(
    mesh: &HalfEdgeMesh,
    args: &SpectrumArgs,
    count: usize,
) -> Result<Spectrum, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut laplacian = match args.laplacian {
        LaplacianKind::Graph => graph_laplacian(mesh),
        LaplacianKind::Cotangent => {
            let options = CotangentOptions::default()
                .with_area(args.area.into())
                .with_parallel(!args.sequential);
            cotangent_laplacian(mesh, &options)?
        }
    };

    let mut count = count;
    if !args.fixed.is_empty() {
        let conditions = apply_fixed_points(laplacian, mesh, &args.fixed)?;
        print_diagnostics(&conditions.diagnostics);
        println!(
            "Fixed: {} vertices (stiffness {:e}), {} free",
            conditions.fixed.len(),
            conditions.stiffness,
            conditions.free_count
        );
        count = count.min(conditions.free_count.max(1));
        laplacian = conditions.matrix;
    }

    let spectrum = decompose(&laplacian, count)?;
    println!(
        "Decomposed {}x{} operator into {} modes ({:.2?})",
        laplacian.nrows(),
        laplacian.ncols(),
        spectrum.len(),
        start.elapsed()
    );
    Ok(spectrum)
}

fn directions(mesh: &HalfEdgeMesh, sequential: bool) -> Vec<Vector3<f64>> {
    if sequential {
        vertex_normals_sequential(mesh)
    } else {
        vertex_normals(mesh)
    }
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Half-edges: {}", mesh.num_halfedges());
    println!("Surface area: {:.6}", mesh.surface_area());

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }

    if mesh.is_triangle_mesh() {
        println!("Mesh type: Triangle mesh");
    } else {
        println!("Mesh type: Polygon mesh (cotangent operator unavailable)");
    }

    let boundary = mesh
        .vertex_ids()
        .filter(|&v| mesh.is_boundary_vertex(v))
        .count();
    if boundary == 0 {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary vertices)", boundary);
    }

    Ok(())
}

fn cmd_modes(
    input: &Path,
    args: &SpectrumArgs,
    count: usize,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;
    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let spectrum = compute_spectrum(&mesh, args, count)?;
    let features = mode_features(&mesh, &spectrum.eigenvectors)?;

    println!("{:>5}  {:>14}  {:<24}  {:<24}", "mode", "eigenvalue", "peaks", "troughs");
    for (k, f) in features.iter().enumerate() {
        println!(
            "{:>5}  {:>14.6e}  {:<24}  {:<24}",
            k,
            spectrum.eigenvalues[k],
            f.peaks.to_string(),
            f.troughs.to_string()
        );
    }

    if let Some(path) = output {
        write_csv(&spectrum.eigenvectors, path)?;
        println!("Saved: {}", path.display());
    }

    Ok(())
}

fn write_csv(modes: &DMatrix<f64>, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = BufWriter::new(File::create(path)?);
    let header: Vec<String> = (0..modes.ncols()).map(|k| format!("mode{}", k)).collect();
    writeln!(writer, "vertex,{}", header.join(","))?;
    for (i, row) in modes.row_iter().enumerate() {
        let values: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(writer, "{},{}", i, values.join(","))?;
    }
    writer.flush()?;
    Ok(())
}

fn cmd_synthesize(
    input: &Path,
    output: &Path,
    args: &SpectrumArgs,
    weights: &[f64],
    scale: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;
    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let spectrum = compute_spectrum(&mesh, args, weights.len())?;
    let directions = directions(&mesh, args.sequential);

    let synthesis = synthesize_or_uniform(&spectrum.eigenvectors, weights, &directions, scale)?;
    print_diagnostics(&synthesis.diagnostics);

    let min = synthesis.nodal_values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = synthesis.nodal_values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let greys = colour_map(&synthesis.nodal_values);
    let distinct = {
        let mut levels = greys.clone();
        levels.sort_unstable();
        levels.dedup();
        levels.len()
    };
    println!(
        "Nodal range: [{:.6}, {:.6}] ({} grey levels)",
        min, max, distinct
    );

    let displaced = mesh.displaced(&synthesis.displacements);
    println!(
        "Surface area: {:.6} -> {:.6}",
        mesh.surface_area(),
        displaced.surface_area()
    );

    io::save(&displaced, output)?;
    println!("Saved: {}", output.display());

    Ok(())
}

fn read_signal(path: &Path) -> Result<Vec<f64>, Box<dyn std::error::Error>> {
    let reader = BufReader::new(File::open(path)?);
    let mut signal = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let value = trimmed
            .parse::<f64>()
            .map_err(|e| format!("{}:{}: {}", path.display(), n + 1, e))?;
        signal.push(value);
    }
    Ok(signal)
}

fn cmd_analyze(
    input: &Path,
    signal_path: &Path,
    args: &SpectrumArgs,
    basis: usize,
    options: &AnalysisOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;
    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let signal = read_signal(signal_path)?;
    let spectrum = compute_spectrum(&mesh, args, basis)?;
    let directions = directions(&mesh, args.sequential);

    let start = Instant::now();
    let analysis = back_calculate(&mesh, &spectrum.eigenvectors, &directions, &signal, options)?;
    print_diagnostics(&analysis.diagnostics);

    println!("{:>5}  {:>8}", "mode", "weight");
    for (index, weight) in analysis.indices.iter().zip(&analysis.weights) {
        println!("{:>5}  {:>8}", index, weight);
    }
    println!("Scale: {}", analysis.scale);
    println!("RMS: {:.6} ({:.2?})", analysis.rms, start.elapsed());

    Ok(())
}
