use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::info;

use fleetmilp::config::RunConfig;
use fleetmilp::costs::{derive_arc_costs, ArcCostTable};
use fleetmilp::io;
use fleetmilp::models::sensor::SensorProblem;
use fleetmilp::models::solver::default_solver;
use fleetmilp::models::{SensorSolver, VrpSolver};
use fleetmilp::osrm::{OsrmClient, OsrmClientParams, OSRM_PUBLIC_URL};
use fleetmilp::problem::{NodeKind, VrpProblem};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    /// JSON run configuration
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[clap(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch distance and duration matrices for all clients and depots
    Matrix {
        #[clap(long)]
        clients: PathBuf,
        #[clap(long)]
        depots: PathBuf,
        #[clap(long, default_value = OSRM_PUBLIC_URL)]
        osrm_url: String,
        #[clap(long, default_value = "driving")]
        profile: String,
        #[clap(long)]
        distances_out: PathBuf,
        #[clap(long)]
        durations_out: PathBuf,
    },
    /// Derive per-vehicle arc costs from the matrices
    Costs {
        #[clap(long)]
        vehicles: PathBuf,
        #[clap(long)]
        distances: PathBuf,
        #[clap(long)]
        durations: PathBuf,
        /// Output file, or output directory with --split
        #[clap(short, long)]
        out: PathBuf,
        /// Write one `costs_<vehicle>.csv` per vehicle
        #[clap(long)]
        split: bool,
    },
    /// Union several arc-cost tables
    MergeCosts {
        #[clap(required = true)]
        inputs: Vec<PathBuf>,
        #[clap(short, long)]
        out: PathBuf,
    },
    /// Solve the vehicle routing model and write the used arcs
    Vrp {
        #[clap(long)]
        clients: PathBuf,
        #[clap(long)]
        depots: PathBuf,
        #[clap(long)]
        vehicles: PathBuf,
        /// One or more arc-cost tables, merged before solving
        #[clap(long, required = true, multiple_occurrences = true)]
        costs: Vec<PathBuf>,
        /// Distance matrix, needed by the range constraint
        #[clap(long)]
        distances: Option<PathBuf>,
        #[clap(short, long)]
        out: PathBuf,
    },
    /// Solve the sensor placement model and write the placements
    Sensors {
        #[clap(long)]
        instance: PathBuf,
        #[clap(short, long)]
        out: PathBuf,
    },
}

/// Client and depot tables, which must list the same products
fn read_node_tables(
    clients: &Path,
    depots: &Path,
) -> anyhow::Result<(io::NodeTable, io::NodeTable)> {
    let clients = io::read_nodes(clients, NodeKind::Client).context("reading clients")?;
    let depots = io::read_nodes(depots, NodeKind::Depot).context("reading depots")?;
    if clients.products != depots.products {
        bail!(
            "client products {:?} and depot products {:?} differ",
            clients.products,
            depots.products
        );
    }
    Ok((clients, depots))
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    let base = config.index_base;

    match cli.command {
        Commands::Matrix {
            clients,
            depots,
            osrm_url,
            profile,
            distances_out,
            durations_out,
        } => {
            let (clients, depots) = read_node_tables(&clients, &depots)?;
            // clients first, then depots
            let points: Vec<_> = clients
                .nodes
                .iter()
                .chain(&depots.nodes)
                .map(|n| n.coordinate())
                .collect();
            let client = OsrmClient::new(OsrmClientParams {
                osrm_url,
                profile,
                ..OsrmClientParams::default()
            })?;
            let matrices = client.fetch_matrices(&points)?;
            io::write_matrix(&distances_out, &matrices.distances, base)?;
            io::write_matrix(&durations_out, &matrices.durations, base)?;
            info!(
                "Wrote {} distances and {} durations",
                matrices.distances.len(),
                matrices.durations.len()
            );
        }
        Commands::Costs {
            vehicles,
            distances,
            durations,
            out,
            split,
        } => {
            let vehicles = io::read_vehicles(&vehicles)?;
            let distances = io::read_matrix(&distances, base)?;
            let durations = io::read_matrix(&durations, base)?;
            let table = derive_arc_costs(&distances, &durations, &vehicles, &config.rates())?;
            match split {
                true => {
                    std::fs::create_dir_all(&out)?;
                    for (vehicle, costs) in table.split_by_vehicle() {
                        io::write_costs(out.join(format!("costs_{}.csv", vehicle)), &costs, base)?;
                    }
                }
                false => io::write_costs(&out, &table, base)?,
            }
        }
        Commands::MergeCosts { inputs, out } => {
            let tables = inputs
                .iter()
                .map(|path| io::read_costs(path, base))
                .collect::<Result<Vec<_>, _>>()?;
            let merged = ArcCostTable::merge(tables)?;
            io::write_costs(&out, &merged, base)?;
            info!("Merged {} tables into {} arc costs", inputs.len(), merged.len());
        }
        Commands::Vrp {
            clients,
            depots,
            vehicles,
            costs,
            distances,
            out,
        } => {
            let (clients, depots) = read_node_tables(&clients, &depots)?;
            let tables = costs
                .iter()
                .map(|path| io::read_costs(path, base))
                .collect::<Result<Vec<_>, _>>()?;
            let distances = distances.map(|path| io::read_matrix(path, base)).transpose()?;

            let problem = VrpProblem::new(
                clients.nodes,
                depots.nodes,
                io::read_vehicles(&vehicles)?,
                clients.products,
                ArcCostTable::merge(tables)?,
                distances,
                config.rates(),
            )?;

            let solver = default_solver();
            let vrp = config.vrp.config();
            let outcome = VrpSolver::solve(&problem, &vrp, solver.as_ref(), &config.solver)?;
            info!("VRP status: {}", outcome.status);
            let solution = outcome.into_solution()?;
            for route in solution.routes() {
                let ids: Vec<&str> = route.nodes.iter().map(|n| problem.nodes()[*n].id()).collect();
                info!("{}: {}", problem.vehicles()[route.vehicle].id(), ids.join(" -> "));
            }
            io::write_routes(&out, &problem, &solution, base)?;
            println!("{}", solution.objective());
        }
        Commands::Sensors { instance, out } => {
            let problem = SensorProblem::from_json_file(&instance)?;
            let solver = default_solver();
            let outcome = SensorSolver::solve(&problem, solver.as_ref(), &config.solver)?;
            info!("Sensor placement status: {}", outcome.status);
            let solution = outcome.into_solution()?;
            io::write_placements(&out, &problem, &solution)?;
            println!("{}", solution.objective());
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    run(cli)
}
