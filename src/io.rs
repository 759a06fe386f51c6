//! Reading and writing the tabular inputs and outputs.
//!
//! Node references in matrix, cost and route records follow an [`IndexBase`]. The
//! headers of the original Spanish data files (`Desde`, `Hacia`, `Distancia`,
//! `Tiempo`, `Vehiculo`, `Costo`) are accepted next to the English ones.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::costs::ArcCostTable;
use crate::error::{Error, Result};
use crate::matrix::{IndexBase, TravelMatrix};
use crate::models::sensor::{SensorProblem, SensorSolution};
use crate::models::vrp::VrpSolution;
use crate::problem::{Coordinate, Node, NodeKind, Quantity, Vehicle, VrpProblem};

const ID_HEADERS: [&str; 4] = ["id", "ID", "Id", "Name"];
const LONGITUDE_HEADERS: [&str; 2] = ["longitude", "Longitude"];
const LATITUDE_HEADERS: [&str; 2] = ["latitude", "Latitude"];

#[derive(Debug, Deserialize)]
struct VehicleRecord {
    #[serde(alias = "VehicleType", alias = "type")]
    kind: String,
    #[serde(alias = "Capacity")]
    capacity: Quantity,
    #[serde(alias = "Range")]
    range: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct MatrixRecord {
    #[serde(alias = "Desde")]
    from: usize,
    #[serde(alias = "Hacia")]
    to: usize,
    #[serde(alias = "Distancia", alias = "Tiempo")]
    value: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CostRecord {
    #[serde(alias = "Vehiculo")]
    vehicle: String,
    #[serde(alias = "Desde")]
    from: usize,
    #[serde(alias = "Hacia")]
    to: usize,
    #[serde(alias = "Costo")]
    cost: f64,
}

#[derive(Debug, Serialize)]
struct RouteRecord<'a> {
    vehicle: &'a str,
    from: usize,
    to: usize,
}

#[derive(Debug, Serialize)]
struct PlacementRecord<'a> {
    sensor_type: &'a str,
    location: &'a str,
    placed: u8,
}

fn open(path: &Path) -> Result<File> {
    debug!("Opening {}", path.display());
    Ok(File::open(path)?)
}

fn column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| names.contains(&h.trim()))
}

/// Nodes of one kind and the product names taken from the extra columns
pub struct NodeTable {
    pub products: Vec<String>,
    pub nodes: Vec<Node>,
}

/// Reads `id,longitude,latitude,<product>...` rows. Every column that is not
/// the id or a coordinate is a product. Without an id column, rows are named
/// `C1, C2, ...` for clients and `D1, D2, ...` for depots.
pub fn read_nodes_from<R: Read>(reader: R, kind: NodeKind) -> Result<NodeTable> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();

    let id = column(&headers, &ID_HEADERS);
    let lon = column(&headers, &LONGITUDE_HEADERS)
        .ok_or_else(|| Error::InvalidInput(format!("{} table has no longitude column", kind)))?;
    let lat = column(&headers, &LATITUDE_HEADERS)
        .ok_or_else(|| Error::InvalidInput(format!("{} table has no latitude column", kind)))?;

    let product_columns: Vec<usize> = (0..headers.len())
        .filter(|c| Some(*c) != id && *c != lon && *c != lat)
        .collect();
    let products: Vec<String> = product_columns
        .iter()
        .map(|c| headers[*c].trim().to_string())
        .collect();

    let prefix = match kind {
        NodeKind::Client => "C",
        NodeKind::Depot => "D",
    };

    let parse = |record: &csv::StringRecord, c: usize, row: usize| -> Result<f64> {
        record[c].trim().parse::<f64>().map_err(|e| {
            Error::InvalidInput(format!("{} row {}, column {}: {}", kind, row + 1, &headers[c], e))
        })
    };

    let mut nodes = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let name = match id {
            Some(c) => record[c].trim().to_string(),
            None => format!("{}{}", prefix, row + 1),
        };
        let coordinate = Coordinate {
            longitude: parse(&record, lon, row)?,
            latitude: parse(&record, lat, row)?,
        };
        let quantities = product_columns
            .iter()
            .map(|c| parse(&record, *c, row))
            .collect::<Result<Vec<_>>>()?;
        nodes.push(match kind {
            NodeKind::Client => Node::client(name, coordinate, quantities),
            NodeKind::Depot => Node::depot(name, coordinate, quantities),
        });
    }

    debug!("Read {} {} rows with products {:?}", nodes.len(), kind, products);
    Ok(NodeTable { products, nodes })
}

pub fn read_nodes(path: impl AsRef<Path>, kind: NodeKind) -> Result<NodeTable> {
    read_nodes_from(open(path.as_ref())?, kind)
}

/// Reads `VehicleType,Capacity,Range` rows; ids V1, V2, ... follow the row order
pub fn read_vehicles_from<R: Read>(reader: R) -> Result<Vec<Vehicle>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let record: VehicleRecord = record?;
        rows.push((record.kind, record.capacity, record.range));
    }
    Ok(Vehicle::fleet(rows))
}

pub fn read_vehicles(path: impl AsRef<Path>) -> Result<Vec<Vehicle>> {
    read_vehicles_from(open(path.as_ref())?)
}

/// Reads `from,to,value` rows into a sparse matrix. Empty values are missing pairs.
pub fn read_matrix_from<R: Read>(reader: R, base: IndexBase) -> Result<TravelMatrix> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut matrix = TravelMatrix::new();
    for record in reader.deserialize() {
        let row: MatrixRecord = record?;
        if let Some(value) = row.value {
            matrix.insert(base.to_internal(row.from)?, base.to_internal(row.to)?, value);
        }
    }
    Ok(matrix)
}

pub fn read_matrix(path: impl AsRef<Path>, base: IndexBase) -> Result<TravelMatrix> {
    let matrix = read_matrix_from(open(path.as_ref())?, base)?;
    info!("Read {} matrix entries from {}", matrix.len(), path.as_ref().display());
    Ok(matrix)
}

pub fn write_matrix_to<W: Write>(writer: W, matrix: &TravelMatrix, base: IndexBase) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for ((from, to), value) in matrix.iter() {
        writer.serialize(MatrixRecord {
            from: base.to_external(from),
            to: base.to_external(to),
            value: Some(value),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_matrix(path: impl AsRef<Path>, matrix: &TravelMatrix, base: IndexBase) -> Result<()> {
    write_matrix_to(File::create(path)?, matrix, base)
}

/// Reads `vehicle,from,to,cost` rows
pub fn read_costs_from<R: Read>(reader: R, base: IndexBase) -> Result<ArcCostTable> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut table = ArcCostTable::new();
    for record in reader.deserialize() {
        let row: CostRecord = record?;
        table.insert(row.vehicle, base.to_internal(row.from)?, base.to_internal(row.to)?, row.cost);
    }
    Ok(table)
}

pub fn read_costs(path: impl AsRef<Path>, base: IndexBase) -> Result<ArcCostTable> {
    let table = read_costs_from(open(path.as_ref())?, base)?;
    info!("Read {} arc costs from {}", table.len(), path.as_ref().display());
    Ok(table)
}

pub fn write_costs_to<W: Write>(writer: W, table: &ArcCostTable, base: IndexBase) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for (vehicle, from, to, cost) in table.iter() {
        writer.serialize(CostRecord {
            vehicle: vehicle.to_string(),
            from: base.to_external(from),
            to: base.to_external(to),
            cost,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_costs(path: impl AsRef<Path>, table: &ArcCostTable, base: IndexBase) -> Result<()> {
    write_costs_to(File::create(path)?, table, base)
}

/// Writes one `vehicle,from,to` row per used arc, vehicles by id
pub fn write_routes_to<W: Write>(
    writer: W,
    problem: &VrpProblem,
    solution: &VrpSolution,
    base: IndexBase,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for arc in solution.arcs() {
        writer.serialize(RouteRecord {
            vehicle: problem.vehicles()[arc.vehicle].id(),
            from: base.to_external(arc.from),
            to: base.to_external(arc.to),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_routes(
    path: impl AsRef<Path>,
    problem: &VrpProblem,
    solution: &VrpSolution,
    base: IndexBase,
) -> Result<()> {
    write_routes_to(File::create(path)?, problem, solution, base)
}

/// Writes one `sensor_type,location,placed` row per type and location
pub fn write_placements_to<W: Write>(
    writer: W,
    problem: &SensorProblem,
    solution: &SensorSolution,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for (s, sensor) in problem.sensors().iter().enumerate() {
        for (l, location) in problem.locations().iter().enumerate() {
            writer.serialize(PlacementRecord {
                sensor_type: sensor,
                location,
                placed: solution.is_placed(s, l) as u8,
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn write_placements(
    path: impl AsRef<Path>,
    problem: &SensorProblem,
    solution: &SensorSolution,
) -> Result<()> {
    write_placements_to(File::create(path)?, problem, solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_take_products_from_the_extra_columns() {
        let data = "Longitude,Latitude,Water,Food\n-74.08,4.60,2,1\n-74.10,4.65,0,3\n";
        let table = read_nodes_from(data.as_bytes(), NodeKind::Client).unwrap();
        assert_eq!(table.products, vec!["Water", "Food"]);
        assert_eq!(table.nodes.len(), 2);
        assert_eq!(table.nodes[1].id(), "C2");
        assert_eq!(table.nodes[1].quantities(), &[0.0, 3.0]);
        assert_eq!(table.nodes[0].coordinate().longitude, -74.08);
    }

    #[test]
    fn nodes_keep_their_ids() {
        let data = "id,longitude,latitude,water\nnorth,1.0,2.0,50\n";
        let table = read_nodes_from(data.as_bytes(), NodeKind::Depot).unwrap();
        assert_eq!(table.nodes[0].id(), "north");
        assert!(table.nodes[0].is_depot());
    }

    #[test]
    fn node_table_needs_coordinates() {
        let data = "id,water\na,1\n";
        assert!(matches!(
            read_nodes_from(data.as_bytes(), NodeKind::Client),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn vehicles_get_sequential_ids() {
        let data = "VehicleType,Capacity,Range\nGas Car,100,300\ndrone,5,20\n";
        let vehicles = read_vehicles_from(data.as_bytes()).unwrap();
        assert_eq!(vehicles[0].id(), "V1");
        assert_eq!(vehicles[1].id(), "V2");
        assert_eq!(vehicles[1].kind(), "drone");
        assert_eq!(vehicles[1].range(), 20.0);
    }

    #[test]
    fn spanish_matrix_headers_with_one_based_indices() {
        let data = "Distancia,Desde,Hacia\n1500.0,1,2\n,2,1\n";
        let matrix = read_matrix_from(data.as_bytes(), IndexBase::One).unwrap();
        assert_eq!(matrix.get(0, 1), Some(1500.0));
        assert_eq!(matrix.get(1, 0), None);
        assert_eq!(matrix.len(), 1);
    }

    #[test]
    fn zero_in_a_one_based_table_is_rejected() {
        let data = "from,to,value\n0,1,3.0\n";
        assert!(read_matrix_from(data.as_bytes(), IndexBase::One).is_err());
    }

    #[test]
    fn cost_tables_round_trip_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("costs.csv");
        let table: ArcCostTable = vec![
            ("V1".to_string(), 0, 1, 12.5),
            ("V2".to_string(), 1, 0, 3.0),
        ]
        .into_iter()
        .collect();

        write_costs(&path, &table, IndexBase::One).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("vehicle,from,to,cost\n"));
        assert!(written.contains("V1,1,2,12.5"));

        assert_eq!(read_costs(&path, IndexBase::One).unwrap(), table);
    }

    #[test]
    fn spanish_cost_headers() {
        let data = "Vehiculo,Desde,Hacia,Costo\nV1,0,1,7.0\n";
        let table = read_costs_from(data.as_bytes(), IndexBase::Zero).unwrap();
        assert_eq!(table.get("V1", 0, 1), Some(7.0));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_vehicles(dir.path().join("vehicles.csv"));
        assert!(matches!(
            result,
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound
        ));
    }
}
