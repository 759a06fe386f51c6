use std::collections::{BTreeMap, HashMap};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::matrix::TravelMatrix;
use crate::problem::{Cost, NodeIndex, Vehicle};

/// Unit costs of a vehicle type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostRates {
    /// cost per kilometre driven
    pub per_km: f64,
    /// cost per minute driven
    pub per_minute: f64,
    /// daily maintenance cost of a vehicle in use
    #[serde(default)]
    pub maintenance: f64,
    /// recharge or fuel cost of a vehicle in use
    #[serde(default)]
    pub recharge: f64,
}

impl CostRates {
    /// The cost that is paid once per vehicle, independent of the route
    pub fn fixed(&self) -> Cost {
        self.maintenance + self.recharge
    }
}

/// Cost rates keyed by vehicle type label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable(HashMap<String, CostRates>);

impl RateTable {
    pub fn new() -> RateTable {
        RateTable::default()
    }

    /// Rates of the gas car, drone and electric vehicle fleet (COP)
    pub fn builtin() -> RateTable {
        let mut table = RateTable::new();
        table.insert(
            "Gas Car",
            CostRates {
                per_km: 5000.0,
                per_minute: 500.0,
                maintenance: 30000.0,
                recharge: 16000.0,
            },
        );
        table.insert(
            "drone",
            CostRates {
                per_km: 500.0,
                per_minute: 500.0,
                maintenance: 3000.0,
                recharge: 220.73,
            },
        );
        table.insert(
            "EV",
            CostRates {
                per_km: 4000.0,
                per_minute: 500.0,
                maintenance: 21000.0,
                recharge: 0.0,
            },
        );
        table
    }

    pub fn insert(&mut self, kind: impl Into<String>, rates: CostRates) {
        self.0.insert(kind.into(), rates);
    }

    pub fn get(&self, kind: &str) -> Option<&CostRates> {
        self.0.get(kind)
    }
}

pub fn distance_km(distance_m: f64) -> f64 {
    distance_m / 1000.0
}

pub fn duration_min(duration_s: f64) -> f64 {
    duration_s / 60.0
}

/// Travel cost of one arc given its distance (metres) and duration (seconds)
pub fn arc_cost(rates: &CostRates, distance_m: f64, duration_s: f64) -> Cost {
    rates.per_km * distance_km(distance_m) + rates.per_minute * duration_min(duration_s)
}

type ArcKey = (String, NodeIndex, NodeIndex);

/// Travel cost per (vehicle id, origin, destination).
///
/// Only defined arcs are stored: an absent key means the vehicle cannot use the arc.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArcCostTable {
    entries: BTreeMap<ArcKey, Cost>,
}

impl ArcCostTable {
    pub fn new() -> ArcCostTable {
        ArcCostTable::default()
    }

    /// Inserts a cost, self-loops are ignored
    pub fn insert(
        &mut self,
        vehicle: impl Into<String>,
        from: NodeIndex,
        to: NodeIndex,
        cost: Cost,
    ) {
        if from != to {
            self.entries.insert((vehicle.into(), from, to), cost);
        }
    }

    pub fn get(&self, vehicle: &str, from: NodeIndex, to: NodeIndex) -> Option<Cost> {
        self.entries.get(&(vehicle.to_string(), from, to)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = (&str, NodeIndex, NodeIndex)> + '_ {
        self.entries.keys().map(|(v, i, j)| (v.as_str(), *i, *j))
    }

    /// All entries ordered by vehicle, origin and destination
    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeIndex, NodeIndex, Cost)> + '_ {
        self.entries.iter().map(|((v, i, j), c)| (v.as_str(), *i, *j, *c))
    }

    /// Ids of the vehicles that have at least one arc
    pub fn vehicles(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(|(v, _, _)| v.as_str()).collect();
        ids.dedup();
        ids
    }

    /// Unions several tables. The same key with two different costs is an error.
    pub fn merge<I: IntoIterator<Item = ArcCostTable>>(tables: I) -> Result<ArcCostTable> {
        let mut merged = ArcCostTable::new();
        for table in tables {
            for (key, cost) in table.entries {
                match merged.entries.get(&key) {
                    Some(existing) if *existing != cost => {
                        return Err(Error::InvalidInput(format!(
                            "conflicting costs for arc ({}, {}, {}): {} and {}",
                            key.0, key.1, key.2, existing, cost
                        )));
                    }
                    _ => {
                        merged.entries.insert(key, cost);
                    }
                }
            }
        }
        Ok(merged)
    }

    /// Splits the table into one table per vehicle, ordered by vehicle id
    pub fn split_by_vehicle(&self) -> Vec<(String, ArcCostTable)> {
        let mut out: BTreeMap<String, ArcCostTable> = BTreeMap::new();
        for ((v, i, j), c) in &self.entries {
            out.entry(v.clone()).or_default().entries.insert((v.clone(), *i, *j), *c);
        }
        out.into_iter().collect()
    }
}

impl FromIterator<(String, NodeIndex, NodeIndex, Cost)> for ArcCostTable {
    fn from_iter<T: IntoIterator<Item = (String, NodeIndex, NodeIndex, Cost)>>(iter: T) -> Self {
        let mut table = ArcCostTable::new();
        for (v, i, j, c) in iter {
            table.insert(v, i, j, c);
        }
        table
    }
}

/// Computes the travel cost of every arc for every vehicle from the distance and duration matrices.
///
/// Each vehicle is priced with the rates of its own type. An arc that is missing from
/// either matrix is left out of the table instead of being priced at zero.
pub fn derive_arc_costs(
    distances: &TravelMatrix,
    durations: &TravelMatrix,
    vehicles: &[Vehicle],
    rates: &RateTable,
) -> Result<ArcCostTable> {
    info!("Deriving arc costs for {} vehicles", vehicles.len());

    let mut table = ArcCostTable::new();
    let mut skipped = 0;
    for vehicle in vehicles {
        let r = rates.get(vehicle.kind()).ok_or_else(|| {
            Error::MissingData(format!(
                "no cost rates for vehicle type '{}' ({})",
                vehicle.kind(),
                vehicle.id()
            ))
        })?;

        for ((from, to), distance) in distances.iter() {
            if from == to {
                continue;
            }
            match durations.get(from, to) {
                Some(duration) => {
                    table.insert(vehicle.id(), from, to, arc_cost(r, distance, duration))
                }
                None => skipped += 1,
            }
        }
    }

    // pairs with a duration but no distance never reach the loop above
    let only_in_durations = durations
        .iter()
        .filter(|((i, j), _)| i != j && !distances.contains(*i, *j))
        .count()
        * vehicles.len();

    debug!(
        "Derived {} arc costs, excluded {} arcs missing a duration and {} missing a distance",
        table.len(),
        skipped,
        only_in_durations
    );
    Ok(table)
}
