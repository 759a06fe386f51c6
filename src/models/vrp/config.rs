use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::problem::VrpProblem;

/// How the per-vehicle maintenance and recharge costs enter the objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedCostCharge {
    /// Not charged, the arc costs already contain everything
    None,
    /// Charged for every vehicle whose activation indicator is 1
    ActivatedOnly,
    /// Charged for every vehicle of the fleet, used or not
    AllVehicles,
}

/// Which nodes carry a subtour-elimination potential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MtzDomain {
    /// u[i,v] for clients, big-M = |C|
    Clients,
    /// u[i,v] for all nodes, big-M = |N|; arcs into depots are not ordered
    AllNodes,
}

/// The constraint families that are added to the routing model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSet {
    pub visit_once: bool,
    pub flow_conservation: bool,
    pub vehicle_capacity: bool,
    pub demand: bool,
    pub depot_capacity: bool,
    pub range: bool,
    pub subtour_elimination: bool,
    pub depart_depot: bool,
    pub activation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrpConfig {
    pub constraints: ConstraintSet,
    pub fixed_costs: FixedCostCharge,
    pub mtz: MtzDomain,
}

impl VrpConfig {
    /// Arc costs decomposed into distance and time, with capacities, range and
    /// maintenance/recharge charged for activated vehicles
    pub fn detailed() -> VrpConfig {
        VrpConfig {
            constraints: ConstraintSet {
                visit_once: true,
                flow_conservation: true,
                vehicle_capacity: true,
                demand: true,
                depot_capacity: true,
                range: true,
                subtour_elimination: true,
                depart_depot: true,
                activation: true,
            },
            fixed_costs: FixedCostCharge::ActivatedOnly,
            mtz: MtzDomain::Clients,
        }
    }

    /// Pre-aggregated arc costs and pure routing constraints
    pub fn simplified() -> VrpConfig {
        VrpConfig {
            constraints: ConstraintSet {
                visit_once: true,
                flow_conservation: true,
                vehicle_capacity: false,
                demand: false,
                depot_capacity: false,
                range: false,
                subtour_elimination: true,
                depart_depot: true,
                activation: false,
            },
            fixed_costs: FixedCostCharge::None,
            mtz: MtzDomain::Clients,
        }
    }

    /// Checks that the selected constraints fit together and that the problem carries the data
    /// they need
    pub fn validate(&self, problem: &VrpProblem) -> Result<()> {
        let c = &self.constraints;
        if self.fixed_costs == FixedCostCharge::ActivatedOnly && !c.activation {
            return Err(Error::InvalidConfig(
                "fixed costs charged for activated vehicles need the activation constraints".into(),
            ));
        }
        if c.depot_capacity && !c.depart_depot {
            return Err(Error::InvalidConfig(
                "depot capacity attributes load to the departure depot and needs depart_depot"
                    .into(),
            ));
        }
        if (c.vehicle_capacity || c.depot_capacity) && !c.demand {
            return Err(Error::InvalidConfig(
                "capacity constraints bound the delivered load and need the demand constraints"
                    .into(),
            ));
        }
        if c.range && problem.distances().is_none() {
            return Err(Error::InvalidConfig("the range constraint needs a distance matrix".into()));
        }
        Ok(())
    }
}

impl Default for VrpConfig {
    fn default() -> Self {
        VrpConfig::detailed()
    }
}

/// Model variant preset, the starting point of a [`VrpSettings`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    #[default]
    Detailed,
    Simplified,
}

/// A preset with individual overrides, as read from a configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VrpSettings {
    pub variant: Variant,
    pub visit_once: Option<bool>,
    pub flow_conservation: Option<bool>,
    pub vehicle_capacity: Option<bool>,
    pub demand: Option<bool>,
    pub depot_capacity: Option<bool>,
    pub range: Option<bool>,
    pub subtour_elimination: Option<bool>,
    pub depart_depot: Option<bool>,
    pub activation: Option<bool>,
    pub fixed_costs: Option<FixedCostCharge>,
    pub mtz: Option<MtzDomain>,
}

impl VrpSettings {
    pub fn config(&self) -> VrpConfig {
        let mut config = match self.variant {
            Variant::Detailed => VrpConfig::detailed(),
            Variant::Simplified => VrpConfig::simplified(),
        };
        let c = &mut config.constraints;
        let overrides = [
            (&mut c.visit_once, self.visit_once),
            (&mut c.flow_conservation, self.flow_conservation),
            (&mut c.vehicle_capacity, self.vehicle_capacity),
            (&mut c.demand, self.demand),
            (&mut c.depot_capacity, self.depot_capacity),
            (&mut c.range, self.range),
            (&mut c.subtour_elimination, self.subtour_elimination),
            (&mut c.depart_depot, self.depart_depot),
            (&mut c.activation, self.activation),
        ];
        for (flag, value) in overrides {
            if let Some(value) = value {
                *flag = value;
            }
        }
        if let Some(fixed_costs) = self.fixed_costs {
            config.fixed_costs = fixed_costs;
        }
        if let Some(mtz) = self.mtz {
            config.mtz = mtz;
        }
        config
    }
}
