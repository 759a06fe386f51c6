use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::matrix::{TravelMatrices, TravelMatrix};
use crate::problem::Coordinate;

pub const OSRM_PUBLIC_URL: &str = "http://router.project-osrm.org";
pub const OSRM_TABLE_API_PATH: &str = "/table/v1/";

/// Body of an OSRM table response; unreachable pairs are `null`
#[derive(Debug, Deserialize)]
struct TableResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f64>>>>,
    #[serde(default)]
    durations: Option<Vec<Vec<Option<f64>>>>,
}

#[derive(Debug, Clone)]
pub struct OsrmClientParams {
    pub osrm_url: String,
    /// Routing profile, e.g. `driving`
    pub profile: String,
    pub timeout: Duration,
}

impl Default for OsrmClientParams {
    fn default() -> Self {
        OsrmClientParams {
            osrm_url: OSRM_PUBLIC_URL.to_string(),
            profile: "driving".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Fetches distance and duration matrices from an OSRM table service
pub struct OsrmClient {
    params: OsrmClientParams,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(params: OsrmClientParams) -> Result<Self> {
        let client = reqwest::blocking::Client::builder().timeout(params.timeout).build()?;
        Ok(Self { params, client })
    }

    /// `{url}/table/v1/{profile}/{lon,lat;lon,lat;...}`
    pub fn table_url(&self, points: &[Coordinate]) -> String {
        let mut url = self.params.osrm_url.trim_end_matches('/').to_string();
        url.push_str(OSRM_TABLE_API_PATH);
        url.push_str(&self.params.profile);
        url.push('/');

        let coordinates: Vec<String> = points
            .iter()
            .map(|p| format!("{},{}", p.longitude, p.latitude))
            .collect();
        url.push_str(&coordinates.join(";"));
        url
    }

    /// All-to-all matrices between `points`, indexed in the order of `points`
    pub fn fetch_matrices(&self, points: &[Coordinate]) -> Result<TravelMatrices> {
        if points.is_empty() {
            return Err(Error::InvalidInput("no points to build a matrix for".into()));
        }

        let url = format!("{}?annotations=distance,duration", self.table_url(points));
        info!("Requesting a {}x{} table from {}", points.len(), points.len(), self.params.osrm_url);
        debug!("GET {}", url);

        let response = self.client.get(&url).send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Service {
                status: status.as_u16(),
                body,
            });
        }

        let table: TableResponse = response.json()?;
        matrices_from_table(table, points.len())
    }
}

fn matrices_from_table(table: TableResponse, n: usize) -> Result<TravelMatrices> {
    if table.code != "Ok" {
        return Err(Error::Service {
            status: 200,
            body: format!("{}: {}", table.code, table.message.unwrap_or_default()),
        });
    }

    let dense = |name: &str, rows: Option<Vec<Vec<Option<f64>>>>| -> Result<TravelMatrix> {
        let rows = rows
            .ok_or_else(|| Error::MissingData(format!("the table response has no {}", name)))?;
        if rows.len() != n || rows.iter().any(|r| r.len() != n) {
            return Err(Error::InvalidInput(format!("the {} table is not {}x{}", name, n, n)));
        }
        Ok(TravelMatrix::from_dense(&rows))
    };

    Ok(TravelMatrices {
        distances: dense("distances", table.distances)?,
        durations: dense("durations", table.durations)?,
    })
}
