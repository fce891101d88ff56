use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::sdk::geo::MAX_MATRIX_CELLS;
use crate::sdk::meetpoint::{MeetpointService, PipelineOptions};
use crate::sdk::routing::client::TravelTimeMatrixClient;
use crate::sdk::routing::error::RoutingError;
use crate::sdk::routing::provider::ors::ORS_BASE_URL;
use crate::sdk::routing::provider::{DgisMatrixProvider, OrsMatrixProvider};
use crate::sdk::transit::{DgisStationLookup, OverpassStopLookup, TransitSnap};
use crate::sdk::util::rate_limit::{lookup_pacer, Limiter, QuotaLimits, SlidingWindowLimiter};

const DEFAULT_MINUTE_LIMIT: u32 = 40;
const DEFAULT_DAILY_LIMIT: u32 = 2000;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SNAP_RADIUS_M: f64 = 1500.0;
const LOOKUPS_PER_SECOND: u32 = 2;

/// Whether a provider can be used with the current configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCapability {
    Available,
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeetpointConfig {
    pub ors_api_key: Option<String>,
    pub ors_base_url: String,
    pub gis2_api_key: Option<String>,
    pub cell_budget: usize,
    pub limits: QuotaLimits,
    pub timeout: Duration,
    pub snap_enabled: bool,
    pub snap_radius_m: f64,
    pub strict: bool,
}

impl Default for MeetpointConfig {
    fn default() -> Self {
        Self {
            ors_api_key: None,
            ors_base_url: ORS_BASE_URL.to_string(),
            gis2_api_key: None,
            cell_budget: MAX_MATRIX_CELLS,
            limits: QuotaLimits {
                per_minute: DEFAULT_MINUTE_LIMIT,
                per_day: DEFAULT_DAILY_LIMIT,
            },
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            snap_enabled: true,
            snap_radius_m: DEFAULT_SNAP_RADIUS_M,
            strict: false,
        }
    }
}

impl MeetpointConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            ors_api_key: text("ORS_API_KEY"),
            ors_base_url: text("ORS_BASE_URL").unwrap_or(defaults.ors_base_url),
            gis2_api_key: text("GIS2_API_KEY").or_else(|| text("2GIS_API_KEY")),
            cell_budget: parse_or("MATRIX_CELL_BUDGET", text("MATRIX_CELL_BUDGET"), defaults.cell_budget),
            limits: QuotaLimits {
                per_minute: parse_or(
                    "ROUTING_MINUTE_LIMIT",
                    text("ROUTING_MINUTE_LIMIT"),
                    defaults.limits.per_minute,
                ),
                per_day: parse_or(
                    "ROUTING_DAILY_LIMIT",
                    text("ROUTING_DAILY_LIMIT"),
                    defaults.limits.per_day,
                ),
            },
            timeout: Duration::from_secs(parse_or(
                "REQUEST_TIMEOUT_SECS",
                text("REQUEST_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT_SECS,
            )),
            snap_enabled: parse_flag("TRANSIT_SNAP", text("TRANSIT_SNAP"), defaults.snap_enabled),
            snap_radius_m: parse_or(
                "TRANSIT_SNAP_RADIUS_M",
                text("TRANSIT_SNAP_RADIUS_M"),
                defaults.snap_radius_m,
            ),
            strict: parse_flag("MEETPOINT_STRICT", text("MEETPOINT_STRICT"), defaults.strict),
        }
    }

    /// ORS needs a key unless it points at a self-hosted instance.
    pub fn ors_capability(&self) -> ProviderCapability {
        if self.ors_api_key.is_some() || self.ors_base_url != ORS_BASE_URL {
            ProviderCapability::Available
        } else {
            ProviderCapability::Unavailable("ORS_API_KEY is not configured".to_string())
        }
    }

    pub fn dgis_capability(&self) -> ProviderCapability {
        match self.gis2_api_key {
            Some(_) => ProviderCapability::Available,
            None => ProviderCapability::Unavailable("GIS2_API_KEY is not configured".to_string()),
        }
    }

    pub fn limiter(&self) -> Limiter {
        Arc::new(SlidingWindowLimiter::new(self.limits))
    }

    /// Matrix clients in failover order (ORS first), plus the reasons for
    /// any provider left out. All clients share one quota limiter.
    pub fn matrix_clients(
        &self,
        limiter: &Limiter,
    ) -> Result<(Vec<TravelTimeMatrixClient>, Vec<String>), RoutingError> {
        let mut clients = Vec::new();
        let mut unavailable = Vec::new();

        match self.ors_capability() {
            ProviderCapability::Available => {
                let provider = OrsMatrixProvider::new(
                    self.ors_api_key.clone(),
                    self.ors_base_url.clone(),
                    self.timeout,
                )?;
                clients.push(TravelTimeMatrixClient::new(Arc::new(provider), Arc::clone(limiter)));
            }
            ProviderCapability::Unavailable(reason) => unavailable.push(reason),
        }

        match &self.gis2_api_key {
            Some(key) => {
                let provider = DgisMatrixProvider::new(key.clone(), self.timeout)?;
                clients.push(TravelTimeMatrixClient::new(Arc::new(provider), Arc::clone(limiter)));
            }
            None => {
                if let ProviderCapability::Unavailable(reason) = self.dgis_capability() {
                    unavailable.push(reason);
                }
            }
        }

        Ok((clients, unavailable))
    }

    /// `None` when snapping is disabled. Without a 2GIS key only the
    /// Overpass bus-stop lookup is used.
    pub fn transit_snap(&self) -> Result<Option<TransitSnap>, RoutingError> {
        if !self.snap_enabled {
            return Ok(None);
        }

        let pacer = lookup_pacer(LOOKUPS_PER_SECOND);
        let surface = Box::new(OverpassStopLookup::new(self.timeout, Arc::clone(&pacer))?);
        let snap = match &self.gis2_api_key {
            Some(key) => {
                let rail = DgisStationLookup::new(key.clone(), self.timeout, pacer)?;
                TransitSnap::new(Box::new(rail), surface, self.snap_radius_m)
            }
            None => {
                log::warn!("Metro station lookup disabled: GIS2_API_KEY is not configured");
                TransitSnap::surface_only(surface, self.snap_radius_m)
            }
        };
        Ok(Some(snap))
    }

    /// Wires providers, limiter and snap into a ready service.
    pub fn build_service(&self) -> Result<MeetpointService, RoutingError> {
        let limiter = self.limiter();
        let (clients, unavailable) = self.matrix_clients(&limiter)?;
        for reason in &unavailable {
            log::warn!("Provider unavailable: {}", reason);
        }

        let options = PipelineOptions {
            cell_budget: self.cell_budget,
            strict: self.strict,
        };
        let mut service = MeetpointService::new(clients, options).with_unavailable(unavailable);
        if let Some(snap) = self.transit_snap()? {
            service = service.with_snap(snap);
        }
        Ok(service)
    }
}

fn parse_or<T: FromStr>(name: &str, value: Option<String>, default: T) -> T {
    match value {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("Ignoring malformed {}='{}', using default", name, raw);
            default
        }),
    }
}

fn parse_flag(name: &str, value: Option<String>, default: bool) -> bool {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => default,
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        Some(other) => {
            log::warn!("Ignoring malformed {}='{}', using default", name, other);
            default
        }
    }
}
