//! Domain types shared by the poller, the placement engine, and the
//! simulator.
//!
//! Field spellings on [`Region`] and [`Snapshot`] are pinned to the cache
//! file format; renaming one is a wire-format break.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Opaque grid-operator zone code (e.g. `US-NY-NYIS`, `FR-FR`).
pub type RegionTag = String;

// ── Resources ──────────────────────────────────────────────────────

/// Typed resource quantities for a host capacity or a workload request.
///
/// Compute is measured in millicores, memory in bytes. New dimensions are
/// added here and compared in [`Resources::fits_within`]; nothing outside
/// this type enumerates dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub cpu_millis: u64,
    pub memory_bytes: u64,
}

impl Resources {
    pub const ZERO: Resources = Resources {
        cpu_millis: 0,
        memory_bytes: 0,
    };

    pub fn new(cpu_millis: u64, memory_bytes: u64) -> Self {
        Self {
            cpu_millis,
            memory_bytes,
        }
    }

    /// True when no dimension requests anything.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// True when every dimension of `self` fits inside `available`.
    pub fn fits_within(&self, available: &Resources) -> bool {
        self.cpu_millis <= available.cpu_millis && self.memory_bytes <= available.memory_bytes
    }

    /// Component-wise sum.
    pub fn plus(&self, other: &Resources) -> Resources {
        Resources {
            cpu_millis: self.cpu_millis.saturating_add(other.cpu_millis),
            memory_bytes: self.memory_bytes.saturating_add(other.memory_bytes),
        }
    }

    /// Component-wise difference, clamped at zero.
    pub fn minus(&self, other: &Resources) -> Resources {
        Resources {
            cpu_millis: self.cpu_millis.saturating_sub(other.cpu_millis),
            memory_bytes: self.memory_bytes.saturating_sub(other.memory_bytes),
        }
    }
}

// ── Region ─────────────────────────────────────────────────────────

/// One region record as persisted in the snapshot file.
///
/// Extra fields reported by the emissions service pass through to the
/// record unchanged; only `zone` and the intensity are interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Zone tag, equal to the key this record is stored under.
    pub zone: String,

    /// Grams CO₂-equivalent per kWh.
    #[serde(rename = "carbonIntensity", default)]
    pub carbon_intensity: f64,

    /// Legacy marginal-emissions field from the previous data provider.
    /// Consulted only when `carbonIntensity` is missing or zero; never
    /// written by the poller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moer: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(
        rename = "emissionFactorType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub emission_factor_type: Option<String>,

    /// The source flagged this measurement as estimated rather than
    /// metered.
    #[serde(rename = "isEstimated", default)]
    pub is_estimated: bool,

    #[serde(
        rename = "estimationMethod",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub estimation_method: Option<String>,

    /// Wall-clock stamp recorded by the poller when the reading was
    /// taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Region {
    /// A minimal record carrying only a tag and an intensity.
    pub fn with_intensity(zone: impl Into<String>, carbon_intensity: f64) -> Self {
        Self {
            zone: zone.into(),
            carbon_intensity,
            moer: None,
            datetime: None,
            updated_at: None,
            created_at: None,
            emission_factor_type: None,
            is_estimated: false,
            estimation_method: None,
            timestamp: None,
        }
    }

    /// Effective intensity: `carbonIntensity` when positive, else the
    /// legacy `moer` when positive.
    pub fn effective_intensity(&self) -> Option<f64> {
        if self.carbon_intensity > 0.0 {
            return Some(self.carbon_intensity);
        }
        match self.moer {
            Some(moer) if moer > 0.0 => Some(moer),
            _ => None,
        }
    }
}

// ── Snapshot ───────────────────────────────────────────────────────

/// An atomic, timestamped view of every polled region, plus the derived
/// ascending order and its endpoints.
///
/// Invariants: `sorted_by_carbon` is a stable ascending permutation of
/// the keys of `regions` by effective intensity; `best_region` and
/// `worst_region` are its first and last entries, or both `None` when
/// the mapping is empty. The `BTreeMap` pins iteration order, which the
/// simulator's determinism relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Wall-clock creation time (RFC3339).
    pub timestamp: DateTime<Utc>,
    pub ttl_minutes: i64,
    pub regions: BTreeMap<RegionTag, Region>,
    pub sorted_by_carbon: Vec<RegionTag>,
    pub best_region: Option<RegionTag>,
    pub worst_region: Option<RegionTag>,
}

impl Snapshot {
    /// Assemble a snapshot from polled regions, deriving the ascending
    /// order and best/worst tags. Regions with no effective intensity
    /// sort last; ties keep tag order.
    pub fn from_regions(
        regions: BTreeMap<RegionTag, Region>,
        ttl_minutes: i64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut sorted_by_carbon: Vec<RegionTag> = regions.keys().cloned().collect();
        sorted_by_carbon.sort_by(|a, b| {
            let ia = intensity_or_inf(&regions, a);
            let ib = intensity_or_inf(&regions, b);
            ia.total_cmp(&ib)
        });

        let best_region = sorted_by_carbon.first().cloned();
        let worst_region = sorted_by_carbon.last().cloned();

        Self {
            timestamp,
            ttl_minutes,
            regions,
            sorted_by_carbon,
            best_region,
            worst_region,
        }
    }

    /// Age of the snapshot at `now`.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.timestamp)
    }

    /// A snapshot older than its TTL must not inform placement.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.age(now) > Duration::minutes(self.ttl_minutes)
    }

    /// Effective intensity of a region tag, if present and positive.
    pub fn intensity_of(&self, tag: &str) -> Option<f64> {
        self.regions.get(tag).and_then(Region::effective_intensity)
    }
}

fn intensity_or_inf(regions: &BTreeMap<RegionTag, Region>, tag: &str) -> f64 {
    regions
        .get(tag)
        .and_then(Region::effective_intensity)
        .unwrap_or(f64::INFINITY)
}
