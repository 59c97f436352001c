//! Endpoint descriptors for the UFM REST resources that get streamed.

use std::fmt;
use std::str::FromStr;

/// The five UFM resources polled by the streamer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Versioning,
    Systems,
    Ports,
    Links,
    Alarms,
}

impl EndpointKind {
    /// All endpoints in fetch order.
    pub const ALL: [EndpointKind; 5] = [
        EndpointKind::Versioning,
        EndpointKind::Systems,
        EndpointKind::Ports,
        EndpointKind::Links,
        EndpointKind::Alarms,
    ];

    /// The key used for this endpoint in records and logs.
    pub const fn name(self) -> &'static str {
        match self {
            EndpointKind::Versioning => "versioning",
            EndpointKind::Systems => "systems",
            EndpointKind::Ports => "ports",
            EndpointKind::Links => "links",
            EndpointKind::Alarms => "alarms",
        }
    }

    /// The static descriptor for this endpoint.
    pub fn descriptor(self) -> &'static Endpoint {
        &ENDPOINTS[self as usize]
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EndpointKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EndpointKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown endpoint '{}'", s))
    }
}

/// How often an endpoint is re-fetched from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Fetched only while the in-memory slot is empty. The value is assumed
    /// immutable for the lifetime of the process.
    OncePerProcess,
    /// Fetched on every tick.
    EveryTick,
}

/// Static description of one polled endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Which resource this is.
    pub kind: EndpointKind,
    /// Path relative to the API root (no leading slash).
    pub path: &'static str,
    /// File name of the cached result inside the cache directory.
    pub result_file: &'static str,
    /// Refresh policy applied by the update cycle.
    pub refresh: RefreshPolicy,
    /// Whether successful fetches are written to the file cache.
    pub persist: bool,
}

impl Endpoint {
    /// The key used for this endpoint in records and logs.
    pub const fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Iterate over all endpoint descriptors in fetch order.
    pub fn all() -> impl Iterator<Item = &'static Endpoint> {
        ENDPOINTS.iter()
    }
}

/// The fixed endpoint table, indexed by `EndpointKind as usize`.
///
/// Alarm state is transient, so alarms are re-fetched after a restart rather
/// than restored from disk.
pub const ENDPOINTS: [Endpoint; 5] = [
    Endpoint {
        kind: EndpointKind::Versioning,
        path: "app/versioning",
        result_file: "versioning.json",
        refresh: RefreshPolicy::OncePerProcess,
        persist: true,
    },
    Endpoint {
        kind: EndpointKind::Systems,
        path: "resources/systems",
        result_file: "systems.json",
        refresh: RefreshPolicy::EveryTick,
        persist: true,
    },
    Endpoint {
        kind: EndpointKind::Ports,
        path: "resources/ports",
        result_file: "ports.json",
        refresh: RefreshPolicy::EveryTick,
        persist: true,
    },
    Endpoint {
        kind: EndpointKind::Links,
        path: "resources/links",
        result_file: "links.json",
        refresh: RefreshPolicy::EveryTick,
        persist: true,
    },
    Endpoint {
        kind: EndpointKind::Alarms,
        path: "app/alarms",
        result_file: "alarms.json",
        refresh: RefreshPolicy::EveryTick,
        persist: false,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_indexed_by_kind() {
        for kind in EndpointKind::ALL {
            assert_eq!(kind.descriptor().kind, kind);
        }
    }

    #[test]
    fn test_only_versioning_is_fetched_once() {
        let once: Vec<_> = Endpoint::all()
            .filter(|e| e.refresh == RefreshPolicy::OncePerProcess)
            .map(|e| e.kind)
            .collect();
        assert_eq!(once, vec![EndpointKind::Versioning]);
    }

    #[test]
    fn test_alarms_are_not_persisted() {
        assert!(!EndpointKind::Alarms.descriptor().persist);
        assert!(Endpoint::all()
            .filter(|e| e.kind != EndpointKind::Alarms)
            .all(|e| e.persist));
    }

    #[test]
    fn test_paths_have_no_leading_slash() {
        for endpoint in Endpoint::all() {
            assert!(!endpoint.path.starts_with('/'), "{}", endpoint.path);
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("ports".parse::<EndpointKind>(), Ok(EndpointKind::Ports));
        assert_eq!("ALARMS".parse::<EndpointKind>(), Ok(EndpointKind::Alarms));
        assert!("fabric".parse::<EndpointKind>().is_err());
    }

    #[test]
    fn test_display_matches_name() {
        assert_eq!(EndpointKind::Links.to_string(), "links");
    }
}
