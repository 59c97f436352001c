//! Per-endpoint streaming switches.

use crate::EndpointKind;

/// Which endpoint sections are included in streamed records.
///
/// Versioning is never streamed; it is fetched and cached only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StreamToggles {
    pub systems: bool,
    pub ports: bool,
    pub links: bool,
    pub alarms: bool,
}

impl StreamToggles {
    /// Every section enabled.
    pub const fn all() -> Self {
        Self {
            systems: true,
            ports: true,
            links: true,
            alarms: true,
        }
    }

    /// Every section disabled.
    pub const fn none() -> Self {
        Self {
            systems: false,
            ports: false,
            links: false,
            alarms: false,
        }
    }

    /// Whether the given endpoint is streamed.
    pub fn is_enabled(&self, kind: EndpointKind) -> bool {
        match kind {
            EndpointKind::Versioning => false,
            EndpointKind::Systems => self.systems,
            EndpointKind::Ports => self.ports,
            EndpointKind::Links => self.links,
            EndpointKind::Alarms => self.alarms,
        }
    }

    /// Enabled endpoints in fetch order.
    pub fn enabled(&self) -> impl Iterator<Item = EndpointKind> + '_ {
        EndpointKind::ALL
            .into_iter()
            .filter(move |kind| self.is_enabled(*kind))
    }
}

impl Default for StreamToggles {
    fn default() -> Self {
        Self::all()
    }
}
