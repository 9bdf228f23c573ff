use log::{debug, info, warn};
use regex::Regex;
use crate::config::ClassifierConfig;
use crate::Result;
use super::blocklist::Blocklist;
use super::packet::{Endpoint, Packet, ResourceType};
use super::progress::{NoProgress, ProgressObserver};
use super::suffix::{self, Resolution};

const IPV4_PATTERN: &str = r"^(\d{1,3}\.){3}\d{1,3}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSide {
    Source,
    Destination,
}

impl std::fmt::Display for EndpointSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointSide::Source => write!(f, "src"),
            EndpointSide::Destination => write!(f, "dst"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationSummary {
    pub packets: usize,
    pub resolved: usize,
    pub skipped: usize,
    pub unresolved: usize,
    pub assets: usize,
    pub ads: usize,
    pub other: usize,
}

impl ClassificationSummary {
    fn count(&mut self, resource_type: ResourceType) {
        match resource_type {
            ResourceType::Asset => self.assets += 1,
            ResourceType::Ads => self.ads += 1,
            ResourceType::Other => self.other += 1,
        }
    }
}

enum EndpointOutcome {
    Resolved,
    Skipped,
    Unresolved,
}

/// Annotates packets with domain decomposition and a resource category.
///
/// Both blocklists are loaded once on construction and kept for the
/// classifier's lifetime.
pub struct PacketClassifier {
    asset_hosts: Blocklist,
    ads_hosts: Blocklist,
    ipv4_literal: Regex,
}

impl PacketClassifier {
    pub fn new(asset_hosts: Blocklist, ads_hosts: Blocklist) -> Result<Self> {
        Ok(Self {
            asset_hosts,
            ads_hosts,
            ipv4_literal: Regex::new(IPV4_PATTERN)?,
        })
    }

    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        debug!("Loading hosts lists");
        let asset_hosts = Blocklist::from_file("asset", &config.asset_hosts_path)?;
        let ads_hosts = Blocklist::from_file("ads", &config.ads_hosts_path)?;

        info!(
            "Classifier ready: {} asset hosts, {} ads hosts",
            asset_hosts.len(),
            ads_hosts.len()
        );
        Self::new(asset_hosts, ads_hosts)
    }

    pub fn classify(&self, packets: &mut [Packet]) -> ClassificationSummary {
        self.classify_with_progress(packets, &mut NoProgress)
    }

    pub fn classify_with_progress(
        &self,
        packets: &mut [Packet],
        progress: &mut dyn ProgressObserver,
    ) -> ClassificationSummary {
        let total = packets.len();
        let mut summary = ClassificationSummary::default();

        progress.on_start(total);
        for (index, packet) in packets.iter_mut().enumerate() {
            for outcome in [
                self.fill_domain_parts(&mut packet.source, EndpointSide::Source),
                self.fill_domain_parts(&mut packet.destination, EndpointSide::Destination),
            ] {
                match outcome {
                    EndpointOutcome::Resolved => summary.resolved += 1,
                    EndpointOutcome::Skipped => summary.skipped += 1,
                    EndpointOutcome::Unresolved => summary.unresolved += 1,
                }
            }

            let resource_type = self.resource_type(&packet.destination.hostname);
            packet.metadata.resource_type = Some(resource_type);
            summary.count(resource_type);
            summary.packets += 1;

            progress.on_item(index + 1, total);
        }
        progress.on_finish(total);

        debug!("Classification completed: {:?}", summary);
        summary
    }

    pub fn is_ipv4_literal(&self, hostname: &str) -> bool {
        self.ipv4_literal.is_match(hostname)
    }

    /// Asset entries take priority over ads entries.
    pub fn resource_type(&self, hostname: &str) -> ResourceType {
        if self.asset_hosts.matches(hostname) {
            ResourceType::Asset
        } else if self.ads_hosts.matches(hostname) {
            ResourceType::Ads
        } else {
            ResourceType::Other
        }
    }

    fn fill_domain_parts(&self, endpoint: &mut Endpoint, side: EndpointSide) -> EndpointOutcome {
        if self.is_ipv4_literal(&endpoint.hostname) {
            debug!("TLD lookup skipped: [{}] {}", side, endpoint.hostname);
            return EndpointOutcome::Skipped;
        }

        match suffix::resolve(&endpoint.hostname) {
            Resolution::Resolved(parts) => {
                endpoint.domain = Some(parts.domain);
                endpoint.subdomain = Some(parts.subdomain);
                endpoint.fld = Some(parts.fld);
                EndpointOutcome::Resolved
            }
            Resolution::Unresolved(reason) => {
                warn!("TLD lookup failed: [{}] {} ({})", side, endpoint.hostname, reason);
                endpoint.domain = None;
                endpoint.subdomain = None;
                endpoint.fld = None;
                EndpointOutcome::Unresolved
            }
        }
    }
}
