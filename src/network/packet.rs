use std::net::IpAddr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use crate::{Result, MetanetError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Asset,
    Ads,
    Other,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Asset => "asset",
            ResourceType::Ads => "ads",
            ResourceType::Other => "other",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of a connection.
///
/// `domain`, `subdomain` and `fld` stay `None` until the endpoint has been
/// through the classifier, and forever for IPv4-literal hostnames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub ip: IpAddr,
    #[serde(deserialize_with = "lowercase_hostname")]
    pub hostname: String,
    pub port: u16,
    pub domain: Option<String>,
    pub subdomain: Option<String>,
    pub fld: Option<String>,
}

impl Endpoint {
    pub fn new(ip: IpAddr, hostname: &str, port: u16) -> Self {
        Self {
            ip,
            hostname: hostname.to_lowercase(),
            port,
            domain: None,
            subdomain: None,
            fld: None,
        }
    }
}

fn lowercase_hostname<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|hostname| hostname.to_lowercase())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketMetadata {
    pub resource_type: Option<ResourceType>,
}

/// A connection-start event, observed or synthesized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    pub tcp_stream: i64,
    pub source: Endpoint,
    pub destination: Endpoint,
    pub metadata: PacketMetadata,
}

impl Packet {
    pub fn new(timestamp: DateTime<Utc>, tcp_stream: i64, source: Endpoint, destination: Endpoint) -> Self {
        Self {
            timestamp,
            tcp_stream,
            source,
            destination,
            metadata: PacketMetadata::default(),
        }
    }

    pub fn epoch_seconds(&self) -> i64 {
        self.timestamp.timestamp()
    }

    pub fn resource_type(&self) -> Option<ResourceType> {
        self.metadata.resource_type
    }
}

/// Flat record handed over by the capture front-end, one per TCP SYN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub time_epoch: f64,
    pub tcp_stream: i64,
    pub src_ip: IpAddr,
    pub src_host: String,
    pub src_port: u16,
    pub dst_ip: IpAddr,
    pub dst_host: String,
    pub dst_port: u16,
}

impl CaptureRecord {
    pub fn into_packet(self) -> Result<Packet> {
        if !self.time_epoch.is_finite() {
            return Err(MetanetError::Parse(format!("Invalid capture timestamp: {}", self.time_epoch)));
        }

        // Capture timestamps carry sub-second precision; packets do not
        let seconds = self.time_epoch.floor() as i64;
        let timestamp = DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| MetanetError::Parse(format!("Capture timestamp out of range: {}", self.time_epoch)))?;

        Ok(Packet::new(
            timestamp,
            self.tcp_stream,
            Endpoint::new(self.src_ip, &self.src_host, self.src_port),
            Endpoint::new(self.dst_ip, &self.dst_host, self.dst_port),
        ))
    }
}

pub fn packets_from_records(records: Vec<CaptureRecord>) -> Result<Vec<Packet>> {
    let packets = records
        .into_iter()
        .map(CaptureRecord::into_packet)
        .collect::<Result<Vec<_>>>()?;

    log::debug!("Converted {} capture records", packets.len());
    Ok(packets)
}

/// Packets grouped under one destination hostname.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationGroup {
    pub hostname: String,
    pub timestamps: Vec<i64>,
}

impl DestinationGroup {
    pub fn first_seen(&self) -> Option<i64> {
        self.timestamps.iter().min().copied()
    }

    pub fn last_seen(&self) -> Option<i64> {
        self.timestamps.iter().max().copied()
    }
}

/// Groups packets by destination hostname, keeping first-seen order.
pub fn group_by_destination(packets: &[Packet]) -> Vec<DestinationGroup> {
    let mut groups: Vec<DestinationGroup> = Vec::new();

    for packet in packets {
        let hostname = &packet.destination.hostname;
        match groups.iter_mut().find(|group| &group.hostname == hostname) {
            Some(group) => group.timestamps.push(packet.epoch_seconds()),
            None => groups.push(DestinationGroup {
                hostname: hostname.clone(),
                timestamps: vec![packet.epoch_seconds()],
            }),
        }
    }

    groups
}
