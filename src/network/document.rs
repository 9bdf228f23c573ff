use std::net::IpAddr;
use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};
use super::packet::{Endpoint, Packet, ResourceType};

/// Packet laid out the way the search index expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub datetime: DateTimeFields,
    pub tcp_stream: i64,
    pub source: EndpointFields,
    pub destination: EndpointFields,
    pub resource: ResourceFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateTimeFields {
    pub timestamp: i64,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointFields {
    pub ip: IpAddr,
    pub port: u16,
    pub hostname: String,
    pub domain: Option<String>,
    pub subdomain: Option<String>,
    pub fld: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceFields {
    #[serde(rename = "type")]
    pub resource_type: Option<ResourceType>,
    pub category: Option<String>,
}

impl From<&Endpoint> for EndpointFields {
    fn from(endpoint: &Endpoint) -> Self {
        Self {
            ip: endpoint.ip,
            port: endpoint.port,
            hostname: endpoint.hostname.clone(),
            domain: endpoint.domain.clone(),
            subdomain: endpoint.subdomain.clone(),
            fld: endpoint.fld.clone(),
        }
    }
}

impl From<&Packet> for IndexDocument {
    fn from(packet: &Packet) -> Self {
        let ts = packet.timestamp;

        Self {
            datetime: DateTimeFields {
                timestamp: ts.timestamp(),
                year: ts.year(),
                month: ts.month(),
                day: ts.day(),
                hour: ts.hour(),
                minute: ts.minute(),
                second: ts.second(),
            },
            tcp_stream: packet.tcp_stream,
            source: EndpointFields::from(&packet.source),
            destination: EndpointFields::from(&packet.destination),
            resource: ResourceFields {
                resource_type: packet.metadata.resource_type,
                category: None,
            },
        }
    }
}

pub fn to_documents(packets: &[Packet]) -> Vec<IndexDocument> {
    packets.iter().map(IndexDocument::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use std::net::Ipv4Addr;

    #[test]
    fn test_document_layout() {
        let mut packet = Packet::new(
            DateTime::from_timestamp(1_577_934_245, 0).unwrap(),
            12,
            Endpoint::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 5)), "192.168.1.5", 51000),
            Endpoint::new(IpAddr::V4(Ipv4Addr::new(140, 82, 121, 4)), "api.github.com", 443),
        );
        packet.destination.domain = Some("github".to_string());
        packet.destination.subdomain = Some("api".to_string());
        packet.destination.fld = Some("github.com".to_string());
        packet.metadata.resource_type = Some(ResourceType::Other);

        let value = serde_json::to_value(IndexDocument::from(&packet)).unwrap();

        // 2020-01-02 03:04:05 UTC
        assert_eq!(value["datetime"]["timestamp"], 1_577_934_245i64);
        assert_eq!(value["datetime"]["year"], 2020);
        assert_eq!(value["datetime"]["month"], 1);
        assert_eq!(value["datetime"]["day"], 2);
        assert_eq!(value["datetime"]["hour"], 3);
        assert_eq!(value["datetime"]["minute"], 4);
        assert_eq!(value["datetime"]["second"], 5);
        assert_eq!(value["tcp_stream"], 12);
        assert_eq!(value["source"]["ip"], "192.168.1.5");
        assert!(value["source"]["fld"].is_null());
        assert_eq!(value["destination"]["hostname"], "api.github.com");
        assert_eq!(value["destination"]["fld"], "github.com");
        assert_eq!(value["resource"]["type"], "other");
        assert!(value["resource"]["category"].is_null());
    }

    #[test]
    fn test_unclassified_resource_is_null() {
        let packet = Packet::new(
            DateTime::from_timestamp(0, 0).unwrap(),
            -1,
            Endpoint::new(IpAddr::V4(Ipv4Addr::LOCALHOST), "127.0.0.1", 13370),
            Endpoint::new(IpAddr::V4(Ipv4Addr::new(87, 240, 132, 72)), "vk.com", 443),
        );

        let documents = to_documents(&[packet]);
        assert_eq!(documents.len(), 1);
        assert!(documents[0].resource.resource_type.is_none());
    }
}
