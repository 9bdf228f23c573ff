//! Synthetic sample generation.
//!
//! A sample is built from random batches: each batch covers a random
//! sub-interval of the requested window and contributes a random number of
//! distinct-second packets. Batches are accumulated until the requested
//! density is reached.

use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use chrono::DateTime;
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use crate::config::{CatalogEntry, GeneratorConfig};
use crate::{Result, MetanetError};
use super::packet::{Endpoint, Packet};

pub const SYNTHETIC_SOURCE_PORT: u16 = 13370;
pub const SYNTHETIC_DESTINATION_PORT: u16 = 443;
pub const SYNTHETIC_TCP_STREAM: i64 = -1;

/// Set from outside to stop a running generation at the next batch.
pub type CancelFlag = Arc<AtomicBool>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub from_timestamp: i64,
    pub to_timestamp: i64,
    pub density: f64,
    pub packets: Vec<Packet>,
}

impl Sample {
    pub fn window(&self) -> i64 {
        self.to_timestamp - self.from_timestamp
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Batch {
    pub from_timestamp: i64,
    pub interval: i64,
    pub density: f64,
    pub packets: Vec<Packet>,
}

pub struct SampleGenerator {
    config: GeneratorConfig,
    cancel: Option<CancelFlag>,
}

impl SampleGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            cancel: None,
        })
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn generate_sample(
        &self,
        from_timestamp: i64,
        to_timestamp: i64,
        desired_density: f64,
        seed: Option<u64>,
    ) -> Result<Sample> {
        self.validate_request(from_timestamp, to_timestamp, desired_density)?;

        let mut rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let window = to_timestamp - from_timestamp;
        let current_density = |count: usize| count as f64 / window as f64;

        let mut packets = Vec::new();
        let mut batches = 0usize;

        while current_density(packets.len()) < desired_density {
            if self.is_cancelled() {
                return Err(MetanetError::Cancelled { batches });
            }
            if batches >= self.config.max_batches {
                return Err(MetanetError::NonConvergingGeneration {
                    batches,
                    achieved: current_density(packets.len()),
                    desired: desired_density,
                });
            }

            let batch = self.generate_batch(&mut rng, from_timestamp, to_timestamp)?;
            debug!(
                "Batch {}: from={} interval={}s density={:.5} packets={}",
                batches,
                batch.from_timestamp,
                batch.interval,
                batch.density,
                batch.packets.len()
            );

            packets.extend(batch.packets);
            batches += 1;
        }

        // Batches overlap in time
        packets.sort_by_key(|packet| packet.timestamp);

        let density = current_density(packets.len());
        info!(
            "Generated {} packets in {} batches over {}s (density {:.5})",
            packets.len(),
            batches,
            window,
            density
        );

        Ok(Sample {
            from_timestamp,
            to_timestamp,
            density,
            packets,
        })
    }

    fn validate_request(&self, from_timestamp: i64, to_timestamp: i64, desired_density: f64) -> Result<()> {
        if to_timestamp <= from_timestamp {
            return Err(MetanetError::InvalidRange {
                from: from_timestamp,
                to: to_timestamp,
            });
        }
        if DateTime::from_timestamp(from_timestamp, 0).is_none() || DateTime::from_timestamp(to_timestamp, 0).is_none() {
            return Err(MetanetError::InvalidRange {
                from: from_timestamp,
                to: to_timestamp,
            });
        }
        if !desired_density.is_finite() || desired_density < 0.0 {
            return Err(MetanetError::InvalidDensity(format!(
                "desired density must be a non-negative number, got {}",
                desired_density
            )));
        }

        // A batch yields round(coefficient * interval) packets with
        // coefficient < density_upper_bound, so it can only ever produce
        // packets if the bound times the longest usable interval exceeds 0.5.
        let window = to_timestamp - from_timestamp;
        let longest = i64::from(self.config.largest_interval()).min(window);
        if desired_density > 0.0 && self.config.density_upper_bound * longest as f64 <= 0.5 {
            return Err(MetanetError::InvalidDensity(format!(
                "density {} is unreachable: batches of at most {}s with coefficient below {} never yield a packet",
                desired_density, longest, self.config.density_upper_bound
            )));
        }

        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    pub(crate) fn generate_batch<R: Rng>(&self, rng: &mut R, sample_from: i64, sample_to: i64) -> Result<Batch> {
        let window = sample_to - sample_from;

        let interval = if self.config.max_interval > self.config.min_interval {
            rng.gen_range(self.config.min_interval..self.config.max_interval)
        } else {
            self.config.min_interval
        };
        let interval = i64::from(interval).min(window);

        let density = rng.gen::<f64>() * self.config.density_upper_bound;

        let from_timestamp = if window > interval {
            rng.gen_range(sample_from..sample_to - interval)
        } else {
            sample_from
        };

        // Timestamps within a batch are distinct seconds
        let packet_count = ((density * interval as f64).round() as usize).min(interval as usize);

        let mut timestamps = BTreeSet::new();
        while timestamps.len() < packet_count {
            timestamps.insert(rng.gen_range(from_timestamp..from_timestamp + interval));
        }

        let packets = timestamps
            .into_iter()
            .map(|timestamp| self.generate_packet(rng, timestamp))
            .collect::<Result<Vec<_>>>()?;

        Ok(Batch {
            from_timestamp,
            interval,
            density,
            packets,
        })
    }

    fn generate_packet<R: Rng>(&self, rng: &mut R, timestamp: i64) -> Result<Packet> {
        let timestamp = DateTime::from_timestamp(timestamp, 0)
            .ok_or_else(|| MetanetError::Parse(format!("Timestamp out of range: {}", timestamp)))?;

        let entry: &CatalogEntry = &self.config.catalog[rng.gen_range(0..self.config.catalog.len())];

        Ok(Packet::new(
            timestamp,
            SYNTHETIC_TCP_STREAM,
            synthetic_source(),
            Endpoint::new(entry.ip, &entry.hostname, SYNTHETIC_DESTINATION_PORT),
        ))
    }
}

fn synthetic_source() -> Endpoint {
    let loopback = IpAddr::V4(Ipv4Addr::LOCALHOST);
    Endpoint::new(loopback, &loopback.to_string(), SYNTHETIC_SOURCE_PORT)
}

/// Generates a sample with the default generator configuration.
pub fn generate_sample(
    from_timestamp: i64,
    to_timestamp: i64,
    desired_density: f64,
    seed: Option<u64>,
) -> Result<Sample> {
    SampleGenerator::new(GeneratorConfig::default())?
        .generate_sample(from_timestamp, to_timestamp, desired_density, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_reference_scenario() {
        let sample = generate_sample(0, 1000, 0.01, Some(42)).unwrap();

        assert!(sample.packets.len() >= 10);
        assert!(sample.density >= 0.01);
        assert_eq!(sample.from_timestamp, 0);
        assert_eq!(sample.to_timestamp, 1000);
        assert_eq!(sample.window(), 1000);
        for packet in &sample.packets {
            let ts = packet.epoch_seconds();
            assert!((0..1000).contains(&ts), "timestamp {} outside window", ts);
        }
    }

    #[test]
    fn test_packets_sorted_and_in_window() {
        let from = 1_600_000_000;
        let to = from + 86_400;
        let sample = generate_sample(from, to, 0.02, Some(7)).unwrap();

        assert!(sample.density >= 0.02);
        assert!(sample.packets.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));
        assert!(sample
            .packets
            .iter()
            .all(|packet| packet.epoch_seconds() >= from && packet.epoch_seconds() < to));
    }

    #[test]
    fn test_deterministic_with_seed() {
        let first = generate_sample(0, 5000, 0.03, Some(1234)).unwrap();
        let second = generate_sample(0, 5000, 0.03, Some(1234)).unwrap();

        assert_eq!(first.packets, second.packets);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_synthetic_packet_shape() {
        let sample = generate_sample(0, 2000, 0.01, Some(3)).unwrap();
        let hostnames: HashSet<String> = GeneratorConfig::default()
            .catalog
            .into_iter()
            .map(|entry| entry.hostname)
            .collect();

        for packet in &sample.packets {
            assert_eq!(packet.tcp_stream, -1);
            assert_eq!(packet.source.ip.to_string(), "127.0.0.1");
            assert_eq!(packet.source.port, 13370);
            assert_eq!(packet.destination.port, 443);
            assert!(hostnames.contains(&packet.destination.hostname));
            assert!(packet.resource_type().is_none());
            assert!(packet.destination.fld.is_none());
        }
    }

    #[test]
    fn test_batch_timestamps_distinct() {
        let config = GeneratorConfig {
            density_upper_bound: 0.9,
            ..GeneratorConfig::default()
        };
        let generator = SampleGenerator::new(config).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(99);

        for _ in 0..50 {
            let batch = generator.generate_batch(&mut rng, 0, 10_000).unwrap();
            let seconds: Vec<i64> = batch.packets.iter().map(|p| p.epoch_seconds()).collect();
            let unique: HashSet<i64> = seconds.iter().copied().collect();

            assert_eq!(unique.len(), seconds.len());
            assert!(seconds.windows(2).all(|pair| pair[0] < pair[1]));
            assert!(batch.interval >= 60 && batch.interval < 600);
            assert!(batch.density < 0.9);
            assert!(seconds
                .iter()
                .all(|ts| *ts >= batch.from_timestamp && *ts < batch.from_timestamp + batch.interval));
        }
    }

    #[test]
    fn test_interval_capped_to_short_window() {
        let generator = SampleGenerator::new(GeneratorConfig::default()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let batch = generator.generate_batch(&mut rng, 100, 130).unwrap();
        assert_eq!(batch.interval, 30);
        assert_eq!(batch.from_timestamp, 100);

        let sample = generator.generate_sample(100, 130, 0.0, Some(5)).unwrap();
        assert!(sample.packets.is_empty());
    }

    #[test]
    fn test_short_window_still_converges() {
        let config = GeneratorConfig {
            density_upper_bound: 0.5,
            ..GeneratorConfig::default()
        };
        let generator = SampleGenerator::new(config).unwrap();
        let sample = generator.generate_sample(0, 20, 0.5, Some(11)).unwrap();

        assert!(sample.packets.len() >= 10);
        assert!(sample.packets.iter().all(|p| (0..20).contains(&p.epoch_seconds())));
    }

    #[test]
    fn test_zero_density_yields_empty_sample() {
        let sample = generate_sample(0, 1000, 0.0, Some(1)).unwrap();
        assert!(sample.packets.is_empty());
        assert_eq!(sample.density, 0.0);
    }

    #[test]
    fn test_invalid_range() {
        assert!(matches!(
            generate_sample(1000, 1000, 0.01, None),
            Err(MetanetError::InvalidRange { from: 1000, to: 1000 })
        ));
        assert!(matches!(
            generate_sample(1000, 10, 0.01, None),
            Err(MetanetError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_invalid_density() {
        assert!(matches!(
            generate_sample(0, 1000, -0.5, None),
            Err(MetanetError::InvalidDensity(_))
        ));
        assert!(matches!(
            generate_sample(0, 1000, f64::NAN, None),
            Err(MetanetError::InvalidDensity(_))
        ));
        // 10s window: round(coefficient * 10) with coefficient < 0.04 is always 0
        assert!(matches!(
            generate_sample(0, 10, 0.1, None),
            Err(MetanetError::InvalidDensity(_))
        ));
    }

    #[test]
    fn test_non_converging_generation() {
        let config = GeneratorConfig {
            max_batches: 3,
            ..GeneratorConfig::default()
        };
        let generator = SampleGenerator::new(config).unwrap();

        // Each batch yields at most 24 packets, three batches cannot reach 1 packet/s
        let result = generator.generate_sample(0, 1000, 1.0, Some(8));
        assert!(matches!(
            result,
            Err(MetanetError::NonConvergingGeneration { batches: 3, .. })
        ));
    }

    #[test]
    fn test_cancelled_generation() {
        let flag: CancelFlag = Arc::new(AtomicBool::new(true));
        let generator = SampleGenerator::new(GeneratorConfig::default())
            .unwrap()
            .with_cancel_flag(flag);

        assert!(matches!(
            generator.generate_sample(0, 1000, 0.01, Some(1)),
            Err(MetanetError::Cancelled { batches: 0 })
        ));
    }
}
