pub mod packet;
pub mod generator;
pub mod suffix;
pub mod blocklist;
pub mod classifier;
pub mod document;
pub mod progress;

pub use packet::{Endpoint, Packet, PacketMetadata, ResourceType, CaptureRecord};
pub use generator::{SampleGenerator, Sample, CancelFlag, generate_sample};
pub use suffix::{Resolution, DomainParts};
pub use blocklist::Blocklist;
pub use classifier::{PacketClassifier, ClassificationSummary};
pub use document::IndexDocument;
pub use progress::{ProgressObserver, LogProgress, NoProgress};
