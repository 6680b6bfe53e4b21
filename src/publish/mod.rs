//! Telemetry publishing: frame layout, sinks and the fixed-rate publisher

pub mod frame;
pub mod publisher;
pub mod sink;

pub use frame::{PublishFrame, DEFAULT_STANDING_HEIGHT, FRAME_LEN};
pub use publisher::{
    PublishStats, PublishSwitch, PublisherConfig, PublisherHandle, StatePublisher, TickOutcome,
    DEFAULT_RATE_HZ, DEFAULT_TELEMETRY_KEY,
};
pub use sink::{
    FileSink, MemorySink, RedisSink, SinkError, SinkResult, TelemetrySink, DEFAULT_TELEMETRY_URL,
};
