//! Domain types for the network-maintenance sanity-check and
//! case-management core. No I/O lives here — see `switchwatch-db` for
//! persistence and `switchwatch-core` for the engine that operates on
//! these types.

pub mod case;
pub mod client;
pub mod collection;
pub mod error;
pub mod expectation;
pub mod hash;
pub mod indicator;
pub mod maintenance;
pub mod record;
pub mod system_log;
pub mod threshold;

pub use case::{Case, CaseNote, CaseStatus, User, UserRole};
pub use client::{ClientRecord, LatestClientRecord, TRACKED_ATTRIBUTES};
pub use collection::{
    BatchMode, CollectionBatch, CollectionError, CollectionType, LatestCollectionBatch, Source,
    VendorOs,
};
pub use error::ModelError;
pub use expectation::{ArpSource, PortChannelExpectation, UplinkExpectation, VersionExpectation};
pub use indicator::{EvaluationResult, IndicatorFailure, IndicatorPass};
pub use maintenance::{DeviceListEntry, DeviceSide, MacListEntry, Maintenance};
pub use record::ParsedItems;
pub use system_log::{LogLevel, SystemLog};
pub use threshold::{ThresholdKey, ThresholdOverride, ThresholdValue};
