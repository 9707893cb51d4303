//! Pull-based editor features backed by the latest pipeline snapshot.
//!
//! Providers only hold a [`SnapshotReader`](crate::runtime::SnapshotReader),
//! so they can be handed to request handlers freely.

pub mod hover;
pub mod lens;

pub use hover::{HoverContent, HoverProvider};
pub use lens::{LensMarker, LensProvider, ReportUpdates};
