//! Timing engine for time-aware-shaper networks
//!
//! Two independent entry points share one domain model (a graph of nodes and
//! links, flows with periodic release, per-port-per-queue serialization):
//! a deterministic hop-by-hop delay simulator that replays a fixed gate
//! schedule, and a segment-based search environment driven by an external
//! decision policy. The search output encodes back into the schedule
//! representation the simulator consumes.

pub mod encoder;
pub mod env;
pub mod gate;
pub mod metrics;
pub mod network;
pub mod policy;
pub mod simulator;
pub mod units;
