//! Test helpers shared across the workspace: in-memory repository mocks,
//! a canned topology provider, entity builders and a controllable HTTP
//! responder for observing in-flight profiles.

pub mod builders;
pub mod mocks;
pub mod responder;

pub use builders::ComponentDescriptorBuilder;
pub use mocks::{MemoryBundleRepository, MemoryProfileRepository, MockTopologyProvider};
pub use responder::HoldingResponder;
