pub mod database;
pub mod signer;
pub mod topology;

pub use database::*;
pub use signer::HmacDescriptorSigner;
pub use topology::StaticTopologyProvider;
