//! Test data builders for creating test entities
//!
//! This module provides builder patterns for creating test data with
//! sensible defaults and easy customization.

use profiler_domain::entities::{ComponentDescriptor, ComponentKind};

/// Builder for creating test ComponentDescriptor entities
///
/// Defaults follow the conventional ports of each component kind, so most
/// tests only override the fields they actually care about.
pub struct ComponentDescriptorBuilder {
    descriptor: ComponentDescriptor,
}

impl ComponentDescriptorBuilder {
    pub fn new(kind: ComponentKind) -> Self {
        let (port, status_port) = match kind {
            ComponentKind::Pd => (2379, 2380),
            ComponentKind::Tidb => (4000, 10080),
            ComponentKind::Tikv => (20160, 20180),
            ComponentKind::Tiflash => (3930, 20292),
        };
        Self {
            descriptor: ComponentDescriptor {
                ip: "127.0.0.1".to_string(),
                port,
                status_port,
                kind,
            },
        }
    }

    pub fn with_ip(mut self, ip: &str) -> Self {
        self.descriptor.ip = ip.to_string();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.descriptor.port = port;
        self
    }

    pub fn with_status_port(mut self, status_port: u16) -> Self {
        self.descriptor.status_port = status_port;
        self
    }

    pub fn build(self) -> ComponentDescriptor {
        self.descriptor
    }
}
