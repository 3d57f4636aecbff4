use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use profiler_domain::entities::{ComponentDescriptor, SignedComponentDescriptor};
use profiler_domain::ports::DescriptorSigner;
use profiler_errors::{ProfilerError, ProfilerResult};
use ring::hmac;
use ring::rand::SystemRandom;

/// HMAC-SHA256 描述符签名器
///
/// 密钥在进程启动时随机生成，因此签名只在单次进程生命周期内有效。
/// 重启后 ListTargets 重新下发签名即可，无需持久化密钥。
pub struct HmacDescriptorSigner {
    key: hmac::Key,
}

impl HmacDescriptorSigner {
    pub fn new() -> ProfilerResult<Self> {
        let rng = SystemRandom::new();
        let key = hmac::Key::generate(hmac::HMAC_SHA256, &rng)
            .map_err(|_| ProfilerError::Signature("生成 HMAC 密钥失败".to_string()))?;
        Ok(Self { key })
    }

    /// 描述符字段的规范化编码，全部字段参与签名
    fn canonical_message(descriptor: &ComponentDescriptor) -> String {
        format!(
            "{}|{}|{}|{}",
            descriptor.ip,
            descriptor.port,
            descriptor.status_port,
            descriptor.kind.as_str()
        )
    }
}

impl DescriptorSigner for HmacDescriptorSigner {
    fn sign(&self, descriptor: &ComponentDescriptor) -> ProfilerResult<SignedComponentDescriptor> {
        let message = Self::canonical_message(descriptor);
        let tag = hmac::sign(&self.key, message.as_bytes());
        Ok(SignedComponentDescriptor {
            descriptor: descriptor.clone(),
            signature: BASE64.encode(tag.as_ref()),
        })
    }

    fn verify(&self, signed: &SignedComponentDescriptor) -> ProfilerResult<()> {
        let tag = BASE64
            .decode(&signed.signature)
            .map_err(|_| ProfilerError::Signature("签名不是合法的 base64".to_string()))?;
        let message = Self::canonical_message(&signed.descriptor);
        hmac::verify(&self.key, message.as_bytes(), &tag)
            .map_err(|_| ProfilerError::Signature("签名校验失败".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use profiler_domain::entities::ComponentKind;

    fn descriptor() -> ComponentDescriptor {
        ComponentDescriptor {
            ip: "tidb-1.internal".to_string(),
            port: 4000,
            status_port: 10080,
            kind: ComponentKind::Tidb,
        }
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let signer = HmacDescriptorSigner::new().unwrap();
        let signed = signer.sign(&descriptor()).unwrap();
        assert!(!signed.signature.is_empty());
        assert!(signer.verify(&signed).is_ok());
    }

    #[test]
    fn test_tampered_descriptor_rejected() {
        let signer = HmacDescriptorSigner::new().unwrap();
        let mut signed = signer.sign(&descriptor()).unwrap();
        signed.descriptor.status_port = 9999;
        assert!(signer.verify(&signed).is_err());
    }

    #[test]
    fn test_garbage_signature_rejected() {
        let signer = HmacDescriptorSigner::new().unwrap();
        let signed = SignedComponentDescriptor {
            descriptor: descriptor(),
            signature: "invalid signature".to_string(),
        };
        assert!(signer.verify(&signed).is_err());
    }

    #[test]
    fn test_keys_are_process_local() {
        let signer_a = HmacDescriptorSigner::new().unwrap();
        let signer_b = HmacDescriptorSigner::new().unwrap();
        let signed = signer_a.sign(&descriptor()).unwrap();
        assert!(signer_b.verify(&signed).is_err());
    }
}
