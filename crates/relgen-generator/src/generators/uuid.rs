//! UUID value generator.

use crate::error::GeneratorError;
use crate::generator::ValueGenerator;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::Rng;
use relgen_core::Value;
use uuid::Uuid;

/// Random version 4 UUIDs drawn from a per-column RNG.
#[derive(Debug)]
pub struct UuidGenerator {
    rng: StdRng,
}

impl UuidGenerator {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }
}

/// Generate a random UUID v4 using the provided RNG.
pub fn generate_uuid_v4<R: Rng>(rng: &mut R) -> Uuid {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);

    // Set version (4) and variant (RFC 4122) bits
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

#[async_trait]
impl ValueGenerator for UuidGenerator {
    async fn next_value(&mut self) -> Result<Value, GeneratorError> {
        Ok(Value::Uuid(generate_uuid_v4(&mut self.rng)))
    }
}
