//! Opaque bearer token generation

use rand::Rng;

const TOKEN_RANDOM_LEN: usize = 32;

/// Source of opaque, unguessable bearer credentials.
pub trait TokenGenerator: Send + Sync {
    fn new_token(&self) -> String;
}

/// Prefix followed by 32 lowercase base36 characters.
#[derive(Debug, Clone)]
pub struct RandomTokenGenerator {
    prefix: String,
}

impl RandomTokenGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for RandomTokenGenerator {
    fn default() -> Self {
        Self::new("kp_")
    }
}

impl TokenGenerator for RandomTokenGenerator {
    fn new_token(&self) -> String {
        let mut rng = rand::rng();
        let random_part: String = (0..TOKEN_RANDOM_LEN)
            .map(|_| {
                let idx: u8 = rng.random_range(0..36);
                if idx < 10 {
                    (b'0' + idx) as char
                } else {
                    (b'a' + idx - 10) as char
                }
            })
            .collect();
        format!("{}{}", self.prefix, random_part)
    }
}
