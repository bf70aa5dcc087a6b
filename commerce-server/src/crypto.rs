//! Password hashing capability

use thiserror::Error;

/// Lowest cost bcrypt accepts
pub const MIN_COST: u32 = 4;

/// Highest cost bcrypt accepts
pub const MAX_COST: u32 = 31;

#[derive(Error, Debug)]
pub enum HashError {
    #[error("password does not match")]
    Mismatch,

    #[error("bcrypt cost {0} outside 4..=31")]
    InvalidCost(u32),

    #[error("bcrypt failure: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

/// One-way hashing of secrets.
///
/// Both operations are CPU-bound; async callers should run them on the
/// blocking pool.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, secret: &str) -> Result<String, HashError>;

    /// `Err(HashError::Mismatch)` when `secret` does not produce `digest`.
    fn verify(&self, digest: &str, secret: &str) -> Result<(), HashError>;
}

/// bcrypt with a fixed cost factor. Each hash carries its own salt.
#[derive(Debug, Clone, Copy)]
pub struct Bcrypt {
    cost: u32,
}

impl Bcrypt {
    pub fn new(cost: u32) -> Result<Self, HashError> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(HashError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for Bcrypt {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl PasswordHasher for Bcrypt {
    fn hash(&self, secret: &str) -> Result<String, HashError> {
        Ok(bcrypt::hash(secret, self.cost)?)
    }

    fn verify(&self, digest: &str, secret: &str) -> Result<(), HashError> {
        if bcrypt::verify(secret, digest)? {
            Ok(())
        } else {
            Err(HashError::Mismatch)
        }
    }
}
