//! Registration and login

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::OnceCell;

use crate::crypto::{HashError, PasswordHasher};
use crate::error::{DomainError, DomainResult};
use crate::models::{
    Email, Identity, LoginInput, NewUser, Problems, RegisterInput, UserProfile, Validate,
};
use crate::store::{BindUserStore, UserStore};
use crate::transaction::{TransactionManager, TxBackend};

/// Rules a new password must satisfy before any work is done.
#[derive(Debug, Clone, Copy)]
pub struct PasswordPolicy {
    pub min_chars: usize,
    /// bcrypt ignores everything past 72 bytes.
    pub max_bytes: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_chars: 8,
            max_bytes: 72,
        }
    }
}

impl PasswordPolicy {
    pub fn check(&self, password: &str) -> Problems {
        let mut problems = Problems::new();
        if password.is_empty() {
            problems.insert("password", "must not be empty");
        } else if password.chars().count() < self.min_chars {
            problems.insert(
                "password",
                format!("must be at least {} characters", self.min_chars),
            );
        } else if password.len() > self.max_bytes {
            problems.insert("password", format!("must be at most {} bytes", self.max_bytes));
        }
        problems
    }
}

/// Object-safe auth surface for the HTTP layer.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn register(&self, input: RegisterInput) -> DomainResult<UserProfile>;

    async fn login(&self, input: LoginInput) -> DomainResult<Identity>;
}

/// Auth service over a transaction backend `B`, a user store `S` and a
/// password hasher `H`.
pub struct AuthService<B, S, H> {
    transactions: TransactionManager<B>,
    users: S,
    hasher: Arc<H>,
    policy: PasswordPolicy,
    /// Digest verified against when no account matches, hashed once at the
    /// hasher's cost.
    decoy: OnceCell<String>,
}

const DECOY_SECRET: &str = "decoy-secret-for-unknown-accounts";

impl<B, S, H> AuthService<B, S, H>
where
    B: TxBackend,
    S: BindUserStore<B::Tx> + Clone + 'static,
    H: PasswordHasher + 'static,
{
    pub fn new(transactions: TransactionManager<B>, users: S, hasher: Arc<H>) -> Self {
        Self {
            transactions,
            users,
            hasher,
            policy: PasswordPolicy::default(),
            decoy: OnceCell::new(),
        }
    }

    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Validate, then hash and insert inside one transaction.
    ///
    /// Validation failures never begin a transaction. A duplicate email is
    /// returned as [`DomainError::Conflict`] and the transaction rolls back.
    pub async fn register(&self, input: RegisterInput) -> DomainResult<UserProfile> {
        let mut problems = input.validate();
        problems.merge(self.policy.check(&input.password));
        problems.into_result().map_err(DomainError::ValidationFailed)?;

        let email = Email::parse(&input.email).map_err(|reason| {
            let mut problems = Problems::new();
            problems.insert("email", reason);
            DomainError::ValidationFailed(problems)
        })?;
        let name = input.name.trim().to_owned();
        let password = input.password;

        let users = self.users.clone();
        let hasher = Arc::clone(&self.hasher);

        let profile = self
            .transactions
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    let password_hash = hash_blocking(hasher, password).await?;

                    let users = users.bind(tx);
                    let id = users
                        .create(NewUser {
                            name,
                            email,
                            password_hash,
                        })
                        .await?;
                    let user = users.find_by_id(id).await?;

                    Ok::<_, DomainError>(UserProfile::from(user))
                })
            })
            .await?;

        tracing::info!(user_id = %profile.id, "user registered");
        Ok(profile)
    }

    /// Check credentials without a transaction.
    ///
    /// Unknown email and wrong password are both
    /// [`DomainError::Unauthorized`], so callers cannot tell which accounts
    /// exist.
    pub async fn login(&self, input: LoginInput) -> DomainResult<Identity> {
        input
            .validate()
            .into_result()
            .map_err(DomainError::ValidationFailed)?;

        let Ok(email) = Email::parse(&input.email) else {
            self.verify_decoy(input.password).await?;
            return Err(DomainError::Unauthorized);
        };

        let user = match self.users.find_by_email(&email).await {
            Ok(user) => user,
            Err(DomainError::NotFound { .. }) => {
                tracing::debug!("login for unknown email");
                self.verify_decoy(input.password).await?;
                return Err(DomainError::Unauthorized);
            }
            Err(err) => return Err(err),
        };

        let hasher = Arc::clone(&self.hasher);
        let digest = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || hasher.verify(&digest, &input.password))
            .await
            .map_err(DomainError::internal)?;

        match verified {
            Ok(()) => {
                tracing::info!(user_id = %user.id, "user logged in");
                Ok(Identity {
                    user: user.into(),
                    authenticated_at: Utc::now(),
                })
            }
            Err(HashError::Mismatch) => {
                tracing::debug!(user_id = %user.id, "login with wrong password");
                Err(DomainError::Unauthorized)
            }
            Err(err) => Err(DomainError::internal(err)),
        }
    }

    /// Spend one verification on a failed lookup so unknown accounts cost
    /// as much as a wrong password.
    async fn verify_decoy(&self, password: String) -> DomainResult<()> {
        let digest = self
            .decoy
            .get_or_try_init(|| hash_blocking(Arc::clone(&self.hasher), DECOY_SECRET.to_owned()))
            .await?
            .clone();

        let hasher = Arc::clone(&self.hasher);
        let outcome = tokio::task::spawn_blocking(move || hasher.verify(&digest, &password))
            .await
            .map_err(DomainError::internal)?;

        match outcome {
            Ok(()) | Err(HashError::Mismatch) => Ok(()),
            Err(err) => Err(DomainError::internal(err)),
        }
    }
}

#[async_trait]
impl<B, S, H> Authenticator for AuthService<B, S, H>
where
    B: TxBackend,
    S: BindUserStore<B::Tx> + Clone + 'static,
    H: PasswordHasher + 'static,
{
    async fn register(&self, input: RegisterInput) -> DomainResult<UserProfile> {
        AuthService::register(self, input).await
    }

    async fn login(&self, input: LoginInput) -> DomainResult<Identity> {
        AuthService::login(self, input).await
    }
}

async fn hash_blocking<H: PasswordHasher + 'static>(
    hasher: Arc<H>,
    password: String,
) -> DomainResult<String> {
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(DomainError::internal)?
        .map_err(DomainError::internal)
}
