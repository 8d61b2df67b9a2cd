//! Registered accounts: registration, sign-in and the password-reset stub.
//!
//! Emails are folded to lower case before they are stored or compared, so
//! `Ada@School.edu` and `ada@school.edu` name the same account. Passwords are
//! kept only as Argon2id PHC strings.

use crate::error::{is_unique_violation, StoreError, StoreResult};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ADMIN" => Some(Self::Admin),
            "TEACHER" => Some(Self::Teacher),
            "STUDENT" => Some(Self::Student),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Teacher => "TEACHER",
            Self::Student => "STUDENT",
        }
    }
}

/// An account as seen by callers. Password material never leaves this module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetNotice {
    pub email: String,
    pub message: String,
    /// Always false: no mail transport exists.
    pub delivered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Argon2id with the configured cost. Verification reads the cost back out of
/// each stored hash, so raising the cost later does not lock out old accounts.
#[derive(Clone)]
pub struct CredentialHasher {
    argon: Argon2<'static>,
}

impl CredentialHasher {
    pub fn new(cost: HashCost) -> anyhow::Result<Self> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 parameters: {e}"))?;
        Ok(Self {
            argon: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash(&self, password: &str) -> StoreResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| StoreError::Hashing(e.to_string()))
    }

    pub fn verify(&self, password: &str, stored: &str) -> StoreResult<bool> {
        let parsed = PasswordHash::new(stored)
            .map_err(|e| StoreError::corrupt(format!("unreadable password hash: {e}")))?;
        match self.argon.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(StoreError::corrupt(format!("unusable password hash: {e}"))),
        }
    }
}

pub fn fold_email(email: &str) -> String {
    email.to_lowercase()
}

pub fn register(
    conn: &Connection,
    hasher: &CredentialHasher,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> StoreResult<Identity> {
    let email = fold_email(email);
    // Hash outside the write transaction; it is the slow part.
    let password_hash = hasher.hash(password)?;

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let taken: Option<i64> = tx
        .query_row("SELECT 1 FROM accounts WHERE email = ?", [&email], |r| {
            r.get(0)
        })
        .optional()?;
    if taken.is_some() {
        return Err(StoreError::DuplicateAccount(email));
    }

    let identity = Identity {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email,
        role,
        created_at: Utc::now(),
    };
    let inserted = tx.execute(
        "INSERT INTO accounts(id, name, email, role, password_hash, created_at)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            &identity.id,
            &identity.name,
            &identity.email,
            identity.role.as_str(),
            &password_hash,
            identity
                .created_at
                .to_rfc3339_opts(SecondsFormat::Nanos, true),
        ),
    );
    match inserted {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(StoreError::DuplicateAccount(identity.email));
        }
        Err(e) => return Err(e.into()),
    }
    tx.commit()?;

    tracing::info!(account_id = %identity.id, role = identity.role.as_str(), "account registered");
    Ok(identity)
}

pub fn authenticate(
    conn: &Connection,
    hasher: &CredentialHasher,
    email: &str,
    password: &str,
) -> StoreResult<Identity> {
    let Some((identity, password_hash)) = find_by_email(conn, &fold_email(email))? else {
        tracing::debug!("sign-in rejected: unknown email");
        return Err(StoreError::InvalidCredentials);
    };
    if !hasher.verify(password, &password_hash)? {
        tracing::debug!(account_id = %identity.id, "sign-in rejected: wrong password");
        return Err(StoreError::InvalidCredentials);
    }
    tracing::info!(account_id = %identity.id, "signed in");
    Ok(identity)
}

/// Stub: confirms the email is registered and reports a reset link as sent.
/// Nothing is delivered.
pub fn request_password_reset(conn: &Connection, email: &str) -> StoreResult<ResetNotice> {
    let email = fold_email(email);
    if find_by_email(conn, &email)?.is_none() {
        return Err(StoreError::UnknownEmail(email));
    }
    tracing::info!(email = %email, "password reset requested (delivery not implemented)");
    Ok(ResetNotice {
        email,
        message: "Password reset link has been sent to your email.".to_string(),
        delivered: false,
    })
}

fn find_by_email(conn: &Connection, folded: &str) -> StoreResult<Option<(Identity, String)>> {
    let row = conn
        .query_row(
            "SELECT id, name, email, role, password_hash, created_at
             FROM accounts
             WHERE email = ?",
            [folded],
            |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, String>(4)?,
                    r.get::<_, String>(5)?,
                ))
            },
        )
        .optional()?;
    let Some((id, name, email, role, password_hash, created_at)) = row else {
        return Ok(None);
    };

    let role = Role::parse(&role)
        .ok_or_else(|| StoreError::corrupt(format!("account {id} has unknown role {role:?}")))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| StoreError::corrupt(format!("account {id} created_at: {e}")))?
        .with_timezone(&Utc);

    Ok(Some((
        Identity {
            id,
            name,
            email,
            role,
            created_at,
        },
        password_hash,
    )))
}
