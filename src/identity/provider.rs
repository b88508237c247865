//! Credential issue side: password verification and token minting.
//!
//! Passwords are stored as Argon2 PHC strings. The provider verifies a login
//! and asks the session resolver for a signed credential embedding the user's
//! role; nothing about the session is kept server-side afterwards.

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use parking_lot::RwLock;
use password_hash::{PasswordHash, SaltString};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::roles::Role;

use super::resolver::SessionResolver;

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub token: String,
    pub subject: String,
    pub role: Role,
    /// Where the UI should land this user after login.
    pub landing: &'static str,
}

pub trait AuthProvider: Send + Sync {
    fn login(&self, req: &LoginRequest) -> AppResult<LoginResponse>;
}

#[derive(Debug, Clone)]
struct UserRecord {
    password_hash: String,
    role: Role,
}

/// In-process user registry keyed by username.
pub struct LocalAuthProvider {
    resolver: Arc<SessionResolver>,
    users: RwLock<HashMap<String, UserRecord>>,
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes)
        .map_err(|e| AppError::internal("salt".to_string(), e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::internal("salt".to_string(), e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::internal("hash".to_string(), e.to_string()))?
        .to_string();
    Ok(phc)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else {
        false
    }
}

impl LocalAuthProvider {
    pub fn new(resolver: Arc<SessionResolver>) -> Self {
        Self { resolver, users: RwLock::new(HashMap::new()) }
    }

    pub fn add_user(&self, username: &str, password: &str, role: Role) -> AppResult<()> {
        let phc = hash_password(password)?;
        let mut users = self.users.write();
        users.insert(username.to_string(), UserRecord { password_hash: phc, role });
        Ok(())
    }

    /// Seed a representative account per role, for the demo server and tests.
    pub fn seed_demo_users(&self) -> AppResult<()> {
        let demo: &[(&str, &str, Role)] = &[
            ("admin", "admin", Role::Admin),
            ("dr-grey", "scalpel", Role::Doctor),
            ("pat-jones", "waiting-room", Role::Patient),
            ("nurse-ratched", "rounds", Role::Nurse),
            ("front-desk", "check-in", Role::Receptionist),
            ("tech-lab", "centrifuge", Role::LabTechnician),
            ("lab-super", "signoff", Role::LabSupervisor),
            ("billing", "ledger", Role::BillingStaff),
            ("claims", "adjuster", Role::InsuranceStaff),
            ("pharmacist", "mortar", Role::Pharmacist),
        ];
        for (user, pass, role) in demo {
            self.add_user(user, pass, *role)?;
        }
        Ok(())
    }
}

impl AuthProvider for LocalAuthProvider {
    fn login(&self, req: &LoginRequest) -> AppResult<LoginResponse> {
        let record = {
            let users = self.users.read();
            users.get(&req.username).cloned()
        };
        // Same rejection for unknown user and wrong password.
        let Some(record) = record else {
            return Err(AppError::auth("invalid_credentials", "login rejected"));
        };
        if !verify_password(&record.password_hash, &req.password) {
            return Err(AppError::auth("invalid_credentials", "login rejected"));
        }
        let token = self.resolver.issue(&req.username, record.role)?;
        info!(user = %req.username, role = %record.role, "auth.login");
        Ok(LoginResponse {
            token,
            subject: req.username.clone(),
            role: record.role,
            landing: record.role.default_landing(),
        })
    }
}
