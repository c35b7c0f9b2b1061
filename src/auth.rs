//! Password hashing and the super-admin account file

use crate::chain::sha256_hex;
use crate::config::ProjectNoteConfig;
use crate::model::UserProfile;
use crate::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const SCHEME: &str = "sha256";

/// Hash a password as `sha256$<salt>$<hex digest>` with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    hash_with_salt(password, &salt)
}

fn hash_with_salt(password: &str, salt: &str) -> String {
    format!("{SCHEME}${salt}${}", sha256_hex(&format!("{salt}{password}")))
}

/// Check a password against a stored hash. Unknown formats never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(SCHEME), Some(salt), Some(_)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    constant_time_eq(hash_with_salt(password, salt).as_bytes(), stored.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// An entry of the super-admin file. Passwords there are plain text.
#[derive(Debug, Clone, Deserialize)]
pub struct SuperAdmin {
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub major: String,
}

#[derive(Debug, Deserialize)]
struct SuperAdminFile {
    #[serde(default)]
    users: HashMap<String, SuperAdmin>,
}

/// Accounts that can always sign in, keyed by username.
#[derive(Debug, Clone, Default)]
pub struct SuperAdmins {
    users: HashMap<String, SuperAdmin>,
}

impl SuperAdmins {
    /// Load `{"users": {name: {...}}}` from the configured file, falling
    /// back to the configured demo user when the file is absent.
    pub fn load(config: &ProjectNoteConfig) -> Result<Self> {
        let path = Path::new(&config.super_admin_file);
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let file: SuperAdminFile = serde_json::from_str(&contents)?;
            tracing::info!(path = %path.display(), count = file.users.len(), "Loaded super admin accounts");
            return Ok(Self { users: file.users });
        }

        tracing::debug!("No super admin file, using demo user");
        Ok(Self::from_demo(config))
    }

    pub fn from_demo(config: &ProjectNoteConfig) -> Self {
        let demo = &config.demo_user;
        let admin = SuperAdmin {
            password: demo.password.clone(),
            name: demo.name.clone(),
            role: demo.role.clone(),
            email: demo.email.clone(),
            organization: demo.organization.clone(),
            major: demo.major.clone(),
        };
        Self {
            users: HashMap::from([(demo.username.clone(), admin)]),
        }
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Option<UserProfile> {
        let admin = self.users.get(username)?;
        if !constant_time_eq(admin.password.as_bytes(), password.as_bytes()) {
            return None;
        }
        Some(UserProfile {
            username: username.to_string(),
            name: admin.name.clone(),
            role: admin.role.clone(),
            email: admin.email.clone(),
            organization: admin.organization.clone(),
            major: admin.major.clone(),
            signature_data_url: String::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
