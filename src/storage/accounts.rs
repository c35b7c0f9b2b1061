//! Teams and sign-in accounts

use rusqlite::{params, Connection, OptionalExtension};
use crate::auth::{hash_password, verify_password};
use crate::model::{
    AccountRole, AccountSummary, AdminAccount, NewAdmin, Registration, Signup, Team, UserProfile,
};
use crate::{Error, Result};
use super::sqlite::{conflict_on_constraint, is_constraint_violation, now};
use super::SqliteStore;

impl SqliteStore {
    // ========== Team Operations ==========

    pub fn list_teams(&self) -> Result<Vec<Team>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description, join_code, created_at FROM teams ORDER BY id")?;
        let teams = stmt
            .query_map([], row_to_team)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(teams)
    }

    pub fn create_team(&self, name: &str, description: &str) -> Result<Team> {
        let team = insert_team(&self.conn, name, description)
            .map_err(conflict_on_constraint("Team name already exists"))?;
        tracing::info!(team_id = team.id, name = %team.name, "Created team");
        Ok(team)
    }

    pub fn find_team_by_code(&self, join_code: &str) -> Result<Option<Team>> {
        self.conn
            .query_row(
                "SELECT id, name, description, join_code, created_at FROM teams WHERE join_code = ?1",
                [join_code],
                row_to_team,
            )
            .optional()
            .map_err(Into::into)
    }

    // ========== Account Operations ==========

    /// Self-service sign-up.
    ///
    /// Admins create a team with a fresh join code; members may join one by
    /// code. Every failure is reported as invalid input.
    pub fn register_user(&self, signup: &Signup) -> Result<Registration> {
        let role = signup.validate()?;
        let username = signup.username.trim();
        let email = signup.email.trim();
        if self.account_exists("username", username)? {
            return Err(Error::InvalidInput("Username already exists".to_string()));
        }
        if self.account_exists("email", email)? {
            return Err(Error::InvalidInput("Email already exists".to_string()));
        }

        let tx = self.conn.unchecked_transaction()?;
        let team = match role {
            AccountRole::Admin => {
                let team = insert_team(&tx, signup.team_name.trim(), signup.team_description.trim())
                    .map_err(|err| {
                        if is_constraint_violation(&err) {
                            Error::InvalidInput("Team name already exists".to_string())
                        } else {
                            Error::Storage(err)
                        }
                    })?;
                Some(team)
            }
            AccountRole::Member if !signup.team_code.trim().is_empty() => {
                let team = self
                    .find_team_by_code(signup.team_code.trim())?
                    .ok_or_else(|| Error::InvalidInput("Unknown team code".to_string()))?;
                Some(team)
            }
            AccountRole::Member => None,
        };

        let created_at = now();
        tx.execute(
            "INSERT INTO user_accounts (username, display_name, email, password_hash, role, team_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                username,
                signup.display_name.trim(),
                email,
                hash_password(&signup.password),
                role.as_str(),
                team.as_ref().map(|t| t.id),
                created_at,
            ],
        )
        .map_err(|err| {
            if is_constraint_violation(&err) {
                Error::InvalidInput("Username or email already exists".to_string())
            } else {
                Error::Storage(err)
            }
        })?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::info!(account_id = id, username, role = role.as_str(), "Registered account");
        Ok(Registration {
            account: AccountSummary {
                id,
                kind: "user",
                username: username.to_string(),
                display_name: signup.display_name.trim().to_string(),
                email: email.to_string(),
                role: role.as_str().to_string(),
                team: team.as_ref().map(|t| t.name.clone()),
                created_at,
            },
            joined_team: team,
        })
    }

    /// Profile for a stored account whose password matches.
    ///
    /// User accounts are checked before admin accounts.
    pub fn find_account_for_login(&self, username: &str, password: &str) -> Result<Option<UserProfile>> {
        let user: Option<(String, String, String, String, Option<String>)> = self
            .conn
            .query_row(
                "SELECT u.display_name, u.email, u.password_hash, u.role, t.name
                 FROM user_accounts u LEFT JOIN teams t ON t.id = u.team_id
                 WHERE u.username = ?1",
                [username],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .optional()?;
        if let Some((name, email, hash, role, team)) = user {
            if verify_password(password, &hash) {
                let role: AccountRole = role.parse()?;
                return Ok(Some(profile(username, name, role.display(), email, team)));
            }
        }

        let admin: Option<(String, String, String, Option<String>)> = self
            .conn
            .query_row(
                "SELECT a.display_name, a.email, a.password_hash, t.name
                 FROM admin_accounts a LEFT JOIN teams t ON t.id = a.team_id
                 WHERE a.username = ?1",
                [username],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;
        if let Some((name, email, hash, team)) = admin {
            if verify_password(password, &hash) {
                return Ok(Some(profile(username, name, "Super admin", email, team)));
            }
        }
        Ok(None)
    }

    /// Create the one super-admin account. Fails once any admin exists.
    pub fn create_initial_admin(&self, new: &NewAdmin) -> Result<AdminAccount> {
        new.validate()?;
        if self.count("SELECT COUNT(*) FROM admin_accounts")? > 0 {
            return Err(Error::Conflict("Initial admin account already exists".to_string()));
        }

        let team: Option<(i64, String)> = match new.team_id() {
            Some(team_id) => self
                .conn
                .query_row("SELECT id, name FROM teams WHERE id = ?1", [team_id], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })
                .optional()?,
            None => None,
        };

        self.conn
            .execute(
                "INSERT INTO admin_accounts (username, display_name, email, password_hash, team_id, is_super_admin, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
                params![
                    new.username.trim(),
                    new.display_name.trim(),
                    new.email.trim(),
                    hash_password(&new.password),
                    team.as_ref().map(|(id, _)| *id),
                    now(),
                ],
            )
            .map_err(conflict_on_constraint("Admin username or email already exists"))?;

        let admin = AdminAccount {
            id: self.conn.last_insert_rowid(),
            username: new.username.trim().to_string(),
            display_name: new.display_name.trim().to_string(),
            email: new.email.trim().to_string(),
            team: team.map(|(_, name)| name),
            is_super_admin: true,
        };
        tracing::info!(admin_id = admin.id, username = %admin.username, "Created initial admin");
        Ok(admin)
    }

    /// Admin accounts followed by user accounts
    pub fn list_all_accounts(&self) -> Result<Vec<AccountSummary>> {
        let mut accounts = Vec::new();

        let mut stmt = self.conn.prepare(
            "SELECT a.id, a.username, a.display_name, a.email, t.name, a.created_at
             FROM admin_accounts a LEFT JOIN teams t ON t.id = a.team_id ORDER BY a.id",
        )?;
        let admins = stmt.query_map([], |row| {
            Ok(AccountSummary {
                id: row.get(0)?,
                kind: "admin",
                username: row.get(1)?,
                display_name: row.get(2)?,
                email: row.get(3)?,
                role: "super_admin".to_string(),
                team: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;
        for admin in admins {
            accounts.push(admin?);
        }

        let mut stmt = self.conn.prepare(
            "SELECT u.id, u.username, u.display_name, u.email, u.role, t.name, u.created_at
             FROM user_accounts u LEFT JOIN teams t ON t.id = u.team_id ORDER BY u.id",
        )?;
        let users = stmt.query_map([], |row| {
            Ok(AccountSummary {
                id: row.get(0)?,
                kind: "user",
                username: row.get(1)?,
                display_name: row.get(2)?,
                email: row.get(3)?,
                role: row.get(4)?,
                team: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;
        for user in users {
            accounts.push(user?);
        }
        Ok(accounts)
    }

    fn account_exists(&self, column: &str, value: &str) -> Result<bool> {
        let sql = format!(
            "SELECT (SELECT COUNT(*) FROM user_accounts WHERE {column} = ?1)
                  + (SELECT COUNT(*) FROM admin_accounts WHERE {column} = ?1)"
        );
        let found: i64 = self.conn.query_row(&sql, [value], |row| row.get(0))?;
        Ok(found > 0)
    }
}

fn profile(
    username: &str,
    name: String,
    role: &str,
    email: String,
    team: Option<String>,
) -> UserProfile {
    UserProfile {
        username: username.to_string(),
        name,
        role: role.to_string(),
        email,
        organization: team.unwrap_or_default(),
        major: String::new(),
        signature_data_url: String::new(),
    }
}

/// Random six-digit join code, redrawn on collision
fn next_join_code(conn: &Connection) -> rusqlite::Result<String> {
    loop {
        let code = random_join_code();
        let taken: i64 = conn.query_row(
            "SELECT COUNT(*) FROM teams WHERE join_code = ?1",
            [&code],
            |row| row.get(0),
        )?;
        if taken == 0 {
            return Ok(code);
        }
    }
}

fn random_join_code() -> String {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    let n = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    format!("{}", 100_000 + n % 900_000)
}

fn insert_team(conn: &Connection, name: &str, description: &str) -> rusqlite::Result<Team> {
    let join_code = next_join_code(conn)?;
    let created_at = now();
    conn.execute(
        "INSERT INTO teams (name, description, join_code, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![name, description, join_code, created_at],
    )?;
    Ok(Team {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        description: description.to_string(),
        join_code,
        created_at,
    })
}

fn row_to_team(row: &rusqlite::Row) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        join_code: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(username: &str, role: &str) -> Signup {
        Signup {
            username: username.into(),
            display_name: username.to_uppercase(),
            email: format!("{username}@example.com"),
            password: "pw-1234".into(),
            role: role.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_team_join_codes() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = store.create_team("Genomics", "").unwrap();
        let second = store.create_team("Proteomics", "mass spec").unwrap();
        for team in [&first, &second] {
            assert_eq!(team.join_code.len(), 6);
            assert!(team.join_code.chars().all(|c| c.is_ascii_digit()));
        }
        assert_ne!(first.join_code, second.join_code);
        assert!(matches!(store.create_team("Genomics", ""), Err(Error::Conflict(_))));
        assert_eq!(store.find_team_by_code(&second.join_code).unwrap(), Some(second));
    }

    #[test]
    fn test_join_codes_are_not_sequential() {
        let codes: std::collections::HashSet<String> = (0..50).map(|_| random_join_code()).collect();
        assert!(codes.len() > 40);
        for code in &codes {
            let n: u32 = code.parse().unwrap();
            assert!((100_000..1_000_000).contains(&n));
        }
    }

    #[test]
    fn test_admin_signup_creates_team_member_joins() {
        let store = SqliteStore::open_in_memory().unwrap();
        let admin = Signup {
            team_name: "Genomics".into(),
            ..signup("lead", "admin")
        };
        let registered = store.register_user(&admin).unwrap();
        let team = registered.joined_team.unwrap();
        assert_eq!(registered.account.role, "admin");

        let member = Signup {
            team_code: team.join_code.clone(),
            ..signup("kim", "member")
        };
        let joined = store.register_user(&member).unwrap();
        assert_eq!(joined.account.team.as_deref(), Some("Genomics"));

        let stray = Signup {
            team_code: "999999".into(),
            ..signup("lee", "member")
        };
        assert!(matches!(store.register_user(&stray), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_signup_duplicates_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.register_user(&signup("kim", "member")).unwrap();
        assert!(matches!(
            store.register_user(&signup("kim", "member")),
            Err(Error::InvalidInput(msg)) if msg == "Username already exists"
        ));
        let same_email = Signup {
            username: "kim2".into(),
            ..signup("kim", "member")
        };
        assert!(matches!(store.register_user(&same_email), Err(Error::InvalidInput(_))));
        assert!(matches!(store.register_user(&signup("x", "owner")), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_login_lookup() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.register_user(&signup("kim", "member")).unwrap();
        let profile = store.find_account_for_login("kim", "pw-1234").unwrap().unwrap();
        assert_eq!(profile.name, "KIM");
        assert_eq!(profile.role, "Member");
        assert!(store.find_account_for_login("kim", "nope").unwrap().is_none());
        assert!(store.find_account_for_login("ghost", "pw-1234").unwrap().is_none());
    }

    #[test]
    fn test_initial_admin_once() {
        let store = SqliteStore::open_in_memory().unwrap();
        let team = store.create_team("Ops", "").unwrap();
        let new = NewAdmin {
            username: "root".into(),
            display_name: "Root".into(),
            email: "root@example.com".into(),
            password: "pw".into(),
            team_id: Some(team.id.to_string()),
        };
        let admin = store.create_initial_admin(&new).unwrap();
        assert_eq!(admin.team.as_deref(), Some("Ops"));
        assert!(admin.is_super_admin);
        assert!(matches!(store.create_initial_admin(&new), Err(Error::Conflict(_))));

        let profile = store.find_account_for_login("root", "pw").unwrap().unwrap();
        assert_eq!(profile.role, "Super admin");

        let accounts = store.list_all_accounts().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].kind, "admin");

        store.truncate_table("teams").unwrap();
        assert!(store.list_all_accounts().unwrap().is_empty());
    }
}
