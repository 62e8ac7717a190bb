use crate::models::{AppointmentRow, LawyerRow, NewUser, TotpRow, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::Connection;

const USER_COLUMNS: &str =
    "id, name, email, password, kind, verified, phone, nip, category, created_at";

impl Database {
    // -- Users (utilizadores) --

    pub fn create_user(&self, user: &NewUser<'_>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO utilizadores (id, name, email, password, kind, verified, phone, nip, category)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    user.id,
                    user.name,
                    user.email,
                    user.password_hash,
                    user.kind,
                    user.verified,
                    user.phone,
                    user.nip,
                    user.category,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- TOTP --

    /// Replace the user's secret and reset verification. Returns false when
    /// the user does not exist.
    pub fn store_totp_secret(&self, user_id: &str, secret: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE utilizadores
                 SET totp_secret = ?2, totp_verified = 0, totp_last_step = NULL
                 WHERE id = ?1",
                rusqlite::params![user_id, secret],
            )?;
            Ok(changed == 1)
        })
    }

    pub fn get_totp(&self, user_id: &str) -> Result<Option<TotpRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT totp_secret, totp_verified, totp_last_step FROM utilizadores WHERE id = ?1",
                    [user_id],
                    |row| {
                        Ok((
                            row.get::<_, Option<String>>(0)?,
                            row.get::<_, bool>(1)?,
                            row.get::<_, Option<i64>>(2)?,
                        ))
                    },
                )
                .optional()?;

            Ok(row.and_then(|(secret, verified, last_step)| {
                secret.map(|secret| TotpRow {
                    secret,
                    verified,
                    last_step: last_step.map(|s| s as u64),
                })
            }))
        })
    }

    /// Record an accepted code: stores its step and flips both the TOTP and
    /// the account verification flags. The write only lands while `step` is
    /// newer than the last accepted one and `secret` is still current, so of
    /// two requests racing with the same code exactly one gets `true`.
    pub fn mark_totp_verified(&self, user_id: &str, secret: &str, step: u64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE utilizadores
                 SET totp_verified = 1, verified = 1, totp_last_step = ?3
                 WHERE id = ?1
                   AND totp_secret = ?2
                   AND (totp_last_step IS NULL OR totp_last_step < ?3)",
                rusqlite::params![user_id, secret, step as i64],
            )?;
            Ok(changed == 1)
        })
    }

    // -- Lawyers (advogados) --

    pub fn create_lawyer_profile(&self, user_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO advogados (user_id) VALUES (?1)",
                [user_id],
            )?;
            Ok(())
        })
    }

    pub fn get_lawyer_profile(&self, user_id: &str) -> Result<Option<LawyerRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT u.id, u.name, u.email, u.phone, u.nip, u.category,
                            COALESCE(a.specialization, ''), a.profile_pic_url,
                            COALESCE(a.config_language, 'Português (Moçambique)'),
                            COALESCE(a.config_theme, 'Claro'),
                            COALESCE(a.config_alerts, 1)
                     FROM utilizadores u
                     LEFT JOIN advogados a ON a.user_id = u.id
                     WHERE u.id = ?1 AND u.kind = 'advogado'",
                    [user_id],
                    |row| {
                        Ok(LawyerRow {
                            user_id: row.get(0)?,
                            name: row.get(1)?,
                            email: row.get(2)?,
                            phone: row.get(3)?,
                            nip: row.get(4)?,
                            category: row.get(5)?,
                            specialization: row.get(6)?,
                            profile_pic_url: row.get(7)?,
                            config_language: row.get(8)?,
                            config_theme: row.get(9)?,
                            config_alerts: row.get(10)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn update_lawyer_profile(
        &self,
        user_id: &str,
        name: &str,
        phone: Option<&str>,
        specialization: &str,
        profile_pic_url: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "UPDATE utilizadores SET name = ?2, phone = COALESCE(?3, phone) WHERE id = ?1",
                rusqlite::params![user_id, name, phone],
            )?;
            tx.execute(
                "INSERT INTO advogados (user_id, specialization, profile_pic_url)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                    specialization = excluded.specialization,
                    profile_pic_url = COALESCE(excluded.profile_pic_url, advogados.profile_pic_url),
                    updated_at = datetime('now')",
                rusqlite::params![user_id, specialization, profile_pic_url],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn update_lawyer_settings(
        &self,
        user_id: &str,
        language: &str,
        theme: &str,
        alerts: bool,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO advogados (user_id, config_language, config_theme, config_alerts)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id) DO UPDATE SET
                    config_language = excluded.config_language,
                    config_theme = excluded.config_theme,
                    config_alerts = excluded.config_alerts,
                    updated_at = datetime('now')",
                rusqlite::params![user_id, language, theme, alerts],
            )?;
            Ok(())
        })
    }

    // -- Appointments (agendamentos) --

    pub fn insert_appointment(&self, row: &AppointmentRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO agendamentos (id, name, email, phone, preferred_date, description, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    row.id,
                    row.name,
                    row.email,
                    row.phone,
                    row.preferred_date,
                    row.description,
                    row.status,
                    row.created_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn list_appointments(&self, limit: u32) -> Result<Vec<AppointmentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, email, phone, preferred_date, description, status, created_at
                 FROM agendamentos
                 ORDER BY created_at DESC
                 LIMIT ?1",
            )?;

            let rows = stmt
                .query_map([limit], |row| {
                    Ok(AppointmentRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        phone: row.get(3)?,
                        preferred_date: row.get(4)?,
                        description: row.get(5)?,
                        status: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Chat audit trail (chat_logs) --

    pub fn insert_chat_log(&self, id: &str, question: &str, has_document: bool, reply: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chat_logs (id, question, has_document, reply) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, question, has_document, reply],
            )?;
            Ok(())
        })
    }

    pub fn count_chat_logs(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM chat_logs", [], |row| row.get(0))?;
            Ok(count as u64)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM utilizadores WHERE {} = ?1", USER_COLUMNS, column);
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                kind: row.get(4)?,
                verified: row.get(5)?,
                phone: row.get(6)?,
                nip: row.get(7)?,
                category: row.get(8)?,
                created_at: row.get(9)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
