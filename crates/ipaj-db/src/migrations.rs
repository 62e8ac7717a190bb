use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS utilizadores (
            id              TEXT PRIMARY KEY,
            name            TEXT NOT NULL,
            email           TEXT NOT NULL UNIQUE,
            password        TEXT NOT NULL,
            kind            TEXT NOT NULL,
            verified        INTEGER NOT NULL DEFAULT 0,
            phone           TEXT,
            nip             TEXT,
            category        TEXT,
            totp_secret     TEXT,
            totp_verified   INTEGER NOT NULL DEFAULT 0,
            totp_last_step  INTEGER,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS advogados (
            user_id          TEXT PRIMARY KEY REFERENCES utilizadores(id),
            specialization   TEXT NOT NULL DEFAULT '',
            profile_pic_url  TEXT,
            config_language  TEXT NOT NULL DEFAULT 'Português (Moçambique)',
            config_theme     TEXT NOT NULL DEFAULT 'Claro',
            config_alerts    INTEGER NOT NULL DEFAULT 1,
            updated_at       TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS agendamentos (
            id              TEXT PRIMARY KEY,
            name            TEXT NOT NULL,
            email           TEXT NOT NULL,
            phone           TEXT NOT NULL,
            preferred_date  TEXT NOT NULL,
            description     TEXT NOT NULL,
            status          TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_agendamentos_created
            ON agendamentos(created_at);

        CREATE TABLE IF NOT EXISTS chat_logs (
            id            TEXT PRIMARY KEY,
            question      TEXT NOT NULL,
            has_document  INTEGER NOT NULL,
            reply         TEXT NOT NULL,
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
