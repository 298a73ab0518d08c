use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                role        TEXT NOT NULL DEFAULT 'regular',
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE animals (
                id          TEXT PRIMARY KEY,
                owner_id    TEXT NOT NULL REFERENCES users(id),
                name        TEXT NOT NULL,
                species     TEXT NOT NULL,
                bio         TEXT,
                image_url   TEXT,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_animals_owner
                ON animals(owner_id);

            -- One row per ordered (swiper, swiped) pair; repeat swipes
            -- overwrite action in place.
            CREATE TABLE swipes (
                id          TEXT PRIMARY KEY,
                swiper_id   TEXT NOT NULL REFERENCES animals(id),
                swiped_id   TEXT NOT NULL REFERENCES animals(id),
                action      TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(swiper_id, swiped_id),
                CHECK(swiper_id <> swiped_id)
            );

            CREATE INDEX idx_swipes_swiped
                ON swipes(swiped_id);

            -- Canonical pair storage: pet_a sorts below pet_b, and the pair
            -- is unique. At-most-one match per unordered pair is enforced
            -- here, not in application code.
            CREATE TABLE matches (
                id          TEXT PRIMARY KEY,
                pet_a       TEXT NOT NULL REFERENCES animals(id),
                pet_b       TEXT NOT NULL REFERENCES animals(id),
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(pet_a, pet_b),
                CHECK(pet_a < pet_b)
            );

            CREATE INDEX idx_matches_pet_a ON matches(pet_a);
            CREATE INDEX idx_matches_pet_b ON matches(pet_b);

            CREATE TABLE messages (
                id          TEXT PRIMARY KEY,
                match_id    TEXT NOT NULL REFERENCES matches(id),
                sender_id   TEXT NOT NULL REFERENCES users(id),
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_messages_match
                ON messages(match_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
