use anyhow::{Result, anyhow};
use rusqlite::Connection;

use pawlink_types::models::SwipeDirection;

use crate::Database;
use crate::models::{AnimalRow, MatchRow, MatchSummaryRow, MessageRow, SwipeRow, UserRow};

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, role: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, role) VALUES (?1, ?2, ?3)",
                (id, username, role),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, username, role, created_at FROM users WHERE id = ?1")?;
            stmt.query_row([id], read_user_row).optional()
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, username, role, created_at FROM users ORDER BY created_at")?;
            let rows = stmt
                .query_map([], read_user_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Animals --

    pub fn create_animal(
        &self,
        id: &str,
        owner_id: &str,
        name: &str,
        species: &str,
        bio: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<AnimalRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO animals (id, owner_id, name, species, bio, image_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, owner_id, name, species, bio, image_url],
            )?;
            query_animal(conn, id)?.ok_or_else(|| anyhow!("Animal vanished after insert: {}", id))
        })
    }

    pub fn get_animal(&self, id: &str) -> Result<Option<AnimalRow>> {
        self.with_conn(|conn| query_animal(conn, id))
    }

    pub fn animals_owned_by(&self, owner_id: &str) -> Result<Vec<AnimalRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, name, species, bio, image_url, created_at
                 FROM animals WHERE owner_id = ?1 ORDER BY created_at",
            )?;
            let rows = stmt
                .query_map([owner_id], read_animal_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_animals(&self) -> Result<Vec<AnimalRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, name, species, bio, image_url, created_at
                 FROM animals ORDER BY created_at",
            )?;
            let rows = stmt
                .query_map([], read_animal_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Swipes --

    /// Create-or-update for the ordered (swiper, swiped) pair. The
    /// UNIQUE(swiper_id, swiped_id) constraint makes this a single atomic
    /// statement: a repeat swipe overwrites `action` and refreshes
    /// `updated_at` instead of appending a second row.
    pub fn upsert_swipe(
        &self,
        id: &str,
        swiper_id: &str,
        swiped_id: &str,
        action: &str,
    ) -> Result<SwipeRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO swipes (id, swiper_id, swiped_id, action)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(swiper_id, swiped_id)
                 DO UPDATE SET action = excluded.action, updated_at = datetime('now')",
                (id, swiper_id, swiped_id, action),
            )?;
            query_swipe(conn, swiper_id, swiped_id)?
                .ok_or_else(|| anyhow!("Swipe vanished after upsert: {} -> {}", swiper_id, swiped_id))
        })
    }

    pub fn get_swipe(&self, swiper_id: &str, swiped_id: &str) -> Result<Option<SwipeRow>> {
        self.with_conn(|conn| query_swipe(conn, swiper_id, swiped_id))
    }

    /// Whether the reverse swipe exists with a positive action.
    pub fn has_reciprocal_positive(&self, swiper_id: &str, swiped_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM swipes
                     WHERE swiper_id = ?1 AND swiped_id = ?2
                       AND action IN ('like', 'super_like'))",
                (swiped_id, swiper_id),
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    pub fn swipes_for_animal(
        &self,
        animal_id: &str,
        direction: SwipeDirection,
        action: Option<&str>,
    ) -> Result<Vec<SwipeRow>> {
        let column = match direction {
            SwipeDirection::Sent => "swiper_id",
            SwipeDirection::Received => "swiped_id",
        };

        self.with_conn(|conn| {
            let base = format!(
                "SELECT id, swiper_id, swiped_id, action, created_at, updated_at
                 FROM swipes WHERE {column} = ?1"
            );

            let rows = match action {
                Some(action) => {
                    let mut stmt =
                        conn.prepare(&format!("{base} AND action = ?2 ORDER BY updated_at DESC"))?;
                    stmt.query_map((animal_id, action), read_swipe_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
                None => {
                    let mut stmt = conn.prepare(&format!("{base} ORDER BY updated_at DESC"))?;
                    stmt.query_map([animal_id], read_swipe_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
            };
            Ok(rows)
        })
    }

    // -- Matches --

    /// Create-if-absent for the unordered pair. Ids are canonicalized
    /// (sorted) before touching storage, so UNIQUE(pet_a, pet_b) is the
    /// actual uniqueness guarantee for the unordered pair: a lost race
    /// means INSERT OR IGNORE changes nothing and the existing row is
    /// fetched instead.
    ///
    /// Returns the match and whether this call created it.
    pub fn create_match_if_absent(
        &self,
        id: &str,
        pet_x: &str,
        pet_y: &str,
    ) -> Result<(MatchRow, bool)> {
        let (pet_a, pet_b) = canonical_pair(pet_x, pet_y);

        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO matches (id, pet_a, pet_b) VALUES (?1, ?2, ?3)",
                (id, pet_a, pet_b),
            )?;

            let row = conn
                .query_row(
                    "SELECT id, pet_a, pet_b, created_at FROM matches
                     WHERE pet_a = ?1 AND pet_b = ?2",
                    (pet_a, pet_b),
                    read_match_row,
                )
                .optional()?
                .ok_or_else(|| anyhow!("Match vanished after insert: {} / {}", pet_a, pet_b))?;

            Ok((row, inserted > 0))
        })
    }

    pub fn get_match(&self, id: &str) -> Result<Option<MatchRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, pet_a, pet_b, created_at FROM matches WHERE id = ?1")?;
            stmt.query_row([id], read_match_row).optional()
        })
    }

    /// Matches involving the animal on either side, joined with both
    /// animals' display fields in a single query.
    pub fn matches_for_animal(&self, animal_id: &str) -> Result<Vec<MatchSummaryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.pet_a, a.name, a.image_url, m.pet_b, b.name, b.image_url, m.created_at
                 FROM matches m
                 JOIN animals a ON m.pet_a = a.id
                 JOIN animals b ON m.pet_b = b.id
                 WHERE m.pet_a = ?1 OR m.pet_b = ?1
                 ORDER BY m.created_at DESC",
            )?;
            let rows = stmt
                .query_map([animal_id], |row| {
                    Ok(MatchSummaryRow {
                        id: row.get(0)?,
                        pet_a: row.get(1)?,
                        pet_a_name: row.get(2)?,
                        pet_a_image_url: row.get(3)?,
                        pet_b: row.get(4)?,
                        pet_b_name: row.get(5)?,
                        pet_b_image_url: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        id: &str,
        match_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<MessageRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (id, match_id, sender_id, content) VALUES (?1, ?2, ?3, ?4)",
                (id, match_id, sender_id, content),
            )?;
            conn.query_row(
                "SELECT id, match_id, sender_id, content, created_at FROM messages WHERE id = ?1",
                [id],
                read_message_row,
            )
            .optional()?
            .ok_or_else(|| anyhow!("Message vanished after insert: {}", id))
        })
    }

    /// Oldest first; ties on created_at resolve by insertion order (rowid),
    /// so the display order is stable.
    pub fn messages_for_match(&self, match_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, match_id, sender_id, content, created_at
                 FROM messages WHERE match_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt
                .query_map([match_id], read_message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

/// Sort two ids into canonical storage order.
pub fn canonical_pair<'a>(x: &'a str, y: &'a str) -> (&'a str, &'a str) {
    if x <= y { (x, y) } else { (y, x) }
}

fn query_animal(conn: &Connection, id: &str) -> Result<Option<AnimalRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, name, species, bio, image_url, created_at
         FROM animals WHERE id = ?1",
    )?;
    stmt.query_row([id], read_animal_row).optional()
}

fn query_swipe(conn: &Connection, swiper_id: &str, swiped_id: &str) -> Result<Option<SwipeRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, swiper_id, swiped_id, action, created_at, updated_at
         FROM swipes WHERE swiper_id = ?1 AND swiped_id = ?2",
    )?;
    stmt.query_row((swiper_id, swiped_id), read_swipe_row)
        .optional()
}

fn read_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        role: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn read_animal_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AnimalRow> {
    Ok(AnimalRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        species: row.get(3)?,
        bio: row.get(4)?,
        image_url: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn read_swipe_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SwipeRow> {
    Ok(SwipeRow {
        id: row.get(0)?,
        swiper_id: row.get(1)?,
        swiped_id: row.get(2)?,
        action: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn read_match_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MatchRow> {
    Ok(MatchRow {
        id: row.get(0)?,
        pet_a: row.get(1)?,
        pet_b: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn read_message_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        match_id: row.get(1)?,
        sender_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
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

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_db() -> Database {
        let path = std::env::temp_dir().join(format!("pawlink-test-{}.db", Uuid::new_v4()));
        Database::open(&path).unwrap()
    }

    fn seed_animal(db: &Database, owner: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_animal(&id, owner, "Rex", "dog", None, None).unwrap();
        id
    }

    fn seed_owner(db: &Database) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(&id, &format!("user-{id}"), "regular").unwrap();
        id
    }

    #[test]
    fn upsert_overwrites_action_in_place() {
        let db = test_db();
        let owner = seed_owner(&db);
        let a = seed_animal(&db, &owner);
        let b = seed_animal(&db, &owner);

        db.upsert_swipe(&Uuid::new_v4().to_string(), &a, &b, "like").unwrap();
        db.upsert_swipe(&Uuid::new_v4().to_string(), &a, &b, "ignore").unwrap();

        let swipe = db.get_swipe(&a, &b).unwrap().unwrap();
        assert_eq!(swipe.action, "ignore");

        let count: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM swipes", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn match_is_unique_across_insertion_orders() {
        let db = test_db();
        let owner = seed_owner(&db);
        let a = seed_animal(&db, &owner);
        let b = seed_animal(&db, &owner);

        let (first, created) = db
            .create_match_if_absent(&Uuid::new_v4().to_string(), &a, &b)
            .unwrap();
        assert!(created);

        // Reversed argument order resolves to the same canonical row.
        let (second, created) = db
            .create_match_if_absent(&Uuid::new_v4().to_string(), &b, &a)
            .unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);

        let count: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM matches", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn canonical_pair_sorts_ids() {
        assert_eq!(canonical_pair("b", "a"), ("a", "b"));
        assert_eq!(canonical_pair("a", "b"), ("a", "b"));
    }

    #[test]
    fn reciprocal_check_skips_negative_swipes() {
        let db = test_db();
        let owner = seed_owner(&db);
        let a = seed_animal(&db, &owner);
        let b = seed_animal(&db, &owner);

        db.upsert_swipe(&Uuid::new_v4().to_string(), &b, &a, "ignore").unwrap();
        assert!(!db.has_reciprocal_positive(&a, &b).unwrap());

        db.upsert_swipe(&Uuid::new_v4().to_string(), &b, &a, "super_like").unwrap();
        assert!(db.has_reciprocal_positive(&a, &b).unwrap());
    }

    #[test]
    fn swipe_queries_filter_by_direction_and_action() {
        let db = test_db();
        let owner = seed_owner(&db);
        let a = seed_animal(&db, &owner);
        let b = seed_animal(&db, &owner);
        let c = seed_animal(&db, &owner);

        db.upsert_swipe(&Uuid::new_v4().to_string(), &a, &b, "like").unwrap();
        db.upsert_swipe(&Uuid::new_v4().to_string(), &a, &c, "ignore").unwrap();
        db.upsert_swipe(&Uuid::new_v4().to_string(), &c, &a, "like").unwrap();

        let sent = db.swipes_for_animal(&a, SwipeDirection::Sent, None).unwrap();
        assert_eq!(sent.len(), 2);

        let sent_likes = db
            .swipes_for_animal(&a, SwipeDirection::Sent, Some("like"))
            .unwrap();
        assert_eq!(sent_likes.len(), 1);
        assert_eq!(sent_likes[0].swiped_id, b);

        let received = db
            .swipes_for_animal(&a, SwipeDirection::Received, None)
            .unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].swiper_id, c);
    }

    #[test]
    fn messages_keep_insertion_order_on_equal_timestamps() {
        let db = test_db();
        let owner = seed_owner(&db);
        let a = seed_animal(&db, &owner);
        let b = seed_animal(&db, &owner);
        let (m, _) = db
            .create_match_if_absent(&Uuid::new_v4().to_string(), &a, &b)
            .unwrap();

        // Force identical timestamps so only the rowid tie-break orders them.
        let ids: Vec<String> = (0..3).map(|_| Uuid::new_v4().to_string()).collect();
        db.with_conn_mut(|conn| {
            for (i, id) in ids.iter().enumerate() {
                conn.execute(
                    "INSERT INTO messages (id, match_id, sender_id, content, created_at)
                     VALUES (?1, ?2, ?3, ?4, '2026-01-01 12:00:00')",
                    (id, &m.id, &owner, format!("msg {i}")),
                )?;
            }
            Ok(())
        })
        .unwrap();

        let messages = db.messages_for_match(&m.id).unwrap();
        let got: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
        let want: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
        assert_eq!(got, want);
    }
}
