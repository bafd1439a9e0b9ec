use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use serde::Serialize;

#[derive(Queryable, Selectable, Debug, Serialize, Clone, PartialEq)]
#[diesel(table_name = crate::schema::karma_transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct KarmaTransaction {
    pub id: i32,
    pub user_id: i32,
    pub points: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::karma_transactions)]
pub struct NewKarmaTransaction {
    pub user_id: i32,
    pub points: i32,
    pub created_at: NaiveDateTime,
}

impl KarmaTransaction {
    /// Ledger entry granting `points` to `recipient`, stamped now. The sign
    /// and magnitude of `points` are not checked.
    pub fn award(recipient: i32, points: i32) -> NewKarmaTransaction {
        NewKarmaTransaction {
            user_id: recipient,
            points,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// One leaderboard row. Field names on the wire are kept compatible with the
/// existing frontend.
#[derive(QueryableByName, Debug, Serialize, Clone, PartialEq, Eq)]
pub struct KarmaTotal {
    #[diesel(sql_type = Text)]
    #[serde(rename = "user__username")]
    pub username: String,
    #[diesel(sql_type = BigInt)]
    pub total_karma: i64,
}
