use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::{
    models::karma::{KarmaTotal, KarmaTransaction},
    store::{Store, StoreError},
};

/// Top `limit` users by karma earned in the trailing `window` ending at
/// `now`. A transaction created exactly at `now - window` still counts.
#[tracing::instrument(skip(store))]
pub async fn get_leaderboard(
    store: &dyn Store,
    now: NaiveDateTime,
    window: TimeDelta,
    limit: usize,
) -> Result<Vec<KarmaTotal>, StoreError> {
    let since = window_start(now, window);
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    store.karma_totals_since(since, limit).await
}

/// `now - window`, clamped to the start of year 1 so an "all time" window
/// stays inside the range PostgreSQL timestamps accept.
pub fn window_start(now: NaiveDateTime, window: TimeDelta) -> NaiveDateTime {
    let earliest = NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN);

    now.checked_sub_signed(window)
        .filter(|since| *since > earliest)
        .unwrap_or(earliest)
}

/// In-process equivalent of the leaderboard query: keep entries created at or
/// after `since`, sum points per username, rank by total descending with ties
/// broken by username, and keep the first `limit`.
pub fn rank<'a, I>(ledger: I, since: NaiveDateTime, limit: usize) -> Vec<KarmaTotal>
where
    I: IntoIterator<Item = (&'a str, &'a KarmaTransaction)>,
{
    let mut totals = HashMap::<&str, i64>::new();
    for (username, transaction) in ledger {
        if transaction.created_at >= since {
            *totals.entry(username).or_default() += i64::from(transaction.points);
        }
    }

    let mut ranked: Vec<KarmaTotal> = totals
        .into_iter()
        .map(|(username, total_karma)| KarmaTotal {
            username: username.to_owned(),
            total_karma,
        })
        .collect();

    ranked.sort_unstable_by(|a, b| {
        b.total_karma
            .cmp(&a.total_karma)
            .then_with(|| a.username.cmp(&b.username))
    });
    ranked.truncate(limit);

    ranked
}
