//! One-pass reductions over fetched rows.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, TimeZone, Utc};

use super::window::shift_month;
use crate::types::{CategoryCount, MonthCount, UNCATEGORIZED};

/// Month labels indexed by `month0()`.
pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Count achievements per category, highest first.
///
/// Missing and empty categories are counted as [`UNCATEGORIZED`]. The sort is
/// stable, so equal counts keep the order in which categories were first seen.
pub fn rank_categories<I>(categories: I) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = Option<String>>,
{
    let mut ranked: Vec<CategoryCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for category in categories {
        let category = category
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| UNCATEGORIZED.to_string());

        match index.get(&category) {
            Some(&i) => ranked[i].count += 1,
            None => {
                index.insert(category.clone(), ranked.len());
                ranked.push(CategoryCount { category, count: 1 });
            }
        }
    }

    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}

/// Percent of window days that have at least one daily win.
///
/// Days are distinct calendar dates in `tz`. The result is rounded to the
/// nearest integer and not clamped: clock or time-zone skew can push it past
/// 100 and that stays visible.
pub fn consistency_percent<Tz: TimeZone>(
    timestamps: &[DateTime<Utc>],
    tz: &Tz,
    window_days: i64,
) -> u32 {
    let unique_days: HashSet<_> = timestamps
        .iter()
        .map(|ts| ts.with_timezone(tz).date_naive())
        .collect();

    let days = window_days.max(1) as f64;
    let percent = (unique_days.len() as f64 / days * 100.0).round();
    if percent.is_finite() {
        percent as u32
    } else {
        0
    }
}

/// Achievement counts for the month of `now` and the two months before it.
///
/// All three months are seeded at zero; rows outside them are ignored. The
/// result is ordered oldest to newest.
pub fn monthly_progress<Tz: TimeZone>(
    timestamps: &[DateTime<Utc>],
    now: &DateTime<Tz>,
) -> Vec<MonthCount> {
    let tz = now.timezone();
    let months: Vec<(i32, u32)> = (0..3)
        .rev()
        .map(|back| shift_month(now.year(), now.month(), -back))
        .collect();
    let mut counts = [0u64; 3];

    for ts in timestamps {
        let local = ts.with_timezone(&tz);
        let key = (local.year(), local.month());
        if let Some(slot) = months.iter().position(|m| *m == key) {
            counts[slot] += 1;
        }
    }

    months
        .iter()
        .zip(counts)
        .map(|(&(_, month), count)| MonthCount {
            month: MONTH_NAMES[(month - 1) as usize].to_string(),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn ranks_by_count_descending() {
        let rows = vec![some("A"), some("A"), some("A"), some("B"), some("A")];
        let ranked = rank_categories(rows);
        assert_eq!(
            ranked,
            vec![
                CategoryCount {
                    category: "A".into(),
                    count: 4,
                },
                CategoryCount {
                    category: "B".into(),
                    count: 1,
                },
            ]
        );
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let rows = vec![
            some("Writing"),
            some("Speaking"),
            some("Speaking"),
            some("Writing"),
            some("Code"),
        ];
        let names: Vec<_> = rank_categories(rows).into_iter().map(|c| c.category).collect();
        assert_eq!(names, vec!["Writing", "Speaking", "Code"]);
    }

    #[test]
    fn missing_categories_become_uncategorized() {
        let ranked = rank_categories(vec![None, some(""), some("Ops")]);
        assert_eq!(ranked[0].category, UNCATEGORIZED);
        assert_eq!(ranked[0].count, 2);
        assert_eq!(ranked[1].category, "Ops");
    }

    #[test]
    fn empty_rows_rank_nothing() {
        assert!(rank_categories(Vec::new()).is_empty());
    }

    #[test]
    fn consistency_counts_distinct_days() {
        let wins = vec![
            ts(2024, 6, 1, 9),
            ts(2024, 6, 1, 17),
            ts(2024, 6, 3, 8),
            ts(2024, 6, 10, 12),
        ];
        assert_eq!(consistency_percent(&wins, &Utc, 30), 10);
    }

    #[test]
    fn consistency_uses_the_given_zone() {
        // 23:00 and 00:00 UTC fall on different UTC dates but the same date at UTC+2
        let wins = vec![ts(2024, 6, 1, 23), ts(2024, 6, 2, 0)];
        assert_eq!(consistency_percent(&wins, &Utc, 10), 20);

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(consistency_percent(&wins, &plus_two, 10), 10);
    }

    #[test]
    fn consistency_is_not_clamped() {
        let wins = vec![ts(2024, 6, 1, 9), ts(2024, 6, 2, 9), ts(2024, 6, 3, 9)];
        assert_eq!(consistency_percent(&wins, &Utc, 2), 150);
    }

    #[test]
    fn consistency_with_no_wins_is_zero() {
        assert_eq!(consistency_percent(&[], &Utc, 0), 0);
    }

    #[test]
    fn monthly_progress_seeds_three_months() {
        let now = ts(2024, 1, 20, 12);
        let rows = vec![
            ts(2023, 11, 2, 10),
            ts(2024, 1, 5, 10),
            ts(2024, 1, 6, 10),
            ts(2023, 10, 30, 10),
        ];
        let progress = monthly_progress(&rows, &now);
        assert_eq!(
            progress,
            vec![
                MonthCount {
                    month: "Nov".into(),
                    count: 1,
                },
                MonthCount {
                    month: "Dec".into(),
                    count: 0,
                },
                MonthCount {
                    month: "Jan".into(),
                    count: 2,
                },
            ]
        );
    }
}
