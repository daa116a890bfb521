//! Board list pipeline: category filter, then text search, then sort.
//!
//! Every stage takes the previous stage's output plus the current control
//! value and is recomputed on each call.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::models::post::{Post, PostCategory, PostQuery};

pub const ALL_CATEGORIES_LABEL: &str = "전체";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortType {
    Recommend,
    #[default]
    Recent,
}

impl SortType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "recommend" => Some(Self::Recommend),
            "recent" => Some(Self::Recent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(PostCategory),
}

impl CategoryFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "" | ALL_CATEGORIES_LABEL | "all" => Some(Self::All),
            other => PostCategory::parse(other).map(Self::Only),
        }
    }

    pub fn matches(&self, category: PostCategory) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == category,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingQuery {
    pub category: CategoryFilter,
    pub search: String,
    pub sort: SortType,
}

impl ListingQuery {
    /// Unknown category or sort values are rejected rather than ignored.
    pub fn from_query(query: &PostQuery) -> Option<Self> {
        let category = match query.category.as_deref() {
            Some(value) => CategoryFilter::parse(value)?,
            None => CategoryFilter::All,
        };
        let sort = match query.sort.as_deref() {
            Some(value) => SortType::parse(value)?,
            None => SortType::default(),
        };

        Some(Self {
            category,
            search: query.search.clone().unwrap_or_default(),
            sort,
        })
    }
}

pub fn filter_by_category(posts: Vec<Post>, filter: CategoryFilter) -> Vec<Post> {
    if filter == CategoryFilter::All {
        return posts;
    }
    posts
        .into_iter()
        .filter(|post| filter.matches(post.category))
        .collect()
}

/// Case-insensitive substring match against title or author. A blank query
/// keeps everything.
pub fn filter_by_search(posts: Vec<Post>, query: &str) -> Vec<Post> {
    if query.trim().is_empty() {
        return posts;
    }
    let needle = query.to_lowercase();
    posts
        .into_iter()
        .filter(|post| {
            post.title.to_lowercase().contains(&needle)
                || post.author.to_lowercase().contains(&needle)
        })
        .collect()
}

pub fn sort_posts(mut posts: Vec<Post>, sort: SortType) -> Vec<Post> {
    match sort {
        SortType::Recommend => rank_desc_by(&mut posts, |post| post.recommends),
        // Unparsable dates sort after every dated post.
        SortType::Recent => rank_desc_by(&mut posts, |post| post.timestamp()),
    }
    posts
}

pub fn apply(posts: Vec<Post>, query: &ListingQuery) -> Vec<Post> {
    let posts = filter_by_category(posts, query.category);
    let posts = filter_by_search(posts, &query.search);
    sort_posts(posts, query.sort)
}

/// Stable descending sort: equal keys keep their input order.
pub fn rank_desc_by<T, K, F>(items: &mut [T], key: F)
where
    K: Ord,
    F: Fn(&T) -> K,
{
    items.sort_by_key(|item| Reverse(key(item)));
}

/// Parses RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.fff]`, or a bare date
/// (taken as midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: u64, category: PostCategory, title: &str, author: &str, date: &str, recommends: u64) -> Post {
        Post {
            id,
            category,
            title: title.to_string(),
            author: author.to_string(),
            date: date.to_string(),
            views: 0,
            recommends,
            comments: 0,
            content: None,
            user_id: None,
        }
    }

    fn ids(posts: &[Post]) -> Vec<u64> {
        posts.iter().map(|p| p.id).collect()
    }

    #[test]
    fn recent_sort_orders_by_date_descending() {
        let posts = vec![
            post(1, PostCategory::Tip, "a", "x", "2024-01-01", 0),
            post(2, PostCategory::Tip, "b", "x", "2024-03-01", 0),
            post(3, PostCategory::Tip, "c", "x", "2024-02-01", 0),
        ];

        let sorted = sort_posts(posts, SortType::Recent);
        let dates: Vec<&str> = sorted.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-02-01", "2024-01-01"]);
    }

    #[test]
    fn recommend_sort_orders_by_count_descending() {
        let posts = vec![
            post(1, PostCategory::Tip, "a", "x", "2024-01-01", 5),
            post(2, PostCategory::Tip, "b", "x", "2024-01-01", 1),
            post(3, PostCategory::Tip, "c", "x", "2024-01-01", 3),
        ];

        let sorted = sort_posts(posts, SortType::Recommend);
        let counts: Vec<u64> = sorted.iter().map(|p| p.recommends).collect();
        assert_eq!(counts, vec![5, 3, 1]);
    }

    #[test]
    fn sort_is_stable_on_ties() {
        let posts = vec![
            post(10, PostCategory::Tip, "a", "x", "2024-01-01", 2),
            post(11, PostCategory::Tip, "b", "x", "2024-01-01", 2),
            post(12, PostCategory::Tip, "c", "x", "2024-01-01", 2),
        ];

        assert_eq!(ids(&sort_posts(posts.clone(), SortType::Recommend)), vec![10, 11, 12]);
        assert_eq!(ids(&sort_posts(posts, SortType::Recent)), vec![10, 11, 12]);
    }

    #[test]
    fn mixed_date_formats_compare_as_timestamps() {
        let posts = vec![
            post(1, PostCategory::Tip, "a", "x", "2024-02-01", 0),
            post(2, PostCategory::Tip, "b", "x", "2024-02-01T09:30:00.000Z", 0),
            post(3, PostCategory::Tip, "c", "x", "not a date", 0),
        ];

        assert_eq!(ids(&sort_posts(posts, SortType::Recent)), vec![2, 1, 3]);
    }

    #[test]
    fn category_filter_keeps_exact_matches_only() {
        let posts = vec![
            post(1, PostCategory::Tip, "a", "x", "2024-01-01", 0),
            post(2, PostCategory::Question, "b", "x", "2024-01-01", 0),
            post(3, PostCategory::Free, "c", "x", "2024-01-01", 0),
            post(4, PostCategory::Question, "d", "x", "2024-01-01", 0),
        ];

        let filter = CategoryFilter::parse("질문").unwrap();
        let filtered = filter_by_category(posts.clone(), filter);
        assert_eq!(ids(&filtered), vec![2, 4]);
        assert!(filtered.iter().all(|p| p.category == PostCategory::Question));

        let all = filter_by_category(posts, CategoryFilter::parse("전체").unwrap());
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn search_matches_title_or_author_case_insensitively() {
        let posts = vec![
            post(1, PostCategory::Tip, "ABC route", "kim", "2024-01-01", 0),
            post(2, PostCategory::Tip, "smoke lineups", "xAbCx", "2024-01-01", 0),
            post(3, PostCategory::Tip, "recoil", "lee", "2024-01-01", 0),
        ];

        assert_eq!(ids(&filter_by_search(posts.clone(), "abc")), vec![1, 2]);
        assert_eq!(ids(&filter_by_search(posts, "   ")), vec![1, 2, 3]);
    }

    #[test]
    fn pipeline_runs_filter_then_search_then_sort() {
        let posts = vec![
            post(1, PostCategory::Question, "abc one", "x", "2024-01-01", 1),
            post(2, PostCategory::Tip, "abc two", "x", "2024-01-02", 9),
            post(3, PostCategory::Question, "abc three", "x", "2024-01-03", 4),
            post(4, PostCategory::Question, "other", "x", "2024-01-04", 7),
        ];

        let query = ListingQuery {
            category: CategoryFilter::Only(PostCategory::Question),
            search: "ABC".to_string(),
            sort: SortType::Recommend,
        };
        assert_eq!(ids(&apply(posts, &query)), vec![3, 1]);
    }

    #[test]
    fn query_parsing_rejects_unknown_values() {
        let query = PostQuery {
            category: Some("팁".to_string()),
            search: None,
            sort: Some("recommend".to_string()),
        };
        let parsed = ListingQuery::from_query(&query).unwrap();
        assert_eq!(parsed.category, CategoryFilter::Only(PostCategory::Tip));
        assert_eq!(parsed.sort, SortType::Recommend);

        let bad = PostQuery {
            category: Some("공지".to_string()),
            ..Default::default()
        };
        assert!(ListingQuery::from_query(&bad).is_none());
    }
}
