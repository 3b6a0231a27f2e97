//! Dashboard Snapshot
//!
//! The structured result of one tick, built from a [`DashboardView`] without
//! any further I/O. Every field is a plain serde-serializable value; dates are
//! pre-formatted text so the payload never carries a type the frontend cannot
//! parse.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{BlogPost, Event, Rating, Testimonial};

use super::source::{DashboardView, RegistrationCounts};

/// Wire format for dates in the payload
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Entries kept in the merged activity feed
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Blog chart labels longer than this are cut and suffixed with "..."
pub const CHART_LABEL_MAX_CHARS: usize = 30;

/// One tick's worth of dashboard data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Distinct email addresses across contact messages
    pub total_clients: i64,

    #[serde(rename = "upcoming_events")]
    pub upcoming_event_count: i64,

    #[serde(rename = "total_posts")]
    pub published_post_count: i64,

    /// Mean testimonial rating to one decimal, 0 when there are none
    #[serde(rename = "avg_rating", with = "rust_decimal::serde::float")]
    pub average_rating: Decimal,

    pub stats_details: StatsDetails,

    #[serde(rename = "services_data")]
    pub services_chart: ChartData<i64>,

    #[serde(rename = "blog_data")]
    pub blog_chart: ChartData<i32>,

    #[serde(rename = "ratings_data")]
    pub rating_distribution: RatingDistribution,

    pub recent_activity: Vec<ActivityEntry>,

    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsDetails {
    pub total_ratings: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_read_time: Decimal,
    pub next_events: Vec<NextEvent>,
    pub unique_companies: i64,
    pub registrations: RegistrationCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextEvent {
    pub title: String,
    pub date: String,
    pub location: String,
    pub event_type: String,
}

/// Parallel label/value arrays, as consumed by the chart widgets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartData<T> {
    pub labels: Vec<String>,
    pub values: Vec<T>,
}

/// Rating histogram: `[<=1, (1,2], (2,3], (3,4], (4,5]]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RatingDistribution {
    pub values: [u64; 5],
}

impl RatingDistribution {
    pub fn from_ratings(ratings: &[Rating]) -> Self {
        let mut values = [0u64; 5];
        for rating in ratings {
            values[rating.bucket()] += 1;
        }
        Self { values }
    }

    pub fn total(&self) -> u64 {
        self.values.iter().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActivityKind {
    #[serde(rename = "Blog Post")]
    BlogPost,
    Event,
    Testimonial,
}

/// Severity tag the frontend maps to a badge color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Success,
    Warning,
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEntry {
    /// Sort key; only the formatted `date` goes on the wire
    #[serde(skip)]
    pub timestamp: DateTime<Utc>,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub description: String,
    pub status: String,
    pub status_color: StatusColor,
}

impl ActivityEntry {
    fn from_post(post: &BlogPost) -> Self {
        let (status, status_color) = if post.is_published {
            ("Published", StatusColor::Success)
        } else {
            ("Draft", StatusColor::Warning)
        };
        Self {
            timestamp: post.created_date,
            date: format_date(post.created_date),
            kind: ActivityKind::BlogPost,
            description: post.title.clone(),
            status: status.to_string(),
            status_color,
        }
    }

    fn from_event(event: &Event) -> Self {
        let (status, status_color) = if event.is_upcoming {
            ("Upcoming", StatusColor::Primary)
        } else {
            ("Past", StatusColor::Secondary)
        };
        Self {
            timestamp: event.date,
            date: format_date(event.date),
            kind: ActivityKind::Event,
            description: event.title.clone(),
            status: status.to_string(),
            status_color,
        }
    }

    /// Testimonials have no creation time; they are stamped with the tick time.
    fn from_testimonial(testimonial: &Testimonial, now: DateTime<Utc>) -> Self {
        Self {
            timestamp: now,
            date: format_date(now),
            kind: ActivityKind::Testimonial,
            description: format!("New review from {}", testimonial.client_name),
            status: format!("{}★", testimonial.rating),
            status_color: StatusColor::Warning,
        }
    }
}

pub fn format_date(date: DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Cut a chart label to [`CHART_LABEL_MAX_CHARS`] characters plus "...".
pub fn truncate_label(title: &str) -> String {
    if title.chars().count() > CHART_LABEL_MAX_CHARS {
        let head: String = title.chars().take(CHART_LABEL_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}

/// Mean rating rounded to one decimal (banker's rounding), 0 when empty.
pub fn average_rating(ratings: &[Rating]) -> Decimal {
    if ratings.is_empty() {
        return Decimal::ZERO;
    }
    let total: Decimal = ratings.iter().map(Rating::value).sum();
    (total / Decimal::from(ratings.len())).round_dp(1)
}

/// Merge the three activity sources, newest first. The sort is stable, so
/// entries with equal timestamps keep source order: posts, events,
/// testimonials.
pub fn merge_activity(view: &DashboardView, now: DateTime<Utc>) -> Vec<ActivityEntry> {
    let mut activity: Vec<ActivityEntry> = view
        .newest_posts
        .iter()
        .map(ActivityEntry::from_post)
        .chain(view.newest_events.iter().map(ActivityEntry::from_event))
        .chain(
            view.newest_testimonials
                .iter()
                .map(|t| ActivityEntry::from_testimonial(t, now)),
        )
        .collect();

    activity.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    activity.truncate(RECENT_ACTIVITY_LIMIT);
    activity
}

impl Snapshot {
    /// Build the snapshot for a view read at `now`.
    ///
    /// Pure: the same view and `now` always produce the same snapshot.
    pub fn from_view(view: &DashboardView, now: DateTime<Utc>) -> Self {
        let next_events = view
            .next_events
            .iter()
            .map(|event| NextEvent {
                title: event.title.clone(),
                date: format_date(event.date),
                location: event.location.clone(),
                event_type: event.event_type.label().to_string(),
            })
            .collect();

        let services_chart = ChartData {
            labels: view.services.iter().map(|s| s.title.clone()).collect(),
            values: view.services.iter().map(|s| s.score()).collect(),
        };

        let blog_chart = ChartData {
            labels: view
                .latest_published_posts
                .iter()
                .map(|p| truncate_label(&p.title))
                .collect(),
            values: view
                .latest_published_posts
                .iter()
                .map(|p| p.read_time)
                .collect(),
        };

        Self {
            total_clients: view.distinct_client_emails,
            upcoming_event_count: view.upcoming_event_count,
            published_post_count: view.published_post_count,
            average_rating: average_rating(&view.ratings),
            stats_details: StatsDetails {
                total_ratings: view.ratings.len() as i64,
                avg_read_time: view
                    .average_published_read_time
                    .map(|avg| avg.round_dp(1))
                    .unwrap_or(Decimal::ZERO),
                next_events,
                unique_companies: view.distinct_companies,
                registrations: view.registrations,
            },
            services_chart,
            blog_chart,
            rating_distribution: RatingDistribution::from_ratings(&view.ratings),
            recent_activity: merge_activity(view, now),
            generated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::source::ServicePopularity;
    use crate::domain::EventType;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn ratings(values: &[&str]) -> Vec<Rating> {
        values.iter().map(|v| v.parse().unwrap()).collect()
    }

    fn post(id: i64, title: &str, created: DateTime<Utc>, is_published: bool) -> BlogPost {
        BlogPost {
            id,
            title: title.to_string(),
            read_time: 4,
            is_published,
            created_date: created,
            published_date: created,
        }
    }

    fn event(id: i64, date: DateTime<Utc>, is_upcoming: bool) -> Event {
        Event {
            id,
            title: format!("Event {}", id),
            date,
            location: "Online".to_string(),
            is_upcoming,
            event_type: EventType::Webinar,
            created_at: date,
        }
    }

    #[test]
    fn test_average_rating_empty_is_zero() {
        assert_eq!(average_rating(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_rating_scenario() {
        let ratings = ratings(&["1", "1", "2.5", "4", "5"]);
        assert_eq!(average_rating(&ratings), dec!(2.7));
        let distribution = RatingDistribution::from_ratings(&ratings);
        assert_eq!(distribution.values, [2, 1, 0, 1, 1]);
        assert_eq!(distribution.total(), 5);
    }

    #[test]
    fn test_average_rating_bankers_rounding() {
        // 4.25 rounds to the even neighbour
        assert_eq!(average_rating(&ratings(&["4", "4.5"])), dec!(4.2));
        // 4.35 -> 4.4
        assert_eq!(average_rating(&ratings(&["4.2", "4.5"])), dec!(4.4));
    }

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("Short title"), "Short title");
        let exact = "a".repeat(30);
        assert_eq!(truncate_label(&exact), exact);
        let long = "How we migrated a monolith to services";
        assert_eq!(truncate_label(long), "How we migrated a monolith to ...");
        assert_eq!(truncate_label(&"é".repeat(31)), format!("{}...", "é".repeat(30)));
    }

    #[test]
    fn test_activity_merge_sorted_and_capped() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        let view = DashboardView {
            newest_posts: vec![
                post(3, "Third", now - Duration::hours(1), true),
                post(2, "Second", now - Duration::days(2), false),
                post(1, "First", now - Duration::days(9), true),
            ],
            newest_events: vec![
                event(7, now + Duration::days(5), true),
                event(6, now - Duration::days(1), false),
                event(5, now - Duration::days(30), false),
            ],
            ..Default::default()
        };

        let activity = merge_activity(&view, now);

        assert_eq!(activity.len(), RECENT_ACTIVITY_LIMIT);
        assert!(activity.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        let descriptions: Vec<&str> = activity.iter().map(|a| a.description.as_str()).collect();
        assert_eq!(descriptions, vec!["Event 7", "Third", "Event 6", "Second", "First"]);
        assert_eq!(activity[0].status, "Upcoming");
        assert_eq!(activity[0].status_color, StatusColor::Primary);
        assert_eq!(activity[3].status, "Draft");
        assert_eq!(activity[3].status_color, StatusColor::Warning);
    }

    #[test]
    fn test_testimonials_stamped_with_now_and_ties_keep_source_order() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        let view = DashboardView {
            newest_posts: vec![post(1, "Same minute", now, true)],
            newest_testimonials: vec![Testimonial {
                id: 4,
                client_name: "Linus".to_string(),
                rating: "4.5".parse().unwrap(),
                service_id: None,
            }],
            ..Default::default()
        };

        let activity = merge_activity(&view, now);

        assert_eq!(activity[0].kind, ActivityKind::BlogPost);
        assert_eq!(activity[1].kind, ActivityKind::Testimonial);
        assert_eq!(activity[1].description, "New review from Linus");
        assert_eq!(activity[1].status, "4.5★");
        assert_eq!(activity[1].date, "2026-06-01 12:00");
    }

    #[test]
    fn test_snapshot_serializes_wire_shape() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 30, 0).unwrap();
        let view = DashboardView {
            distinct_client_emails: 12,
            upcoming_event_count: 1,
            next_events: vec![event(1, now + Duration::days(1), true)],
            published_post_count: 1,
            average_published_read_time: Some(dec!(6.25)),
            ratings: ratings(&["5"]),
            services: vec![ServicePopularity {
                title: "Data Platforms".to_string(),
                portfolio_count: 2,
                testimonial_count: 1,
            }],
            latest_published_posts: vec![post(1, "Launch", now, true)],
            newest_posts: vec![post(1, "Launch", now, true)],
            ..Default::default()
        };

        let json = serde_json::to_value(Snapshot::from_view(&view, now)).unwrap();

        assert_eq!(json["total_clients"], 12);
        assert_eq!(json["upcoming_events"], 1);
        assert_eq!(json["total_posts"], 1);
        assert_eq!(json["avg_rating"], 5.0);
        assert_eq!(json["stats_details"]["avg_read_time"], 6.2);
        assert_eq!(json["stats_details"]["total_ratings"], 1);
        assert_eq!(json["stats_details"]["next_events"][0]["date"], "2026-06-02 09:30");
        assert_eq!(json["stats_details"]["next_events"][0]["event_type"], "Webinar");
        assert_eq!(json["services_data"]["labels"][0], "Data Platforms");
        assert_eq!(json["services_data"]["values"][0], 3);
        assert_eq!(json["blog_data"]["values"][0], 4);
        assert_eq!(json["ratings_data"]["values"], serde_json::json!([0, 0, 0, 0, 1]));
        assert_eq!(json["recent_activity"][0]["type"], "Blog Post");
        assert_eq!(json["recent_activity"][0]["status_color"], "success");
        assert!(json["recent_activity"][0].get("timestamp").is_none());
    }
}
