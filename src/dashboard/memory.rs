//! In-memory dashboard source
//!
//! Holds the site collections in process and answers reads with the same
//! filters and orderings as the Postgres source. Used by tests and local
//! demos where no database is available.

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::{
    BlogPost, ContactMessage, Event, EventRegistration, Portfolio, RegistrationStatus, Service,
    Testimonial,
};

use super::error::StoreError;
use super::source::{
    start_of_day, DashboardSource, DashboardView, RegistrationCounts, ServicePopularity,
    ACTIVITY_SOURCE_LIMIT, BLOG_CHART_LIMIT, NEXT_EVENTS_LIMIT,
};

#[derive(Debug, Default)]
struct Collections {
    contacts: Vec<ContactMessage>,
    events: Vec<Event>,
    registrations: Vec<EventRegistration>,
    posts: Vec<BlogPost>,
    testimonials: Vec<Testimonial>,
    services: Vec<Service>,
    portfolios: Vec<Portfolio>,
}

/// Dashboard source over in-process collections
#[derive(Debug, Default)]
pub struct MemorySource {
    data: RwLock<Collections>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_contact(&self, contact: ContactMessage) {
        self.write().contacts.push(contact);
    }

    pub fn add_event(&self, event: Event) {
        self.write().events.push(event);
    }

    pub fn add_registration(&self, registration: EventRegistration) {
        self.write().registrations.push(registration);
    }

    pub fn add_post(&self, post: BlogPost) {
        self.write().posts.push(post);
    }

    pub fn add_testimonial(&self, testimonial: Testimonial) {
        self.write().testimonials.push(testimonial);
    }

    pub fn add_service(&self, service: Service) {
        self.write().services.push(service);
    }

    pub fn add_portfolio(&self, portfolio: Portfolio) {
        self.write().portfolios.push(portfolio);
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Collections> {
        // A panic while holding the lock cannot leave a Vec half-pushed
        self.data.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Collections> {
        self.data.read().unwrap_or_else(|e| e.into_inner())
    }
}

fn take<T: Clone>(items: Vec<&T>, limit: i64) -> Vec<T> {
    items
        .into_iter()
        .take(limit as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl DashboardSource for MemorySource {
    async fn read_view(&self, today: NaiveDate) -> Result<DashboardView, StoreError> {
        let data = self.read();
        let today_start = start_of_day(today);

        let distinct_client_emails = data
            .contacts
            .iter()
            .map(|c| c.email.as_str())
            .collect::<HashSet<_>>()
            .len() as i64;

        let distinct_companies = data
            .contacts
            .iter()
            .filter_map(|c| c.company_name.as_deref().map(str::trim))
            .filter(|name| !name.is_empty())
            .collect::<HashSet<_>>()
            .len() as i64;

        let mut upcoming: Vec<&Event> = data
            .events
            .iter()
            .filter(|e| e.date >= today_start && e.is_upcoming)
            .collect();
        upcoming.sort_by_key(|e| (e.date, e.id));

        let published: Vec<&BlogPost> = data.posts.iter().filter(|p| p.is_published).collect();
        let average_published_read_time = if published.is_empty() {
            None
        } else {
            let total: i64 = published.iter().map(|p| i64::from(p.read_time)).sum();
            Some(Decimal::from(total) / Decimal::from(published.len()))
        };

        let mut latest_published = published.clone();
        latest_published.sort_by(|a, b| {
            b.published_date
                .cmp(&a.published_date)
                .then(b.id.cmp(&a.id))
        });

        let mut ordered_testimonials: Vec<&Testimonial> = data.testimonials.iter().collect();
        ordered_testimonials.sort_by_key(|t| t.id);

        let mut services: Vec<&Service> = data.services.iter().collect();
        services.sort_by_key(|s| s.id);
        let services = services
            .into_iter()
            .map(|service| ServicePopularity {
                title: service.title.clone(),
                portfolio_count: data
                    .portfolios
                    .iter()
                    .filter(|p| p.service_id == Some(service.id))
                    .count() as i64,
                testimonial_count: data
                    .testimonials
                    .iter()
                    .filter(|t| t.service_id == Some(service.id))
                    .count() as i64,
            })
            .collect();

        let mut newest_posts: Vec<&BlogPost> = data.posts.iter().collect();
        newest_posts.sort_by(|a, b| b.created_date.cmp(&a.created_date).then(b.id.cmp(&a.id)));

        let mut newest_events: Vec<&Event> = data.events.iter().collect();
        newest_events.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));

        let mut newest_testimonials = ordered_testimonials.clone();
        newest_testimonials.reverse();

        let mut registrations = RegistrationCounts::default();
        for registration in &data.registrations {
            match registration.status {
                RegistrationStatus::Pending => registrations.pending += 1,
                RegistrationStatus::Confirmed => registrations.confirmed += 1,
                RegistrationStatus::Cancelled => registrations.cancelled += 1,
            }
        }

        Ok(DashboardView {
            distinct_client_emails,
            distinct_companies,
            upcoming_event_count: upcoming.len() as i64,
            next_events: take(upcoming, NEXT_EVENTS_LIMIT),
            published_post_count: published.len() as i64,
            average_published_read_time,
            ratings: ordered_testimonials.iter().map(|t| t.rating).collect(),
            services,
            latest_published_posts: take(latest_published, BLOG_CHART_LIMIT),
            newest_posts: take(newest_posts, ACTIVITY_SOURCE_LIMIT),
            newest_events: take(newest_events, ACTIVITY_SOURCE_LIMIT),
            newest_testimonials: take(newest_testimonials, ACTIVITY_SOURCE_LIMIT),
            registrations,
        })
    }
}
