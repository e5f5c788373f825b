//! Engagement aggregation
//!
//! Pure functions over already-fetched records: chronological ordering,
//! per-person grouping on glasswork pages, the founder engagements shown by
//! search, map points and the person timeline.

use std::collections::HashMap;

use serde::Serialize;

use crate::dates::{format_event_date, format_period};
use crate::models::{
    ApproxDate, BiographicalEvent, DatePrecision, Engagement, EngagementKind, Function, Glasswork,
    GlassworkRef, Id, PersonRef,
};

/// Sort position of a start date: unknown year and month go last
pub fn sort_key(date: &ApproxDate) -> (i32, u32) {
    (
        date.known_year().unwrap_or(9999),
        date.month.filter(|m| *m != 0).unwrap_or(13),
    )
}

/// Stable ascending sort on start date
pub fn sort_chronologically(engagements: &mut [Engagement]) {
    engagements.sort_by_key(|e| sort_key(&e.start));
}

/// One engagement as listed under a person
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementSummary {
    pub engagement_id: String,
    pub function: Option<String>,
    pub period: String,
    pub start_year: Option<i32>,
    pub start_month: Option<u32>,
}

/// A person and their engagements at one glasswork, oldest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonEngagements {
    pub person: PersonRef,
    pub engagements: Vec<EngagementSummary>,
}

/// Group the engagements of one role category by person
///
/// Groups appear in the order of each person's earliest engagement. Every
/// engagement of the requested category lands in exactly one group.
pub fn group_by_person(engagements: &[Engagement], kind: EngagementKind) -> Vec<PersonEngagements> {
    let mut matching: Vec<Engagement> = engagements
        .iter()
        .filter(|e| e.kind == kind)
        .cloned()
        .collect();
    sort_chronologically(&mut matching);

    let mut index: HashMap<Id, usize> = HashMap::new();
    let mut groups: Vec<PersonEngagements> = Vec::new();

    for engagement in matching {
        let summary = EngagementSummary {
            engagement_id: engagement.id.clone(),
            function: engagement.function.as_ref().map(|f| f.name.clone()),
            period: format_period(&engagement.start, &engagement.end),
            start_year: engagement.start.known_year(),
            start_month: engagement.start.month,
        };
        let slot = *index.entry(engagement.person.id).or_insert_with(|| {
            groups.push(PersonEngagements {
                person: engagement.person.clone(),
                engagements: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].engagements.push(summary);
    }

    groups
}

/// Synthetic personality-role engagement for the founder of a glasswork
///
/// Starts at the glasswork's structured start when it has a year, else at
/// its approximate founding year tagged circa. Founders have no end date.
pub fn founder_engagement(person: &PersonRef, glasswork: &Glasswork) -> Engagement {
    let period = &glasswork.period;
    let start = if period.start.known_year().is_some() {
        period.start
    } else if let Some(year) = period.founded_approx.filter(|y| *y != 0) {
        ApproxDate::with_precision(year, DatePrecision::Circa)
    } else {
        ApproxDate::default()
    };

    Engagement {
        id: format!("fondateur-{}", glasswork.id),
        glasswork: glasswork.to_ref(),
        person: person.clone(),
        kind: EngagementKind::PersonalityRole,
        function: Some(Function {
            id: 0,
            name: "Fondateur".to_string(),
        }),
        start,
        end: ApproxDate::default(),
        description: None,
        admin_title: None,
    }
}

/// Engagement shown in a map popup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapEngagement {
    pub function: Option<String>,
    pub period: String,
    pub kind_label: String,
}

/// Glasswork marker on a map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub id: Id,
    pub slug: Option<String>,
    pub name: String,
    /// `[longitude, latitude]`
    pub coordinates: [f64; 2],
    pub town: Option<String>,
    pub place_name: Option<String>,
    pub engagements: Vec<MapEngagement>,
}

impl MapPoint {
    /// Marker for a glasswork, `None` when its place has no coordinates
    pub fn for_glasswork(glasswork: &GlassworkRef) -> Option<Self> {
        let place = glasswork.place.as_ref()?;
        let coordinates = place.coordinates?;
        Some(Self {
            id: glasswork.id,
            slug: glasswork.slug.clone(),
            name: glasswork.name.clone(),
            coordinates,
            town: place.town.clone(),
            place_name: place.name.clone(),
            engagements: Vec::new(),
        })
    }
}

/// Map markers for a person's professional path, one per glasswork
pub fn group_by_glasswork(engagements: &[Engagement]) -> Vec<MapPoint> {
    let mut index: HashMap<Id, usize> = HashMap::new();
    let mut points: Vec<MapPoint> = Vec::new();

    for engagement in engagements {
        let slot = match index.get(&engagement.glasswork.id) {
            Some(slot) => *slot,
            None => match MapPoint::for_glasswork(&engagement.glasswork) {
                Some(point) => {
                    points.push(point);
                    index.insert(engagement.glasswork.id, points.len() - 1);
                    points.len() - 1
                }
                None => continue,
            },
        };
        points[slot].engagements.push(MapEngagement {
            function: engagement.function.as_ref().map(|f| f.name.clone()),
            period: format_period(&engagement.start, &engagement.end),
            kind_label: engagement.kind.label().to_string(),
        });
    }

    points
}

/// Source of a timeline entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineKind {
    Engagement,
    Event,
}

/// Entry of the person timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineItem {
    pub kind: TimelineKind,
    /// (year, month, day)
    pub sort_key: (i32, u32, u32),
    pub axis_title: String,
    pub card_title: String,
    pub subtitle: Option<String>,
    pub link: Option<String>,
    pub detail: Option<String>,
}

fn engagement_item(engagement: &Engagement) -> TimelineItem {
    let period = format_period(&engagement.start, &engagement.end);
    let glasswork = &engagement.glasswork;
    let name = if glasswork.name.trim().is_empty() {
        "Verrerie non spécifiée"
    } else {
        glasswork.name.as_str()
    };
    let subtitle = match glasswork.place.as_ref().and_then(|p| p.display_name()) {
        Some(location) => format!("{} ({})", name, location),
        None => name.to_string(),
    };

    TimelineItem {
        kind: TimelineKind::Engagement,
        sort_key: (
            engagement.start.known_year().unwrap_or(1),
            engagement.start.month.filter(|m| *m != 0).unwrap_or(1),
            1,
        ),
        axis_title: if period.is_empty() {
            "Période inconnue".to_string()
        } else {
            period
        },
        card_title: engagement
            .function
            .as_ref()
            .map(|f| f.name.clone())
            .unwrap_or_else(|| "Rôle non spécifié".to_string()),
        subtitle: Some(subtitle),
        link: glasswork.slug.as_ref().map(|slug| format!("/verreries/{}", slug)),
        detail: engagement.description.clone().filter(|d| !d.is_empty()),
    }
}

fn event_item(event: &BiographicalEvent) -> TimelineItem {
    let date = &event.date;
    let axis_title = event
        .date_text
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| format_event_date(date));
    let subtitle = event.place.as_ref().and_then(|p| {
        p.name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(p.town.as_deref())
            .map(str::to_string)
    });

    TimelineItem {
        kind: TimelineKind::Event,
        sort_key: (
            date.year.filter(|y| *y != 0).unwrap_or(9999),
            date.month.filter(|m| *m != 0).unwrap_or(1),
            date.day.filter(|d| *d != 0).unwrap_or(1),
        ),
        axis_title,
        card_title: event
            .kind
            .map(|k| k.label().to_string())
            .unwrap_or_else(|| "Événement".to_string()),
        subtitle,
        link: None,
        detail: event.description.clone().filter(|d| !d.is_empty()),
    }
}

/// Merge engagements and life events into one ascending timeline
pub fn build_timeline(
    engagements: &[Engagement],
    events: &[BiographicalEvent],
) -> Vec<TimelineItem> {
    let mut items: Vec<TimelineItem> = engagements
        .iter()
        .map(engagement_item)
        .chain(events.iter().map(event_item))
        .collect();
    items.sort_by_key(|item| item.sort_key);
    items
}
