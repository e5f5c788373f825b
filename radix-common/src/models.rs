//! Content model
//!
//! Records as stored in the content store and handed to the pages. Relations
//! are carried already populated (`PersonRef`, `GlassworkRef`, `Place`) so the
//! rendering code never goes back to the store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record identifier (SQLite rowid)
pub type Id = i64;

// ========================================
// Dates
// ========================================

/// Precision tag attached to an engagement or activity-period year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatePrecision {
    #[serde(rename = "AnneeSeuleExacte")]
    ExactYear,
    #[serde(rename = "CircaAnnee")]
    Circa,
    #[serde(rename = "ApresAnnee")]
    After,
    #[serde(rename = "AvantAnnee")]
    Before,
    #[serde(rename = "MoisAnneeExacts")]
    ExactMonthYear,
}

impl DatePrecision {
    /// Stored tag value
    pub fn as_str(&self) -> &'static str {
        match self {
            DatePrecision::ExactYear => "AnneeSeuleExacte",
            DatePrecision::Circa => "CircaAnnee",
            DatePrecision::After => "ApresAnnee",
            DatePrecision::Before => "AvantAnnee",
            DatePrecision::ExactMonthYear => "MoisAnneeExacts",
        }
    }

    /// Parse a stored tag. Unknown tags yield `None` and format as a plain year.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "AnneeSeuleExacte" => Some(DatePrecision::ExactYear),
            "CircaAnnee" => Some(DatePrecision::Circa),
            "ApresAnnee" => Some(DatePrecision::After),
            "AvantAnnee" => Some(DatePrecision::Before),
            "MoisAnneeExacts" => Some(DatePrecision::ExactMonthYear),
            _ => None,
        }
    }
}

/// Year with optional month and a precision tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproxDate {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub precision: Option<DatePrecision>,
}

impl ApproxDate {
    pub fn year(year: i32) -> Self {
        Self {
            year: Some(year),
            month: None,
            precision: Some(DatePrecision::ExactYear),
        }
    }

    pub fn with_precision(year: i32, precision: DatePrecision) -> Self {
        Self {
            year: Some(year),
            month: None,
            precision: Some(precision),
        }
    }

    pub fn month_year(year: i32, month: u32) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
            precision: Some(DatePrecision::ExactMonthYear),
        }
    }

    /// A year of 0 counts as absent
    pub fn known_year(&self) -> Option<i32> {
        self.year.filter(|y| *y != 0)
    }
}

/// Precision tag of a biographical event date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPrecision {
    #[serde(rename = "JourMoisAnneeExacts")]
    ExactDayMonthYear,
    #[serde(rename = "MoisAnneeExacts")]
    ExactMonthYear,
    #[serde(rename = "AnneeSeuleExacte")]
    ExactYear,
    #[serde(rename = "CircaAnnee")]
    Circa,
    #[serde(rename = "AvantDate")]
    Before,
    #[serde(rename = "ApresDate")]
    After,
}

impl EventPrecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventPrecision::ExactDayMonthYear => "JourMoisAnneeExacts",
            EventPrecision::ExactMonthYear => "MoisAnneeExacts",
            EventPrecision::ExactYear => "AnneeSeuleExacte",
            EventPrecision::Circa => "CircaAnnee",
            EventPrecision::Before => "AvantDate",
            EventPrecision::After => "ApresDate",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "JourMoisAnneeExacts" => Some(EventPrecision::ExactDayMonthYear),
            "MoisAnneeExacts" => Some(EventPrecision::ExactMonthYear),
            "AnneeSeuleExacte" => Some(EventPrecision::ExactYear),
            "CircaAnnee" => Some(EventPrecision::Circa),
            "AvantDate" => Some(EventPrecision::Before),
            "ApresDate" => Some(EventPrecision::After),
            _ => None,
        }
    }
}

/// Structured date of a biographical event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDate {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub day: Option<u32>,
    #[serde(default)]
    pub precision: Option<EventPrecision>,
}

// ========================================
// Closed vocabularies
// ========================================

/// Declares a closed select vocabulary with its stored value and French label.
macro_rules! vocabulary {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:literal, $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            /// Stored select value
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }

            /// Display label
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Parse a stored select value
            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($value => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

vocabulary! {
    /// Role category of an engagement
    EngagementKind {
        PersonalityRole => "role_personnalite", "Rôle",
        CraftOccupation => "metier_verrier", "Métier",
    }
}

vocabulary! {
    /// Present-day status of a glasswork
    GlassworkStatus {
        Active => "enActivite", "En activité",
        ClosedPermanently => "fermeeDefinitivement", "Fermée définitivement",
        ClosedTemporarily => "fermeeTemporairement", "Fermée temporairement",
        Ruins => "enRuines", "En ruines",
        Disappeared => "disparueSansVestiges", "Disparue (sans vestiges visibles)",
        Converted => "convertie", "Convertie (autre usage)",
    }
}

vocabulary! {
    /// Principal role of a notable person
    PrincipalRole {
        Founder => "fondateur", "Fondateur",
        Director => "directeur", "Directeur",
        MasterGlassmaker => "maitre_verrerie", "Maître de Verrerie",
        Owner => "proprietaire", "Propriétaire",
        Partner => "associe", "Associé",
        Engineer => "ingenieur", "Ingénieur",
        Other => "autre", "Autre",
    }
}

vocabulary! {
    /// Kind of dated life event
    BiographicalEventKind {
        Birth => "naissance", "Naissance",
        Baptism => "bapteme", "Baptême",
        Marriage => "mariage", "Mariage",
        Death => "deces", "Décès",
        Burial => "inhumation", "Inhumation/Sépulture",
        RecordMention => "mention_acte", "Mention dans un acte",
        Other => "autre", "Autre événement marquant",
    }
}

vocabulary! {
    /// Kind of long-form story
    StoryKind {
        GlassworkGroup => "groupe_verreries", "Histoire d'un groupe de verreries",
        Adventure => "aventure_verriere", "Histoire d'une aventure verrière",
        Dynasty => "dynastie_verriere", "Histoire d'une dynastie verrière",
        Region => "region_verriere", "Histoire d'une ville ou région",
    }
}

// ========================================
// Places and functions
// ========================================

/// Normalized location record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: Id,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// `[longitude, latitude]`
    #[serde(default)]
    pub coordinates: Option<[f64; 2]>,
}

impl Place {
    /// Town first, then the place name
    pub fn display_name(&self) -> Option<&str> {
        self.town
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.name.as_deref().filter(|s| !s.is_empty()))
    }

    /// Town, region and country joined for the detail sidebar
    pub fn full_label(&self) -> String {
        [
            self.name.as_deref(),
            self.town.as_deref(),
            self.region.as_deref(),
            self.country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Named function (craft occupation or personality role)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub id: Id,
    pub name: String,
}

// ========================================
// People
// ========================================

/// Populated reference to a person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: Id,
    #[serde(default)]
    pub slug: Option<String>,
    pub name: String,
}

/// Glassmaker or notable figure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: Id,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub birth_date_text: Option<String>,
    #[serde(default)]
    pub birth_place: Option<Place>,
    #[serde(default)]
    pub death_date_text: Option<String>,
    #[serde(default)]
    pub death_place: Option<Place>,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub death_year: Option<i32>,
    #[serde(default)]
    pub principal_role: Option<PrincipalRole>,
    #[serde(default)]
    pub specialisation: Option<String>,
    #[serde(default)]
    pub main_activity_period: Option<String>,
    #[serde(default)]
    pub biography: Option<Value>,
}

impl Person {
    pub fn display_name(&self) -> String {
        if let Some(full) = self.full_name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            return full.to_string();
        }
        let joined = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let joined = joined.trim();
        if joined.is_empty() {
            "Verrier inconnu".to_string()
        } else {
            joined.to_string()
        }
    }

    pub fn to_ref(&self) -> PersonRef {
        PersonRef {
            id: self.id,
            slug: self.slug.clone(),
            name: self.display_name(),
        }
    }
}

// ========================================
// Glassworks
// ========================================

/// Populated reference to a glasswork, with its place for map and timeline use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlassworkRef {
    pub id: Id,
    #[serde(default)]
    pub slug: Option<String>,
    pub name: String,
    #[serde(default)]
    pub place: Option<Place>,
}

/// Historical name variant with its validity period
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalName {
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub validity_period: Option<String>,
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub end_year: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl HistoricalName {
    /// Start year, else the leading year of the validity period text, else 0
    pub fn sort_year(&self) -> i32 {
        self.start_year.filter(|y| *y != 0).unwrap_or_else(|| {
            self.validity_period
                .as_deref()
                .and_then(|p| p.split('-').next())
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(0)
        })
    }
}

/// Activity period of a glasswork
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityPeriod {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub founded_approx: Option<i32>,
    #[serde(default)]
    pub closed_approx: Option<i32>,
    #[serde(default)]
    pub start: ApproxDate,
    #[serde(default)]
    pub end: ApproxDate,
}

impl ActivityPeriod {
    /// Free text, else approximate bounds ("env. 1820 - ...")
    pub fn display(&self) -> Option<String> {
        if let Some(text) = self.text.as_deref().filter(|t| !t.trim().is_empty()) {
            return Some(text.to_string());
        }
        if self.founded_approx.is_none() && self.closed_approx.is_none() {
            return None;
        }
        Some(format!(
            "env. {} - {}",
            self.founded_approx
                .map(|y| y.to_string())
                .unwrap_or_else(|| "?".to_string()),
            self.closed_approx
                .map(|y| y.to_string())
                .unwrap_or_else(|| "...".to_string()),
        ))
    }
}

/// Image or document attached to a record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub id: Option<Id>,
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub caption: Option<String>,
}

/// Bibliographic source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub publication_details: Option<String>,
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Historical glass-manufacturing establishment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Glasswork {
    pub id: Id,
    #[serde(default)]
    pub slug: Option<String>,
    pub name: String,
    #[serde(default)]
    pub historical_names: Vec<HistoricalName>,
    #[serde(default)]
    pub period: ActivityPeriod,
    #[serde(default)]
    pub status: Option<GlassworkStatus>,
    #[serde(default)]
    pub status_notes: Option<String>,
    #[serde(default)]
    pub place: Option<Place>,
    #[serde(default)]
    pub history: Option<Value>,
    #[serde(default)]
    pub techniques: Option<String>,
    #[serde(default)]
    pub social_aspects: Option<Value>,
    #[serde(default)]
    pub media: Vec<Media>,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub founders: Vec<PersonRef>,
    #[serde(default)]
    pub production_types: Vec<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Glasswork {
    pub fn to_ref(&self) -> GlassworkRef {
        GlassworkRef {
            id: self.id,
            slug: self.slug.clone(),
            name: self.name.clone(),
            place: self.place.clone(),
        }
    }

    /// Historical names ordered by start year
    pub fn sorted_historical_names(&self) -> Vec<HistoricalName> {
        let mut names = self.historical_names.clone();
        names.sort_by_key(HistoricalName::sort_year);
        names
    }
}

// ========================================
// Engagements and events
// ========================================

/// Link between a person and a glasswork with a role and a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    /// Synthetic founder engagements carry a string id ("fondateur-<id>")
    pub id: String,
    pub glasswork: GlassworkRef,
    pub person: PersonRef,
    pub kind: EngagementKind,
    #[serde(default)]
    pub function: Option<Function>,
    #[serde(default)]
    pub start: ApproxDate,
    #[serde(default)]
    pub end: ApproxDate,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub admin_title: Option<String>,
}

/// Dated life event of a person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiographicalEvent {
    pub id: Id,
    pub person_id: Id,
    #[serde(default)]
    pub kind: Option<BiographicalEventKind>,
    #[serde(default)]
    pub date_text: Option<String>,
    #[serde(default)]
    pub date: EventDate,
    #[serde(default)]
    pub place: Option<Place>,
    #[serde(default)]
    pub description: Option<String>,
}

// ========================================
// Free-form content
// ========================================

/// Long-form narrative with relations to people and glassworks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: Id,
    #[serde(default)]
    pub slug: Option<String>,
    pub title: String,
    #[serde(default)]
    pub kind: Option<StoryKind>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub featured_image: Option<Media>,
    #[serde(default)]
    pub related_people: Vec<PersonRef>,
    #[serde(default)]
    pub related_glassworks: Vec<GlassworkRef>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Free-form site page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: Id,
    #[serde(default)]
    pub slug: Option<String>,
    pub title: String,
    #[serde(default)]
    pub content: Option<Value>,
}
