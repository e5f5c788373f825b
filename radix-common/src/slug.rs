//! Slug and name hooks
//!
//! Applied when records are saved. URLs are derived from names, and an
//! existing slug survives an update that blanks every name field.

/// Turn arbitrary text into a URL slug
///
/// Lowercase ASCII, diacritics transliterated, punctuation dropped, runs of
/// separators collapsed into a single hyphen.
///
/// # Examples
/// ```
/// use radix_common::slug::slugify;
///
/// assert_eq!(slugify("Château d'Eau!"), "chateau-d-eau");
/// assert_eq!(slugify(&slugify("Château d'Eau!")), "chateau-d-eau");
/// ```
pub fn slugify(text: &str) -> String {
    ::slug::slugify(text)
}

/// Name fields a record offers to the slug hook
#[derive(Debug, Clone, Copy, Default)]
pub struct NameFields<'a> {
    /// Slug typed by the editor, if any
    pub explicit_slug: Option<&'a str>,
    /// Single name field (glasswork main name, page or story title)
    pub name: Option<&'a str>,
    /// Full name of a person
    pub full_name: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
}

impl<'a> NameFields<'a> {
    /// Best available name: name > full name > "first last"
    fn source(&self) -> Option<String> {
        if let Some(name) = non_blank(self.name) {
            return Some(name.to_string());
        }
        if let Some(full) = non_blank(self.full_name) {
            return Some(full.to_string());
        }
        let first = non_blank(self.first_name);
        let last = non_blank(self.last_name);
        if first.is_none() && last.is_none() {
            return None;
        }
        let joined = format!("{} {}", first.unwrap_or(""), last.unwrap_or(""));
        Some(joined.trim().to_string())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Compute the slug to store for a record being saved
///
/// An explicit slug is re-slugified. Otherwise the best available name is
/// used. When no name is available the existing slug is returned unchanged,
/// and `None` means the record has nothing to derive a slug from.
pub fn resolve_slug(fields: &NameFields<'_>, existing_slug: Option<&str>) -> Option<String> {
    if let Some(explicit) = non_blank(fields.explicit_slug) {
        let slug = slugify(explicit);
        if !slug.is_empty() {
            return Some(slug);
        }
    }

    match fields.source() {
        Some(source) => {
            let slug = slugify(&source);
            if slug.is_empty() {
                existing_slug.map(str::to_string)
            } else {
                Some(slug)
            }
        }
        None => existing_slug
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    }
}

/// Full name hook for people: explicit value, else "first last"
pub fn derive_full_name(
    explicit: Option<&str>,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> Option<String> {
    if let Some(full) = non_blank(explicit) {
        return Some(full.to_string());
    }
    let joined = format!(
        "{} {}",
        non_blank(first_name).unwrap_or(""),
        non_blank(last_name).unwrap_or("")
    );
    let joined = joined.trim();
    if joined.is_empty() {
        None
    } else {
        Some(joined.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_strips_diacritics_and_punctuation() {
        assert_eq!(slugify("Château d'Eau!"), "chateau-d-eau");
        assert_eq!(slugify("Verrerie de Saint-Louis-lès-Bitche"), "verrerie-de-saint-louis-les-bitche");
        assert_eq!(slugify("  Éloïse   Müller  "), "eloise-muller");
    }

    #[test]
    fn test_slugify_is_idempotent() {
        for input in ["Château d'Eau!", "Cristallerie (1764)", "a--b__c", "déjà-vu"] {
            let once = slugify(input);
            assert_eq!(slugify(&once), once, "input: {}", input);
        }
    }

    #[test]
    fn test_resolve_slug_prefers_explicit_value() {
        let fields = NameFields {
            explicit_slug: Some("Mon Slug"),
            name: Some("Autre nom"),
            ..Default::default()
        };
        assert_eq!(resolve_slug(&fields, None).as_deref(), Some("mon-slug"));
    }

    #[test]
    fn test_resolve_slug_name_priority() {
        let fields = NameFields {
            name: Some("Verrerie de Portieux"),
            full_name: Some("Ignored"),
            ..Default::default()
        };
        assert_eq!(resolve_slug(&fields, None).as_deref(), Some("verrerie-de-portieux"));

        let fields = NameFields {
            full_name: Some("Jean Guillaume"),
            first_name: Some("Ignored"),
            ..Default::default()
        };
        assert_eq!(resolve_slug(&fields, None).as_deref(), Some("jean-guillaume"));

        let fields = NameFields {
            first_name: Some("Jean"),
            last_name: Some("Guillaume"),
            ..Default::default()
        };
        assert_eq!(resolve_slug(&fields, None).as_deref(), Some("jean-guillaume"));

        let fields = NameFields {
            last_name: Some("Guillaume"),
            ..Default::default()
        };
        assert_eq!(resolve_slug(&fields, None).as_deref(), Some("guillaume"));
    }

    #[test]
    fn test_resolve_slug_keeps_existing_when_names_blank() {
        let fields = NameFields {
            name: Some("   "),
            ..Default::default()
        };
        assert_eq!(
            resolve_slug(&fields, Some("ancien-slug")).as_deref(),
            Some("ancien-slug")
        );
        assert_eq!(resolve_slug(&NameFields::default(), None), None);
    }

    #[test]
    fn test_derive_full_name() {
        assert_eq!(
            derive_full_name(Some(" Jean-Baptiste "), Some("Jean"), Some("Guillaume")).as_deref(),
            Some("Jean-Baptiste")
        );
        assert_eq!(
            derive_full_name(None, Some("Jean"), Some("Guillaume")).as_deref(),
            Some("Jean Guillaume")
        );
        assert_eq!(derive_full_name(Some(""), None, None), None);
    }
}
