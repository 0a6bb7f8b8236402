//! Host input configuration
//!
//! The host hands the widget a target entity, an archive flag, and an
//! optional delimiter-separated entity list the user may switch between.
//! Everything here is forgiving: parsing trims and skips rather than
//! rejecting, and resolution falls back in a fixed order.

use serde::{Deserialize, Serialize};

/// Configuration supplied by the host at construction/update time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Logical name of the entity to load first. May be empty when
    /// `entity_options` supplies the choices.
    pub target_entity: String,
    /// Read from the long-term retention store where supported.
    pub is_archive: bool,
    /// Raw `logical[:display]` list, delimited by comma, semicolon, or
    /// newline.
    pub entity_options: Option<String>,
    /// Authoritative primary-key attribute for record-identity resolution.
    /// When unset, the `<entity>id` / `id` probe order is used instead.
    pub primary_key_field: Option<String>,
}

impl ControlConfig {
    pub fn new(target_entity: impl Into<String>) -> Self {
        ControlConfig {
            target_entity: target_entity.into(),
            ..ControlConfig::default()
        }
    }

    /// Parsed entity options, empty when none were supplied.
    pub fn options(&self) -> Vec<EntityOption> {
        parse_entity_options(self.entity_options.as_deref().unwrap_or(""))
    }

    /// The entity to load on mount: the configured target, else the first
    /// option, else none (a configuration failure the caller must log).
    pub fn resolve_target(&self) -> Option<String> {
        let target = self.target_entity.trim();
        if !target.is_empty() {
            return Some(target.to_owned());
        }
        self.options().into_iter().next().map(|o| o.logical_name)
    }

    /// Map a selection back to its canonical logical name. Matching is
    /// case-insensitive on logical or display name; an unmatched input is
    /// used verbatim.
    pub fn canonicalize_entity(&self, input: &str) -> String {
        let input = input.trim();
        self.options()
            .into_iter()
            .find(|option| option.matches(input))
            .map(|option| option.logical_name)
            .unwrap_or_else(|| input.to_owned())
    }

    /// The configured primary-key attribute, normalized; `None` keeps the
    /// naming-convention fallbacks.
    pub fn primary_key_override(&self) -> Option<String> {
        self.primary_key_field
            .as_deref()
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(str::to_owned)
    }

    /// Fields to probe when matching a grid row against a record id.
    pub fn primary_key_candidates(&self, entity: &str) -> Vec<String> {
        match self.primary_key_override() {
            Some(field) => vec![field],
            None => vec![format!("{entity}id"), "id".to_owned()],
        }
    }
}

/// One user-selectable target entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityOption {
    pub logical_name: String,
    pub display_name: Option<String>,
}

impl EntityOption {
    /// Text shown to the user: the display name when present.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.logical_name)
    }

    fn matches(&self, input: &str) -> bool {
        input.eq_ignore_ascii_case(&self.logical_name)
            || self
                .display_name
                .as_deref()
                .is_some_and(|display| input.eq_ignore_ascii_case(display))
    }
}

/// Parse a `logical[:display]` list separated by commas, semicolons, or
/// newlines. Empty segments are skipped; whitespace is trimmed everywhere.
pub fn parse_entity_options(raw: &str) -> Vec<EntityOption> {
    raw.split(|c| matches!(c, ',' | ';' | '\n'))
        .filter_map(|segment| {
            let segment = segment.trim();
            if segment.is_empty() {
                return None;
            }
            let (logical, display) = match segment.split_once(':') {
                Some((logical, display)) => (logical.trim(), Some(display.trim())),
                None => (segment, None),
            };
            if logical.is_empty() {
                return None;
            }
            Some(EntityOption {
                logical_name: logical.to_owned(),
                display_name: display.filter(|d| !d.is_empty()).map(str::to_owned),
            })
        })
        .collect()
}
