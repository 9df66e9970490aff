//! Composite user identifier codec
//!
//! A "full" user ID packs (location, class, user) into a single string of
//! the form `location-class-user`. A "simple" user ID is just the user
//! portion. The user portion may itself contain `-`, so decoding rejoins
//! everything after the first two fields.

/// The logical triple behind a user identifier string.
///
/// `location` and `class` are present only for composite identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeUserId {
    pub location: Option<String>,
    pub class: Option<String>,
    pub user: String,
}

impl CompositeUserId {
    /// Decode a user identifier string.
    ///
    /// Splits on `-`. With two or fewer fields the whole input is the user
    /// id (simple form). With more, the first field is the location, the
    /// second is the class, and the user is every remaining field rejoined
    /// with `-`. Location and class are trimmed of surrounding whitespace.
    ///
    /// Never fails: an empty input decodes to the simple form with an
    /// empty user.
    pub fn decode(id: &str) -> Self {
        let fields: Vec<&str> = if id.is_empty() {
            Vec::new()
        } else {
            id.split('-').collect()
        };

        if fields.len() <= 2 {
            return CompositeUserId {
                location: None,
                class: None,
                user: id.to_string(),
            };
        }

        CompositeUserId {
            location: Some(fields[0].trim().to_string()),
            class: Some(fields[1].trim().to_string()),
            user: fields[2..].join("-"),
        }
    }

    /// Encode a (location, class, user) triple as `location-class-user`.
    ///
    /// No escaping is performed: callers must ensure location and class do
    /// not themselves contain `-`, or the result will not decode back to
    /// the same triple. This mirrors the wire convention and is a known
    /// limitation of the format, not something to silently repair.
    pub fn encode(location: &str, class: &str, user: &str) -> String {
        format!("{}-{}-{}", location, class, user)
    }
}
