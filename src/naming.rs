//! Identifier derivation: PascalCase conversion plus abbreviation fix-ups.
//!
//! Two substitution tables are consulted, always in the same order: the
//! built-in abbreviations first, then the caller's pairs. Within each table
//! longer keys are tried before shorter ones (ties broken lexicographically),
//! so the result never depends on hash order. A user pair whose key is also
//! built in never fires.

use convert_case::{Case, Casing};
use once_cell::sync::Lazy;
use regex::Regex;

const BUILTIN_REPLACEMENTS: &[(&str, &str)] = &[
    ("Id", "ID"),
    ("Http", "HTTP"),
    ("Https", "HTTPS"),
    ("Api", "API"),
    ("Url", "URL"),
    ("Json", "JSON"),
    ("Xml", "XML"),
    ("Html", "HTML"),
];

static WORD_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("static regex"));

#[derive(Debug, Clone)]
pub struct Naming {
    builtin: Vec<(String, String)>,
    user: Vec<(String, String)>,
}

impl Default for Naming {
    fn default() -> Self {
        Self::new(std::iter::empty::<(String, String)>())
    }
}

impl Naming {
    pub fn new<I, K, V>(user: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let builtin: Vec<(String, String)> = BUILTIN_REPLACEMENTS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let user = user
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| !k.is_empty() && !builtin.iter().any(|(b, _)| b == k))
            .collect();
        Self {
            builtin: ordered(builtin),
            user: ordered(user),
        }
    }

    fn rules(&self) -> impl Iterator<Item = (&str, &str)> {
        self.builtin
            .iter()
            .chain(self.user.iter())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Convert a raw name (title, property key, ...) into a type identifier.
    pub fn to_identifier(&self, raw: &str) -> String {
        let word = pascal(raw);
        if word.is_empty() {
            return word;
        }

        for (from, to) in self.rules() {
            if let Some(stem) = word.strip_suffix(from) {
                return format!("{stem}{to}");
            }
        }

        let mut word = word;
        for (from, to) in self.rules() {
            if let Some(rest) = word.strip_prefix(from) {
                // `Identity` keeps its `Id`; only whole leading words match
                if rest.chars().next().is_none_or(|c| !c.is_lowercase()) {
                    word = format!("{to}{rest}");
                }
            }
        }
        word
    }
}

fn ordered(mut table: Vec<(String, String)>) -> Vec<(String, String)> {
    table.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    table
}

fn pascal(raw: &str) -> String {
    let spaced = WORD_BREAK.replace_all(raw, " ");
    spaced.trim().to_case(Case::Pascal)
}

/// Plural of a bare type name, used to name otherwise anonymous arrays.
pub fn plural(name: &str) -> String {
    if name.ends_with('s') {
        format!("{name}es")
    } else {
        format!("{name}s")
    }
}

/// File stem for a generated type: `UserID` → `user_id`.
pub fn file_stem(type_name: &str) -> String {
    type_name.to_case(Case::Snake)
}
