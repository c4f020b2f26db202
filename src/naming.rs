//! Placeholder names for paths and groups created by the host.

use rand::rngs::StdRng;
use rand::seq::SliceRandom as _;
use rand::SeedableRng as _;

use crate::document::Document;
use crate::error::Error;

/// Nouns used for new paths and groups.
pub const NOUNS: [&str; 30] = [
    "anchor", "badger", "beacon", "canyon", "cedar", "comet", "delta", "ember", "falcon", "forest",
    "glacier", "harbor", "island", "jasper", "kestrel", "lagoon", "maple", "meadow", "nebula",
    "orchid", "otter", "pebble", "quartz", "raven", "river", "summit", "thistle", "tundra",
    "walnut", "willow",
];

/// Name used when a generator yields nothing usable.
const FALLBACK_NOUN: &str = "item";

/// Source of candidate names.
pub trait NameGenerator {
    /// The next candidate noun.
    fn next_noun(&mut self) -> String;
}

/// Picks nouns uniformly at random from a list.
#[derive(Debug, Clone)]
pub struct RandomNouns {
    /// Candidate nouns.
    nouns: Vec<String>,
    /// Random source.
    rng: StdRng,
}

impl RandomNouns {
    /// Random picks from the built-in list, seeded from the OS.
    pub fn new() -> Self {
        return Self { nouns: builtin_nouns(), rng: StdRng::from_entropy() };
    }

    /// Deterministic picks from the built-in list.
    pub fn seeded(seed: u64) -> Self {
        return Self { nouns: builtin_nouns(), rng: StdRng::seed_from_u64(seed) };
    }

    /// Deterministic picks from a custom list.
    pub fn with_nouns(nouns: Vec<String>, seed: u64) -> Self {
        return Self { nouns, rng: StdRng::seed_from_u64(seed) };
    }
}

impl Default for RandomNouns {
    fn default() -> Self {
        return Self::new();
    }
}

impl NameGenerator for RandomNouns {
    fn next_noun(&mut self) -> String {
        return self
            .nouns
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| return FALLBACK_NOUN.to_string());
    }
}

/// A name `taken` rejects for none of the generator's picks.
/// After as many misses as there are built-in nouns, numeric suffixes
/// (`noun-2`, `noun-3`, ...) are appended to the last pick.
pub fn unique_name(generator: &mut dyn NameGenerator, taken: impl Fn(&str) -> bool) -> String {
    let mut last = String::new();
    for _ in 0..NOUNS.len() {
        let noun = generator.next_noun();
        if !taken(&noun) {
            return noun;
        }
        last = noun;
    }
    if last.is_empty() {
        last = FALLBACK_NOUN.to_string();
    }
    let mut suffix: usize = 2;
    loop {
        let candidate = format!("{last}-{suffix}");
        if !taken(&candidate) {
            return candidate;
        }
        suffix = suffix.saturating_add(1);
    }
}

/// A subgroup name not used under `parent`.
///
/// # Errors
///
/// Returns `Error::GroupNotFound` if `parent` does not exist in the path tree.
pub fn unused_group_name<S: AsRef<str>>(
    document: &Document,
    parent: &[S],
    generator: &mut dyn NameGenerator,
) -> Result<String, Error> {
    let Some(files) = &document.component_files else {
        if parent.is_empty() {
            return Ok(unique_name(generator, |_| return false));
        }
        let components = parent.iter().map(|component| return component.as_ref().to_string()).collect();
        return Err(Error::GroupNotFound { components });
    };
    let group = files.paths.get(parent)?;
    return Ok(unique_name(generator, |name| return group.groups.contains_key(name)));
}

/// A document path (`/noun`) not yet in `document.paths`.
pub fn unused_path(document: &Document, generator: &mut dyn NameGenerator) -> String {
    let noun = unique_name(generator, |name| return document.paths.contains_key(&format!("/{name}")));
    return format!("/{noun}");
}

/// The built-in nouns as owned strings.
fn builtin_nouns() -> Vec<String> {
    return NOUNS.iter().map(|noun| return (*noun).to_string()).collect();
}
