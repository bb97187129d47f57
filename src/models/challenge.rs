use crate::engine::ProgressionError;
use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

static PLACEHOLDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(goal|reward)\]").expect("Invalid placeholder regex"));

/// IDE activity that grants XP on every occurrence.
///
/// **Do not rename variants.** Their snake_case names are persisted event-count keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    Typing,
    Cut,
    Copy,
    Paste,
    Backspace,
    Tab,
    Enter,
    Save,
    Build,
    Run,
    Debug,
    Action,
}

impl Event {
    pub const ALL: [Event; 12] = [
        Event::Typing,
        Event::Cut,
        Event::Copy,
        Event::Paste,
        Event::Backspace,
        Event::Tab,
        Event::Enter,
        Event::Save,
        Event::Build,
        Event::Run,
        Event::Debug,
        Event::Action,
    ];

    /// XP granted for a single occurrence.
    pub fn xp_value(self) -> u64 {
        match self {
            Event::Typing => 2,
            Event::Cut | Event::Copy | Event::Paste | Event::Backspace => 1,
            Event::Tab | Event::Enter => 2,
            Event::Save => 10,
            Event::Build => 5,
            Event::Run => 10,
            Event::Debug => 20,
            Event::Action => 5,
        }
    }

    /// Stable lowercase key, used in ids and persisted records.
    pub fn as_str(self) -> &'static str {
        match self {
            Event::Typing => "typing",
            Event::Cut => "cut",
            Event::Copy => "copy",
            Event::Paste => "paste",
            Event::Backspace => "backspace",
            Event::Tab => "tab",
            Event::Enter => "enter",
            Event::Save => "save",
            Event::Build => "build",
            Event::Run => "run",
            Event::Debug => "debug",
            Event::Action => "action",
        }
    }

    /// Parse a key produced by [`Event::as_str`], ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Event> {
        Event::ALL
            .into_iter()
            .find(|event| event.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A one-time achievement. Catalog entries are never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub xp_reward: u64,
}

impl Challenge {
    /// Create a challenge whose display name is its id.
    pub fn new(id: impl Into<String>, xp_reward: u64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            xp_reward,
        }
    }

    /// Name for display, falling back to the id when no name was configured.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// A progressive series of challenges bound to one [`Event`].
///
/// Tier `n` (starting at 1) asks for `goal * n` occurrences counted after the
/// previous tier completed and rewards `reward_xp + (n - 1) * reward_xp_increment`.
/// Its challenge id is `"<event>-<n>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeTrack {
    pub event: Event,
    pub name: String,

    /// Template; `[goal]` and `[reward]` are replaced per tier.
    #[serde(default)]
    pub description: String,

    pub goal: u64,
    pub reward_xp: u64,

    #[serde(default)]
    pub reward_xp_increment: u64,
}

impl ChallengeTrack {
    pub fn tier_id(&self, tier: u64) -> String {
        format!("{}-{}", self.event.as_str(), tier)
    }

    /// Occurrences required by `tier` alone.
    pub fn tier_goal(&self, tier: u64) -> u64 {
        self.goal.saturating_mul(tier)
    }

    /// Total occurrences required to complete every tier up to `tier`.
    ///
    /// `None` when the count would overflow.
    pub fn cumulative_goal(&self, tier: u64) -> Option<u64> {
        let triangle = tier.checked_mul(tier.checked_add(1)?)? / 2;
        self.goal.checked_mul(triangle)
    }

    pub fn tier_reward(&self, tier: u64) -> u64 {
        self.reward_xp
            .saturating_add(tier.saturating_sub(1).saturating_mul(self.reward_xp_increment))
    }

    /// Render the description template for `tier`.
    pub fn describe(&self, tier: u64) -> String {
        PLACEHOLDER_PATTERN
            .replace_all(&self.description, |caps: &Captures| match &caps[1] {
                "goal" => self.tier_goal(tier).to_string(),
                _ => self.tier_reward(tier).to_string(),
            })
            .into_owned()
    }

    /// Materialize `tier` as a catalog challenge.
    pub fn tier(&self, tier: u64) -> Challenge {
        Challenge {
            id: self.tier_id(tier),
            name: self.name.clone(),
            description: self.describe(tier),
            xp_reward: self.tier_reward(tier),
        }
    }

    /// First tier of this track that is not yet in `completed`.
    pub fn next_tier(&self, completed: &BTreeSet<String>) -> u64 {
        let mut tier = 1;
        while completed.contains(&self.tier_id(tier)) {
            tier += 1;
        }
        tier
    }

    /// Number of consecutive tiers completed from tier 1.
    pub fn completed_tiers(&self, completed: &BTreeSet<String>) -> u64 {
        self.next_tier(completed) - 1
    }
}

/// Split a track tier id such as `"typing-3"` into its event and tier.
pub fn parse_tier_id(id: &str) -> Option<(Event, u64)> {
    let (event, tier) = id.rsplit_once('-')?;
    let event = Event::from_name(event)?;
    let tier = tier.parse::<u64>().ok().filter(|&tier| tier > 0)?;
    Some((event, tier))
}

/// Every challenge the engine knows about.
///
/// Static challenges are looked up by id first; ids of the form
/// `"<event>-<tier>"` then resolve against the event's [`ChallengeTrack`].
#[derive(Debug, Clone, Default)]
pub struct ChallengeCatalog {
    challenges: IndexMap<String, Challenge>,
    tracks: IndexMap<Event, ChallengeTrack>,
}

impl ChallengeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a static challenge, returning the entry it replaced.
    pub fn insert_challenge(&mut self, challenge: Challenge) -> Option<Challenge> {
        self.challenges.insert(challenge.id.clone(), challenge)
    }

    /// Add a track, returning the track previously bound to the same event.
    pub fn insert_track(&mut self, track: ChallengeTrack) -> Option<ChallengeTrack> {
        self.tracks.insert(track.event, track)
    }

    pub fn get(&self, id: &str) -> Option<Challenge> {
        if let Some(challenge) = self.challenges.get(id) {
            return Some(challenge.clone());
        }

        let (event, tier) = parse_tier_id(id)?;
        self.tracks.get(&event).map(|track| track.tier(tier))
    }

    /// Like [`get`](Self::get), but reports a missing id as an error.
    pub fn lookup(&self, id: &str) -> Result<Challenge, ProgressionError> {
        self.get(id)
            .ok_or_else(|| ProgressionError::UnknownChallengeId(id.to_string()))
    }

    pub fn track(&self, event: Event) -> Option<&ChallengeTrack> {
        self.tracks.get(&event)
    }

    pub fn challenges(&self) -> impl Iterator<Item = &Challenge> {
        self.challenges.values()
    }

    pub fn tracks(&self) -> impl Iterator<Item = &ChallengeTrack> {
        self.tracks.values()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty() && self.tracks.is_empty()
    }
}

/// Built-in progressive challenges, one per event.
pub fn default_tracks() -> Vec<ChallengeTrack> {
    let track = |event, name: &str, description: &str, goal, reward_xp, reward_xp_increment| {
        ChallengeTrack {
            event,
            name: name.to_string(),
            description: description.to_string(),
            goal,
            reward_xp,
            reward_xp_increment,
        }
    };

    vec![
        track(Event::Typing, "Typing Challenge", "Typing [goal] times.", 100, 100, 200),
        track(Event::Cut, "Cut Challenge", "Cut [goal] times.", 10, 100, 150),
        track(Event::Copy, "Copy Challenge", "Copy [goal] times.", 10, 100, 150),
        track(Event::Paste, "Paste Challenge", "Paste [goal] times.", 10, 100, 150),
        track(
            Event::Backspace,
            "Backspace Challenge",
            "Press the backspace key [goal] times.",
            50,
            100,
            150,
        ),
        track(Event::Tab, "Tab Challenge", "Press the tab key [goal] times.", 50, 100, 150),
        track(Event::Enter, "Enter Challenge", "Press the enter key [goal] times.", 10, 100, 200),
        track(Event::Save, "Save Challenge", "Save [goal] times.", 10, 300, 400),
        track(Event::Build, "Build Challenge", "Build [goal] times.", 10, 150, 200),
        track(Event::Run, "Run Challenge", "Run [goal] times.", 10, 200, 250),
        track(Event::Debug, "Debug Challenge", "Debug [goal] times.", 10, 300, 400),
        track(Event::Action, "Action Challenge", "Perform [goal] actions.", 20, 100, 120),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typing_track() -> ChallengeTrack {
        default_tracks()
            .into_iter()
            .find(|track| track.event == Event::Typing)
            .unwrap()
    }

    #[test]
    fn test_event_names_round_trip() {
        for event in Event::ALL {
            assert_eq!(Event::from_name(event.as_str()), Some(event));
        }
        assert_eq!(Event::from_name("BUILD"), Some(Event::Build));
        assert_eq!(Event::from_name("compile"), None);
    }

    #[test]
    fn test_track_tiers() {
        let track = typing_track();

        assert_eq!(track.tier_id(3), "typing-3");
        assert_eq!(track.tier_goal(3), 300);
        assert_eq!(track.cumulative_goal(1), Some(100));
        assert_eq!(track.cumulative_goal(3), Some(600));
        assert_eq!(track.tier_reward(1), 100);
        assert_eq!(track.tier_reward(3), 500);
        assert_eq!(track.cumulative_goal(u64::MAX), None);
    }

    #[test]
    fn test_describe_substitutes_placeholders() {
        let mut track = typing_track();
        assert_eq!(track.describe(2), "Typing 200 times.");

        track.description = "[goal] keys for [reward] XP, [unknown] stays".to_string();
        assert_eq!(track.describe(1), "100 keys for 100 XP, [unknown] stays");
    }

    #[test]
    fn test_next_tier() {
        let track = typing_track();
        let mut completed = BTreeSet::new();
        assert_eq!(track.next_tier(&completed), 1);

        completed.insert("typing-1".to_string());
        completed.insert("typing-2".to_string());
        completed.insert("typing-4".to_string());
        assert_eq!(track.next_tier(&completed), 3);
        assert_eq!(track.completed_tiers(&completed), 2);
    }

    #[test]
    fn test_parse_tier_id() {
        assert_eq!(parse_tier_id("typing-3"), Some((Event::Typing, 3)));
        assert_eq!(parse_tier_id("typing-0"), None);
        assert_eq!(parse_tier_id("typing"), None);
        assert_eq!(parse_tier_id("first-steps"), None);
    }

    #[test]
    fn test_catalog_lookup() {
        let mut catalog = ChallengeCatalog::new();
        catalog.insert_challenge(Challenge::new("first-steps", 50));
        catalog.insert_track(typing_track());

        assert_eq!(catalog.lookup("first-steps").unwrap().xp_reward, 50);

        let tier = catalog.lookup("typing-2").unwrap();
        assert_eq!(tier.xp_reward, 300);
        assert_eq!(tier.description, "Typing 200 times.");

        assert_eq!(
            catalog.lookup("build-1"),
            Err(ProgressionError::UnknownChallengeId("build-1".to_string()))
        );
        assert!(catalog.lookup("missing").is_err());
    }

    #[test]
    fn test_static_challenge_shadows_track_id() {
        let mut catalog = ChallengeCatalog::new();
        catalog.insert_track(typing_track());
        catalog.insert_challenge(Challenge::new("typing-1", 5));

        assert_eq!(catalog.lookup("typing-1").unwrap().xp_reward, 5);
    }

    #[test]
    fn test_default_tracks_cover_every_event() {
        let tracks = default_tracks();
        assert_eq!(tracks.len(), Event::ALL.len());
        for event in Event::ALL {
            assert!(tracks.iter().any(|track| track.event == event));
        }
    }
}
