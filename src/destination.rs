use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Id reported when the user dismissed a chooser without picking anything.
pub const CANCELLED: &str = "cancelled";

/// A social network composer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SocialNetwork {
    Twitter,
    Facebook,
    SinaWeibo,
    TencentWeibo,
}

impl SocialNetwork {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocialNetwork::Twitter => "twitter",
            SocialNetwork::Facebook => "facebook",
            SocialNetwork::SinaWeibo => "sina-weibo",
            SocialNetwork::TencentWeibo => "tencent-weibo",
        }
    }
}

/// A channel content can be shared through.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Destination {
    Text,
    Email,
    Pasteboard,
    PhotoLibrary,
    Chooser,
    Social(SocialNetwork),
}

impl Destination {
    pub const ALL: [Destination; 9] = [
        Destination::Text,
        Destination::Email,
        Destination::Pasteboard,
        Destination::PhotoLibrary,
        Destination::Chooser,
        Destination::Social(SocialNetwork::Twitter),
        Destination::Social(SocialNetwork::Facebook),
        Destination::Social(SocialNetwork::SinaWeibo),
        Destination::Social(SocialNetwork::TencentWeibo),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Text => "text",
            Destination::Email => "email",
            Destination::Pasteboard => "pasteboard",
            Destination::PhotoLibrary => "photo-library",
            Destination::Chooser => "chooser",
            Destination::Social(network) => network.as_str(),
        }
    }

    pub fn id(&self) -> DestinationId {
        DestinationId::from(*self)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Destination {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Destination::ALL
            .iter()
            .find(|d| d.as_str() == s)
            .copied()
            .ok_or_else(|| Error::InvalidArgs(format!("Unknown share destination: {}", s)))
    }
}

impl TryFrom<String> for Destination {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Destination> for String {
    fn from(destination: Destination) -> Self {
        destination.as_str().to_string()
    }
}

/// The destination a result is attributed to.
///
/// This is a string rather than a [`Destination`] because a chooser reports
/// whatever activity the host picked, which may be outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(String);

impl DestinationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn cancelled() -> Self {
        Self(CANCELLED.to_string())
    }

    pub fn is_cancelled(&self) -> bool {
        self.0 == CANCELLED
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Destination> for DestinationId {
    fn from(destination: Destination) -> Self {
        Self(destination.as_str().to_string())
    }
}

impl From<String> for DestinationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for DestinationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl PartialEq<&str> for DestinationId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reads host state to tell whether a destination can be used right now.
///
/// Implementations must not cache: permissions and installed apps can change
/// between two share attempts. Anything the host cannot answer is `false`.
pub trait CapabilityProbe: Send + Sync {
    fn is_available(&self, destination: Destination) -> bool;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationStatus {
    pub destination: Destination,
    pub available: bool,
}

/// Enumerates destinations and answers capability queries.
#[derive(Clone)]
pub struct DestinationRegistry {
    probe: Arc<dyn CapabilityProbe>,
}

impl DestinationRegistry {
    pub fn new(probe: Arc<dyn CapabilityProbe>) -> Self {
        Self { probe }
    }

    pub fn destinations(&self) -> &'static [Destination] {
        &Destination::ALL
    }

    pub fn capability(&self, destination: Destination) -> bool {
        match destination {
            // Writing to the pasteboard cannot be refused.
            Destination::Pasteboard => true,
            _ => self.probe.is_available(destination),
        }
    }

    pub fn statuses(&self) -> Vec<DestinationStatus> {
        self.destinations()
            .iter()
            .map(|&destination| DestinationStatus {
                destination,
                available: self.capability(destination),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct CountingProbe {
        available: Mutex<HashSet<Destination>>,
        calls: AtomicUsize,
    }

    impl CapabilityProbe for CountingProbe {
        fn is_available(&self, destination: Destination) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.available.lock().unwrap().contains(&destination)
        }
    }

    #[test]
    fn ids_round_trip_through_from_str() {
        for destination in Destination::ALL {
            let parsed: Destination = destination.as_str().parse().unwrap();
            assert_eq!(parsed, destination);
        }
        assert!("myspace".parse::<Destination>().is_err());
    }

    #[test]
    fn destination_serializes_as_its_id() {
        let json = serde_json::to_string(&Destination::Social(SocialNetwork::SinaWeibo)).unwrap();
        assert_eq!(json, "\"sina-weibo\"");
        let back: Destination = serde_json::from_str("\"photo-library\"").unwrap();
        assert_eq!(back, Destination::PhotoLibrary);
    }

    #[test]
    fn pasteboard_is_always_available_without_asking_the_host() {
        let probe = Arc::new(CountingProbe::default());
        let registry = DestinationRegistry::new(probe.clone());
        assert!(registry.capability(Destination::Pasteboard));
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn capability_is_re_evaluated_on_every_call() {
        let probe = Arc::new(CountingProbe::default());
        let registry = DestinationRegistry::new(probe.clone());

        assert!(!registry.capability(Destination::Email));
        probe.available.lock().unwrap().insert(Destination::Email);
        assert!(registry.capability(Destination::Email));
        probe.available.lock().unwrap().clear();
        assert!(!registry.capability(Destination::Email));
        assert_eq!(probe.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn statuses_cover_every_destination() {
        let probe = Arc::new(CountingProbe::default());
        probe.available.lock().unwrap().insert(Destination::Chooser);
        let registry = DestinationRegistry::new(probe);

        let statuses = registry.statuses();
        assert_eq!(statuses.len(), Destination::ALL.len());
        let available: Vec<_> = statuses
            .iter()
            .filter(|s| s.available)
            .map(|s| s.destination)
            .collect();
        assert_eq!(available, vec![Destination::Pasteboard, Destination::Chooser]);
    }

    #[test]
    fn cancellation_sentinel_is_distinct_from_every_destination() {
        assert!(DestinationId::cancelled().is_cancelled());
        for destination in Destination::ALL {
            assert!(!destination.id().is_cancelled());
        }
    }
}
