use std::fmt;

use serde::{Deserialize, Serialize};

pub const ACTOR_TYPE_USER: &str = "app.bsky.system.actorUser";
pub const ACTOR_TYPE_SCENE: &str = "app.bsky.system.actorScene";

macro_rules! string_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_newtype!(Did);
string_newtype!(Handle);
string_newtype!(Cid);
string_newtype!(AtUri);

impl AtUri {
    /// Splits `at://<repo>/<collection>/<rkey>` into its three parts.
    pub fn record_parts(&self) -> Option<(&str, &str, &str)> {
        let rest = self.0.strip_prefix("at://")?;
        let mut parts = rest.splitn(3, '/');
        let repo = parts.next().filter(|part| !part.is_empty())?;
        let collection = parts.next().filter(|part| !part.is_empty())?;
        let rkey = parts
            .next()
            .filter(|part| !part.is_empty() && !part.contains('/'))?;
        Some((repo, collection, rkey))
    }
}

/// Kind of actor named by a declaration reference.
///
/// Unknown tags are kept verbatim so a newer server does not break decoding.
/// The empty tag stands for "no declaration loaded yet".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActorType {
    User,
    Scene,
    Other(String),
}

impl ActorType {
    pub fn as_str(&self) -> &str {
        match self {
            ActorType::User => ACTOR_TYPE_USER,
            ActorType::Scene => ACTOR_TYPE_SCENE,
            ActorType::Other(raw) => raw,
        }
    }
}

impl Default for ActorType {
    fn default() -> Self {
        ActorType::Other(String::new())
    }
}

impl From<String> for ActorType {
    fn from(value: String) -> Self {
        match value.as_str() {
            ACTOR_TYPE_USER => ActorType::User,
            ACTOR_TYPE_SCENE => ActorType::Scene,
            _ => ActorType::Other(value),
        }
    }
}

impl From<ActorType> for String {
    fn from(value: ActorType) -> Self {
        match value {
            ActorType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
