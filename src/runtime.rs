use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::RuntimeError;

/// Length of a movie in whole minutes.
///
/// Externally a runtime is the string `"<N> mins"`: a base-10 integer, one
/// ASCII space and the literal `mins`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Runtime(pub i32);

impl Runtime {
    pub fn minutes(self) -> i32 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Decode a quoted JSON string such as `"\"102 mins\""`.
    ///
    /// The input must be exactly one quoted string, with nothing around it.
    pub fn from_json(raw: &str) -> Result<Self, RuntimeError> {
        if raw.len() < 2 || !raw.starts_with('"') || !raw.ends_with('"') {
            return Err(RuntimeError::InvalidFormat);
        }
        let body: String = serde_json::from_str(raw).map_err(|_| RuntimeError::InvalidFormat)?;
        body.parse()
    }

    /// Encode as a quoted JSON string.
    pub fn to_json(self) -> String {
        format!("\"{}\"", self)
    }
}

impl From<i32> for Runtime {
    fn from(minutes: i32) -> Self {
        Runtime(minutes)
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mins", self.0)
    }
}

impl FromStr for Runtime {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(' ').collect();
        if parts.len() != 2 || parts[1] != "mins" {
            return Err(RuntimeError::InvalidFormat);
        }

        parts[0]
            .parse::<i32>()
            .map(Runtime)
            .map_err(|_| RuntimeError::InvalidFormat)
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RuntimeVisitor;

        impl Visitor<'_> for RuntimeVisitor {
            type Value = Runtime;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string of the form \"<N> mins\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Runtime, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(RuntimeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Runtime(102).to_string(), "102 mins");
        assert_eq!(Runtime(-5).to_string(), "-5 mins");
        assert_eq!(Runtime(102).to_json(), "\"102 mins\"");
    }

    #[test]
    fn test_parse_valid() {
        assert_eq!("102 mins".parse::<Runtime>(), Ok(Runtime(102)));
        assert_eq!("0 mins".parse::<Runtime>(), Ok(Runtime(0)));
        assert_eq!("-7 mins".parse::<Runtime>(), Ok(Runtime(-7)));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in [
            "102",
            "102 minutes",
            "102 mins extra",
            "102  mins",
            "abc mins",
            " mins",
            "1.5 mins",
            "2147483648 mins",
            "",
        ] {
            assert_eq!(
                input.parse::<Runtime>(),
                Err(RuntimeError::InvalidFormat),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_json_requires_quotes() {
        assert_eq!(Runtime::from_json("\"90 mins\""), Ok(Runtime(90)));
        assert_eq!(Runtime::from_json("90 mins"), Err(RuntimeError::InvalidFormat));
        assert_eq!(Runtime::from_json("90"), Err(RuntimeError::InvalidFormat));
        assert_eq!(Runtime::from_json("\"90 mins"), Err(RuntimeError::InvalidFormat));
        assert_eq!(Runtime::from_json("\""), Err(RuntimeError::InvalidFormat));
        for padded in ["  \"90 mins\"\n", " \"90 mins\"", "\"90 mins\"\t"] {
            assert_eq!(
                Runtime::from_json(padded),
                Err(RuntimeError::InvalidFormat),
                "{padded:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_json_roundtrip_at_extremes() {
        for minutes in [i32::MIN, -1, 0, 1, 102, i32::MAX] {
            let runtime = Runtime(minutes);
            assert_eq!(Runtime::from_json(&runtime.to_json()), Ok(runtime));
        }
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&Runtime(120)).unwrap();
        assert_eq!(json, "\"120 mins\"");

        let runtime: Runtime = serde_json::from_str("\"120 mins\"").unwrap();
        assert_eq!(runtime, Runtime(120));

        assert!(serde_json::from_str::<Runtime>("120").is_err());
        assert!(serde_json::from_str::<Runtime>("\"120\"").is_err());
    }
}
