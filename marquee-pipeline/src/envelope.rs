//! The uniform result envelope every stage hands back.
//!
//! On the wire it is `{"success": bool, "data"?: T, "error"?: string}`. In
//! memory it is an enum, so a success always carries data and a failure
//! always carries a message.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq)]
pub enum StageResult<T> {
    Success(T),
    Failure(String),
}

impl<T> StageResult<T> {
    pub fn success(data: T) -> Self {
        Self::Success(data)
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure(error.into())
    }

    /// Convert a fallible result, rendering the error with `Display`.
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(e) => Self::Failure(e.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            Self::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Success(data) => Ok(data),
            Self::Failure(e) => Err(e),
        }
    }
}

#[derive(Serialize)]
struct WireRef<'a, T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

#[derive(Deserialize)]
struct Wire<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> TryFrom<Wire<T>> for StageResult<T> {
    type Error = String;

    fn try_from(wire: Wire<T>) -> Result<Self, Self::Error> {
        match (wire.success, wire.data, wire.error) {
            (true, Some(data), None) => Ok(Self::Success(data)),
            (false, None, Some(error)) => Ok(Self::Failure(error)),
            (true, _, _) => Err("successful envelope must carry data and no error".into()),
            (false, _, _) => Err("failed envelope must carry an error and no data".into()),
        }
    }
}

impl<T: Serialize> Serialize for StageResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireRef {
            success: self.is_success(),
            data: self.data(),
            error: self.error(),
        }
        .serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for StageResult<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = Wire::<T>::deserialize(deserializer)?;
        Self::try_from(wire).map_err(serde::de::Error::custom)
    }
}
