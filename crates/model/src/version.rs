//! Schema versions carried by subsystem model definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A `major.minor.micro` schema version with a total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelVersion {
	pub major: u16,
	pub minor: u16,
	pub micro: u16,
}

impl ModelVersion {
	pub const fn new(major: u16, minor: u16, micro: u16) -> Self {
		Self {
			major,
			minor,
			micro,
		}
	}

	pub const fn of(major: u16, minor: u16) -> Self {
		Self::new(major, minor, 0)
	}
}

impl fmt::Display for ModelVersion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}.{}", self.major, self.minor, self.micro)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid model version '{0}': expected major[.minor[.micro]]")]
pub struct VersionParseError(pub String);

impl FromStr for ModelVersion {
	type Err = VersionParseError;

	/// Parses `major`, `major.minor`, or `major.minor.micro`; omitted parts
	/// default to zero.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let mut parts = s.split('.');
		let mut next = |required: bool| -> Result<u16, VersionParseError> {
			match parts.next() {
				Some(part) => part.parse().map_err(|_| VersionParseError(s.to_owned())),
				None if required => Err(VersionParseError(s.to_owned())),
				None => Ok(0),
			}
		};
		let major = next(true)?;
		let minor = next(false)?;
		let micro = next(false)?;
		if parts.next().is_some() {
			return Err(VersionParseError(s.to_owned()));
		}
		Ok(Self::new(major, minor, micro))
	}
}
