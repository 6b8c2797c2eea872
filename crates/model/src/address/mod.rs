//! Tree addresses built from `key=value` segments.
//!
//! A [`PathAddress`] names one location in the management tree. Segment
//! values come in three shapes: a concrete string, the wildcard `*` matching
//! any sibling, or an explicit multi-target list that queries fan out over.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;


/// Reserved value string matching any child name at its level.
pub const WILDCARD: &str = "*";

/// Characters that structure the textual address form and are therefore
/// forbidden inside keys and values.
const SEPARATORS: [char; 3] = ['/', '=', ','];

/// Errors produced when parsing or validating address input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
	#[error("path segment '{0}' is not of the form key=value")]
	MalformedSegment(String),
	#[error("invalid path key '{0}': keys must be non-empty, not '*', and free of '/', '=' and ','")]
	InvalidKey(String),
	#[error("invalid path value '{0}': values must be non-empty and free of '/', '=' and ','")]
	InvalidValue(String),
	#[error("multi-target value lists must be non-empty and must not contain '*'")]
	InvalidMultiTarget,
}

fn check_key(key: &str) -> Result<(), AddressError> {
	if key.is_empty() || key == WILDCARD || key.contains(SEPARATORS) {
		return Err(AddressError::InvalidKey(key.to_owned()));
	}
	Ok(())
}

fn check_value(value: &str) -> Result<(), AddressError> {
	if value.is_empty() || value.contains(SEPARATORS) {
		return Err(AddressError::InvalidValue(value.to_owned()));
	}
	Ok(())
}

/// The value half of an address segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathValue {
	/// Matches any sibling value; rendered as `*`.
	Wildcard,
	/// A single literal value.
	Concrete(String),
	/// An explicit list of literal values, fanned out during queries.
	Multi(Vec<String>),
}

impl PathValue {
	#[inline]
	pub fn is_wildcard(&self) -> bool {
		matches!(self, PathValue::Wildcard)
	}

	#[inline]
	pub fn is_multi_target(&self) -> bool {
		matches!(self, PathValue::Multi(_))
	}

	/// The literal value, if this segment is concrete.
	#[inline]
	pub fn as_concrete(&self) -> Option<&str> {
		match self {
			PathValue::Concrete(value) => Some(value),
			_ => None,
		}
	}

	/// The single value string this segment occupies in a registry slot:
	/// the literal for concrete segments, `*` for wildcards. Multi-target
	/// segments occupy no single slot and yield `None`.
	#[inline]
	pub fn as_single(&self) -> Option<&str> {
		match self {
			PathValue::Concrete(value) => Some(value),
			PathValue::Wildcard => Some(WILDCARD),
			PathValue::Multi(_) => None,
		}
	}
}

impl fmt::Display for PathValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PathValue::Wildcard => f.write_str(WILDCARD),
			PathValue::Concrete(value) => f.write_str(value),
			PathValue::Multi(values) => f.write_str(&values.join(",")),
		}
	}
}

/// One `key=value` segment of a [`PathAddress`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathElement {
	key: String,
	value: PathValue,
}

impl PathElement {
	/// Builds a concrete segment. A value of `*` is normalized to the
	/// wildcard form, so `try_new("a", "*")` equals `try_wildcard("a")`.
	pub fn try_new(key: impl Into<String>, value: impl Into<String>) -> Result<Self, AddressError> {
		let key = key.into();
		let value = value.into();
		check_key(&key)?;
		if value == WILDCARD {
			return Ok(Self {
				key,
				value: PathValue::Wildcard,
			});
		}
		check_value(&value)?;
		Ok(Self {
			key,
			value: PathValue::Concrete(value),
		})
	}

	/// Builds a concrete segment.
	///
	/// # Panics
	/// Panics if the key or value is malformed; use [`PathElement::try_new`]
	/// for untrusted input.
	pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
		match Self::try_new(key, value) {
			Ok(element) => element,
			Err(err) => panic!("{err}"),
		}
	}

	pub fn try_wildcard(key: impl Into<String>) -> Result<Self, AddressError> {
		let key = key.into();
		check_key(&key)?;
		Ok(Self {
			key,
			value: PathValue::Wildcard,
		})
	}

	/// Builds a wildcard segment.
	///
	/// # Panics
	/// Panics if the key is malformed.
	pub fn wildcard(key: impl Into<String>) -> Self {
		match Self::try_wildcard(key) {
			Ok(element) => element,
			Err(err) => panic!("{err}"),
		}
	}

	/// Builds a multi-target segment. A single-value list collapses to the
	/// concrete form, so multi-target segments always carry two or more
	/// values.
	pub fn try_multi(
		key: impl Into<String>,
		values: impl IntoIterator<Item = impl Into<String>>,
	) -> Result<Self, AddressError> {
		let key = key.into();
		check_key(&key)?;
		let values: Vec<String> = values.into_iter().map(Into::into).collect();
		if values.is_empty() || values.iter().any(|v| v == WILDCARD) {
			return Err(AddressError::InvalidMultiTarget);
		}
		for value in &values {
			check_value(value)?;
		}
		if values.len() == 1 {
			let value = values.into_iter().next().unwrap_or_default();
			return Ok(Self {
				key,
				value: PathValue::Concrete(value),
			});
		}
		Ok(Self {
			key,
			value: PathValue::Multi(values),
		})
	}

	/// Builds a multi-target segment.
	///
	/// # Panics
	/// Panics if the key or any value is malformed, or if the list is empty
	/// or contains `*`.
	pub fn multi(
		key: impl Into<String>,
		values: impl IntoIterator<Item = impl Into<String>>,
	) -> Self {
		match Self::try_multi(key, values) {
			Ok(element) => element,
			Err(err) => panic!("{err}"),
		}
	}

	#[inline]
	pub fn key(&self) -> &str {
		&self.key
	}

	#[inline]
	pub fn value(&self) -> &PathValue {
		&self.value
	}

	#[inline]
	pub fn is_wildcard(&self) -> bool {
		self.value.is_wildcard()
	}

	#[inline]
	pub fn is_multi_target(&self) -> bool {
		self.value.is_multi_target()
	}
}

impl fmt::Display for PathElement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}={}", self.key, self.value)
	}
}

/// An ordered sequence of segments naming one location in the tree.
///
/// Descent code works on the [`PathAddress::elements`] slice view; stepping
/// into a child is taking a sub-slice, and backtracking to a sibling branch
/// is re-slicing from the saved position, so no cursor state is mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PathAddress {
	elements: Vec<PathElement>,
}

impl PathAddress {
	/// The root address, with no segments.
	pub const fn empty() -> Self {
		Self {
			elements: Vec::new(),
		}
	}

	pub fn new(elements: Vec<PathElement>) -> Self {
		Self { elements }
	}

	/// A single-segment address.
	pub fn of(element: PathElement) -> Self {
		Self {
			elements: vec![element],
		}
	}

	/// Returns this address extended by one segment.
	pub fn append(mut self, element: PathElement) -> Self {
		self.elements.push(element);
		self
	}

	/// Returns this address followed by every segment of `tail`.
	pub fn concat(&self, tail: &PathAddress) -> PathAddress {
		let mut elements = self.elements.clone();
		elements.extend(tail.elements.iter().cloned());
		PathAddress { elements }
	}

	/// The suffix starting at segment `from`.
	///
	/// # Panics
	/// Panics if `from` is greater than the address length.
	pub fn sub_address(&self, from: usize) -> PathAddress {
		PathAddress {
			elements: self.elements[from..].to_vec(),
		}
	}

	/// The prefix holding the first `len` segments.
	///
	/// # Panics
	/// Panics if `len` is greater than the address length.
	pub fn truncated(&self, len: usize) -> PathAddress {
		PathAddress {
			elements: self.elements[..len].to_vec(),
		}
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.elements.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.elements.is_empty()
	}

	#[inline]
	pub fn get(&self, index: usize) -> Option<&PathElement> {
		self.elements.get(index)
	}

	#[inline]
	pub fn last(&self) -> Option<&PathElement> {
		self.elements.last()
	}

	#[inline]
	pub fn iter(&self) -> std::slice::Iter<'_, PathElement> {
		self.elements.iter()
	}

	/// Slice view of the segments, used as the descent cursor.
	#[inline]
	pub fn elements(&self) -> &[PathElement] {
		&self.elements
	}

	/// True if any segment is a multi-target list.
	pub fn is_multi_target(&self) -> bool {
		self.elements.iter().any(PathElement::is_multi_target)
	}

	/// Parses the textual form produced by [`fmt::Display`]:
	/// `/key=value/other=*` with `,`-separated multi-target values. The
	/// empty string and `/` both parse to the root address.
	pub fn parse(input: &str) -> Result<Self, AddressError> {
		let trimmed = input.strip_prefix('/').unwrap_or(input);
		if trimmed.is_empty() {
			return Ok(Self::empty());
		}
		let mut elements = Vec::new();
		for segment in trimmed.split('/') {
			let Some((key, value)) = segment.split_once('=') else {
				return Err(AddressError::MalformedSegment(segment.to_owned()));
			};
			let element = if value.contains(',') {
				PathElement::try_multi(key, value.split(','))?
			} else {
				PathElement::try_new(key, value)?
			};
			elements.push(element);
		}
		Ok(Self { elements })
	}
}

impl fmt::Display for PathAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.elements.is_empty() {
			return f.write_str("/");
		}
		for element in &self.elements {
			write!(f, "/{element}")?;
		}
		Ok(())
	}
}

impl FromStr for PathAddress {
	type Err = AddressError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl FromIterator<PathElement> for PathAddress {
	fn from_iter<I: IntoIterator<Item = PathElement>>(iter: I) -> Self {
		Self {
			elements: iter.into_iter().collect(),
		}
	}
}

impl<'a> IntoIterator for &'a PathAddress {
	type Item = &'a PathElement;
	type IntoIter = std::slice::Iter<'a, PathElement>;

	fn into_iter(self) -> Self::IntoIter {
		self.elements.iter()
	}
}

impl From<PathElement> for PathAddress {
	fn from(element: PathElement) -> Self {
		Self::of(element)
	}
}
