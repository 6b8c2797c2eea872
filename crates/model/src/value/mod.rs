//! Dynamic model values.
//!
//! A [`ModelValue`] is the structured payload carried by resources and
//! operation requests: scalars, lists, and insertion-ordered objects. No
//! schema is enforced here; shape contracts live with the description
//! providers that document each resource.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};


/// A dynamic tree of scalars, lists, and ordered string-keyed objects.
///
/// `Clone` is a deep copy; equality is structural. Object fields keep
/// insertion order for stable enumeration and display.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum ModelValue {
	#[default]
	Undefined,
	Boolean(bool),
	Int(i64),
	Double(f64),
	Str(String),
	List(Vec<ModelValue>),
	Object(IndexMap<String, ModelValue>),
}

impl ModelValue {
	#[inline]
	pub fn is_defined(&self) -> bool {
		!matches!(self, ModelValue::Undefined)
	}

	/// Short name of this value's kind, for diagnostics.
	pub fn kind(&self) -> &'static str {
		match self {
			ModelValue::Undefined => "undefined",
			ModelValue::Boolean(_) => "boolean",
			ModelValue::Int(_) => "int",
			ModelValue::Double(_) => "double",
			ModelValue::Str(_) => "string",
			ModelValue::List(_) => "list",
			ModelValue::Object(_) => "object",
		}
	}

	#[inline]
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			ModelValue::Boolean(b) => Some(*b),
			_ => None,
		}
	}

	#[inline]
	pub fn as_int(&self) -> Option<i64> {
		match self {
			ModelValue::Int(i) => Some(*i),
			_ => None,
		}
	}

	#[inline]
	pub fn as_double(&self) -> Option<f64> {
		match self {
			ModelValue::Double(d) => Some(*d),
			ModelValue::Int(i) => Some(*i as f64),
			_ => None,
		}
	}

	#[inline]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			ModelValue::Str(s) => Some(s),
			_ => None,
		}
	}

	#[inline]
	pub fn as_list(&self) -> Option<&[ModelValue]> {
		match self {
			ModelValue::List(items) => Some(items),
			_ => None,
		}
	}

	#[inline]
	pub fn as_list_mut(&mut self) -> Option<&mut Vec<ModelValue>> {
		match self {
			ModelValue::List(items) => Some(items),
			_ => None,
		}
	}

	#[inline]
	pub fn as_object(&self) -> Option<&IndexMap<String, ModelValue>> {
		match self {
			ModelValue::Object(fields) => Some(fields),
			_ => None,
		}
	}

	#[inline]
	pub fn as_object_mut(&mut self) -> Option<&mut IndexMap<String, ModelValue>> {
		match self {
			ModelValue::Object(fields) => Some(fields),
			_ => None,
		}
	}

	/// Field of an object value; `None` for other kinds or a missing key.
	pub fn get(&self, key: &str) -> Option<&ModelValue> {
		self.as_object().and_then(|fields| fields.get(key))
	}

	pub fn get_mut(&mut self, key: &str) -> Option<&mut ModelValue> {
		self.as_object_mut().and_then(|fields| fields.get_mut(key))
	}

	/// Element of a list value; `None` for other kinds or out of range.
	pub fn at(&self, index: usize) -> Option<&ModelValue> {
		self.as_list().and_then(|items| items.get(index))
	}

	/// Sets a field, promoting an undefined value to an empty object first.
	///
	/// # Panics
	/// Panics if this value is defined and not an object.
	pub fn set(&mut self, key: impl Into<String>, value: impl Into<ModelValue>) {
		if matches!(self, ModelValue::Undefined) {
			*self = ModelValue::Object(IndexMap::new());
		}
		match self {
			ModelValue::Object(fields) => {
				fields.insert(key.into(), value.into());
			}
			other => panic!("cannot set a field on a {} value", other.kind()),
		}
	}

	/// Appends an element, promoting an undefined value to an empty list
	/// first.
	///
	/// # Panics
	/// Panics if this value is defined and not a list.
	pub fn push(&mut self, value: impl Into<ModelValue>) {
		if matches!(self, ModelValue::Undefined) {
			*self = ModelValue::List(Vec::new());
		}
		match self {
			ModelValue::List(items) => items.push(value.into()),
			other => panic!("cannot push onto a {} value", other.kind()),
		}
	}

	/// Removes and returns a field of an object value.
	pub fn remove(&mut self, key: &str) -> Option<ModelValue> {
		self.as_object_mut().and_then(|fields| fields.shift_remove(key))
	}

	/// Field names of an object value, in insertion order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.as_object()
			.into_iter()
			.flat_map(|fields| fields.keys())
			.map(String::as_str)
	}

	/// Number of elements or fields; 0 for scalars and undefined.
	pub fn len(&self) -> usize {
		match self {
			ModelValue::List(items) => items.len(),
			ModelValue::Object(fields) => fields.len(),
			_ => 0,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl From<bool> for ModelValue {
	fn from(value: bool) -> Self {
		ModelValue::Boolean(value)
	}
}

impl From<i32> for ModelValue {
	fn from(value: i32) -> Self {
		ModelValue::Int(i64::from(value))
	}
}

impl From<i64> for ModelValue {
	fn from(value: i64) -> Self {
		ModelValue::Int(value)
	}
}

impl From<f64> for ModelValue {
	fn from(value: f64) -> Self {
		ModelValue::Double(value)
	}
}

impl From<&str> for ModelValue {
	fn from(value: &str) -> Self {
		ModelValue::Str(value.to_owned())
	}
}

impl From<String> for ModelValue {
	fn from(value: String) -> Self {
		ModelValue::Str(value)
	}
}

impl From<Vec<ModelValue>> for ModelValue {
	fn from(items: Vec<ModelValue>) -> Self {
		ModelValue::List(items)
	}
}

impl<V: Into<ModelValue>> FromIterator<(String, V)> for ModelValue {
	fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
		ModelValue::Object(
			iter.into_iter()
				.map(|(key, value)| (key, value.into()))
				.collect(),
		)
	}
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
	f.write_str("\"")?;
	for c in s.chars() {
		match c {
			'"' => f.write_str("\\\"")?,
			'\\' => f.write_str("\\\\")?,
			'\n' => f.write_str("\\n")?,
			'\t' => f.write_str("\\t")?,
			_ => write!(f, "{c}")?,
		}
	}
	f.write_str("\"")
}

impl fmt::Display for ModelValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ModelValue::Undefined => f.write_str("undefined"),
			ModelValue::Boolean(b) => write!(f, "{b}"),
			ModelValue::Int(i) => write!(f, "{i}"),
			ModelValue::Double(d) => write!(f, "{d}"),
			ModelValue::Str(s) => write_escaped(f, s),
			ModelValue::List(items) => {
				f.write_str("[")?;
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{item}")?;
				}
				f.write_str("]")
			}
			ModelValue::Object(fields) => {
				f.write_str("{")?;
				for (i, (key, value)) in fields.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write_escaped(f, key)?;
					write!(f, ": {value}")?;
				}
				f.write_str("}")
			}
		}
	}
}
