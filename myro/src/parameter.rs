//! Command parameter.
use std::borrow::Cow;

use crate::{mysql::MySqlDbType, value::Value};

/// Parameter direction, only meaningful for stored procedure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterDirection {
    Input,
    Output,
    InputOutput,
    ReturnValue,
}

/// Command parameter.
///
/// Direction and type can be left unset, a stored procedure signature from
/// [`ProcedureLookup`][crate::procedure::ProcedureLookup] then fills them.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    name: String,
    db_type: Option<MySqlDbType>,
    direction: Option<ParameterDirection>,
    value: Value,
}

impl Parameter {
    /// Named parameter, the name may include the `@` or `?` prefix.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Parameter {
        Parameter {
            name: name.into(),
            db_type: None,
            direction: None,
            value: value.into(),
        }
    }

    /// Unnamed parameter, bound by position.
    pub fn positional(value: impl Into<Value>) -> Parameter {
        Parameter::new(String::new(), value)
    }

    pub fn with_direction(mut self, direction: ParameterDirection) -> Parameter {
        self.direction = Some(direction);
        self
    }

    pub fn with_db_type(mut self, db_type: MySqlDbType) -> Parameter {
        self.db_type = Some(db_type);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without prefix and quoting, see [`normalize_name`].
    pub fn normalized_name(&self) -> Cow<'_, str> {
        normalize_name(&self.name)
    }

    /// Parameter direction, defaults to [`ParameterDirection::Input`].
    pub fn direction(&self) -> ParameterDirection {
        self.direction.unwrap_or(ParameterDirection::Input)
    }

    pub fn has_direction(&self) -> bool {
        self.direction.is_some()
    }

    /// Declared type, defaults to [`MySqlDbType::VarChar`].
    pub fn db_type(&self) -> MySqlDbType {
        self.db_type.unwrap_or_default()
    }

    pub fn has_db_type(&self) -> bool {
        self.db_type.is_some()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = value.into();
    }

    /// Copy of this parameter under another name.
    pub(crate) fn renamed(&self, name: &str) -> Parameter {
        Parameter { name: name.to_owned(), ..self.clone() }
    }

    /// Fill direction and type that the caller left unset.
    pub(crate) fn fill(&mut self, direction: ParameterDirection, db_type: MySqlDbType) {
        self.direction.get_or_insert(direction);
        self.db_type.get_or_insert(db_type);
    }
}

/// Strip the `@` or `?` prefix and the quoting of a parameter name.
///
/// ```
/// use myro::parameter::normalize_name;
///
/// assert_eq!(normalize_name("@id"), "id");
/// assert_eq!(normalize_name("?`a``b`"), "a`b");
/// assert_eq!(normalize_name("plain"), "plain");
/// ```
pub fn normalize_name(name: &str) -> Cow<'_, str> {
    let name = name.trim();
    let Some(rest) = name.strip_prefix(['@', '?']) else {
        return Cow::Borrowed(name);
    };

    for quote in ['`', '\'', '"'] {
        let Some(inner) = rest.strip_prefix(quote).and_then(|e| e.strip_suffix(quote)) else {
            continue;
        };
        let doubled = format!("{quote}{quote}");
        if inner.contains(&doubled) {
            return Cow::Owned(inner.replace(&doubled, quote.encode_utf8(&mut [0; 4])));
        }
        return Cow::Borrowed(inner);
    }

    Cow::Borrowed(rest)
}

/// Ordered parameter set of a command.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterCollection {
    params: Vec<Parameter>,
}

impl ParameterCollection {
    pub fn new() -> ParameterCollection {
        ParameterCollection::default()
    }

    pub fn push(&mut self, param: Parameter) {
        self.params.push(param);
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Parameter> {
        self.params.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.params.iter()
    }

    /// Index of the first parameter whose normalized name matches, ignoring ascii case.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        let name = normalize_name(name);
        self.params
            .iter()
            .position(|e| e.normalized_name().eq_ignore_ascii_case(&name))
    }

    /// Number of parameters whose normalized name matches, ignoring ascii case.
    pub(crate) fn count_of(&self, name: &str) -> usize {
        let name = normalize_name(name);
        self.params
            .iter()
            .filter(|e| e.normalized_name().eq_ignore_ascii_case(&name))
            .count()
    }
}

impl std::ops::Index<usize> for ParameterCollection {
    type Output = Parameter;

    fn index(&self, index: usize) -> &Self::Output {
        &self.params[index]
    }
}

impl FromIterator<Parameter> for ParameterCollection {
    fn from_iter<T: IntoIterator<Item = Parameter>>(iter: T) -> Self {
        Self { params: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a ParameterCollection {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}
