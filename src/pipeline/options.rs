//! # Options Compiler
//!
//! Compiles pipeline options into one wire map from two inputs:
//!
//! - known options, declared by a [`KnownOptionsSchema`] that maps local
//!   names to wire names (optionally nested)
//! - free-form overrides keyed by dotted wire paths
//!
//! Overrides are applied after known options, so they win at the same path.

use crate::value::{CodecError, CodecResult, FieldMap, NativeValue, Serializer, WireValue};

/// One declared option
#[derive(Debug, Clone, PartialEq)]
pub struct KnownOption {
    /// Field name on the wire
    pub wire_name: String,
    /// Schema for an option whose value is itself a map of options
    pub nested: Option<KnownOptionsSchema>,
}

/// Ordered mapping from local option name to its wire declaration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KnownOptionsSchema {
    entries: Vec<(String, KnownOption)>,
}

impl KnownOptionsSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a scalar option
    pub fn option(mut self, name: impl Into<String>, wire_name: impl Into<String>) -> Self {
        self.entries.push((
            name.into(),
            KnownOption {
                wire_name: wire_name.into(),
                nested: None,
            },
        ));
        self
    }

    /// Declare an option holding nested options
    pub fn nested(
        mut self,
        name: impl Into<String>,
        wire_name: impl Into<String>,
        schema: KnownOptionsSchema,
    ) -> Self {
        self.entries.push((
            name.into(),
            KnownOption {
                wire_name: wire_name.into(),
                nested: Some(schema),
            },
        ));
        self
    }

    pub fn get(&self, name: &str) -> Option<&KnownOption> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, option)| option)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &KnownOption)> {
        self.entries.iter().map(|(n, o)| (n.as_str(), o))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Options supplied by a caller
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineOptions {
    /// Values for schema-declared options, keyed by local name
    pub known: FieldMap<NativeValue>,
    /// Raw overrides keyed by dotted wire path. `None` writes `Null`.
    pub overrides: FieldMap<Option<NativeValue>>,
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<NativeValue>) -> Self {
        self.known.insert(name, value.into());
        self
    }

    pub fn with_override(mut self, path: impl Into<String>, value: Option<NativeValue>) -> Self {
        self.overrides.insert(path, value);
        self
    }
}

/// Compiles options against a schema
#[derive(Debug, Clone)]
pub struct OptionsCompiler {
    serializer: Serializer,
}

impl OptionsCompiler {
    pub fn new(serializer: Serializer) -> Self {
        Self { serializer }
    }

    /// Compile known options and overrides into one wire map
    pub fn compile(
        &self,
        schema: &KnownOptionsSchema,
        known: &FieldMap<NativeValue>,
        overrides: &FieldMap<Option<NativeValue>>,
    ) -> CodecResult<FieldMap<WireValue>> {
        let mut out = self.compile_known(schema, known)?;

        for (path, value) in overrides.iter() {
            let segments = parse_field_path(path)?;
            let encoded = match value {
                Some(value) => self
                    .serializer
                    .encode_argument(path, value)?
                    .unwrap_or(WireValue::Null),
                None => WireValue::Null,
            };
            set_path(&mut out, &segments, encoded);
        }

        Ok(out)
    }

    fn compile_known(
        &self,
        schema: &KnownOptionsSchema,
        known: &FieldMap<NativeValue>,
    ) -> CodecResult<FieldMap<WireValue>> {
        let mut out = FieldMap::new();

        for (name, option) in schema.iter() {
            let Some(value) = known.get(name) else {
                continue;
            };

            match (&option.nested, value) {
                (Some(nested), NativeValue::Map(fields)) => {
                    let compiled = self.compile_known(nested, fields)?;
                    out.insert(option.wire_name.clone(), WireValue::Map(compiled));
                }
                _ => {
                    if let Some(encoded) = self.serializer.encode_argument(name, value)? {
                        out.insert(option.wire_name.clone(), encoded);
                    }
                }
            }
        }

        Ok(out)
    }
}

/// Write `value` at a nested path, creating (or replacing non-map)
/// intermediate nodes.
fn set_path(map: &mut FieldMap<WireValue>, segments: &[String], value: WireValue) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };

    if rest.is_empty() {
        map.insert(first.clone(), value);
        return;
    }

    if !matches!(map.get(first), Some(WireValue::Map(_))) {
        map.insert(first.clone(), WireValue::Map(FieldMap::new()));
    }
    if let Some(WireValue::Map(child)) = map.get_mut(first) {
        set_path(child, rest, value);
    }
}

/// Split a dotted path into segments.
///
/// A segment wrapped in backticks may contain dots; inside backticks a
/// backslash escapes the next character.
pub fn parse_field_path(path: &str) -> CodecResult<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = path.chars();

    loop {
        match chars.next() {
            None => {
                finish_segment(path, &mut segments, &mut current, &mut quoted)?;
                break;
            }
            Some('.') => finish_segment(path, &mut segments, &mut current, &mut quoted)?,
            Some('`') => {
                if quoted || !current.is_empty() {
                    return Err(CodecError::invalid_path(path, &current));
                }
                quoted = true;
                loop {
                    match chars.next() {
                        Some('`') => break,
                        Some('\\') => match chars.next() {
                            Some(c) => current.push(c),
                            None => {
                                return Err(CodecError::invalid_path(
                                    path,
                                    &format!("`{}\\", current),
                                ))
                            }
                        },
                        Some(c) => current.push(c),
                        None => {
                            return Err(CodecError::invalid_path(path, &format!("`{}", current)))
                        }
                    }
                }
            }
            Some(c) => {
                if quoted {
                    // text after a closing backtick
                    return Err(CodecError::invalid_path(path, &format!("`{}`{}", current, c)));
                }
                current.push(c);
            }
        }
    }

    Ok(segments)
}

fn finish_segment(
    path: &str,
    segments: &mut Vec<String>,
    current: &mut String,
    quoted: &mut bool,
) -> CodecResult<()> {
    if current.is_empty() {
        return Err(CodecError::invalid_path(path, ""));
    }
    segments.push(std::mem::take(current));
    *quoted = false;
    Ok(())
}
