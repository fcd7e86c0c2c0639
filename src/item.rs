use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor};

use crate::error::ConversionError;

/// Fields pulled out of an item before its remaining fields are written.
pub const EXTRACTED_FIELDS: [&str; 3] = ["type", "author", "authors"];

/// A parsed input document: citation keys paired with their raw entries, in document order.
///
/// Keys are kept as a list rather than a map so that a key appearing twice survives parsing and
/// can be rejected item by item later on.
#[derive(Debug, Default)]
pub struct Document {
    entries: Vec<(String, Node)>,
}

impl Document {
    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Document::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> impl Iterator<Item = (String, Node)> {
        self.entries.into_iter()
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = Document;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of citation keys to entries")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Document, E> {
                Ok(Document::default())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Document, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, entry)) = map.next_entry::<Node, Node>()? {
                    let key = key.text().ok_or_else(|| {
                        de::Error::custom(format!(
                            "citation keys must be scalars, found {}",
                            key.kind()
                        ))
                    })?;
                    entries.push((key, entry));
                }
                Ok(Document { entries })
            }
        }

        deserializer.deserialize_any(DocumentVisitor)
    }
}

/// A YAML node exactly as the document spelled it, before any interpretation.
///
/// Mappings keep every pair in order, duplicates included. Numbers keep their text, so integers
/// of any width survive. Tagged nodes are recorded without their content.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Number(String),
    String(String),
    List(Vec<Node>),
    Mapping(Vec<(Node, Node)>),
    Tagged,
}

impl Node {
    /// The scalar as it should appear in a field value; `None` for collections and tags.
    fn text(&self) -> Option<String> {
        match self {
            Node::Null => Some(String::new()),
            Node::Bool(b) => Some(b.to_string()),
            Node::Number(n) | Node::String(n) => Some(n.clone()),
            Node::List(_) | Node::Mapping(_) | Node::Tagged => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "a boolean",
            Node::Number(_) => "a number",
            Node::String(_) => "a string",
            Node::List(_) => "a list",
            Node::Mapping(_) => "a mapping",
            Node::Tagged => "a tagged value",
        }
    }

    /// Null, `false`, zero, and empty strings or collections.
    fn is_blank(&self) -> bool {
        match self {
            Node::Null | Node::Bool(false) | Node::Tagged => true,
            Node::Bool(true) => false,
            Node::Number(n) => n.parse::<f64>().is_ok_and(|n| n == 0.0),
            Node::String(s) => s.is_empty(),
            Node::List(nodes) => nodes.is_empty(),
            Node::Mapping(pairs) => pairs.is_empty(),
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NodeVisitor;

        impl<'de> Visitor<'de> for NodeVisitor {
            type Value = Node;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("any YAML node")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Node, A::Error> {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(pair) = map.next_entry::<Node, Node>()? {
                    pairs.push(pair);
                }
                Ok(Node::Mapping(pairs))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Node, A::Error> {
                let mut nodes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(node) = seq.next_element::<Node>()? {
                    nodes.push(node);
                }
                Ok(Node::List(nodes))
            }

            // Local tags (`!custom ...`) arrive as enums and are skipped, never constructed.
            // Secondary `!!` tags are dropped by the parser, leaving the plain node underneath.
            fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<Node, A::Error> {
                let (_tag, variant) = data.variant::<de::IgnoredAny>()?;
                variant.newtype_variant::<de::IgnoredAny>()?;
                Ok(Node::Tagged)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Node, E> {
                Ok(Node::Null)
            }

            fn visit_bool<E: de::Error>(self, b: bool) -> Result<Node, E> {
                Ok(Node::Bool(b))
            }

            fn visit_i64<E: de::Error>(self, n: i64) -> Result<Node, E> {
                Ok(Node::Number(n.to_string()))
            }

            fn visit_u64<E: de::Error>(self, n: u64) -> Result<Node, E> {
                Ok(Node::Number(n.to_string()))
            }

            fn visit_i128<E: de::Error>(self, n: i128) -> Result<Node, E> {
                Ok(Node::Number(n.to_string()))
            }

            fn visit_u128<E: de::Error>(self, n: u128) -> Result<Node, E> {
                Ok(Node::Number(n.to_string()))
            }

            fn visit_f64<E: de::Error>(self, n: f64) -> Result<Node, E> {
                Ok(Node::Number(serde_yaml::Number::from(n).to_string()))
            }

            fn visit_str<E: de::Error>(self, s: &str) -> Result<Node, E> {
                Ok(Node::String(s.to_string()))
            }

            fn visit_string<E: de::Error>(self, s: String) -> Result<Node, E> {
                Ok(Node::String(s))
            }
        }

        deserializer.deserialize_any(NodeVisitor)
    }
}

/// A field value: a single scalar or an ordered list of scalars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    fn from_node(field: &str, node: Node) -> Result<Self, ConversionError> {
        let unsupported = |node: &Node| ConversionError::UnsupportedValue {
            field: field.to_string(),
            found: node.kind(),
        };
        match node {
            Node::List(nodes) => nodes
                .iter()
                .map(|n| n.text().ok_or_else(|| unsupported(n)))
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::List),
            other => other.text().map(FieldValue::Text).ok_or_else(|| unsupported(&other)),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::List(values) => f.write_str(&values.join(" and ")),
        }
    }
}

/// The author list of an item, taken from `authors` when present and from `author` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authors<'a> {
    List(&'a [String]),
    Single(&'a str),
}

impl<'a> Authors<'a> {
    fn from_value(value: &'a FieldValue) -> Self {
        match value {
            FieldValue::List(names) => Authors::List(names),
            FieldValue::Text(name) => Authors::Single(name),
        }
    }

    pub fn first(&self) -> Option<&'a str> {
        match *self {
            Authors::List(names) => names.first().map(String::as_str),
            Authors::Single(name) => Some(name),
        }
    }
}

impl fmt::Display for Authors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authors::List(names) => f.write_str(&names.join(" and ")),
            Authors::Single(name) => f.write_str(name),
        }
    }
}

/// A single bibliography record: field names mapped to values, in the order they were written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BibItem {
    fields: IndexMap<String, FieldValue>,
    entry_type: Option<String>,
}

impl BibItem {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Fields other than `type`, `author` and `authors`, in item order.
    pub fn remaining(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.iter().filter(|(name, _)| !EXTRACTED_FIELDS.contains(name))
    }

    /// The entry type, if present as a non-blank scalar.
    pub fn entry_type(&self) -> Option<&str> {
        self.entry_type.as_deref()
    }

    /// Resolves the author list, or `None` when there is no usable first author.
    pub fn authors(&self) -> Option<Authors<'_>> {
        let value = self
            .fields
            .get("authors")
            .or_else(|| self.fields.get("author"))?;
        let authors = Authors::from_value(value);
        authors
            .first()
            .is_some_and(|first| !first.is_empty())
            .then_some(authors)
    }
}

impl TryFrom<Node> for BibItem {
    type Error = ConversionError;

    fn try_from(node: Node) -> Result<Self, Self::Error> {
        let pairs = match node {
            Node::Mapping(pairs) => pairs,
            other => {
                return Err(ConversionError::UnsupportedValue {
                    field: "entry".to_string(),
                    found: other.kind(),
                });
            }
        };

        let mut fields = IndexMap::with_capacity(pairs.len());
        let mut entry_type = None;
        for (name, value) in pairs {
            let name = name.text().ok_or_else(|| ConversionError::UnsupportedValue {
                field: "field name".to_string(),
                found: name.kind(),
            })?;
            if name == "type" {
                // `0`, `false` and friends name no type at all.
                entry_type = (!value.is_blank()).then(|| value.text()).flatten();
            }
            let value = FieldValue::from_node(&name, value)?;
            // Later duplicates overwrite the value but keep the first position.
            fields.insert(name, value);
        }
        Ok(BibItem { fields, entry_type })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(yaml: &str) -> Vec<(String, Result<BibItem, ConversionError>)> {
        Document::parse(yaml)
            .expect("valid yaml")
            .into_entries()
            .map(|(key, raw)| (key, BibItem::try_from(raw)))
            .collect()
    }

    fn single(yaml: &str) -> BibItem {
        let mut parsed = items(yaml);
        assert_eq!(parsed.len(), 1);
        parsed.remove(0).1.expect("item converts")
    }

    #[test]
    fn document_keeps_duplicate_keys_in_order() {
        let doc = Document::parse("a: {type: x}\nb: {type: y}\na: {type: z}\n").unwrap();
        let keys: Vec<_> = doc.into_entries().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b", "a"]);
    }

    #[test]
    fn empty_document_is_empty_batch() {
        assert!(Document::parse("").unwrap().is_empty());
        assert!(Document::parse("   \n").unwrap().is_empty());
        assert!(Document::parse("~\n").unwrap().is_empty());
    }

    #[test]
    fn non_mapping_document_is_rejected() {
        assert!(Document::parse("- a\n- b\n").is_err());
        assert!(Document::parse("just a string").is_err());
    }

    #[test]
    fn numeric_keys_are_stringified() {
        let doc = Document::parse("2020: {type: misc}\n").unwrap();
        let keys: Vec<_> = doc.into_entries().map(|(k, _)| k).collect();
        assert_eq!(keys, ["2020"]);
    }

    #[test]
    fn scalars_are_stringified() {
        let item = single("k:\n  year: 1843\n  volume: 2.5\n  draft: true\n  note:\n  title: X\n");
        assert_eq!(item.get("year"), Some(&FieldValue::Text("1843".into())));
        assert_eq!(item.get("volume"), Some(&FieldValue::Text("2.5".into())));
        assert_eq!(item.get("draft"), Some(&FieldValue::Text("true".into())));
        assert_eq!(item.get("note"), Some(&FieldValue::Text(String::new())));
        assert_eq!(item.get("title"), Some(&FieldValue::Text("X".into())));
    }

    #[test]
    fn field_order_follows_document() {
        let item = single("k:\n  zeta: 1\n  alpha: 2\n  mid: 3\n");
        let names: Vec<_> = item.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn remaining_skips_extracted_fields() {
        let item = single("k:\n  type: '@book'\n  title: T\n  author: A\n  authors: [B]\n  year: 1\n");
        let names: Vec<_> = item.remaining().map(|(name, _)| name).collect();
        assert_eq!(names, ["title", "year"]);
    }

    #[test]
    fn lists_join_with_and() {
        let value = FieldValue::List(vec!["A".into(), "B".into(), "C".into()]);
        assert_eq!(value.to_string(), "A and B and C");
    }

    #[test]
    fn authors_list_wins_over_author() {
        let item = single("k:\n  author: Solo\n  authors: [Ada Lovelace, Charles Babbage]\n");
        let authors = item.authors().unwrap();
        assert!(matches!(authors, Authors::List(_)));
        assert_eq!(authors.to_string(), "Ada Lovelace and Charles Babbage");
    }

    #[test]
    fn single_author_falls_back() {
        let item = single("k:\n  author: Solo\n");
        assert_eq!(item.authors(), Some(Authors::Single("Solo")));
    }

    #[test]
    fn empty_authors_are_missing() {
        for yaml in [
            "k:\n  authors: []\n",
            "k:\n  authors: ['']\n",
            "k:\n  author:\n",
            "k:\n  title: T\n",
        ] {
            assert_eq!(single(yaml).authors(), None, "{yaml}");
        }
    }

    #[test]
    fn entry_type_requires_non_empty_text() {
        assert_eq!(single("k: {type: '@book'}\n").entry_type(), Some("@book"));
        assert_eq!(single("k: {type: ''}\n").entry_type(), None);
        assert_eq!(single("k: {type: }\n").entry_type(), None);
        assert_eq!(single("k: {title: T}\n").entry_type(), None);
    }

    #[test]
    fn blank_types_are_missing() {
        for yaml in [
            "k: {type: 0}\n",
            "k: {type: 0.0}\n",
            "k: {type: false}\n",
            "k: {type: []}\n",
            "k: {type: [a]}\n",
        ] {
            assert_eq!(single(yaml).entry_type(), None, "{yaml}");
        }
        assert_eq!(single("k: {type: 7}\n").entry_type(), Some("7"));
        assert_eq!(single("k: {type: true}\n").entry_type(), Some("true"));
    }

    #[test]
    fn duplicate_field_keeps_first_position_and_last_value() {
        let item = single("k:\n  title: First\n  year: 1\n  title: Second\n");
        let fields: Vec<_> = item.iter().map(|(n, v)| (n, v.to_string())).collect();
        assert_eq!(
            fields,
            [("title", "Second".to_string()), ("year", "1".to_string())]
        );
    }

    #[test]
    fn nested_values_are_per_item_errors() {
        let parsed = items("bad:\n  title: {nested: yes}\ngood:\n  title: T\n");
        assert_eq!(parsed.len(), 2);
        assert_eq!(
            parsed[0].1,
            Err(ConversionError::UnsupportedValue {
                field: "title".into(),
                found: "a mapping"
            })
        );
        assert!(parsed[1].1.is_ok());
    }

    #[test]
    fn local_tags_are_never_constructed() {
        let parsed = items("evil: !custom {a: 1}\nalso:\n  title: !custom value\n");
        assert_eq!(parsed.len(), 2);
        for (_, item) in &parsed {
            assert!(matches!(
                item,
                Err(ConversionError::UnsupportedValue { found: "a tagged value", .. })
            ));
        }
    }

    #[test]
    fn python_tags_are_rejected_as_plain_nodes() {
        let parsed = items("evil: !!python/object/apply:os.system ['echo hi']\n");
        assert_eq!(
            parsed[0].1,
            Err(ConversionError::UnsupportedValue {
                field: "entry".into(),
                found: "a list"
            })
        );
    }

    #[test]
    fn huge_integers_keep_their_digits() {
        let parsed = items(
            "big:\n  type: zine\n  issue: 123456789012345678901234\n  neg: -123456789012345678901234\nsmall:\n  type: zine\n",
        );
        assert_eq!(parsed.len(), 2);
        let big = parsed[0].1.as_ref().expect("item converts");
        assert_eq!(
            big.get("issue"),
            Some(&FieldValue::Text("123456789012345678901234".into()))
        );
        assert_eq!(
            big.get("neg"),
            Some(&FieldValue::Text("-123456789012345678901234".into()))
        );
        assert!(parsed[1].1.is_ok());
    }

    #[test]
    fn nested_duplicate_keys_stay_per_item() {
        let parsed = items("bad:\n  title: {a: 1, a: 2}\ngood:\n  title: T\n");
        assert!(matches!(
            parsed[0].1,
            Err(ConversionError::UnsupportedValue { found: "a mapping", .. })
        ));
        assert!(parsed[1].1.is_ok());
    }

    #[test]
    fn scalar_entries_are_per_item_errors() {
        let parsed = items("a: just text\nb: [x, y]\nc:\n");
        let found: Vec<_> = parsed
            .into_iter()
            .map(|(_, item)| match item {
                Err(ConversionError::UnsupportedValue { found, .. }) => found,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(found, ["a string", "a list", "null"]);
    }
}
