//! Reading of Disease Ontology OBO files.
//!
//! OBO files consist of a header followed by stanzas, each introduced by a line such as
//! `[Term]` and followed by `tag: value` lines.
//!
//! ```text
//! [Term]
//! id: DOID:0001816
//! name: angiosarcoma
//! def: "A vascular cancer that derives_from the cells that line the walls of blood vessels." [url:...]
//! is_a: DOID:175 ! vascular cancer
//! ```
//!
//! Only `[Term]` stanzas are kept, everything before the first stanza is ignored.

use std::io::BufRead;
use std::path::Path;

use anyhow::Context;
use indexmap::IndexMap;
use thousands::Separable;

use crate::common::io::std::open_read_maybe_gz;
use crate::error::Error;

/// One `[Term]` stanza of an OBO file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Term {
    /// Term identifier, e.g., `DOID:0001816`.
    pub id: String,
    /// Term name, if any.
    pub name: Option<String>,
    /// Unquoted definition text, if any.
    pub def: Option<String>,
    /// Whether the term carries `is_obsolete: true`.
    pub is_obsolete: bool,
    /// All tag values in file order.
    pub tags: IndexMap<String, Vec<String>>,
}

impl Term {
    /// Build from the tags of a stanza, `None` if there is no `id` tag.
    fn from_tags(tags: IndexMap<String, Vec<String>>) -> Option<Self> {
        let first = |tag: &str| tags.get(tag).and_then(|values| values.first()).cloned();
        Some(Term {
            id: first("id")?,
            name: first("name"),
            def: first("def"),
            is_obsolete: first("is_obsolete").as_deref() == Some("true"),
            tags,
        })
    }
}

/// Disease Ontology terms by identifier.
#[derive(Debug, Clone, Default)]
pub struct DiseaseOntology {
    terms: IndexMap<String, Term>,
}

impl DiseaseOntology {
    /// Load from the given path, transparently decompressing `.gz` files.
    pub fn from_path<P>(path: P) -> Result<Self, anyhow::Error>
    where
        P: AsRef<Path>,
    {
        tracing::info!("Parsing Disease Ontology file {:?} ...", path.as_ref());
        let reader = open_read_maybe_gz(path.as_ref())?;
        let result = Self::from_reader(reader)
            .with_context(|| format!("problem parsing {:?}", path.as_ref()))?;
        tracing::info!(
            "... got {} Disease Ontology terms",
            result.len().separate_with_commas()
        );
        Ok(result)
    }

    /// Parse from a buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, anyhow::Error> {
        let mut terms = IndexMap::new();
        let mut stanza: Option<String> = None;
        let mut tags: IndexMap<String, Vec<String>> = IndexMap::new();

        let mut finish = |stanza: Option<String>, tags: IndexMap<String, Vec<String>>| {
            if stanza.as_deref() != Some("Term") {
                return;
            }
            match Term::from_tags(tags) {
                Some(term) => {
                    terms.insert(term.id.clone(), term);
                }
                None => tracing::warn!("Skipping [Term] stanza without id"),
            }
        };

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('!') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                finish(stanza.take(), std::mem::take(&mut tags));
                stanza = Some(line[1..line.len() - 1].to_string());
                continue;
            }
            if stanza.is_none() {
                continue; // header
            }

            let (tag, value) = line.split_once(':').ok_or_else(|| Error::Obo {
                line_no: idx + 1,
                message: format!("expected 'tag: value', got {:?}", line),
            })?;
            let tag = tag.trim();
            let value = if tag == "def" {
                unquote(value.trim())
            } else {
                strip_comment(value).to_string()
            };
            tags.entry(tag.to_string()).or_default().push(value);
        }
        finish(stanza, tags);

        Ok(Self { terms })
    }

    /// Look up term by identifier.
    pub fn get(&self, id: &str) -> Option<&Term> {
        self.terms.get(id)
    }

    /// Whether a term with the given identifier exists.
    pub fn contains(&self, id: &str) -> bool {
        self.terms.contains_key(id)
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether there are no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterate terms in file order.
    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.terms.values()
    }
}

/// Strip trailing `! comment` from a tag value.
fn strip_comment(value: &str) -> &str {
    value
        .split_once(" !")
        .map(|(value, _)| value)
        .unwrap_or(value)
        .trim()
}

/// Extract the quoted text at the start of `value`, e.g., of a `def` tag.
///
/// Values that do not start with a quote are returned as is.
fn unquote(value: &str) -> String {
    let Some(rest) = value.strip_prefix('"') else {
        return value.to_string();
    };

    let mut result = String::with_capacity(rest.len());
    let mut chars = rest.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    result.push(escaped);
                }
            }
            '"' => break,
            c => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::DiseaseOntology;

    #[test]
    fn from_path() -> Result<(), anyhow::Error> {
        let ontology = DiseaseOntology::from_path("tests/data/tinx/doid.obo")?;

        assert_eq!(ontology.len(), 4);
        assert!(ontology.contains("DOID:50"));
        assert!(!ontology.contains("is_a"));

        let term = ontology.get("DOID:50").expect("term must exist");
        assert_eq!(term.name.as_deref(), Some("thyroid gland disease"));
        assert_eq!(
            term.def.as_deref(),
            Some("An endocrine system disease located in the \"thyroid gland\".")
        );
        assert_eq!(term.tags["is_a"], vec!["DOID:28".to_string()]);
        assert!(!term.is_obsolete);

        Ok(())
    }

    #[test]
    fn from_reader_skips_header_and_typedef() -> Result<(), anyhow::Error> {
        let text = "format-version: 1.2\n\
            ontology: doid\n\
            \n\
            [Term]\n\
            id: DOID:4\n\
            name: disease\n\
            \n\
            [Typedef]\n\
            id: derives_from\n\
            name: derives from\n";
        let ontology = DiseaseOntology::from_reader(text.as_bytes())?;

        assert_eq!(
            ontology.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
            vec!["DOID:4"]
        );

        Ok(())
    }

    #[test]
    fn from_reader_obsolete_and_missing_def() -> Result<(), anyhow::Error> {
        let text = "[Term]\nid: DOID:1\nname: old\nis_obsolete: true\n";
        let ontology = DiseaseOntology::from_reader(text.as_bytes())?;

        let term = ontology.get("DOID:1").expect("term must exist");
        assert!(term.is_obsolete);
        assert_eq!(term.def, None);

        Ok(())
    }

    #[test]
    fn from_reader_malformed() {
        let text = "[Term]\nid: DOID:1\nthis line has no tag\n";
        let err = DiseaseOntology::from_reader(text.as_bytes()).unwrap_err();

        assert_eq!(
            err.to_string(),
            "OBO line 3: expected 'tag: value', got \"this line has no tag\""
        );
    }

    #[rstest::rstest]
    #[case("\"plain\" [url:x]", "plain")]
    #[case("\"with \\\"escaped\\\" quotes\" []", "with \"escaped\" quotes")]
    #[case("unquoted", "unquoted")]
    fn unquote(#[case] value: &str, #[case] expected: &str) {
        assert_eq!(super::unquote(value), expected);
    }

    #[rstest::rstest]
    #[case(" DOID:175 ! vascular cancer", "DOID:175")]
    #[case(" DOID:175", "DOID:175")]
    fn strip_comment(#[case] value: &str, #[case] expected: &str) {
        assert_eq!(super::strip_comment(value), expected);
    }
}
