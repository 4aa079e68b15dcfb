//! Stringifier boundary: renders game trees to text.
//!
//! The tree never looks a stringifier up on its own; callers hand one to
//! [`GameTree::to_string`](crate::domain::GameTree::to_string).

use std::fmt;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::{debug, instrument};

use crate::config::StringifySettings;
use crate::domain::{GameTree, NodeId, Properties, SgfTree, TreeError, TreeResult, Value};

/// Value transform applied to every property before rendering.
///
/// Receives the property identifier and its value; returning `None` drops
/// the property from the output.
pub type Replacer = Box<dyn Fn(&str, &Value) -> Option<Value>>;

/// Indentation of the rendered output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Indent {
    /// Everything on one line
    #[default]
    Compact,
    /// Nested levels indented by this many spaces
    Spaces(usize),
    /// Nested levels indented by this literal text
    Text(String),
}

impl Indent {
    /// Text for one nesting level; None when compact.
    fn unit(&self) -> Option<String> {
        match self {
            Indent::Compact => None,
            Indent::Spaces(width) => Some(" ".repeat(*width)),
            Indent::Text(text) => Some(text.clone()),
        }
    }
}

/// Formatting controls passed through to a [`Stringifier`].
#[derive(Default)]
pub struct StringifyOptions {
    pub replacer: Option<Replacer>,
    pub indent: Indent,
}

impl StringifyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replacer<F>(mut self, replacer: F) -> Self
    where
        F: Fn(&str, &Value) -> Option<Value> + 'static,
    {
        self.replacer = Some(Box::new(replacer));
        self
    }

    pub fn with_indent(mut self, indent: Indent) -> Self {
        self.indent = indent;
        self
    }

    /// Applies the replacer, if any, to every property of `properties`.
    pub fn replace(&self, properties: &Properties) -> Properties {
        match &self.replacer {
            None => properties.clone(),
            Some(replacer) => properties
                .iter()
                .filter_map(|(key, value)| replacer(key, value).map(|v| (key.clone(), v)))
                .collect(),
        }
    }
}

impl From<&StringifySettings> for StringifyOptions {
    fn from(settings: &StringifySettings) -> Self {
        let indent = match settings.indent {
            0 => Indent::Compact,
            width => Indent::Spaces(width),
        };
        Self::new().with_indent(indent)
    }
}

impl fmt::Debug for StringifyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringifyOptions")
            .field("replacer", &self.replacer.as_ref().map(|_| "Fn"))
            .field("indent", &self.indent)
            .finish()
    }
}

/// Renders a collection of root nodes to text.
pub trait Stringifier {
    fn stringify(
        &self,
        tree: &GameTree,
        roots: &[NodeId],
        options: &StringifyOptions,
    ) -> TreeResult<String>;
}

/// Renders roots as a JSON array of nested forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonStringifier {
    /// Merge single-child chains into one sequence
    pub collapse_chains: bool,
}

impl Default for JsonStringifier {
    fn default() -> Self {
        Self {
            collapse_chains: true,
        }
    }
}

impl From<&StringifySettings> for JsonStringifier {
    fn from(settings: &StringifySettings) -> Self {
        Self {
            collapse_chains: settings.collapse_chains,
        }
    }
}

/// Pending output while walking nested forms.
enum Emit<'a> {
    Forms(&'a [SgfTree]),
    Form(&'a SgfTree),
    Element { first: bool },
    Close { empty: bool },
}

/// Writes nested forms as JSON arrays without recursing per level.
///
/// Array punctuation and indentation follow serde_json's pretty layout;
/// each property map is rendered by serde_json and shifted to its depth.
struct FormWriter<'o> {
    out: String,
    unit: Option<String>,
    depth: usize,
    options: &'o StringifyOptions,
}

impl<'o> FormWriter<'o> {
    fn new(options: &'o StringifyOptions) -> Self {
        Self {
            out: String::new(),
            unit: options.indent.unit(),
            depth: 0,
            options,
        }
    }

    fn write(mut self, forms: &[SgfTree]) -> TreeResult<String> {
        let mut stack = vec![Emit::Forms(forms)];

        while let Some(emit) = stack.pop() {
            match emit {
                Emit::Forms(forms) => {
                    self.open();
                    stack.push(Emit::Close {
                        empty: forms.is_empty(),
                    });
                    for (i, form) in forms.iter().enumerate().rev() {
                        stack.push(Emit::Form(form));
                        stack.push(Emit::Element { first: i == 0 });
                    }
                }
                Emit::Form(form) => {
                    self.open();
                    self.element(true);
                    self.sequence(&form.sequence)?;
                    stack.push(Emit::Close { empty: false });
                    stack.push(Emit::Forms(&form.variations));
                    stack.push(Emit::Element { first: false });
                }
                Emit::Element { first } => self.element(first),
                Emit::Close { empty } => self.close(empty),
            }
        }

        Ok(self.out)
    }

    fn open(&mut self) {
        self.out.push('[');
        self.depth += 1;
    }

    fn element(&mut self, first: bool) {
        if !first {
            self.out.push(',');
        }
        if let Some(unit) = &self.unit {
            self.out.push('\n');
            self.out.push_str(&unit.repeat(self.depth));
        }
    }

    fn close(&mut self, empty: bool) {
        self.depth = self.depth.saturating_sub(1);
        if let (false, Some(unit)) = (empty, &self.unit) {
            self.out.push('\n');
            self.out.push_str(&unit.repeat(self.depth));
        }
        self.out.push(']');
    }

    fn sequence(&mut self, sequence: &[Properties]) -> TreeResult<()> {
        self.open();
        for (i, properties) in sequence.iter().enumerate() {
            self.element(i == 0);
            self.properties(properties)?;
        }
        self.close(sequence.is_empty());
        Ok(())
    }

    fn properties(&mut self, properties: &Properties) -> TreeResult<()> {
        let replaced = self.options.replace(properties);
        // JSON has no NaN or infinity; serde_json would silently write null
        if let Some((key, _)) = replaced.iter().find(|(_, value)| !value.is_finite()) {
            return Err(TreeError::Stringify {
                message: format!("property {} holds a non-finite number", key),
            });
        }

        let text = render(&replaced, self.unit.as_deref()).map_err(|e| TreeError::Stringify {
            message: e.to_string(),
        })?;
        match &self.unit {
            None => self.out.push_str(&text),
            Some(unit) => {
                let margin = format!("\n{}", unit.repeat(self.depth));
                self.out.push_str(&text.replace('\n', &margin));
            }
        }
        Ok(())
    }
}

fn render<T: Serialize>(value: &T, unit: Option<&str>) -> Result<String, serde_json::Error> {
    match unit {
        None => serde_json::to_string(value),
        Some(unit) => {
            let mut out = Vec::new();
            let formatter = PrettyFormatter::with_indent(unit.as_bytes());
            let mut serializer = Serializer::with_formatter(&mut out, formatter);
            value.serialize(&mut serializer)?;
            Ok(String::from_utf8_lossy(&out).into_owned())
        }
    }
}

impl Stringifier for JsonStringifier {
    /// Fails with [`TreeError::Stringify`] on NaN or infinite floats.
    #[instrument(level = "debug", skip(self, tree, options))]
    fn stringify(
        &self,
        tree: &GameTree,
        roots: &[NodeId],
        options: &StringifyOptions,
    ) -> TreeResult<String> {
        let forms = roots
            .iter()
            .map(|&root| {
                if self.collapse_chains {
                    tree.to_json(root)
                } else {
                    tree.to_sgf(root)
                }
            })
            .collect::<TreeResult<Vec<_>>>()?;

        debug!(roots = forms.len(), "rendering collection");
        FormWriter::new(options).write(&forms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn given_replacer_when_stringifying_then_drops_and_rewrites_properties() {
        let mut tree = GameTree::new();
        let props = Properties::from([
            ("C".to_string(), Value::from("secret")),
            ("B".to_string(), Value::from("pd")),
        ]);
        let root = tree.create(props, None).unwrap();
        let options = StringifyOptions::new().with_replacer(|key, value| match key {
            "C" => None,
            _ => Some(Value::from(format!("{}!", value.as_str().unwrap_or_default()))),
        });

        let text = tree
            .to_string(root, &JsonStringifier::default(), &options)
            .unwrap();

        assert_eq!(text, r#"[[[{"B":"pd!"}],[]]]"#);
    }

    #[test]
    fn given_indent_when_stringifying_then_output_is_pretty() {
        let mut tree = GameTree::new();
        let root = tree.create(Properties::new(), None).unwrap();
        let options = StringifyOptions::new().with_indent(Indent::Spaces(2));

        let text = tree
            .to_string(root, &JsonStringifier::default(), &options)
            .unwrap();

        assert!(text.contains("\n  "), "expected indented output: {}", text);
    }

    #[test]
    fn given_branching_tree_when_pretty_printed_then_matches_serde_json_layout() {
        let mut tree = GameTree::new();
        let root = tree
            .create(Properties::from([("GM".to_string(), Value::Int(1))]), None)
            .unwrap();
        let pd = tree
            .create(Properties::from([("B".to_string(), Value::from("pd"))]), Some(root))
            .unwrap();
        tree.create(Properties::new(), Some(pd)).unwrap();
        tree.create(
            Properties::from([("C".to_string(), Value::from(vec!["a", "b"]))]),
            Some(pd),
        )
        .unwrap();
        let options = StringifyOptions::new().with_indent(Indent::Spaces(2));
        let shallow = JsonStringifier {
            collapse_chains: false,
        };

        let collapsed = tree
            .to_string(root, &JsonStringifier::default(), &options)
            .unwrap();
        let nested = tree.to_string(root, &shallow, &options).unwrap();

        let expected = serde_json::to_string_pretty(&vec![tree.to_json(root).unwrap()]).unwrap();
        assert_eq!(collapsed, expected);
        let expected = serde_json::to_string_pretty(&vec![tree.to_sgf(root).unwrap()]).unwrap();
        assert_eq!(nested, expected);
    }

    #[test]
    fn given_long_chain_when_stringifying_uncollapsed_then_renders_every_node() {
        let mut tree = GameTree::new();
        let root = tree.create(Properties::new(), None).unwrap();
        let mut last = root;
        for _ in 1..10_000 {
            last = tree.create(Properties::new(), Some(last)).unwrap();
        }
        let shallow = JsonStringifier {
            collapse_chains: false,
        };

        let text = tree
            .to_string(root, &shallow, &StringifyOptions::new())
            .unwrap();

        assert_eq!(text.matches("{}").count(), 10_000);
        assert!(text.starts_with("[[[{}],[[[{}],["), "got {}", &text[..40]);
        assert!(text.ends_with("[]]]]]"), "unbalanced tail");
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(f64::NEG_INFINITY)]
    fn given_non_finite_float_when_stringifying_then_stringify_error(#[case] number: f64) {
        let mut tree = GameTree::new();
        let nested = Value::from(vec![Value::Int(1), Value::Float(number)]);
        let root = tree
            .create(Properties::from([("KM".to_string(), nested)]), None)
            .unwrap();

        let result = tree.to_string(root, &JsonStringifier::default(), &StringifyOptions::new());

        assert!(
            matches!(&result, Err(TreeError::Stringify { message }) if message.contains("KM")),
            "got {:?}",
            result
        );
    }
}
