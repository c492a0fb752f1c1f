//! Completion specifications
//!
//! Declarative description of a command's subcommands, options and
//! positional arguments, compatible with the Fig/Warp JSON layout. A
//! subcommand is itself a [`CommandSpec`], so the tree is uniform.

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserializer, IntoDeserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::post_process::PostProcess;

/// A completion specification for a command or subcommand
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSpec {
    /// Labels the command answers to (first is canonical)
    #[serde(deserialize_with = "one_or_many")]
    pub name: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subcommands: Vec<CommandSpec>,
    #[serde(default)]
    pub options: Vec<OptionSpec>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub args: Vec<ArgSpec>,
}

/// Specification for a command option/flag
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSpec {
    /// Option names (e.g., ["-v", "--verbose"])
    #[serde(deserialize_with = "one_or_many")]
    pub name: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Values the option consumes, in order
    #[serde(default, deserialize_with = "one_or_many")]
    pub args: Vec<ArgSpec>,
    /// Stays valid inside every nested subcommand
    #[serde(default)]
    pub is_persistent: bool,
}

/// Specification for a positional argument or option value
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<SuggestionSpec>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub generators: Vec<GeneratorSpec>,
    /// Shorthand for a leading template generator
    #[serde(default)]
    pub template: Option<TemplateKind>,
    #[serde(default)]
    pub is_variadic: bool,
    #[serde(default)]
    pub is_optional: bool,
}

/// A literal suggestion attached to an argument
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "SuggestionRepr")]
pub struct SuggestionSpec {
    pub name: Vec<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SuggestionRepr {
    Name(String),
    Full {
        #[serde(deserialize_with = "one_or_many")]
        name: Vec<String>,
        #[serde(default)]
        description: Option<String>,
    },
}

impl From<SuggestionRepr> for SuggestionSpec {
    fn from(repr: SuggestionRepr) -> Self {
        match repr {
            SuggestionRepr::Name(name) => Self {
                name: vec![name],
                description: None,
            },
            SuggestionRepr::Full { name, description } => Self { name, description },
        }
    }
}

/// Path listing requested by a template generator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Filepaths,
    Folders,
}

/// Producer of dynamic suggestions for an argument
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GeneratorSpec {
    /// Only flags a path listing; never runs a process
    Template(TemplateKind),
    /// Runs an external command and maps its output
    Script(ScriptGenerator),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptGenerator {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub post_process: PostProcess,
}

impl CommandSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: vec![name.to_string()],
            description: None,
            subcommands: vec![],
            options: vec![],
            args: vec![],
        }
    }

    pub fn alias(mut self, name: &str) -> Self {
        self.name.push(name.to_string());
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn subcommand(mut self, sub: CommandSpec) -> Self {
        self.subcommands.push(sub);
        self
    }

    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    pub fn arg(mut self, arg: ArgSpec) -> Self {
        self.args.push(arg);
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.name.iter().any(|n| n == label)
    }

    pub fn find_subcommand(&self, label: &str) -> Option<&CommandSpec> {
        self.subcommands.iter().find(|s| s.has_label(label))
    }
}

impl OptionSpec {
    pub fn new(names: &[&str]) -> Self {
        Self {
            name: names.iter().map(|n| n.to_string()).collect(),
            description: None,
            args: vec![],
            is_persistent: false,
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn arg(mut self, arg: ArgSpec) -> Self {
        self.args.push(arg);
        self
    }

    pub fn persistent(mut self) -> Self {
        self.is_persistent = true;
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.name.iter().any(|n| n == label)
    }

    pub fn takes_value(&self) -> bool {
        !self.args.is_empty()
    }
}

impl ArgSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn suggestions(mut self, names: &[&str]) -> Self {
        self.suggestions
            .extend(names.iter().map(|n| SuggestionSpec::new(n)));
        self
    }

    pub fn suggestion(mut self, suggestion: SuggestionSpec) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    pub fn generator(mut self, generator: GeneratorSpec) -> Self {
        self.generators.push(generator);
        self
    }

    pub fn template(mut self, kind: TemplateKind) -> Self {
        self.template = Some(kind);
        self
    }

    pub fn variadic(mut self) -> Self {
        self.is_variadic = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    /// Template shorthand first, then declared generators
    pub fn all_generators(&self) -> impl Iterator<Item = Cow<'_, GeneratorSpec>> {
        self.template
            .map(|kind| Cow::Owned(GeneratorSpec::Template(kind)))
            .into_iter()
            .chain(self.generators.iter().map(Cow::Borrowed))
    }
}

impl SuggestionSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: vec![name.to_string()],
            description: None,
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }
}

impl GeneratorSpec {
    pub fn script(command: &str, args: &[&str], post_process: PostProcess) -> Self {
        GeneratorSpec::Script(ScriptGenerator {
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            post_process,
        })
    }
}

/// Accepts either a single value or a list of values
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct OneOrMany<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for OneOrMany<T> {
        type Value = Vec<T>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a value or a list of values")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Vec<T>, E> {
            T::deserialize(v.into_deserializer()).map(|t| vec![t])
        }

        fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Vec<T>, A::Error> {
            Vec::<T>::deserialize(de::value::SeqAccessDeserializer::new(seq))
        }

        fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Vec<T>, A::Error> {
            T::deserialize(de::value::MapAccessDeserializer::new(map)).map(|t| vec![t])
        }
    }

    deserializer.deserialize_any(OneOrMany(PhantomData))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_tree() {
        let spec = CommandSpec::new("git")
            .description("Version control")
            .subcommand(CommandSpec::new("checkout").alias("co"))
            .option(OptionSpec::new(&["-C"]).arg(ArgSpec::new("path")));

        assert!(spec.find_subcommand("co").is_some());
        assert!(spec.find_subcommand("commit").is_none());
        assert!(spec.options[0].takes_value());
    }

    #[test]
    fn test_deserialize_fig_layout() {
        let json = r#"{
            "name": "tool",
            "subcommands": [{ "name": ["remove", "rm"], "args": { "name": "item", "isVariadic": true } }],
            "options": [{ "name": "--out", "args": { "template": "folders" }, "isPersistent": true }],
            "args": [{
                "suggestions": ["a", { "name": ["b", "bee"], "description": "B" }],
                "generators": [
                    { "template": "filepaths" },
                    { "script": { "command": "git", "args": ["branch"], "postProcess": "gitBranches" } }
                ]
            }]
        }"#;
        let spec: CommandSpec = serde_json::from_str(json).unwrap();

        assert_eq!(spec.name, vec!["tool"]);
        assert_eq!(spec.subcommands[0].name, vec!["remove", "rm"]);
        assert!(spec.subcommands[0].args[0].is_variadic);
        assert!(spec.options[0].is_persistent);
        assert_eq!(spec.options[0].args[0].template, Some(TemplateKind::Folders));

        let arg = &spec.args[0];
        assert_eq!(arg.suggestions[0].name, vec!["a"]);
        assert_eq!(arg.suggestions[1].name, vec!["b", "bee"]);
        assert_eq!(arg.generators[0], GeneratorSpec::Template(TemplateKind::Filepaths));
        match &arg.generators[1] {
            GeneratorSpec::Script(script) => {
                assert_eq!(script.command, "git");
                assert_eq!(script.post_process.name(), "gitBranches");
            }
            other => panic!("expected script generator, got {:?}", other),
        }
    }

    #[test]
    fn test_post_process_defaults_to_lines() {
        let gen: GeneratorSpec =
            serde_json::from_str(r#"{ "script": { "command": "ls" } }"#).unwrap();
        match gen {
            GeneratorSpec::Script(script) => assert_eq!(script.post_process.name(), "lines"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_template_shorthand_runs_first() {
        let arg = ArgSpec::new("x")
            .generator(GeneratorSpec::Template(TemplateKind::Folders))
            .template(TemplateKind::Filepaths);
        let gens: Vec<_> = arg.all_generators().map(Cow::into_owned).collect();
        assert_eq!(
            gens,
            vec![
                GeneratorSpec::Template(TemplateKind::Filepaths),
                GeneratorSpec::Template(TemplateKind::Folders),
            ]
        );
    }

    #[test]
    fn test_yaml_spec() {
        let yaml = "name: cd\nargs:\n  template: folders\n";
        let spec: CommandSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.args[0].template, Some(TemplateKind::Folders));
    }
}
