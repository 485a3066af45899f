//! Template Record - in-memory form of one parsed prompt definition
//!
//! Records are deserialized from the on-disk `*.prompt.json` layout, where the
//! structural sections live under a nested `prompt` object, and flattened into
//! a single immutable [`TemplateRecord`].

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Caller-supplied substitution values, keyed by placeholder name
pub type Variables = HashMap<String, Value>;

/// One prompt definition, owned by the registry and never mutated after load
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemplateRecord {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub persona: Option<Persona>,
    pub instructions: Option<Vec<String>>,
    pub few_shot_examples: Option<Vec<FewShotExample>>,
    pub chain_of_thought: Option<Vec<String>>,
    pub user_input_template: Option<String>,
    pub variables: Vec<VariableDeclaration>,
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub expertise: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FewShotExample {
    #[serde(default)]
    pub input: String,
    #[serde(default, alias = "explanation")]
    pub analysis: String,
    #[serde(default)]
    pub output: String,
}

/// Advisory description of a placeholder; never enforced during compilation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub name: String,
    #[serde(rename = "type", default)]
    pub var_type: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "default")]
    pub default_value: Option<Value>,
}

/// A named sample invocation shipped with the prompt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    #[serde(default)]
    pub inputs: Variables,
}

#[derive(Debug, Default, Deserialize)]
struct RawTemplate {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    prompt: Option<RawStructure>,
    #[serde(default)]
    user_input_template: Option<String>,
    #[serde(default)]
    variables: Option<Vec<VariableDeclaration>>,
    #[serde(default)]
    test_cases: Option<Vec<TestCase>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStructure {
    #[serde(default)]
    persona: Option<Persona>,
    #[serde(default)]
    instructions: Option<Vec<String>>,
    #[serde(default)]
    few_shot_examples: Option<Vec<FewShotExample>>,
    #[serde(default)]
    chain_of_thought: Option<Vec<String>>,
}

impl TemplateRecord {
    /// Build a record from structured data, assigning it the given identifier
    pub fn from_value(id: impl Into<String>, value: Value) -> Result<Self, serde_json::Error> {
        let raw: RawTemplate = serde_json::from_value(value)?;
        let structure = raw.prompt.unwrap_or_default();
        Ok(Self {
            id: id.into(),
            title: raw.title,
            description: raw.description,
            persona: structure.persona,
            instructions: structure.instructions,
            few_shot_examples: structure.few_shot_examples,
            chain_of_thought: structure.chain_of_thought,
            user_input_template: raw.user_input_template,
            variables: raw.variables.unwrap_or_default(),
            test_cases: raw.test_cases.unwrap_or_default(),
        })
    }

    /// Look up a shipped test case by name
    pub fn test_case(&self, name: &str) -> Option<&TestCase> {
        self.test_cases.iter().find(|tc| tc.name == name)
    }
}

/// Persona expertise appears both as a sentence and as a list of areas
fn string_or_list<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    Ok(Option::<StringOrList>::deserialize(deserializer)?.map(|v| match v {
        StringOrList::One(s) => s,
        StringOrList::Many(items) => items.join(", "),
    }))
}
