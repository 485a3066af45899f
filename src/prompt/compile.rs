//! Template Compiler - turn a record plus variables into the final prompt text
//!
//! Sections are emitted in a fixed order (persona, instructions, examples,
//! chain of thought, user input). A section whose source field is absent
//! produces nothing at all. Every emitted section other than the user input
//! ends with a blank line, so the user input follows directly after it.
//!
//! Placeholders use `${name}` syntax. Unknown names are left in place and
//! substituted values are never rescanned. No escaping is applied to values.

use std::fmt::Write;

use serde_json::Value;

use super::template::{TemplateRecord, Variables};

/// Compile a record into the text sent to a backend
pub fn compile(record: &TemplateRecord, variables: &Variables) -> String {
    let mut out = String::new();

    if let Some(persona) = &record.persona {
        if let Some(role) = &persona.role {
            let _ = writeln!(out, "{}", role);
        }
        if let Some(expertise) = &persona.expertise {
            let _ = writeln!(out, "Expertise: {}", expertise);
        }
        if let Some(tone) = &persona.tone {
            let _ = writeln!(out, "Tone: {}", tone);
        }
        out.push('\n');
    }

    if let Some(instructions) = &record.instructions {
        out.push_str("Instructions:\n");
        push_bullets(&mut out, instructions);
        out.push('\n');
    }

    if let Some(examples) = &record.few_shot_examples {
        out.push_str("Examples:\n");
        for example in examples {
            let _ = writeln!(out, "Input: {}", example.input);
            let _ = writeln!(out, "Analysis: {}", example.analysis);
            let _ = writeln!(out, "Output: {}", example.output);
            out.push('\n');
        }
    }

    if let Some(steps) = &record.chain_of_thought {
        out.push_str("Please follow this process:\n");
        push_bullets(&mut out, steps);
        out.push('\n');
    }

    if let Some(template) = &record.user_input_template {
        out.push_str(&substitute(template, variables));
    }

    out
}

/// Compile a record using the inputs of one of its shipped test cases
pub fn compile_test_case(record: &TemplateRecord, name: &str) -> Option<String> {
    record.test_case(name).map(|tc| compile(record, &tc.inputs))
}

fn push_bullets(out: &mut String, items: &[String]) {
    for item in items {
        let _ = writeln!(out, "- {}", item);
    }
}

/// Replace every `${name}` whose name has a non-null value in `variables`
pub fn substitute(template: &str, variables: &Variables) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let Some(end) = after_open.find('}') else {
            // Unterminated placeholder, keep the remainder as written
            out.push_str(&rest[start..]);
            return out;
        };

        let name = &after_open[..end];
        if let Some(inner) = name.find("${") {
            // Stray opener, the real placeholder starts at the inner one
            out.push_str(&rest[start..start + 2 + inner]);
            rest = &after_open[inner..];
            continue;
        }
        match variables.get(name).filter(|v| !v.is_null()) {
            Some(value) => out.push_str(&value_to_string(value)),
            None => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after_open[end + 1..];
    }

    out.push_str(rest);
    out
}

/// Canonical text form of a variable value
///
/// Strings are used as-is; everything else uses its compact JSON form.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Declared required variables that are missing from `variables`
///
/// Purely advisory: neither `compile` nor the executor consult it.
pub fn missing_required<'a>(record: &'a TemplateRecord, variables: &Variables) -> Vec<&'a str> {
    record
        .variables
        .iter()
        .filter(|decl| decl.required && variables.get(&decl.name).is_none_or(Value::is_null))
        .map(|decl| decl.name.as_str())
        .collect()
}
