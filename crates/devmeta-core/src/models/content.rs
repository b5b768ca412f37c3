//! Service payload models

use serde::{Deserialize, Serialize};

use super::non_empty;

/// Value type of a content variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    /// Text value
    #[serde(rename = "https://schema.org/Text")]
    String,
    /// Whole number
    #[serde(rename = "https://schema.org/Integer")]
    Integer,
    /// Floating point number
    #[serde(rename = "https://schema.org/Float")]
    Float,
    /// true / false
    #[serde(rename = "https://schema.org/Boolean")]
    Boolean,
    /// Object with named members
    #[serde(rename = "https://schema.org/StructuredValue")]
    Structure,
    /// Ordered list; member names are indices or `*`
    #[serde(rename = "https://schema.org/ItemList")]
    List,
}

/// One point in a service's structured input or output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentVariable {
    /// Unique identifier
    pub id: String,
    /// Member name within the parent (or the payload root name)
    pub name: String,
    /// Value type
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<VariableType>,
    /// Characteristic (unit/representation) of the value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characteristic_id: Option<String>,
    /// Function this value measures or controls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_id: Option<String>,
    /// Aspect this value refers to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_id: Option<String>,
    /// Variable carries no payload (e.g. a plain "switch on" request)
    #[serde(default)]
    pub is_void: bool,
    /// Default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// Ordered members
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_content_variables: Vec<ContentVariable>,
}

impl ContentVariable {
    /// Create a variable without annotations
    pub fn new(id: impl Into<String>, name: impl Into<String>, variable_type: VariableType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            variable_type: Some(variable_type),
            ..Default::default()
        }
    }

    /// Annotate with a function and aspect
    pub fn with_function(mut self, function_id: impl Into<String>, aspect_id: Option<&str>) -> Self {
        self.function_id = Some(function_id.into());
        self.aspect_id = aspect_id.map(String::from);
        self
    }

    /// Set the characteristic
    pub fn with_characteristic(mut self, characteristic_id: impl Into<String>) -> Self {
        self.characteristic_id = Some(characteristic_id.into());
        self
    }

    /// Mark as void
    pub fn void(mut self) -> Self {
        self.is_void = true;
        self
    }

    /// Append a member
    pub fn with_member(mut self, member: ContentVariable) -> Self {
        self.sub_content_variables.push(member);
        self
    }

    /// Function annotation, ignoring empty strings
    pub fn function(&self) -> Option<&str> {
        non_empty(&self.function_id)
    }

    /// Aspect annotation, ignoring empty strings
    pub fn aspect(&self) -> Option<&str> {
        non_empty(&self.aspect_id)
    }

    /// Characteristic, ignoring empty strings
    pub fn characteristic(&self) -> Option<&str> {
        non_empty(&self.characteristic_id)
    }

    /// Whether this variable has no members
    pub fn is_leaf(&self) -> bool {
        self.sub_content_variables.is_empty()
    }

    /// Walk this tree in document order, yielding every variable with its
    /// path. The root's path is `prefix + name`; struct members are joined
    /// with `.`, list members with `[name]`.
    pub fn flatten(&self, prefix: &str) -> Vec<FlatVariable<'_>> {
        let root_path = format!("{}{}", prefix, self.name);
        let mut result = Vec::new();
        let mut stack = vec![(self, root_path.clone())];
        while let Some((variable, path)) = stack.pop() {
            let is_list = variable.variable_type == Some(VariableType::List);
            for member in variable.sub_content_variables.iter().rev() {
                let member_path = if is_list {
                    format!("{}[{}]", path, member.name)
                } else {
                    format!("{}.{}", path, member.name)
                };
                stack.push((member, member_path));
            }
            result.push(FlatVariable {
                variable,
                path,
                root_path: root_path.clone(),
            });
        }
        result
    }
}

/// Payload content of a service input or output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// Unique identifier
    pub id: String,
    /// Root of the payload tree
    pub content_variable: ContentVariable,
    /// Wire serialization (json, xml, plain-text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialization: Option<String>,
    /// Protocol segment the payload travels in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_segment_id: Option<String>,
}

impl Content {
    /// Wrap a payload root
    pub fn new(id: impl Into<String>, content_variable: ContentVariable) -> Self {
        Self {
            id: id.into(),
            content_variable,
            serialization: None,
            protocol_segment_id: None,
        }
    }
}

/// Which side of a service a payload belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Request payload
    Input,
    /// Response or event payload
    Output,
}

/// A content variable located within its payload
#[derive(Debug, Clone, PartialEq)]
pub struct FlatVariable<'a> {
    /// The variable
    pub variable: &'a ContentVariable,
    /// Path from the content root, including any prefix
    pub path: String,
    /// Path of the content root this variable belongs to
    pub root_path: String,
}

/// A flattened variable tagged with the side of the service it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceVariable<'a> {
    /// Input or output
    pub direction: Direction,
    /// Located variable
    pub flat: FlatVariable<'a>,
}

impl<'a> ServiceVariable<'a> {
    /// The variable
    pub fn variable(&self) -> &'a ContentVariable {
        self.flat.variable
    }

    /// Path used to address this variable. Void variables carry no payload
    /// and are addressed by their content root.
    pub fn address(&self) -> &str {
        if self.flat.variable.is_void {
            &self.flat.root_path
        } else {
            &self.flat.path
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paths(flat: &[FlatVariable<'_>]) -> Vec<String> {
        flat.iter().map(|f| f.path.clone()).collect()
    }

    #[test]
    fn flatten_struct_in_document_order() {
        let root = ContentVariable::new("v1", "struct", VariableType::Structure)
            .with_member(ContentVariable::new("v2", "level", VariableType::Float))
            .with_member(
                ContentVariable::new("v3", "meta", VariableType::Structure)
                    .with_member(ContentVariable::new("v4", "unit", VariableType::String)),
            )
            .with_member(ContentVariable::new("v5", "time", VariableType::String));

        let flat = root.flatten("");
        assert_eq!(
            paths(&flat),
            vec!["struct", "struct.level", "struct.meta", "struct.meta.unit", "struct.time"]
        );
        assert!(flat.iter().all(|f| f.root_path == "struct"));
    }

    #[test]
    fn flatten_list_members_use_brackets() {
        let root = ContentVariable::new("v1", "values", VariableType::List)
            .with_member(ContentVariable::new("v2", "0", VariableType::Float))
            .with_member(
                ContentVariable::new("v3", "1", VariableType::Structure)
                    .with_member(ContentVariable::new("v4", "level", VariableType::Float)),
            );

        assert_eq!(
            paths(&root.flatten("value.")),
            vec!["value.values", "value.values[0]", "value.values[1]", "value.values[1].level"]
        );
    }

    #[test]
    fn void_variable_is_addressed_by_root() {
        let root = ContentVariable::new("v1", "payload", VariableType::Structure)
            .with_member(
                ContentVariable::new("v2", "on", VariableType::Boolean)
                    .with_function("urn:infai:ses:controlling-function:on", None)
                    .void(),
            );
        let flat = root.flatten("");
        let on = ServiceVariable {
            direction: Direction::Input,
            flat: flat[1].clone(),
        };
        assert_eq!(on.flat.path, "payload.on");
        assert_eq!(on.address(), "payload");
    }

    #[test]
    fn empty_annotations_are_ignored() {
        let mut variable = ContentVariable::new("v1", "level", VariableType::Float);
        variable.function_id = Some(String::new());
        variable.aspect_id = Some("air".to_string());
        assert_eq!(variable.function(), None);
        assert_eq!(variable.aspect(), Some("air"));
    }
}
