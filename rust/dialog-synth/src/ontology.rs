//! The target domain: methods, objects, values and states.
//!
//! The ontology is read-only once built. Members live in per-kind arenas and
//! are identified by small copyable handles, so candidates can refer to them
//! without borrowing the ontology.
//!
//! An ontology is assembled with [`OntologyBuilder`] or read from a JSON
//! [`OntologyDocument`], which refers to other members by name:
//!
//! ```json
//! {
//!   "methods": [{ "name": "openDoor", "parameters": [{ "name": "door", "data_type": "Openable" }] }],
//!   "objects": [{ "name": "Fridge", "types": ["Openable"], "sub_objects": ["FridgeDoor"] }]
//! }
//! ```

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::SynthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MethodId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObjectId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ValueId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StateId(usize);

/// A handle to an ontology member that can fill a method parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Individual {
    Object(ObjectId),
    Value(ValueId),
    State(StateId),
}

/// A declared parameter of a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodParameter {
    pub name: String,
    /// Name of the parameter's data type: "Object", a typed-object category,
    /// an enumerated data type, a state name, or a primitive like "int".
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub parameters: Vec<MethodParameter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub name: String,
    /// Typed-object categories this object belongs to.
    pub types: Vec<String>,
    pub sub_objects: Vec<ObjectId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataType {
    pub name: String,
    /// Whether values of this type are drawn from `values`.
    #[serde(default)]
    pub primitive: bool,
    #[serde(default)]
    pub values: Vec<String>,
}

/// Parameter types without an ontology representation.
pub const PRIMITIVE_TYPES: [&str; 8] = [
    "String", "int", "double", "float", "short", "char", "boolean", "long",
];

/// Primitive types that need a number in the utterance.
pub const NUMERIC_TYPES: [&str; 5] = ["int", "double", "float", "short", "long"];

/// The data type every object is compatible with.
pub const ANY_OBJECT: &str = "Object";

pub fn is_primitive_type(data_type: &str) -> bool {
    PRIMITIVE_TYPES.contains(&data_type)
}

pub fn is_numeric_type(data_type: &str) -> bool {
    NUMERIC_TYPES.contains(&data_type)
}

#[derive(Debug, Clone, Default)]
pub struct Ontology {
    methods: Vec<Method>,
    aliases: Vec<Vec<MethodId>>,
    objects: Vec<Object>,
    values: Vec<String>,
    states: Vec<String>,
    data_types: HashMap<String, DataType>,
    typed_object_types: BTreeSet<String>,
}

impl Ontology {
    pub fn from_json(json: &str) -> Result<Self, SynthError> {
        let document: OntologyDocument = serde_json::from_str(json)?;
        Ontology::from_document(document)
    }

    pub fn from_document(document: OntologyDocument) -> Result<Self, SynthError> {
        let method_ids = index_names("method", document.methods.iter().map(|m| m.name.as_str()))?;
        let object_ids = index_names("object", document.objects.iter().map(|o| o.name.as_str()))?;

        let mut aliases = vec![BTreeSet::new(); document.methods.len()];
        for (index, method) in document.methods.iter().enumerate() {
            for alias in &method.same_as {
                let other = *method_ids.get(alias.as_str()).ok_or_else(|| {
                    SynthError::UnknownReference {
                        kind: "method",
                        name: alias.clone(),
                    }
                })?;
                if other != index {
                    aliases[index].insert(MethodId(other));
                    aliases[other].insert(MethodId(index));
                }
            }
        }

        let mut objects = Vec::with_capacity(document.objects.len());
        for object in &document.objects {
            let sub_objects = object
                .sub_objects
                .iter()
                .map(|name| {
                    object_ids
                        .get(name.as_str())
                        .map(|index| ObjectId(*index))
                        .ok_or_else(|| SynthError::UnknownReference {
                            kind: "object",
                            name: name.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            objects.push(Object {
                name: object.name.clone(),
                types: object.types.clone(),
                sub_objects,
            });
        }

        let typed_object_types = objects
            .iter()
            .flat_map(|object| object.types.iter().cloned())
            .collect();

        let mut values = document.values;
        for value in document.data_types.iter().flat_map(|t| t.values.iter()) {
            if !values.contains(value) {
                values.push(value.clone());
            }
        }

        let data_types = document
            .data_types
            .into_iter()
            .map(|data_type| (data_type.name.clone(), data_type))
            .collect();

        Ok(Ontology {
            methods: document
                .methods
                .into_iter()
                .map(|method| Method {
                    name: method.name,
                    parameters: method.parameters,
                })
                .collect(),
            aliases: aliases
                .into_iter()
                .map(|set| set.into_iter().collect())
                .collect(),
            objects,
            values,
            states: document.states,
            data_types,
            typed_object_types,
        })
    }

    pub fn method(&self, id: MethodId) -> &Method {
        &self.methods[id.0]
    }

    pub fn methods(&self) -> impl Iterator<Item = (MethodId, &Method)> {
        self.methods
            .iter()
            .enumerate()
            .map(|(index, method)| (MethodId(index), method))
    }

    pub fn method_by_name(&self, name: &str) -> Option<MethodId> {
        self.methods().find(|(_, m)| m.name == name).map(|(id, _)| id)
    }

    /// Methods declared to be the same individual as `id`.
    pub fn aliases(&self, id: MethodId) -> &[MethodId] {
        &self.aliases[id.0]
    }

    /// Whether `a` and `b` are the same method or declared aliases.
    pub fn same_method(&self, a: MethodId, b: MethodId) -> bool {
        a == b || self.aliases(a).contains(&b)
    }

    pub fn object(&self, id: ObjectId) -> &Object {
        &self.objects[id.0]
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(index, object)| (ObjectId(index), object))
    }

    pub fn values(&self) -> impl Iterator<Item = (ValueId, &str)> {
        self.values
            .iter()
            .enumerate()
            .map(|(index, value)| (ValueId(index), value.as_str()))
    }

    pub fn states(&self) -> impl Iterator<Item = (StateId, &str)> {
        self.states
            .iter()
            .enumerate()
            .map(|(index, state)| (StateId(index), state.as_str()))
    }

    pub fn individual_name(&self, individual: Individual) -> &str {
        match individual {
            Individual::Object(id) => &self.objects[id.0].name,
            Individual::Value(id) => &self.values[id.0],
            Individual::State(id) => &self.states[id.0],
        }
    }

    pub fn data_type(&self, name: &str) -> Option<&DataType> {
        self.data_types.get(name)
    }

    pub fn is_typed_object_type(&self, name: &str) -> bool {
        self.typed_object_types.contains(name)
    }

    /// The object named `name` that belongs to the typed-object category
    /// `data_type`, if that category exists.
    pub fn typed_object(&self, name: &str, data_type: &str) -> Option<ObjectId> {
        if !self.is_typed_object_type(data_type) {
            return None;
        }
        self.objects()
            .find(|(_, object)| {
                object.name == name && object.types.iter().any(|t| t == data_type)
            })
            .map(|(id, _)| id)
    }
}

fn index_names<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> Result<HashMap<&'a str, usize>, SynthError> {
    let mut index = HashMap::new();
    for (position, name) in names.enumerate() {
        if index.insert(name, position).is_some() {
            return Err(SynthError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(index)
}

/// Serialized form of an [`Ontology`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OntologyDocument {
    pub methods: Vec<MethodDocument>,
    pub objects: Vec<ObjectDocument>,
    /// Values not listed by any data type.
    pub values: Vec<String>,
    pub states: Vec<String>,
    pub data_types: Vec<DataType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDocument {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<MethodParameter>,
    /// Names of methods that denote the same individual.
    #[serde(default)]
    pub same_as: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDocument {
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub sub_objects: Vec<String>,
}

/// Builder for constructing ontologies ergonomically.
#[derive(Debug, Default)]
pub struct OntologyBuilder {
    document: OntologyDocument,
}

impl OntologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: MethodBuilder) -> Self {
        self.document.methods.push(method.document);
        self
    }

    pub fn object(mut self, object: ObjectBuilder) -> Self {
        self.document.objects.push(object.document);
        self
    }

    pub fn value(mut self, name: impl Into<String>) -> Self {
        self.document.values.push(name.into());
        self
    }

    pub fn state(mut self, name: impl Into<String>) -> Self {
        self.document.states.push(name.into());
        self
    }

    /// Add an enumerated data type whose members are values.
    pub fn enumeration<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.document.data_types.push(DataType {
            name: name.into(),
            primitive: true,
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn build(self) -> Result<Ontology, SynthError> {
        Ontology::from_document(self.document)
    }
}

pub struct MethodBuilder {
    document: MethodDocument,
}

impl MethodBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        MethodBuilder {
            document: MethodDocument {
                name: name.into(),
                parameters: Vec::new(),
                same_as: Vec::new(),
            },
        }
    }

    pub fn parameter(mut self, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        self.document.parameters.push(MethodParameter {
            name: name.into(),
            data_type: data_type.into(),
        });
        self
    }

    pub fn same_as(mut self, method: impl Into<String>) -> Self {
        self.document.same_as.push(method.into());
        self
    }
}

pub struct ObjectBuilder {
    document: ObjectDocument,
}

impl ObjectBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        ObjectBuilder {
            document: ObjectDocument {
                name: name.into(),
                types: Vec::new(),
                sub_objects: Vec::new(),
            },
        }
    }

    pub fn typed(mut self, data_type: impl Into<String>) -> Self {
        self.document.types.push(data_type.into());
        self
    }

    pub fn sub_object(mut self, name: impl Into<String>) -> Self {
        self.document.sub_objects.push(name.into());
        self
    }
}

/// Example: a small kitchen domain.
pub fn kitchen() -> Result<Ontology, SynthError> {
    OntologyBuilder::new()
        .method(MethodBuilder::new("open").parameter("what", "Openable"))
        .method(MethodBuilder::new("close").parameter("what", "Openable"))
        .method(
            MethodBuilder::new("grasp")
                .parameter("what", "Graspable")
                .same_as("take"),
        )
        .method(MethodBuilder::new("take").parameter("what", "Graspable"))
        .method(MethodBuilder::new("say").parameter("text", "String"))
        .method(MethodBuilder::new("wait").parameter("seconds", "int"))
        .method(MethodBuilder::new("turnOnLight"))
        .object(
            ObjectBuilder::new("Microwave")
                .typed("Appliance")
                .sub_object("MicrowaveDoor"),
        )
        .object(ObjectBuilder::new("MicrowaveDoor").typed("Openable"))
        .object(ObjectBuilder::new("Fridge").typed("Openable"))
        .object(ObjectBuilder::new("Cup").typed("Graspable"))
        .object(ObjectBuilder::new("Person"))
        .enumeration("Color", ["red", "green"])
        .state("Open")
        .build()
}
