//! Schema descriptors.
//!
//! A [`Schema`] is the fully materialized view of one entry `.proto` file:
//! the ordered top-level inventories of that file plus a registry of every
//! reachable type (nested and imported) keyed by fully-qualified name.

use indexmap::IndexMap;

/// Repetition label of a field declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLabel {
    Required,
    Optional,
    Repeated,
}

impl FieldLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Optional => "optional",
            Self::Repeated => "repeated",
        }
    }
}

/// Declared wire type of a field, mirroring the protobuf type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    Enum,
    Message,
}

/// Value category of a field type, used to gate default-value comparison.
///
/// Distinct wire encodings of the same in-memory kind (e.g. `int32` and
/// `sint32`) share a `ValueKind` the way they share a C++ `cpp_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    I32,
    I64,
    U32,
    U64,
    F32,
    F64,
    Bool,
    String,
    Bytes,
    Enum,
    Message,
}

impl FieldType {
    /// Parse a scalar type keyword. Returns `None` for non-scalar tokens,
    /// which are treated as type references to be resolved later.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "double" => Self::Double,
            "float" => Self::Float,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "uint32" => Self::Uint32,
            "uint64" => Self::Uint64,
            "sint32" => Self::Sint32,
            "sint64" => Self::Sint64,
            "fixed32" => Self::Fixed32,
            "fixed64" => Self::Fixed64,
            "sfixed32" => Self::Sfixed32,
            "sfixed64" => Self::Sfixed64,
            "bool" => Self::Bool,
            "string" => Self::String,
            "bytes" => Self::Bytes,
            _ => return None,
        })
    }

    /// Source-level name of the type, used in change-item labels.
    pub fn proto_name(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Float => "float",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Sint32 => "sint32",
            Self::Sint64 => "sint64",
            Self::Fixed32 => "fixed32",
            Self::Fixed64 => "fixed64",
            Self::Sfixed32 => "sfixed32",
            Self::Sfixed64 => "sfixed64",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Enum => "enum",
            Self::Message => "message",
        }
    }

    pub fn value_kind(self) -> ValueKind {
        match self {
            Self::Double => ValueKind::F64,
            Self::Float => ValueKind::F32,
            Self::Int32 | Self::Sint32 | Self::Sfixed32 => ValueKind::I32,
            Self::Int64 | Self::Sint64 | Self::Sfixed64 => ValueKind::I64,
            Self::Uint32 | Self::Fixed32 => ValueKind::U32,
            Self::Uint64 | Self::Fixed64 => ValueKind::U64,
            Self::Bool => ValueKind::Bool,
            Self::String => ValueKind::String,
            Self::Bytes => ValueKind::Bytes,
            Self::Enum => ValueKind::Enum,
            Self::Message => ValueKind::Message,
        }
    }
}

/// A field's declared default value.
///
/// Enum defaults keep the declared value *name*; the comparator resolves it
/// to the numeric tag through the field's enum type at comparison time.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    String(String),
    Enum(String),
}

/// One field of a message.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Simple name within the message.
    pub name: String,
    /// `<message full name>.<name>`.
    pub full_name: String,
    /// Wire number.
    pub number: u32,
    pub label: FieldLabel,
    /// Whether the declaration distinguishes "unset" from "set to default":
    /// proto2 `optional`, proto3 `optional`, or oneof membership.
    pub explicit_presence: bool,
    pub field_type: FieldType,
    /// Fully-qualified name of the referenced type, for enum/message fields.
    pub type_name: Option<String>,
    pub default: Option<DefaultValue>,
}

/// A message type and its ordered fields.
#[derive(Debug, Clone)]
pub struct MessageDescriptor {
    pub name: String,
    pub full_name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl MessageDescriptor {
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.number == number)
    }
}

/// One value of an enum type.
#[derive(Debug, Clone)]
pub struct EnumValueDescriptor {
    pub name: String,
    pub number: i32,
}

/// An enum type and its ordered values.
#[derive(Debug, Clone)]
pub struct EnumDescriptor {
    pub name: String,
    pub full_name: String,
    pub values: Vec<EnumValueDescriptor>,
}

impl EnumDescriptor {
    pub fn value_by_name(&self, name: &str) -> Option<&EnumValueDescriptor> {
        self.values.iter().find(|v| v.name == name)
    }

    pub fn value_by_number(&self, number: i32) -> Option<&EnumValueDescriptor> {
        self.values.iter().find(|v| v.number == number)
    }
}

/// One rpc method of a service.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    pub name: String,
    /// Fully-qualified request message name.
    pub input_type: String,
    /// Fully-qualified response message name.
    pub output_type: String,
    pub client_streaming: bool,
    pub server_streaming: bool,
}

/// A service and its ordered methods.
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    pub name: String,
    pub full_name: String,
    pub methods: Vec<MethodDescriptor>,
}

/// Fully materialized schema for one entry file.
///
/// Top-level inventories preserve the entry file's declaration order. The
/// registries additionally hold nested and imported types, so field type
/// references and named lookups resolve against the whole import closure.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Entry file path as given to the loader.
    pub entry_file: String,
    /// Package of the entry file, if declared.
    pub package: Option<String>,
    messages: IndexMap<String, MessageDescriptor>,
    enums: IndexMap<String, EnumDescriptor>,
    services: Vec<ServiceDescriptor>,
    top_messages: Vec<String>,
    top_enums: Vec<String>,
}

impl Schema {
    pub fn new(entry_file: impl Into<String>, package: Option<String>) -> Self {
        Self {
            entry_file: entry_file.into(),
            package,
            ..Self::default()
        }
    }

    /// Register a message type. `top_level` marks it as part of the entry
    /// file's own inventory. Returns false if the name was already taken.
    pub fn add_message(&mut self, message: MessageDescriptor, top_level: bool) -> bool {
        if self.messages.contains_key(&message.full_name) || self.enums.contains_key(&message.full_name) {
            return false;
        }
        if top_level {
            self.top_messages.push(message.full_name.clone());
        }
        self.messages.insert(message.full_name.clone(), message);
        true
    }

    /// Register an enum type. Same contract as [`Schema::add_message`].
    pub fn add_enum(&mut self, enum_type: EnumDescriptor, top_level: bool) -> bool {
        if self.enums.contains_key(&enum_type.full_name) || self.messages.contains_key(&enum_type.full_name) {
            return false;
        }
        if top_level {
            self.top_enums.push(enum_type.full_name.clone());
        }
        self.enums.insert(enum_type.full_name.clone(), enum_type);
        true
    }

    pub fn add_service(&mut self, service: ServiceDescriptor) {
        self.services.push(service);
    }

    /// Look up any registered message by fully-qualified name.
    pub fn message(&self, full_name: &str) -> Option<&MessageDescriptor> {
        self.messages.get(full_name)
    }

    /// Look up any registered enum by fully-qualified name.
    pub fn enum_type(&self, full_name: &str) -> Option<&EnumDescriptor> {
        self.enums.get(full_name)
    }

    /// Top-level messages of the entry file, in declaration order.
    pub fn top_level_messages(&self) -> impl Iterator<Item = &MessageDescriptor> {
        self.top_messages
            .iter()
            .filter_map(move |name| self.messages.get(name))
    }

    /// Top-level enums of the entry file, in declaration order.
    pub fn top_level_enums(&self) -> impl Iterator<Item = &EnumDescriptor> {
        self.top_enums
            .iter()
            .filter_map(move |name| self.enums.get(name))
    }

    /// Services of the entry file, in declaration order.
    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    /// Find a top-level message by its simple (unqualified) name.
    pub fn find_top_message(&self, name: &str) -> Option<&MessageDescriptor> {
        self.top_level_messages().find(|m| m.name == name)
    }

    /// Find a top-level enum by its simple (unqualified) name.
    pub fn find_top_enum(&self, name: &str) -> Option<&EnumDescriptor> {
        self.top_level_enums().find(|e| e.name == name)
    }

    pub fn find_service(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Resolve a user-supplied type name against the registry: first as
    /// given, then qualified with the entry file's package.
    pub fn resolve_message(&self, name: &str) -> Option<&MessageDescriptor> {
        self.message(name)
            .or_else(|| self.message(&self.qualify(name)))
    }

    /// Enum counterpart of [`Schema::resolve_message`].
    pub fn resolve_enum(&self, name: &str) -> Option<&EnumDescriptor> {
        self.enum_type(name)
            .or_else(|| self.enum_type(&self.qualify(name)))
    }

    fn qualify(&self, name: &str) -> String {
        match &self.package {
            Some(pkg) if !name.contains('.') => format!("{pkg}.{name}"),
            _ => name.to_string(),
        }
    }
}
