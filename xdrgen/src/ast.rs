//! The abstract syntax of XDR interface descriptions.

use crate::source::ByteRange;

/// An identifier, along with where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub range: ByteRange,
    pub name: String,
}

impl Ident {
    pub fn new(range: ByteRange, name: impl Into<String>) -> Ident {
        Ident {
            range,
            name: name.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

/// Sizes, constant values, identifiers and case labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A numeric literal, spelled as a Rust integer literal.
    Number(ByteRange, String),
    /// A reference to a constant or enumeration item.
    Name(Ident),
}

impl Value {
    pub fn range(&self) -> ByteRange {
        match self {
            Value::Number(range, _) => *range,
            Value::Name(ident) => ident.range,
        }
    }
}

/// The shape of a declared item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    Int { unsigned: bool },
    Hyper { unsigned: bool },
    Float,
    Double,
    Quadruple,
    Bool,
    /// An anonymous enumeration, represented as a plain integer.
    Enum(Vec<EnumItem>),
    /// A reference to a named type.
    Named(Ident),
    /// An anonymous structure.
    Struct(Vec<Field>),
    /// An anonymous discriminated union.
    Union(Box<UnionBody>),
    FixedArray(Box<TypeDescriptor>, Value),
    VarArray(Box<TypeDescriptor>, Option<Value>),
    FixedOpaque(Value),
    VarOpaque(Option<Value>),
    String(Option<Value>),
    Optional(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    /// The name used for this type in diagnostics.
    pub fn description(&self) -> &'static str {
        match self {
            TypeDescriptor::Int { unsigned: false } => "int",
            TypeDescriptor::Int { unsigned: true } => "unsigned int",
            TypeDescriptor::Hyper { unsigned: false } => "hyper",
            TypeDescriptor::Hyper { unsigned: true } => "unsigned hyper",
            TypeDescriptor::Float => "float",
            TypeDescriptor::Double => "double",
            TypeDescriptor::Quadruple => "quadruple",
            TypeDescriptor::Bool => "bool",
            TypeDescriptor::Enum(_) => "enum",
            TypeDescriptor::Named(_) => "named type",
            TypeDescriptor::Struct(_) => "struct",
            TypeDescriptor::Union(_) => "union",
            TypeDescriptor::FixedArray(_, _) => "fixed-length array",
            TypeDescriptor::VarArray(_, _) => "variable-length array",
            TypeDescriptor::FixedOpaque(_) => "fixed-length opaque",
            TypeDescriptor::VarOpaque(_) => "variable-length opaque",
            TypeDescriptor::String(_) => "string",
            TypeDescriptor::Optional(_) => "optional",
        }
    }
}

/// A declaration inside a structure, union or typedef.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Void(ByteRange),
    Named { name: Ident, ty: TypeDescriptor },
}

impl Field {
    pub fn range(&self) -> ByteRange {
        match self {
            Field::Void(range) => *range,
            Field::Named { name, .. } => name.range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumItem {
    pub name: Ident,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionBody {
    pub discriminant: Field,
    pub cases: Vec<UnionCase>,
    pub default: Option<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionCase {
    pub labels: Vec<Value>,
    pub body: Field,
}

/// The argument or result of a remote procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcType {
    Void(ByteRange),
    Type(ByteRange, TypeDescriptor),
}

impl ProcType {
    pub fn range(&self) -> ByteRange {
        match self {
            ProcType::Void(range) | ProcType::Type(range, _) => *range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Procedure {
    pub name: Ident,
    pub id: Value,
    pub args: Vec<ProcType>,
    pub result: ProcType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub name: Ident,
    pub id: Value,
    pub procedures: Vec<Procedure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub name: Ident,
    pub id: Value,
    pub versions: Vec<Version>,
}

/// Top-level definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    Const { name: Ident, value: Value },
    Typedef(Field),
    Struct { name: Ident, fields: Vec<Field> },
    Union { name: Ident, body: UnionBody },
    Enum { name: Ident, items: Vec<EnumItem> },
    Program(Program),
}

impl Definition {
    /// The name introduced by this definition, if any.
    pub fn name(&self) -> Option<&Ident> {
        match self {
            Definition::Const { name, .. }
            | Definition::Struct { name, .. }
            | Definition::Union { name, .. }
            | Definition::Enum { name, .. }
            | Definition::Program(Program { name, .. }) => Some(name),
            Definition::Typedef(Field::Named { name, .. }) => Some(name),
            Definition::Typedef(Field::Void(_)) => None,
        }
    }
}

/// A parsed `.x` file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Specification {
    pub definitions: Vec<Definition>,
}
