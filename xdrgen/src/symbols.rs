//! The table of names declared by a specification.
//!
//! XDR has a single flat namespace shared by types, constants, enumeration
//! items, programs, versions and procedures. The table is built in one pass
//! before any code is generated, and is only read afterwards.

use fxhash::FxHashMap;

use crate::ast::{
    Definition, EnumItem, Field, Ident, Procedure, Program, Specification, TypeDescriptor,
    UnionBody, Value, Version,
};
use crate::codegen::GenError;
use crate::names;
use crate::source::ByteRange;

/// What a name refers to.
#[derive(Debug, Clone, Copy)]
pub enum Symbol<'spec> {
    Const(&'spec Value),
    Typedef(&'spec TypeDescriptor),
    Struct(&'spec [Field]),
    Union(&'spec UnionBody),
    Enum(&'spec [EnumItem]),
    EnumItem {
        owner: &'spec Ident,
        value: &'spec Value,
    },
    Program(&'spec Program),
    Version(&'spec Version),
    Procedure(&'spec Procedure),
}

impl<'spec> Symbol<'spec> {
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            Symbol::Typedef(_) | Symbol::Struct(_) | Symbol::Union(_) | Symbol::Enum(_)
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            Symbol::Const(_) => "constant",
            Symbol::Typedef(_) => "typedef",
            Symbol::Struct(_) => "struct",
            Symbol::Union(_) => "union",
            Symbol::Enum(_) => "enum",
            Symbol::EnumItem { .. } => "enum item",
            Symbol::Program(_) => "program",
            Symbol::Version(_) => "version",
            Symbol::Procedure(_) => "procedure",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Entry<'spec> {
    pub range: ByteRange,
    pub symbol: Symbol<'spec>,
}

pub struct SymbolTable<'spec> {
    entries: FxHashMap<&'spec str, Entry<'spec>>,
    // Top-level Rust items, which share one module
    rust_names: FxHashMap<String, (&'spec str, ByteRange)>,
    // Set once the name of the handler parameter is taken
    handler_param: bool,
}

/// The type parameter of generated wrappers and dispatch tables.
const HANDLER_PARAM: &str = "H";

impl<'spec> SymbolTable<'spec> {
    pub fn build(spec: &'spec Specification) -> Result<SymbolTable<'spec>, GenError> {
        let mut table = SymbolTable {
            entries: FxHashMap::default(),
            rust_names: FxHashMap::default(),
            handler_param: false,
        };

        for definition in &spec.definitions {
            match definition {
                Definition::Const { name, value } => {
                    table.insert_value(name, Symbol::Const(value))?;
                }
                Definition::Typedef(Field::Named { name, ty }) => {
                    table.insert_type(name, Symbol::Typedef(ty))?;
                }
                // Rejected during generation
                Definition::Typedef(Field::Void(_)) => {}
                Definition::Struct { name, fields } => {
                    table.insert_type(name, Symbol::Struct(fields))?;
                }
                Definition::Union { name, body } => {
                    table.insert_type(name, Symbol::Union(body))?;
                }
                Definition::Enum { name, items } => {
                    table.insert_type(name, Symbol::Enum(items))?;
                    for item in items {
                        let symbol = Symbol::EnumItem {
                            owner: name,
                            value: &item.value,
                        };
                        table.insert_value(&item.name, symbol)?;
                    }
                }
                Definition::Program(program) => table.insert_program(program)?,
            }
        }

        tracing::debug!(symbols = table.entries.len(), "built symbol table");
        Ok(table)
    }

    fn insert_program(&mut self, program: &'spec Program) -> Result<(), GenError> {
        self.insert_value(&program.name, Symbol::Program(program))?;
        if !self.handler_param {
            self.insert_rust_name(&program.name, HANDLER_PARAM.to_owned())?;
            self.handler_param = true;
        }
        for version in &program.versions {
            self.insert_value(&version.name, Symbol::Version(version))?;

            let handler = names::handler_name(&program.name.name, &version.name.name);
            self.insert_rust_name(&version.name, format!("{handler}Wrapper"))?;
            self.insert_rust_name(&version.name, handler)?;
            let regs = names::regs_name(&program.name.name, &version.name.name);
            self.insert_rust_name(&version.name, regs)?;

            for procedure in &version.procedures {
                self.insert_value(&procedure.name, Symbol::Procedure(procedure))?;
            }
        }
        Ok(())
    }

    fn insert_type(&mut self, name: &'spec Ident, symbol: Symbol<'spec>) -> Result<(), GenError> {
        self.insert(name, symbol)?;
        self.insert_rust_name(name, names::type_name(&name.name))
    }

    fn insert_value(&mut self, name: &'spec Ident, symbol: Symbol<'spec>) -> Result<(), GenError> {
        self.insert(name, symbol)?;
        self.insert_rust_name(name, names::const_name(&name.name))
    }

    fn insert(&mut self, name: &'spec Ident, symbol: Symbol<'spec>) -> Result<(), GenError> {
        let entry = Entry {
            range: name.range,
            symbol,
        };
        match self.entries.insert(&name.name, entry) {
            None => Ok(()),
            Some(first) => Err(GenError::DuplicateName {
                name: name.name.clone(),
                first: first.range,
                second: name.range,
                rust_name: None,
            }),
        }
    }

    fn insert_rust_name(&mut self, name: &'spec Ident, rust_name: String) -> Result<(), GenError> {
        match self.rust_names.get(&rust_name) {
            None => {
                self.rust_names.insert(rust_name, (&name.name, name.range));
                Ok(())
            }
            Some((_, first)) => Err(GenError::DuplicateName {
                name: name.name.clone(),
                first: *first,
                second: name.range,
                rust_name: Some(rust_name),
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Entry<'spec>> {
        self.entries.get(name)
    }

    /// Look up `ident`, failing with a suggestion if it was never declared.
    pub fn resolve(&self, ident: &Ident) -> Result<&Entry<'spec>, GenError> {
        self.get(&ident.name)
            .ok_or_else(|| GenError::UnresolvedName {
                range: ident.range,
                name: ident.name.clone(),
                suggestion: self.suggest(&ident.name),
            })
    }

    /// The declared name closest to `name`, if any is close enough to be a
    /// plausible typo.
    pub fn suggest(&self, name: &str) -> Option<String> {
        let max_distance = std::cmp::max(1, (name.len() + 2) / 3);
        self.entries
            .keys()
            .map(|candidate| (levenshtein::levenshtein(name, candidate), *candidate))
            .filter(|(distance, _)| *distance <= max_distance)
            .min()
            .map(|(_, candidate)| candidate.to_owned())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
