//! Hoisting of anonymous aggregates into top-level definitions.
//!
//! Rust has no anonymous structs, so every `struct { ... }` or
//! `union switch (...) { ... }` written inline in a declaration is lifted into
//! a definition of its own, named after its owner and field, and declared just
//! before the owner. Items of inline enums are declared as plain constants.

use crate::ast::{
    Definition, EnumItem, Field, Ident, Specification, TypeDescriptor, UnionBody, UnionCase,
};
use crate::names;

pub fn lower(spec: Specification) -> Specification {
    let mut definitions = Vec::with_capacity(spec.definitions.len());

    for definition in spec.definitions {
        match definition {
            Definition::Typedef(Field::Named { name, ty }) => match ty {
                TypeDescriptor::Struct(fields) => lower_struct(name, fields, &mut definitions),
                TypeDescriptor::Union(body) => lower_union(name, *body, &mut definitions),
                TypeDescriptor::Enum(items) => definitions.push(Definition::Enum { name, items }),
                ty => {
                    let owner = name.name.clone();
                    let field = Ident::new(name.range, "value");
                    let ty = hoist_type(&owner, &field, ty, &mut definitions);
                    definitions.push(Definition::Typedef(Field::Named { name, ty }));
                }
            },
            Definition::Struct { name, fields } => lower_struct(name, fields, &mut definitions),
            Definition::Union { name, body } => lower_union(name, body, &mut definitions),
            definition @ (Definition::Typedef(Field::Void(_))
            | Definition::Const { .. }
            | Definition::Enum { .. }
            | Definition::Program(_)) => definitions.push(definition),
        }
    }

    Specification { definitions }
}

fn lower_struct(name: Ident, fields: Vec<Field>, definitions: &mut Vec<Definition>) {
    let fields = fields
        .into_iter()
        .map(|field| hoist_field(&name.name, field, definitions))
        .collect();
    definitions.push(Definition::Struct { name, fields });
}

fn lower_union(name: Ident, body: UnionBody, definitions: &mut Vec<Definition>) {
    let owner = name.name.as_str();
    let body = UnionBody {
        discriminant: hoist_field(owner, body.discriminant, definitions),
        cases: (body.cases.into_iter())
            .map(|case| UnionCase {
                labels: case.labels,
                body: hoist_field(owner, case.body, definitions),
            })
            .collect(),
        default: (body.default).map(|field| hoist_field(owner, field, definitions)),
    };
    definitions.push(Definition::Union { name, body });
}

fn hoist_field(owner: &str, field: Field, definitions: &mut Vec<Definition>) -> Field {
    match field {
        Field::Void(range) => Field::Void(range),
        Field::Named { name, ty } => {
            let ty = hoist_type(owner, &name, ty, definitions);
            Field::Named { name, ty }
        }
    }
}

fn hoist_type(
    owner: &str,
    field: &Ident,
    ty: TypeDescriptor,
    definitions: &mut Vec<Definition>,
) -> TypeDescriptor {
    let nested_name = || Ident::new(field.range, names::nested_type_name(owner, &field.name));

    match ty {
        TypeDescriptor::Struct(fields) => {
            let name = nested_name();
            lower_struct(name.clone(), fields, definitions);
            TypeDescriptor::Named(name)
        }
        TypeDescriptor::Union(body) => {
            let name = nested_name();
            lower_union(name.clone(), *body, definitions);
            TypeDescriptor::Named(name)
        }
        TypeDescriptor::Enum(items) => {
            definitions.extend(items.iter().map(|EnumItem { name, value }| {
                Definition::Const {
                    name: name.clone(),
                    value: value.clone(),
                }
            }));
            TypeDescriptor::Enum(items)
        }
        TypeDescriptor::FixedArray(elem, size) => {
            TypeDescriptor::FixedArray(Box::new(hoist_type(owner, field, *elem, definitions)), size)
        }
        TypeDescriptor::VarArray(elem, max) => {
            TypeDescriptor::VarArray(Box::new(hoist_type(owner, field, *elem, definitions)), max)
        }
        TypeDescriptor::Optional(elem) => {
            TypeDescriptor::Optional(Box::new(hoist_type(owner, field, *elem, definitions)))
        }
        ty @ (TypeDescriptor::Int { .. }
        | TypeDescriptor::Hyper { .. }
        | TypeDescriptor::Float
        | TypeDescriptor::Double
        | TypeDescriptor::Quadruple
        | TypeDescriptor::Bool
        | TypeDescriptor::Named(_)
        | TypeDescriptor::FixedOpaque(_)
        | TypeDescriptor::VarOpaque(_)
        | TypeDescriptor::String(_)) => ty,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::files::FileId;
    use crate::parse::parse;

    fn lower_source(source: &str) -> Vec<Definition> {
        let file_id = FileId::try_from(1).unwrap();
        lower(parse(file_id, source).unwrap()).definitions
    }

    fn names(definitions: &[Definition]) -> Vec<&str> {
        definitions
            .iter()
            .filter_map(|definition| definition.name())
            .map(Ident::as_str)
            .collect()
    }

    #[test]
    fn typedef_aggregates_become_definitions() {
        let definitions = lower_source(
            "typedef struct { int a; } point;
             typedef union switch (bool b) { case TRUE: int x; case FALSE: void; } maybe;
             typedef enum { RED = 0 } color;",
        );
        assert!(matches!(definitions[0], Definition::Struct { .. }));
        assert!(matches!(definitions[1], Definition::Union { .. }));
        assert!(matches!(definitions[2], Definition::Enum { .. }));
        assert_eq!(names(&definitions), ["point", "maybe", "color"]);
    }

    #[test]
    fn nested_aggregates_are_hoisted_before_their_owner() {
        let definitions = lower_source(
            "struct entry {
                 struct { int a; struct { int b; } inner; } outer<>;
                 union switch (int k) { case 0: void; } *opt;
             };",
        );
        assert_eq!(
            names(&definitions),
            ["EntryOuterInner", "EntryOuter", "EntryOpt", "entry"]
        );

        let fields = match &definitions[3] {
            Definition::Struct { fields, .. } => fields,
            definition => panic!("unexpected definition: {definition:?}"),
        };
        match &fields[0] {
            Field::Named {
                ty: TypeDescriptor::VarArray(elem, None),
                ..
            } => assert!(matches!(
                &**elem,
                TypeDescriptor::Named(name) if name.name == "EntryOuter"
            )),
            field => panic!("unexpected field: {field:?}"),
        }
    }

    #[test]
    fn inline_enum_items_become_constants() {
        let definitions = lower_source("struct s { enum { A = 1, B = 2 } kind; };");
        assert_eq!(names(&definitions), ["A", "B", "s"]);
        match &definitions[2] {
            Definition::Struct { fields, .. } => assert!(matches!(
                &fields[0],
                Field::Named {
                    ty: TypeDescriptor::Enum(items),
                    ..
                } if items.len() == 2
            )),
            definition => panic!("unexpected definition: {definition:?}"),
        }
    }

    #[test]
    fn typedef_of_nested_struct() {
        let definitions = lower_source("typedef struct { int a; } *list;");
        assert_eq!(names(&definitions), ["ListValue", "list"]);
    }
}
