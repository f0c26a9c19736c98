//! Declarations and `Xdr` impls for constants, typedefs, structs, enums and
//! unions.

use fxhash::FxHashMap;

use crate::ast::{Definition, EnumItem, Field, Ident, TypeDescriptor, UnionBody, Value};
use crate::codegen::{Context, GenError};
use crate::names;

pub(super) fn emit_definition(
    cx: &mut Context<'_, '_>,
    definition: &Definition,
) -> Result<(), GenError> {
    match definition {
        Definition::Const { name, value } => emit_const(cx, name, value),
        Definition::Typedef(Field::Named { name, ty }) => emit_typedef(cx, name, ty),
        Definition::Typedef(Field::Void(range)) => Err(GenError::MalformedAst {
            range: *range,
            message: "`void` cannot be given a name with `typedef`".to_owned(),
        }),
        Definition::Struct { name, fields } => emit_struct(cx, name, fields),
        Definition::Enum { name, items } => emit_enum(cx, name, items),
        Definition::Union { name, body } => emit_union(cx, name, body),
        Definition::Program(program) => Err(GenError::MalformedAst {
            range: program.name.range,
            message: "unexpected program definition".to_owned(),
        }),
    }
}

fn emit_const(cx: &mut Context<'_, '_>, name: &Ident, value: &Value) -> Result<(), GenError> {
    let const_type = cx.options.const_type.as_str();
    let value = cx.typed_value(value, const_type)?;
    emit!(cx, "pub const {}: {const_type} = {value};", names::const_name(&name.name));
    Ok(())
}

fn emit_header(cx: &mut Context<'_, '_>, kind: &str, name: &Ident) {
    emit!(cx, "/// XDR {kind} `{}`.", name.name);
}

/// The `Default` impl, with a body built by `emit_body`.
fn emit_default(
    cx: &mut Context<'_, '_>,
    type_name: &str,
    emit_body: impl FnOnce(&mut Context<'_, '_>) -> Result<(), GenError>,
) -> Result<(), GenError> {
    emit!(cx);
    emit!(cx, "impl ::std::default::Default for {type_name} {{");
    emit!(cx, "fn default() -> {type_name} {{");
    emit_body(cx)?;
    emit!(cx, "}}");
    emit!(cx, "}}");
    Ok(())
}

/// The `Xdr` impl, with a body built by `emit_body`.
fn emit_xdr_impl(
    cx: &mut Context<'_, '_>,
    type_name: &str,
    emit_body: impl FnOnce(&mut Context<'_, '_>) -> Result<(), GenError>,
) -> Result<(), GenError> {
    let rt = cx.rt();
    emit!(cx);
    emit!(cx, "impl {rt}::Xdr for {type_name} {{");
    emit!(cx, "fn xdr(&mut self, xs: &mut {rt}::XdrState<'_>) {{");
    emit_body(cx)?;
    emit!(cx, "}}");
    emit!(cx, "}}");
    Ok(())
}

fn emit_typedef(
    cx: &mut Context<'_, '_>,
    name: &Ident,
    ty: &TypeDescriptor,
) -> Result<(), GenError> {
    let type_name = names::type_name(&name.name);
    let rust_type = cx.rust_type(ty)?;
    let zero = cx.zero_value(ty)?;

    emit_header(cx, "typedef", name);
    emit!(cx, "#[derive(Clone, Debug, PartialEq)]");
    emit!(cx, "pub struct {type_name}(pub {rust_type});");
    emit_default(cx, &type_name, |cx| {
        emit!(cx, "{type_name}({zero})");
        Ok(())
    })?;
    emit_xdr_impl(cx, &type_name, |cx| cx.emit_codec(ty, "self.0"))
}

/// A struct field, or an arm of a union.
struct Member<'ast> {
    name: String,
    rust_type: String,
    zero: String,
    ident: &'ast Ident,
}

impl<'ast> Member<'ast> {
    fn new(
        cx: &mut Context<'_, '_>,
        ident: &'ast Ident,
        ty: &TypeDescriptor,
    ) -> Result<Member<'ast>, GenError> {
        cx.site = ident.range;
        Ok(Member {
            name: names::field_name(&ident.name),
            rust_type: cx.rust_type(ty)?,
            zero: cx.zero_value(ty)?,
            ident,
        })
    }
}

fn emit_members(
    cx: &mut Context<'_, '_>,
    kind: &str,
    name: &Ident,
    members: &[Member<'_>],
) -> Result<(), GenError> {
    let type_name = names::type_name(&name.name);

    emit_header(cx, kind, name);
    emit!(cx, "#[derive(Clone, Debug, PartialEq)]");
    match members {
        [] => emit!(cx, "pub struct {type_name} {{}}"),
        members => {
            emit!(cx, "pub struct {type_name} {{");
            for member in members {
                emit!(cx, "pub {}: {},", member.name, member.rust_type);
            }
            emit!(cx, "}}");
        }
    }

    emit_default(cx, &type_name, |cx| {
        match members {
            [] => emit!(cx, "{type_name} {{}}"),
            members => {
                emit!(cx, "{type_name} {{");
                for member in members {
                    emit!(cx, "{}: {},", member.name, member.zero);
                }
                emit!(cx, "}}");
            }
        }
        Ok(())
    })
}

/// Insert a member, unless one of the same name is already present. Members
/// of the same name must have the same type.
fn insert_member<'ast>(
    members: &mut Vec<Member<'ast>>,
    indices: &mut FxHashMap<String, usize>,
    member: Member<'ast>,
) -> Result<(), GenError> {
    match indices.get(&member.name) {
        None => {
            indices.insert(member.name.clone(), members.len());
            members.push(member);
            Ok(())
        }
        Some(&index) if members[index].rust_type == member.rust_type => Ok(()),
        Some(&index) => Err(GenError::DuplicateName {
            name: member.ident.name.clone(),
            first: members[index].ident.range,
            second: member.ident.range,
            rust_name: Some(member.name),
        }),
    }
}

fn emit_struct(cx: &mut Context<'_, '_>, name: &Ident, fields: &[Field]) -> Result<(), GenError> {
    let mut members = Vec::with_capacity(fields.len());
    let mut indices = FxHashMap::default();
    for field in fields {
        if let Field::Named { name, ty } = field {
            let member = Member::new(cx, name, ty)?;
            match indices.contains_key(&member.name) {
                false => insert_member(&mut members, &mut indices, member)?,
                // Fields are distinct storage, even with equal types
                true => {
                    let first = members[indices[&member.name]].ident.range;
                    return Err(GenError::DuplicateName {
                        name: name.name.clone(),
                        first,
                        second: name.range,
                        rust_name: Some(member.name),
                    });
                }
            }
        }
    }

    emit_members(cx, "struct", name, &members)?;

    let type_name = names::type_name(&name.name);
    emit_xdr_impl(cx, &type_name, |cx| {
        if members.is_empty() {
            emit!(cx, "let _ = xs;");
        }
        for (field, member) in fields
            .iter()
            .filter(|field| matches!(field, Field::Named { .. }))
            .zip(&members)
        {
            cx.emit_field_codec(field, &format!("self.{}", member.name))?;
        }
        Ok(())
    })
}

fn emit_enum(cx: &mut Context<'_, '_>, name: &Ident, items: &[EnumItem]) -> Result<(), GenError> {
    let type_name = names::type_name(&name.name);
    let repr = cx.enum_repr();

    emit_header(cx, "enum", name);
    emit!(cx, "#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]");
    emit!(cx, "pub struct {type_name}(pub {repr});");
    for item in items {
        cx.site = item.name.range;
        let value = cx.typed_value(&item.value, repr)?;
        emit!(cx);
        emit!(cx, "/// XDR enum item `{}`.", item.name.name);
        emit!(
            cx,
            "pub const {}: {type_name} = {type_name}({value});",
            names::const_name(&item.name.name),
        );
    }

    emit_xdr_impl(cx, &type_name, |cx| {
        emit!(cx, "xs.{repr}(&mut self.0);");
        Ok(())
    })
}

fn emit_union(cx: &mut Context<'_, '_>, name: &Ident, body: &UnionBody) -> Result<(), GenError> {
    let (disc_ident, disc_ty) = match &body.discriminant {
        Field::Named { name, ty } => (name, ty),
        Field::Void(range) => {
            return Err(GenError::MalformedAst {
                range: *range,
                message: "union discriminants cannot be `void`".to_owned(),
            });
        }
    };
    cx.site = disc_ident.range;
    let (discriminant, accessor) = cx.discriminant(disc_ty)?;

    // The discriminant, then one member per distinct arm name
    let mut members = Vec::new();
    let mut indices = FxHashMap::default();
    let disc = Member::new(cx, disc_ident, disc_ty)?;
    let disc_place = format!("self.{}{accessor}", disc.name);
    insert_member(&mut members, &mut indices, disc)?;
    let arms = (body.cases.iter().map(|case| &case.body)).chain(&body.default);
    for arm in arms {
        if let Field::Named { name, ty } = arm {
            if names::field_name(&name.name) == members[0].name {
                return Err(GenError::DuplicateName {
                    name: name.name.clone(),
                    first: disc_ident.range,
                    second: name.range,
                    rust_name: Some(names::field_name(&name.name)),
                });
            }
            let member = Member::new(cx, name, ty)?;
            insert_member(&mut members, &mut indices, member)?;
        }
    }

    emit_members(cx, "union", name, &members)?;

    let mut conditions = Vec::with_capacity(body.cases.len());
    for case in &body.cases {
        let mut labels = Vec::with_capacity(case.labels.len());
        for label in &case.labels {
            cx.site = label.range();
            let label = cx.case_label(&discriminant, label)?;
            labels.push(format!("{disc_place} == {label}"));
        }
        conditions.push(labels.join(" || "));
    }

    let type_name = names::type_name(&name.name);
    let rt = cx.rt();
    emit_xdr_impl(cx, &type_name, |cx| {
        cx.emit_field_codec(&body.discriminant, &format!("self.{}", members[0].name))?;

        let emit_arm = |cx: &mut Context<'_, '_>, arm: &Field| match arm {
            Field::Void(_) => {
                emit!(cx, "// void");
                Ok(())
            }
            Field::Named { name, .. } => {
                let place = format!("self.{}", names::field_name(&name.name));
                cx.emit_field_codec(arm, &place)
            }
        };

        for (index, (case, condition)) in body.cases.iter().zip(&conditions).enumerate() {
            match index {
                0 => emit!(cx, "if {condition} {{"),
                _ => emit!(cx, "}} else if {condition} {{"),
            }
            emit_arm(cx, &case.body)?;
        }

        let nested = !body.cases.is_empty();
        if nested {
            emit!(cx, "}} else {{");
        }
        match &body.default {
            Some(default) => emit_arm(cx, default)?,
            None => emit!(
                cx,
                "xs.set_error({rt}::Error::UnmatchedDiscriminant(\"{}\"));",
                name.name,
            ),
        }
        if nested {
            emit!(cx, "}}");
        }
        Ok(())
    })
}
