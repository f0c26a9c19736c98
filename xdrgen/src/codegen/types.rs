//! The type descriptor model: native Rust shapes, zero values and codecs.

use crate::ast::{Field, Ident, TypeDescriptor, Value};
use crate::codegen::{Context, GenError};
use crate::names;
use crate::symbols::Symbol;

impl<'a, 'spec> Context<'a, 'spec> {
    pub(super) fn enum_repr(&self) -> &'static str {
        match self.options.unsigned_enums {
            true => "u32",
            false => "i32",
        }
    }

    fn unsupported(&self, ty: &TypeDescriptor) -> GenError {
        GenError::Unsupported {
            range: self.site,
            type_name: ty.description(),
        }
    }

    fn not_hoisted(&self, ty: &TypeDescriptor) -> GenError {
        GenError::MalformedAst {
            range: self.site,
            message: format!("anonymous {} in an unexpected position", ty.description()),
        }
    }

    /// The Rust type of a named XDR type.
    pub(super) fn named_type(&self, ident: &Ident) -> Result<String, GenError> {
        let entry = self.symbols.resolve(ident)?;
        match entry.symbol.is_type() {
            true => Ok(names::type_name(&ident.name)),
            false => Err(GenError::MalformedAst {
                range: ident.range,
                message: format!(
                    "expected a type, found {} `{}`",
                    entry.symbol.description(),
                    ident.name,
                ),
            }),
        }
    }

    /// The Rust type used to store values of `ty`.
    pub(super) fn rust_type(&self, ty: &TypeDescriptor) -> Result<String, GenError> {
        Ok(match ty {
            TypeDescriptor::Int { unsigned: false } => "i32".to_owned(),
            TypeDescriptor::Int { unsigned: true } => "u32".to_owned(),
            TypeDescriptor::Hyper { unsigned: false } => "i64".to_owned(),
            TypeDescriptor::Hyper { unsigned: true } => "u64".to_owned(),
            TypeDescriptor::Float => "f32".to_owned(),
            TypeDescriptor::Double => "f64".to_owned(),
            TypeDescriptor::Quadruple => return Err(self.unsupported(ty)),
            TypeDescriptor::Bool => "bool".to_owned(),
            TypeDescriptor::Enum(_) => self.enum_repr().to_owned(),
            TypeDescriptor::Named(ident) => self.named_type(ident)?,
            TypeDescriptor::Struct(_) | TypeDescriptor::Union(_) => {
                return Err(self.not_hoisted(ty));
            }
            TypeDescriptor::FixedArray(elem, size) => {
                format!("[{}; {}]", self.rust_type(elem)?, self.typed_value(size, "usize")?)
            }
            TypeDescriptor::VarArray(elem, _) => {
                format!("::std::vec::Vec<{}>", self.rust_type(elem)?)
            }
            TypeDescriptor::FixedOpaque(size) => {
                format!("[u8; {}]", self.typed_value(size, "usize")?)
            }
            TypeDescriptor::VarOpaque(_) => "::std::vec::Vec<u8>".to_owned(),
            TypeDescriptor::String(_) => "::std::string::String".to_owned(),
            TypeDescriptor::Optional(elem) => format!(
                "::std::option::Option<::std::boxed::Box<{}>>",
                self.rust_type(elem)?
            ),
        })
    }

    /// An expression for the initial value of a `ty`. Decoding always starts
    /// from this value.
    pub(super) fn zero_value(&self, ty: &TypeDescriptor) -> Result<String, GenError> {
        Ok(match ty {
            TypeDescriptor::Int { .. } | TypeDescriptor::Hyper { .. } | TypeDescriptor::Enum(_) => {
                "0".to_owned()
            }
            TypeDescriptor::Float | TypeDescriptor::Double => "0.0".to_owned(),
            TypeDescriptor::Quadruple => return Err(self.unsupported(ty)),
            TypeDescriptor::Bool => "false".to_owned(),
            TypeDescriptor::Named(ident) => {
                self.named_type(ident)?;
                "::std::default::Default::default()".to_owned()
            }
            TypeDescriptor::Struct(_) | TypeDescriptor::Union(_) => {
                return Err(self.not_hoisted(ty));
            }
            TypeDescriptor::FixedArray(elem, _) => {
                format!("::std::array::from_fn(|_| {})", self.zero_value(elem)?)
            }
            TypeDescriptor::FixedOpaque(size) => {
                format!("[0; {}]", self.typed_value(size, "usize")?)
            }
            TypeDescriptor::VarArray(_, _) | TypeDescriptor::VarOpaque(_) => {
                "::std::vec::Vec::new()".to_owned()
            }
            TypeDescriptor::String(_) => "::std::string::String::new()".to_owned(),
            TypeDescriptor::Optional(_) => "::std::option::Option::None".to_owned(),
        })
    }

    /// An expression of Rust type `target` for a size, bound or constant.
    pub(super) fn typed_value(&self, value: &Value, target: &str) -> Result<String, GenError> {
        let ident = match value {
            Value::Number(_, number) => return Ok(number.clone()),
            Value::Name(ident) => ident,
        };

        let rust_name = names::const_name(&ident.name);
        match self.symbols.resolve(ident)?.symbol {
            Symbol::Const(_) if target == self.options.const_type => Ok(rust_name),
            Symbol::Const(_) => Ok(format!("{rust_name} as {target}")),
            Symbol::EnumItem { .. } if target == self.enum_repr() => Ok(format!("{rust_name}.0")),
            Symbol::EnumItem { .. } => Ok(format!("{rust_name}.0 as {target}")),
            symbol => Err(GenError::MalformedAst {
                range: ident.range,
                message: format!(
                    "expected a constant, found {} `{}`",
                    symbol.description(),
                    ident.name,
                ),
            }),
        }
    }

    fn max_len(&self, max: &Option<Value>) -> Result<String, GenError> {
        match max {
            Some(max) => Ok(format!(
                "::std::option::Option::Some({})",
                self.typed_value(max, "u32")?
            )),
            None => Ok("::std::option::Option::None".to_owned()),
        }
    }

    /// Emit statements transferring the value at `place` through the coding
    /// state. `place` must be a mutable place expression of the type
    /// described by `ty`.
    pub(super) fn emit_codec(&mut self, ty: &TypeDescriptor, place: &str) -> Result<(), GenError> {
        let xs = self.xs;
        let rt = self.rt();

        match ty {
            TypeDescriptor::Int { unsigned: false } => emit!(self, "{xs}.i32(&mut {place});"),
            TypeDescriptor::Int { unsigned: true } => emit!(self, "{xs}.u32(&mut {place});"),
            TypeDescriptor::Hyper { unsigned: false } => emit!(self, "{xs}.i64(&mut {place});"),
            TypeDescriptor::Hyper { unsigned: true } => emit!(self, "{xs}.u64(&mut {place});"),
            TypeDescriptor::Bool => emit!(self, "{xs}.bool(&mut {place});"),
            TypeDescriptor::Enum(_) => {
                let repr = self.enum_repr();
                emit!(self, "{xs}.{repr}(&mut {place});");
            }
            TypeDescriptor::Float | TypeDescriptor::Double | TypeDescriptor::Quadruple => {
                return Err(self.unsupported(ty));
            }
            TypeDescriptor::Named(ident) => {
                self.named_type(ident)?;
                emit!(self, "{rt}::Xdr::xdr(&mut {place}, {xs});");
            }
            TypeDescriptor::Struct(_) | TypeDescriptor::Union(_) => {
                return Err(self.not_hoisted(ty));
            }
            TypeDescriptor::FixedArray(elem, _) => {
                let index = self.fresh("i");
                emit!(self, "for {index} in 0..{place}.len() {{");
                self.emit_codec(elem, &format!("{place}[{index}]"))?;
                emit!(self, "}}");
            }
            TypeDescriptor::VarArray(elem, max) => self.emit_var_array(elem, max, place)?,
            TypeDescriptor::FixedOpaque(_) => emit!(self, "{xs}.fixed_opaque(&mut {place});"),
            TypeDescriptor::VarOpaque(max) => {
                let max = self.max_len(max)?;
                emit!(self, "{xs}.var_opaque({max}, &mut {place});");
            }
            TypeDescriptor::String(max) => {
                let max = self.max_len(max)?;
                emit!(self, "{xs}.string({max}, &mut {place});");
            }
            TypeDescriptor::Optional(elem) => self.emit_optional(elem, place)?,
        }

        Ok(())
    }

    fn emit_var_array(
        &mut self,
        elem: &TypeDescriptor,
        max: &Option<Value>,
        place: &str,
    ) -> Result<(), GenError> {
        let xs = self.xs;
        let len = self.fresh("len");
        let max = match max {
            Some(max) => Some(self.typed_value(max, "u32")?),
            None => None,
        };

        // The length is checked before it is written, so that nothing of an
        // oversized array reaches the output.
        emit!(self, "let mut {len} = {xs}.encoding_len({place}.len());");
        if let Some(max) = &max {
            emit!(self, "if {xs}.encoding() {{");
            emit!(self, "{xs}.check_len({len}, {max});");
            emit!(self, "}}");
        }
        emit!(self, "{xs}.u32(&mut {len});");
        if let Some(max) = &max {
            emit!(self, "if {xs}.decoding() {{");
            emit!(self, "{xs}.check_len({len}, {max});");
            emit!(self, "}}");
        }

        // Decoding grows the vector one element at a time, so it never holds
        // more elements than the input has supplied.
        let zero = self.zero_value(elem)?;
        let index = self.fresh("i");
        emit!(self, "if {xs}.ok() {{");
        emit!(self, "if {xs}.decoding() {{");
        emit!(self, "{place}.clear();");
        emit!(self, "}}");
        emit!(self, "for {index} in 0..{len} as usize {{");
        emit!(self, "if {xs}.decoding() {{");
        emit!(self, "{place}.push({zero});");
        emit!(self, "}}");
        self.emit_codec(elem, &format!("{place}[{index}]"))?;
        emit!(self, "if !{xs}.ok() {{");
        emit!(self, "break;");
        emit!(self, "}}");
        emit!(self, "}}");
        emit!(self, "}}");

        Ok(())
    }

    fn emit_optional(&mut self, elem: &TypeDescriptor, place: &str) -> Result<(), GenError> {
        let xs = self.xs;
        let present = self.fresh("present");
        let inner = self.fresh("inner");

        emit!(self, "if {xs}.encoding() {{");
        emit!(self, "let mut {present} = {place}.is_some();");
        emit!(self, "{xs}.bool(&mut {present});");
        emit!(self, "if let ::std::option::Option::Some({inner}) = {place}.as_deref_mut() {{");
        // Referents are transferred between `enter` and `leave`, which bound
        // the nesting of recursive types.
        emit!(self, "if {xs}.enter() {{");
        self.emit_codec(elem, &format!("(*{inner})"))?;
        emit!(self, "{xs}.leave();");
        emit!(self, "}}");
        emit!(self, "}}");
        emit!(self, "}} else {{");
        emit!(self, "let mut {present} = false;");
        emit!(self, "{xs}.bool(&mut {present});");
        emit!(self, "if {present} && {xs}.enter() {{");
        let zero = self.zero_value(elem)?;
        emit!(self, "let {inner} = {place}.insert(::std::boxed::Box::new({zero}));");
        self.emit_codec(elem, &format!("(**{inner})"))?;
        emit!(self, "{xs}.leave();");
        emit!(self, "}} else {{");
        emit!(self, "{place} = ::std::option::Option::None;");
        emit!(self, "}}");
        emit!(self, "}}");

        Ok(())
    }

    /// Emit the codec of a struct field or union arm, found at `place`.
    pub(super) fn emit_field_codec(&mut self, field: &Field, place: &str) -> Result<(), GenError> {
        match field {
            Field::Void(_) => Ok(()),
            Field::Named { name, ty } => {
                self.site = name.range;
                self.emit_codec(ty, place)
            }
        }
    }
}

/// How the discriminant of a union is compared against case labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Discriminant {
    Int(&'static str),
    Bool,
    /// An enumeration, by Rust type name.
    Enum(String),
}

impl<'a, 'spec> Context<'a, 'spec> {
    /// Classify a union discriminant. Also returns the accessor needed to
    /// reach the comparable value through any typedef newtypes.
    pub(super) fn discriminant(
        &self,
        ty: &TypeDescriptor,
    ) -> Result<(Discriminant, String), GenError> {
        let invalid = |type_name: &str| GenError::InvalidDiscriminant {
            range: self.site,
            type_name: type_name.to_owned(),
        };

        match ty {
            TypeDescriptor::Int { unsigned: false } => {
                Ok((Discriminant::Int("i32"), String::new()))
            }
            TypeDescriptor::Int { unsigned: true } => {
                Ok((Discriminant::Int("u32"), String::new()))
            }
            TypeDescriptor::Enum(_) => Ok((Discriminant::Int(self.enum_repr()), String::new())),
            TypeDescriptor::Bool => Ok((Discriminant::Bool, String::new())),
            TypeDescriptor::Named(ident) => match self.symbols.resolve(ident)?.symbol {
                Symbol::Enum(_) => Ok((
                    Discriminant::Enum(names::type_name(&ident.name)),
                    String::new(),
                )),
                Symbol::Typedef(ty) => {
                    let (discriminant, accessor) = self
                        .discriminant(ty)
                        .map_err(|_| invalid(&ident.name))?;
                    Ok((discriminant, format!(".0{accessor}")))
                }
                _ => Err(invalid(&ident.name)),
            },
            ty => Err(invalid(ty.description())),
        }
    }

    /// An expression comparable with a discriminant of the given kind.
    pub(super) fn case_label(
        &self,
        discriminant: &Discriminant,
        label: &Value,
    ) -> Result<String, GenError> {
        let ident = match label {
            Value::Number(_, number) => {
                return Ok(match discriminant {
                    Discriminant::Int(_) => number.clone(),
                    Discriminant::Bool if number == "0" => "false".to_owned(),
                    Discriminant::Bool if number == "1" => "true".to_owned(),
                    Discriminant::Bool => format!("({number} != 0)"),
                    Discriminant::Enum(name) => format!("{name}({number})"),
                });
            }
            Value::Name(ident) => ident,
        };

        // Conventional boolean names, usable without being declared
        let is_truth = ident.name == "TRUE" || ident.name == "FALSE";
        if is_truth && self.symbols.get(&ident.name).is_none() {
            let truth = ident.name == "TRUE";
            return Ok(match discriminant {
                Discriminant::Bool => truth.to_string(),
                Discriminant::Int(_) => u8::from(truth).to_string(),
                Discriminant::Enum(name) => format!("{name}({})", u8::from(truth)),
            });
        }

        let rust_name = names::const_name(&ident.name);
        let entry = self.symbols.resolve(ident)?;
        let repr = self.enum_repr();
        match (entry.symbol, discriminant) {
            (Symbol::EnumItem { owner, .. }, Discriminant::Enum(name)) => {
                match names::type_name(&owner.name) == *name {
                    true => Ok(rust_name),
                    false => Ok(format!("{name}({rust_name}.0)")),
                }
            }
            (Symbol::EnumItem { .. }, Discriminant::Int(int)) if *int == repr => {
                Ok(format!("{rust_name}.0"))
            }
            (Symbol::EnumItem { .. }, Discriminant::Int(int)) => {
                Ok(format!("{rust_name}.0 as {int}"))
            }
            (Symbol::EnumItem { .. }, Discriminant::Bool) => Ok(format!("({rust_name}.0 != 0)")),
            (Symbol::Const(_), Discriminant::Enum(name)) => {
                Ok(format!("{name}({rust_name} as {repr})"))
            }
            (Symbol::Const(_), Discriminant::Int(int)) => Ok(format!("{rust_name} as {int}")),
            (Symbol::Const(_), Discriminant::Bool) => Ok(format!("({rust_name} != 0)")),
            (symbol, _) => Err(GenError::MalformedAst {
                range: ident.range,
                message: format!(
                    "expected a case label, found {} `{}`",
                    symbol.description(),
                    ident.name,
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::codegen::tests::{generate_source, generate_with};
    use crate::codegen::{GenError, Options};

    fn struct_impl(source: &str) -> String {
        let output = generate_source(source).unwrap();
        let start = output.find("impl ::xdrgen_runtime::Xdr").unwrap();
        output[start..].to_owned()
    }

    #[test]
    fn primitives() {
        let output = struct_impl(
            "struct s { int a; unsigned int b; hyper c; unsigned hyper d; bool e; };",
        );
        assert_eq!(
            output,
            "impl ::xdrgen_runtime::Xdr for S {
    fn xdr(&mut self, xs: &mut ::xdrgen_runtime::XdrState<'_>) {
        xs.i32(&mut self.a);
        xs.u32(&mut self.b);
        xs.i64(&mut self.c);
        xs.u64(&mut self.d);
        xs.bool(&mut self.e);
    }
}
"
        );
    }

    #[test]
    fn fixed_array_has_no_length() {
        let output = struct_impl("struct s { int a[4]; };");
        assert!(output.contains(
            "        for i1 in 0..self.a.len() {
            xs.i32(&mut self.a[i1]);
        }
"
        ));
        assert!(!output.contains("encoding_len"));
    }

    #[test]
    fn bounded_var_array() {
        let output = struct_impl("const MAX = 10; struct s { int a<MAX>; };");
        assert_eq!(
            output,
            "impl ::xdrgen_runtime::Xdr for S {
    fn xdr(&mut self, xs: &mut ::xdrgen_runtime::XdrState<'_>) {
        let mut len1 = xs.encoding_len(self.a.len());
        if xs.encoding() {
            xs.check_len(len1, MAX as u32);
        }
        xs.u32(&mut len1);
        if xs.decoding() {
            xs.check_len(len1, MAX as u32);
        }
        if xs.ok() {
            if xs.decoding() {
                self.a.clear();
            }
            for i2 in 0..len1 as usize {
                if xs.decoding() {
                    self.a.push(0);
                }
                xs.i32(&mut self.a[i2]);
                if !xs.ok() {
                    break;
                }
            }
        }
    }
}
"
        );
    }

    #[test]
    fn optional_has_presence_flag() {
        let output = struct_impl("struct s { int *a; };");
        assert!(output.contains(
            "        if xs.encoding() {
            let mut present1 = self.a.is_some();
            xs.bool(&mut present1);
            if let ::std::option::Option::Some(inner2) = self.a.as_deref_mut() {
                if xs.enter() {
                    xs.i32(&mut (*inner2));
                    xs.leave();
                }
            }
        } else {
            let mut present1 = false;
            xs.bool(&mut present1);
            if present1 && xs.enter() {
                let inner2 = self.a.insert(::std::boxed::Box::new(0));
                xs.i32(&mut (**inner2));
                xs.leave();
            } else {
                self.a = ::std::option::Option::None;
            }
        }
"
        ));
    }

    #[test]
    fn opaque_and_strings() {
        let output = struct_impl("struct s { opaque a[3]; opaque b<>; string c<8>; };");
        assert!(output.contains("xs.fixed_opaque(&mut self.a);"));
        assert!(output.contains("xs.var_opaque(::std::option::Option::None, &mut self.b);"));
        assert!(output.contains("xs.string(::std::option::Option::Some(8), &mut self.c);"));
    }

    #[test]
    fn temporaries_do_not_shadow() {
        let output = struct_impl("struct s { int a<>; int b<>; };");
        assert!(output.contains("let mut len1 = xs.encoding_len(self.a.len());"));
        assert!(output.contains("for i2 in 0..len1 as usize {"));
        assert!(output.contains("let mut len3 = xs.encoding_len(self.b.len());"));
        assert!(output.contains("xs.i32(&mut self.b[i4]);"));
    }

    #[test]
    fn unsigned_enums() {
        let options = Options {
            unsigned_enums: true,
            ..Options::default()
        };
        let output = generate_with("enum e { A = 1 }; struct s { e x; };", &options).unwrap();
        assert!(output.contains("pub struct E(pub u32);"));
        assert!(output.contains("xs.u32(&mut self.0);"));
    }

    #[test]
    fn floats_have_no_codec() {
        let error = generate_source("struct s { float f; };").unwrap_err();
        assert!(matches!(error, GenError::Unsupported { type_name: "float", .. }));
        let error = generate_source("typedef double d;").unwrap_err();
        assert!(matches!(error, GenError::Unsupported { type_name: "double", .. }));
    }

    #[test]
    fn quadruple_is_unsupported_everywhere() {
        let error = generate_source("typedef quadruple q<>;").unwrap_err();
        assert!(matches!(
            error,
            GenError::Unsupported {
                type_name: "quadruple",
                ..
            }
        ));
    }

    #[test]
    fn constants_are_not_types() {
        let error = generate_source("const A = 1; struct s { A x; };").unwrap_err();
        assert!(matches!(error, GenError::MalformedAst { .. }));
    }
}
