//! Handler traits, marshalling wrappers and registration tables for RPC
//! programs.

use crate::ast::{ProcType, Procedure, Program, TypeDescriptor, Value, Version};
use crate::codegen::{Context, GenError};
use crate::names;

pub(super) fn emit_program(cx: &mut Context<'_, '_>, program: &Program) -> Result<(), GenError> {
    emit_id(cx, "program", &program.name.name, &program.id)?;
    for version in &program.versions {
        cx.site = version.name.range;
        emit!(cx);
        emit_version(cx, program, version)?;
    }
    Ok(())
}

fn emit_id(cx: &mut Context<'_, '_>, kind: &str, name: &str, id: &Value) -> Result<(), GenError> {
    let id = cx.typed_value(id, "u32")?;
    emit!(cx, "/// RPC {kind} `{name}`.");
    emit!(cx, "pub const {}: u32 = {id};", names::const_name(name));
    Ok(())
}

/// The Rust shape of a procedure argument or result.
struct Signature {
    arg: Option<(TypeDescriptor, String)>,
    result: Option<String>,
}

impl Signature {
    fn new(cx: &mut Context<'_, '_>, procedure: &Procedure) -> Result<Signature, GenError> {
        let arg = match &procedure.args[..] {
            [ProcType::Void(_)] => None,
            [ProcType::Type(range, ty)] => {
                cx.site = *range;
                Some((ty.clone(), cx.proc_type(ty)?))
            }
            args => {
                let range = args.last().map_or(procedure.name.range, ProcType::range);
                return Err(GenError::MalformedAst {
                    range,
                    message: format!(
                        "procedure `{}` takes {} arguments, but only one is supported",
                        procedure.name.name,
                        args.len(),
                    ),
                });
            }
        };
        let result = match &procedure.result {
            ProcType::Void(_) => None,
            ProcType::Type(range, ty) => {
                cx.site = *range;
                Some(cx.proc_type(ty)?)
            }
        };
        Ok(Signature { arg, result })
    }

    fn trait_method(&self, method: &str) -> String {
        let arg = match &self.arg {
            Some((_, rust_type)) => format!(", arg: {rust_type}"),
            None => String::new(),
        };
        let result = match &self.result {
            Some(rust_type) => format!(" -> {rust_type}"),
            None => String::new(),
        };
        format!("fn {method}(&self{arg}){result};")
    }
}

impl<'a, 'spec> Context<'a, 'spec> {
    /// The Rust type of a procedure argument or result. Results are boxed as
    /// `dyn Xdr`, so only types that implement it directly are allowed.
    fn proc_type(&self, ty: &TypeDescriptor) -> Result<String, GenError> {
        match ty {
            TypeDescriptor::Int { .. }
            | TypeDescriptor::Hyper { .. }
            | TypeDescriptor::Bool
            | TypeDescriptor::Named(_) => self.rust_type(ty),
            TypeDescriptor::Float | TypeDescriptor::Double | TypeDescriptor::Quadruple => {
                Err(GenError::Unsupported {
                    range: self.site,
                    type_name: ty.description(),
                })
            }
            ty => Err(GenError::MalformedAst {
                range: self.site,
                message: format!(
                    "procedure arguments and results cannot be an anonymous {}",
                    ty.description(),
                ),
            }),
        }
    }
}

fn emit_version(
    cx: &mut Context<'_, '_>,
    program: &Program,
    version: &Version,
) -> Result<(), GenError> {
    let rt = cx.rt();
    let handler = names::handler_name(&program.name.name, &version.name.name);
    let regs = names::regs_name(&program.name.name, &version.name.name);
    let prog_id = names::const_name(&program.name.name);
    let vers_id = names::const_name(&version.name.name);

    emit_id(cx, "version", &version.name.name, &version.id)?;
    let mut signatures = Vec::with_capacity(version.procedures.len());
    for procedure in &version.procedures {
        cx.site = procedure.name.range;
        emit!(cx);
        emit_id(cx, "procedure", &procedure.name.name, &procedure.id)?;
        signatures.push(Signature::new(cx, procedure)?);
    }

    emit!(cx);
    emit!(
        cx,
        "/// Procedures of version `{}` of RPC program `{}`.",
        version.name.name,
        program.name.name,
    );
    emit!(cx, "pub trait {handler}: ::std::marker::Send + ::std::marker::Sync {{");
    for (procedure, signature) in version.procedures.iter().zip(&signatures) {
        let method = names::field_name(&procedure.name.name);
        emit!(cx, "{}", signature.trait_method(&method));
    }
    emit!(cx, "}}");

    emit!(cx);
    emit!(cx, "/// Decodes arguments and encodes results for a [`{handler}`].");
    emit!(cx, "pub struct {handler}Wrapper<H> {{");
    emit!(cx, "pub h: ::std::sync::Arc<H>,");
    emit!(cx, "}}");
    emit!(cx);
    emit!(cx, "impl<H: {handler}> {handler}Wrapper<H> {{");
    for (index, (procedure, signature)) in version.procedures.iter().zip(&signatures).enumerate() {
        if index > 0 {
            emit!(cx);
        }
        cx.site = procedure.name.range;
        emit_wrapper_method(cx, &handler, procedure, signature)?;
    }
    emit!(cx, "}}");

    emit!(cx);
    emit!(cx, "/// The dispatch table of a [`{handler}`].");
    emit!(cx, "pub fn {regs}<H: {handler} + 'static>(");
    emit!(cx, "h: ::std::sync::Arc<H>,");
    emit!(cx, ") -> ::std::vec::Vec<{rt}::rpc::ProcRegistration> {{");
    emit!(cx, "let w = ::std::sync::Arc::new({handler}Wrapper {{ h }});");
    emit!(cx, "::std::vec![");
    for procedure in &version.procedures {
        let proc_id = names::const_name(&procedure.name.name);
        let method = names::field_name(&procedure.name.name);
        emit!(cx, "{{");
        emit!(cx, "let w = ::std::sync::Arc::clone(&w);");
        emit!(cx, "{rt}::rpc::ProcRegistration::new(");
        emit!(cx, "{prog_id},");
        emit!(cx, "{vers_id},");
        emit!(cx, "{proc_id},");
        emit!(cx, "move |args: &mut {rt}::XdrState<'_>| {{");
        emit!(cx, "{handler}Wrapper::{method}(&*w, args)");
        emit!(cx, "}},");
        emit!(cx, ")");
        emit!(cx, "}},");
    }
    emit!(cx, "]");
    emit!(cx, "}}");

    Ok(())
}

fn emit_wrapper_method(
    cx: &mut Context<'_, '_>,
    handler: &str,
    procedure: &Procedure,
    signature: &Signature,
) -> Result<(), GenError> {
    let rt = cx.rt();
    let method = names::field_name(&procedure.name.name);

    emit!(cx, "pub fn {method}(");
    emit!(cx, "&self,");
    emit!(cx, "args: &mut {rt}::XdrState<'_>,");
    emit!(cx, ") -> {rt}::rpc::ProcResult {{");
    let call = match &signature.arg {
        None => {
            emit!(cx, "let _ = args;");
            format!("{handler}::{method}(&*self.h)")
        }
        Some((ty, rust_type)) => {
            let zero = cx.zero_value(ty)?;
            emit!(cx, "let mut arg: {rust_type} = {zero};");
            cx.xs = "args";
            let codec = cx.emit_codec(ty, "arg");
            cx.xs = "xs";
            codec?;
            // Handlers never see partially decoded arguments
            emit!(cx, "args.check()?;");
            format!("{handler}::{method}(&*self.h, arg)")
        }
    };
    match signature.result {
        None => {
            emit!(cx, "{call};");
            emit!(cx, "::std::result::Result::Ok(::std::boxed::Box::new({rt}::Void))");
        }
        Some(_) => {
            emit!(cx, "let res = {call};");
            emit!(cx, "::std::result::Result::Ok(::std::boxed::Box::new(res))");
        }
    }
    emit!(cx, "}}");

    Ok(())
}
