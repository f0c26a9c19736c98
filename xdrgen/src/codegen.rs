//! Generation of Rust types, codecs and RPC dispatch tables.
//!
//! Output is emitted line by line into an explicit [`Context`] in the order
//! the definitions were written. Nothing is emitted for a specification that
//! fails to generate: the first error aborts the whole pass.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use std::fmt;

use crate::ast::{Definition, Specification};
use crate::files::FileId;
use crate::source::ByteRange;
use crate::symbols::SymbolTable;

/// Emit one line of output, formatted like [`format!`]. With no format
/// arguments, emits a blank line.
macro_rules! emit {
    ($cx:expr) => {
        $cx.blank()
    };
    ($cx:expr, $($arg:tt)*) => {
        $cx.line(format_args!($($arg)*))
    };
}

mod defs;
mod rpc;
mod types;

/// Generation options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Wrap the output in `pub mod <module>`.
    pub module: Option<String>,
    /// Represent enumerations as `u32` rather than `i32`.
    pub unsigned_enums: bool,
    /// The Rust type of `const` definitions.
    pub const_type: String,
    /// The path of the runtime crate in generated code.
    pub runtime: String,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            module: None,
            unsigned_enums: false,
            const_type: "i64".to_owned(),
            runtime: "::xdrgen_runtime".to_owned(),
        }
    }
}

/// Errors that abort generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenError {
    /// No codec can be generated for this type.
    Unsupported {
        range: ByteRange,
        type_name: &'static str,
    },
    /// A shape the generator does not accept.
    MalformedAst { range: ByteRange, message: String },
    UnresolvedName {
        range: ByteRange,
        name: String,
        suggestion: Option<String>,
    },
    /// A name was declared twice, or two names map to the same Rust item.
    DuplicateName {
        name: String,
        first: ByteRange,
        second: ByteRange,
        rust_name: Option<String>,
    },
    InvalidDiscriminant { range: ByteRange, type_name: String },
}

impl GenError {
    pub fn range(&self) -> ByteRange {
        match self {
            GenError::Unsupported { range, .. }
            | GenError::MalformedAst { range, .. }
            | GenError::UnresolvedName { range, .. }
            | GenError::InvalidDiscriminant { range, .. } => *range,
            GenError::DuplicateName { second, .. } => *second,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        let primary_label = |range: &ByteRange| Label::primary(range.file_id(), *range);
        let secondary_label = |range: &ByteRange| Label::secondary(range.file_id(), *range);

        match self {
            GenError::Unsupported { range, type_name } => Diagnostic::error()
                .with_message(format!("unsupported type `{type_name}`"))
                .with_labels(vec![
                    primary_label(range).with_message("no XDR codec can be generated for this")
                ]),
            GenError::MalformedAst { range, message } => Diagnostic::error()
                .with_message(message)
                .with_labels(vec![primary_label(range)]),
            GenError::UnresolvedName {
                range,
                name,
                suggestion,
            } => Diagnostic::error()
                .with_message(format!("cannot find `{name}` in this file"))
                .with_labels(vec![primary_label(range).with_message("not declared")])
                .with_notes(
                    suggestion
                        .iter()
                        .map(|suggestion| {
                            format!("help: a definition with a similar name exists: `{suggestion}`")
                        })
                        .collect(),
                ),
            GenError::DuplicateName {
                name,
                first,
                second,
                rust_name,
            } => Diagnostic::error()
                .with_message(match rust_name {
                    None => format!("the name `{name}` is defined multiple times"),
                    Some(rust_name) => {
                        format!("the Rust name `{rust_name}` is generated multiple times")
                    }
                })
                .with_labels(vec![
                    primary_label(second).with_message("redefined here"),
                    secondary_label(first).with_message("first defined here"),
                ]),
            GenError::InvalidDiscriminant { range, type_name } => Diagnostic::error()
                .with_message(format!("invalid union discriminant of type `{type_name}`"))
                .with_labels(vec![primary_label(range)])
                .with_notes(vec![
                    "discriminants must be `int`, `unsigned int`, `bool` or an enum".to_owned(),
                ]),
        }
    }
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_diagnostic().message)
    }
}

impl std::error::Error for GenError {}

/// The state of an in-progress generation pass.
pub struct Context<'a, 'spec> {
    symbols: &'a SymbolTable<'spec>,
    options: &'a Options,
    out: String,
    indent: usize,
    // Suffix source for loop variables and temporaries, reset per definition
    counter: usize,
    // Where the declaration being generated was written
    site: ByteRange,
    // Name of the coding state in the code being generated
    xs: &'static str,
}

impl<'a, 'spec> Context<'a, 'spec> {
    pub fn new(symbols: &'a SymbolTable<'spec>, options: &'a Options, site: ByteRange) -> Self {
        Context {
            symbols,
            options,
            out: String::new(),
            indent: 0,
            counter: 0,
            site,
            xs: "xs",
        }
    }

    /// Append a line at the current indentation. Lines starting with a
    /// closing delimiter are outdented, and lines ending with an opening
    /// delimiter indent the lines that follow.
    pub fn line(&mut self, args: fmt::Arguments<'_>) {
        use std::fmt::Write;

        let start = self.out.len();
        // Writing to a `String` cannot fail
        let _ = self.out.write_fmt(args);
        let text = &self.out[start..];
        let closes = text.starts_with(['}', ')', ']']);
        let opens = text.ends_with(['{', '(', '[']);

        if closes {
            self.indent = self.indent.saturating_sub(1);
        }
        let indent = "    ".repeat(self.indent);
        self.out.insert_str(start, &indent);
        self.out.push('\n');
        if opens {
            self.indent += 1;
        }
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// A fresh identifier, unique within the current definition.
    fn fresh(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{prefix}{}", self.counter)
    }

    fn rt(&self) -> &'a str {
        &self.options.runtime
    }

    pub fn into_output(self) -> String {
        self.out
    }
}

/// Generate the Rust source for a lowered specification.
pub fn generate(
    spec: &Specification,
    symbols: &SymbolTable<'_>,
    options: &Options,
    source_name: &str,
    file_id: FileId,
) -> Result<String, GenError> {
    let mut cx = Context::new(symbols, options, ByteRange::new(file_id, 0, 0));

    emit!(cx, "// Generated by xdrgen from `{source_name}`. Do not edit.");
    if let Some(module) = &options.module {
        emit!(cx);
        emit!(cx, "#[allow(clippy::all, dead_code, unused_parens)]");
        emit!(cx, "#[allow(non_camel_case_types, non_upper_case_globals)]");
        emit!(cx, "pub mod {module} {{");
    }

    for (index, definition) in spec.definitions.iter().enumerate() {
        if index > 0 || options.module.is_none() {
            emit!(cx);
        }
        cx.counter = 0;
        if let Some(name) = definition.name() {
            cx.site = name.range;
            tracing::debug!(name = name.as_str(), "generating definition");
        }
        match definition {
            Definition::Program(program) => rpc::emit_program(&mut cx, program)?,
            definition => defs::emit_definition(&mut cx, definition)?,
        }
    }

    if options.module.is_some() {
        emit!(cx, "}}");
    }
    Ok(cx.into_output())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::lower::lower;
    use crate::parse::parse;

    pub(super) fn file_id() -> FileId {
        FileId::try_from(1).unwrap()
    }

    pub(super) fn generate_with(source: &str, options: &Options) -> Result<String, GenError> {
        let spec = lower(parse(file_id(), source).unwrap());
        let symbols = SymbolTable::build(&spec)?;
        generate(&spec, &symbols, options, "test.x", file_id())
    }

    pub(super) fn generate_source(source: &str) -> Result<String, GenError> {
        generate_with(source, &Options::default())
    }

    #[test]
    fn indentation_follows_delimiters() {
        let symbols_spec = Specification::default();
        let symbols = SymbolTable::build(&symbols_spec).unwrap();
        let options = Options::default();
        let mut cx = Context::new(&symbols, &options, ByteRange::new(file_id(), 0, 0));

        emit!(cx, "fn f() {{");
        emit!(cx, "if x {{");
        emit!(cx, "y();");
        emit!(cx, "}} else {{");
        emit!(cx, "z();");
        emit!(cx, "}}");
        emit!(cx, "}}");
        assert_eq!(
            cx.into_output(),
            "fn f() {\n    if x {\n        y();\n    } else {\n        z();\n    }\n}\n"
        );
    }

    #[test]
    fn constants() {
        let output = generate_source("const MAX = 10; const OTHER = MAX;").unwrap();
        assert_eq!(
            output,
            "// Generated by xdrgen from `test.x`. Do not edit.\n\
             \n\
             pub const MAX: i64 = 10;\n\
             \n\
             pub const OTHER: i64 = MAX;\n"
        );
    }

    #[test]
    fn module_wrapper() {
        let options = Options {
            module: Some("proto".to_owned()),
            const_type: "u32".to_owned(),
            ..Options::default()
        };
        let output = generate_with("const A = 0x10;", &options).unwrap();
        assert!(output.contains("pub mod proto {\n    pub const A: u32 = 0x10;\n}\n"));
    }

    #[test]
    fn generation_is_deterministic() {
        let source = "
            struct node { int value; node *next; int items<4>; };
            program P { version V { node GET(node) = 1; } = 1; } = 100;
        ";
        assert_eq!(generate_source(source), generate_source(source));
    }

    #[test]
    fn unresolved_names_are_reported() {
        let error = generate_source("struct s { pont p; };").unwrap_err();
        assert!(matches!(error, GenError::UnresolvedName { ref name, .. } if name == "pont"));
        assert_eq!(error.to_diagnostic().message, "cannot find `pont` in this file");
    }

    #[test]
    fn duplicate_name_diagnostics_point_at_both_sites() {
        let error = generate_source("const A = 1; const A = 2;").unwrap_err();
        let diagnostic = error.to_diagnostic();
        assert_eq!(diagnostic.labels.len(), 2);
        assert_eq!(diagnostic.labels[0].range, 19..20);
        assert_eq!(diagnostic.labels[1].range, 6..7);
    }
}
