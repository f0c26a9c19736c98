//! Parsing of XDR interface descriptions.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use lalrpop_util::lalrpop_mod;

use crate::ast::Specification;
use crate::files::FileId;
use crate::source::{BytePos, ByteRange};

lalrpop_mod!(grammar, "/src/parse/grammar.rs");
// Public for LALRPOP's generated code.
pub(crate) mod lexer;

type LalrpopError<'source> = lalrpop_util::ParseError<BytePos, lexer::Token<'source>, lexer::Error>;

/// Parse a specification from the `source` string.
pub fn parse(file_id: FileId, source: &str) -> Result<Specification, ParseMessage> {
    grammar::SpecificationParser::new()
        .parse(file_id, lexer::tokens(file_id, source))
        .map_err(|error| ParseMessage::from_lalrpop(file_id, error))
}

/// Rewrite a numeric literal as it is written in XDR into the equivalent
/// Rust literal. C octal literals (`0755`) become `0o755`, and the `0X` hex
/// prefix becomes `0x`.
pub fn rust_number(text: &str) -> String {
    let (sign, digits) = match text.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", text),
    };

    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        format!("{sign}0x{hex}")
    } else if digits.len() > 1 && digits.starts_with('0') {
        format!("{sign}0o{}", &digits[1..])
    } else {
        text.to_owned()
    }
}

/// Messages produced during parsing
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseMessage {
    Lexer(lexer::Error),
    InvalidToken {
        range: ByteRange,
    },
    UnrecognizedEof {
        range: ByteRange,
        expected: Vec<String>,
    },
    UnrecognizedToken {
        range: ByteRange,
        token: &'static str,
        expected: Vec<String>,
    },
    ExtraToken {
        range: ByteRange,
        token: &'static str,
    },
}

impl ParseMessage {
    fn from_lalrpop(file_id: FileId, error: LalrpopError<'_>) -> ParseMessage {
        use lalrpop_util::ParseError::*;

        match error {
            InvalidToken { location } => ParseMessage::InvalidToken {
                range: ByteRange::new(file_id, location, location),
            },
            UnrecognizedEOF { location, expected } => ParseMessage::UnrecognizedEof {
                range: ByteRange::new(file_id, location, location),
                expected,
            },
            UnrecognizedToken {
                token: (start, token, end),
                expected,
            } => ParseMessage::UnrecognizedToken {
                range: ByteRange::new(file_id, start, end),
                token: token.description(),
                expected,
            },
            ExtraToken {
                token: (start, token, end),
            } => ParseMessage::ExtraToken {
                range: ByteRange::new(file_id, start, end),
                token: token.description(),
            },
            User { error } => ParseMessage::Lexer(error),
        }
    }

    pub fn range(&self) -> ByteRange {
        match self {
            ParseMessage::Lexer(error) => error.range(),
            ParseMessage::InvalidToken { range }
            | ParseMessage::UnrecognizedEof { range, .. }
            | ParseMessage::UnrecognizedToken { range, .. }
            | ParseMessage::ExtraToken { range, .. } => *range,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            ParseMessage::Lexer(error) => error.to_diagnostic(),
            ParseMessage::InvalidToken { range } => Diagnostic::error()
                .with_message("invalid token")
                .with_labels(vec![Label::primary(range.file_id(), *range)]),
            ParseMessage::UnrecognizedEof { range, expected } => Diagnostic::error()
                .with_message("unexpected end of file")
                .with_labels(vec![Label::primary(range.file_id(), *range)
                    .with_message("unexpected end of file")])
                .with_notes(format_expected(expected).map_or(Vec::new(), |message| vec![message])),
            ParseMessage::UnrecognizedToken {
                range,
                token,
                expected,
            } => Diagnostic::error()
                .with_message(format!("unexpected token {token}"))
                .with_labels(vec![
                    Label::primary(range.file_id(), *range).with_message("unexpected token")
                ])
                .with_notes(format_expected(expected).map_or(Vec::new(), |message| vec![message])),
            ParseMessage::ExtraToken { range, token } => Diagnostic::error()
                .with_message(format!("extra token {token}"))
                .with_labels(vec![
                    Label::primary(range.file_id(), *range).with_message("extra token")
                ]),
        }
    }
}

fn format_expected(expected: &[impl std::fmt::Display]) -> Option<String> {
    use itertools::Itertools;

    expected.split_last().map(|items| match items {
        (last, []) => format!("expected {last}"),
        (last, expected) => format!("expected {} or {last}", expected.iter().format(", ")),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::{Definition, Field, Ident, ProcType, TypeDescriptor, Value};

    fn file_id() -> FileId {
        FileId::try_from(1).unwrap()
    }

    fn range(start: BytePos, end: BytePos) -> ByteRange {
        ByteRange::new(file_id(), start, end)
    }

    #[test]
    fn rust_numbers() {
        assert_eq!(rust_number("0"), "0");
        assert_eq!(rust_number("42"), "42");
        assert_eq!(rust_number("-7"), "-7");
        assert_eq!(rust_number("0755"), "0o755");
        assert_eq!(rust_number("-010"), "-0o10");
        assert_eq!(rust_number("0X1f"), "0x1f");
        assert_eq!(rust_number("0x20000001"), "0x20000001");
    }

    #[test]
    fn constant() {
        let spec = parse(file_id(), "const MAXLEN = 0x10;").unwrap();
        assert_eq!(
            spec.definitions,
            vec![Definition::Const {
                name: Ident::new(range(6, 12), "MAXLEN"),
                value: Value::Number(range(15, 19), "0x10".to_owned()),
            }]
        );
    }

    #[test]
    fn declarations() {
        let source = "struct s { int a[4]; unsigned b<>; opaque c<MAX>; string d<>; s *next; };";
        let spec = parse(file_id(), source).unwrap();
        let fields = match &spec.definitions[..] {
            [Definition::Struct { fields, .. }] => fields,
            definitions => panic!("unexpected definitions: {definitions:?}"),
        };

        let types: Vec<_> = fields
            .iter()
            .map(|field| match field {
                Field::Named { ty, .. } => ty.description(),
                Field::Void(_) => "void",
            })
            .collect();
        assert_eq!(
            types,
            [
                "fixed-length array",
                "variable-length array",
                "variable-length opaque",
                "string",
                "optional",
            ]
        );

        match &fields[1] {
            Field::Named { ty, .. } => assert_eq!(
                *ty,
                TypeDescriptor::VarArray(Box::new(TypeDescriptor::Int { unsigned: true }), None)
            ),
            field => panic!("unexpected field: {field:?}"),
        }
    }

    #[test]
    fn union_with_shared_cases() {
        let source = "
            union u switch (int kind) {
            case 1:
            case 2:
                int a;
            case 3:
                void;
            default:
                hyper c;
            };
        ";
        let spec = parse(file_id(), source).unwrap();
        let body = match &spec.definitions[..] {
            [Definition::Union { body, .. }] => body,
            definitions => panic!("unexpected definitions: {definitions:?}"),
        };

        assert_eq!(body.cases.len(), 2);
        assert_eq!(body.cases[0].labels.len(), 2);
        assert!(matches!(body.cases[1].body, Field::Void(_)));
        assert!(matches!(
            body.default,
            Some(Field::Named {
                ty: TypeDescriptor::Hyper { unsigned: false },
                ..
            })
        ));
    }

    #[test]
    fn program() {
        let source = "
            program PROG {
                version VERS {
                    void PROC_NULL(void) = 0;
                    result PROC_GET(args) = 1;
                } = 1;
            } = 0x20000001;
        ";
        let spec = parse(file_id(), source).unwrap();
        let program = match &spec.definitions[..] {
            [Definition::Program(program)] => program,
            definitions => panic!("unexpected definitions: {definitions:?}"),
        };

        let procedures = &program.versions[0].procedures;
        assert_eq!(procedures.len(), 2);
        assert!(matches!(procedures[0].result, ProcType::Void(_)));
        assert!(matches!(
            procedures[1].args[..],
            [ProcType::Type(_, TypeDescriptor::Named(_))]
        ));
    }

    #[test]
    fn unexpected_token() {
        let error = parse(file_id(), "struct s { int a };").unwrap_err();
        assert!(matches!(
            error,
            ParseMessage::UnrecognizedToken { token: "}", .. }
        ));
        assert_eq!(error.range(), range(17, 18));
    }

    #[test]
    fn unexpected_eof() {
        let error = parse(file_id(), "const A = 1").unwrap_err();
        assert!(matches!(error, ParseMessage::UnrecognizedEof { .. }));

        let diagnostic = error.to_diagnostic();
        assert_eq!(diagnostic.message, "unexpected end of file");
        assert_eq!(diagnostic.notes.len(), 1);
        assert!(diagnostic.notes[0].contains("\";\""));
    }

    #[test]
    fn lexer_errors_are_reported() {
        let error = parse(file_id(), "const A = @;").unwrap_err();
        assert!(matches!(error, ParseMessage::Lexer(_)));
    }
}
