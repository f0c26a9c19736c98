use codespan_reporting::diagnostic::{Diagnostic, Label};
use logos::{Filter, Logos};

use crate::files::FileId;
use crate::source::{BytePos, ByteRange};

#[derive(Clone, Debug, PartialEq, Eq, Logos)]
#[logos(extras = FileId)]
pub enum Token<'source> {
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Name(&'source str),
    #[regex(r"-?(0[xX][0-9a-fA-F]+|[0-9]+)")]
    NumberLiteral(&'source str),

    #[token("bool")]
    KeywordBool,
    #[token("case")]
    KeywordCase,
    #[token("const")]
    KeywordConst,
    #[token("default")]
    KeywordDefault,
    #[token("double")]
    KeywordDouble,
    #[token("enum")]
    KeywordEnum,
    #[token("float")]
    KeywordFloat,
    #[token("hyper")]
    KeywordHyper,
    #[token("int")]
    KeywordInt,
    #[token("opaque")]
    KeywordOpaque,
    #[token("program")]
    KeywordProgram,
    #[token("quadruple")]
    KeywordQuadruple,
    #[token("string")]
    KeywordString,
    #[token("struct")]
    KeywordStruct,
    #[token("switch")]
    KeywordSwitch,
    #[token("typedef")]
    KeywordTypedef,
    #[token("union")]
    KeywordUnion,
    #[token("unsigned")]
    KeywordUnsigned,
    #[token("version")]
    KeywordVersion,
    #[token("void")]
    KeywordVoid,

    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("=")]
    Equals,
    #[token(";")]
    Semicolon,
    #[token("*")]
    Star,
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("<")]
    OpenAngle,
    #[token(">")]
    CloseAngle,

    #[token(r"/*", block_comment)]
    BlockComment(BlockCommentError),

    #[error]
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)]
    // rpcgen pass-through lines and C preprocessor directives
    #[regex(r"%[^\n]*", logos::skip)]
    #[regex(r"#[^\n]*", logos::skip)]
    Error,
}

const OPEN: &str = "/*";
const CLOSE: &str = "*/";
const LEN: BytePos = OPEN.len() as BytePos;

fn block_comment<'source>(
    lexer: &mut logos::Lexer<'source, Token<'source>>,
) -> Filter<BlockCommentError> {
    match lexer.remainder().find(CLOSE) {
        Some(offset) => {
            lexer.bump(offset + CLOSE.len());
            Filter::Skip
        }
        None => {
            let start = lexer.span().start as BytePos;
            lexer.bump(lexer.remainder().len());
            Filter::Emit(BlockCommentError {
                open: ByteRange::new(lexer.extras, start, start + LEN),
            })
        }
    }
}

pub type Spanned<Tok, Loc> = (Loc, Tok, Loc);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    UnclosedBlockComment(BlockCommentError),
    UnexpectedCharacter { range: ByteRange },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockCommentError {
    open: ByteRange,
}

impl Error {
    pub fn range(&self) -> ByteRange {
        match self {
            Error::UnexpectedCharacter { range } => *range,
            Error::UnclosedBlockComment(BlockCommentError { open }) => *open,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            Error::UnexpectedCharacter { range } => Diagnostic::error()
                .with_message("unexpected character")
                .with_labels(vec![Label::primary(range.file_id(), *range)]),
            Error::UnclosedBlockComment(BlockCommentError { open }) => Diagnostic::error()
                .with_message("unclosed block comment")
                .with_labels(vec![
                    Label::primary(open.file_id(), *open).with_message(format!("`{OPEN}` here"))
                ])
                .with_notes(vec![format!("Help: add a closing `{CLOSE}`")]),
        }
    }
}

/// Tokenize `source`. The caller is responsible for keeping `source` below
/// [`MAX_SOURCE_LEN`](crate::source::MAX_SOURCE_LEN) bytes.
pub fn tokens(
    file_id: FileId,
    source: &str,
) -> impl Iterator<Item = Result<Spanned<Token<'_>, BytePos>, Error>> {
    Token::lexer_with_extras(source, file_id)
        .spanned()
        .map(move |(token, range)| {
            let start = range.start as BytePos;
            let end = range.end as BytePos;
            match token {
                Token::BlockComment(err) => Err(Error::UnclosedBlockComment(err)),
                Token::Error => Err(Error::UnexpectedCharacter {
                    range: ByteRange::new(file_id, start, end),
                }),
                token => Ok((start, token, end)),
            }
        })
        .inspect(|token| tracing::debug!(?token, "lexed"))
}

impl<'source> Token<'source> {
    pub fn description(&self) -> &'static str {
        match self {
            Token::Name(_) => "name",
            Token::NumberLiteral(_) => "number literal",
            Token::KeywordBool => "bool",
            Token::KeywordCase => "case",
            Token::KeywordConst => "const",
            Token::KeywordDefault => "default",
            Token::KeywordDouble => "double",
            Token::KeywordEnum => "enum",
            Token::KeywordFloat => "float",
            Token::KeywordHyper => "hyper",
            Token::KeywordInt => "int",
            Token::KeywordOpaque => "opaque",
            Token::KeywordProgram => "program",
            Token::KeywordQuadruple => "quadruple",
            Token::KeywordString => "string",
            Token::KeywordStruct => "struct",
            Token::KeywordSwitch => "switch",
            Token::KeywordTypedef => "typedef",
            Token::KeywordUnion => "union",
            Token::KeywordUnsigned => "unsigned",
            Token::KeywordVersion => "version",
            Token::KeywordVoid => "void",
            Token::Colon => ":",
            Token::Comma => ",",
            Token::Equals => "=",
            Token::Semicolon => ";",
            Token::Star => "*",
            Token::OpenBrace => "{",
            Token::CloseBrace => "}",
            Token::OpenBracket => "[",
            Token::CloseBracket => "]",
            Token::OpenParen => "(",
            Token::CloseParen => ")",
            Token::OpenAngle => "<",
            Token::CloseAngle => ">",
            Token::BlockComment(_) => "block comment",
            Token::Error => "error",
        }
    }
}
