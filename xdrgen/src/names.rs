//! Conversion of XDR identifiers into Rust identifiers.

use heck::{ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

// Keywords that cannot be written as raw identifiers.
const NON_RAW: &[&str] = &["crate", "self", "Self", "super"];

fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

fn escape(name: String) -> String {
    if NON_RAW.contains(&name.as_str()) || name.is_empty() {
        format!("{name}_")
    } else if is_keyword(&name) {
        format!("r#{name}")
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else {
        name
    }
}

/// The Rust name of a type: `nfs_fh3` becomes `NfsFh3`.
pub fn type_name(name: &str) -> String {
    escape(name.to_upper_camel_case())
}

/// The Rust name of a field or method: `fileId` becomes `file_id`.
pub fn field_name(name: &str) -> String {
    escape(name.to_snake_case())
}

/// The Rust name of a constant: `maxLen` becomes `MAX_LEN`.
pub fn const_name(name: &str) -> String {
    escape(name.to_shouty_snake_case())
}

/// The name of the synthetic type declared for an anonymous aggregate
/// nested in `owner`'s `field`.
pub fn nested_type_name(owner: &str, field: &str) -> String {
    format!("{}{}", owner.to_upper_camel_case(), field.to_upper_camel_case())
}

/// The handler trait generated for `version` of `program`.
pub fn handler_name(program: &str, version: &str) -> String {
    format!(
        "{}{}Handler",
        program.to_upper_camel_case(),
        version.to_upper_camel_case()
    )
}

/// The registration function generated for `version` of `program`.
pub fn regs_name(program: &str, version: &str) -> String {
    format!("{}_{}_regs", program.to_snake_case(), version.to_snake_case())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types() {
        assert_eq!(type_name("nfs_fh3"), "NfsFh3");
        assert_eq!(type_name("fattr3"), "Fattr3");
        assert_eq!(type_name("self"), "Self_");
    }

    #[test]
    fn fields() {
        assert_eq!(field_name("fileId"), "file_id");
        assert_eq!(field_name("type"), "r#type");
        assert_eq!(field_name("self"), "self_");
        assert_eq!(field_name("NFSPROC3_NULL"), "nfsproc3_null");
    }

    #[test]
    fn constants() {
        assert_eq!(const_name("maxLen"), "MAX_LEN");
        assert_eq!(const_name("NFS3_FHSIZE"), "NFS3_FHSIZE");
        assert_eq!(const_name("TRUE"), "TRUE");
    }

    #[test]
    fn rpc_items() {
        assert_eq!(handler_name("NFS_PROGRAM", "NFS_V3"), "NfsProgramNfsV3Handler");
        assert_eq!(regs_name("NFS_PROGRAM", "NFS_V3"), "nfs_program_nfs_v3_regs");
    }

    #[test]
    fn nested_types() {
        assert_eq!(nested_type_name("entry", "next_cookie"), "EntryNextCookie");
    }
}
