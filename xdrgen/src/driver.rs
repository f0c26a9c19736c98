use codespan_reporting::diagnostic::{Diagnostic, Severity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::termcolor::{BufferedStandardStream, ColorChoice, WriteColor};
use std::cell::RefCell;
use std::io::{Read, Write};
use std::path::Path;

use crate::codegen::{self, Options};
use crate::files::{FileId, Files};
use crate::lower::lower;
use crate::parse;
use crate::symbols::SymbolTable;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Error => 1,
        }
    }
}

fn color_choice(stream: atty::Stream) -> ColorChoice {
    match atty::is(stream) {
        true => ColorChoice::Auto,
        false => ColorChoice::Never,
    }
}

pub struct Driver {
    files: Files,
    options: Options,

    seen_errors: RefCell<bool>,
    codespan_config: codespan_reporting::term::Config,
    diagnostic_writer: RefCell<Box<dyn WriteColor>>,
}

impl Default for Driver {
    fn default() -> Driver {
        Driver::new()
    }
}

impl Driver {
    pub fn new() -> Driver {
        Driver {
            files: Files::new(),
            options: Options::default(),

            seen_errors: RefCell::new(false),
            codespan_config: codespan_reporting::term::Config::default(),
            diagnostic_writer: RefCell::new(Box::new(BufferedStandardStream::stderr(
                color_choice(atty::Stream::Stderr),
            ))),
        }
    }

    /// Setup a global panic hook
    pub fn install_panic_hook(&self) {
        // Use the currently set codespan configuration
        let term_config = self.codespan_config.clone();
        // Fetch the default hook (which prints the panic message and an optional backtrace)
        let default_hook = std::panic::take_hook();

        std::panic::set_hook(Box::new(move |info| {
            let location = info.location();
            let message = if let Some(message) = info.payload().downcast_ref::<String>() {
                message.as_str()
            } else if let Some(message) = info.payload().downcast_ref::<&str>() {
                message
            } else {
                "unknown panic type"
            };

            let diagnostic = Diagnostic::bug()
                .with_message(format!("compiler panicked at '{message}'"))
                .with_notes(vec![match location {
                    Some(location) => format!("panicked at: {location}"),
                    None => "panicked at: unknown location".to_owned(),
                }]);

            let mut writer = BufferedStandardStream::stderr(color_choice(atty::Stream::Stderr));
            let dummy_files = SimpleFiles::<String, String>::new();

            default_hook(info);
            eprintln!();
            // Nothing more can be done if the report itself fails
            let _ = codespan_reporting::term::emit(
                &mut writer,
                &term_config,
                &dummy_files,
                &diagnostic,
            );
            let _ = writer.flush();
        }));
    }

    /// Set the options used when generating code
    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    /// Set the writer to use when rendering diagnostics
    pub fn set_diagnostic_writer(&mut self, stream: impl 'static + WriteColor) {
        self.diagnostic_writer = RefCell::new(Box::new(stream) as Box<dyn WriteColor>);
    }

    /// Set when to use colours when rendering diagnostics to standard error
    pub fn set_color_choice(&mut self, choice: ColorChoice) {
        self.set_diagnostic_writer(BufferedStandardStream::stderr(choice));
    }

    /// Load a source string into the file database.
    pub fn load_source_string(&mut self, name: String, source: String) -> Option<FileId> {
        let file_id = self.files.add(name, source);
        if file_id.is_none() {
            self.emit_diagnostic(Diagnostic::error().with_message("too many source files"));
        }
        file_id
    }

    /// Load a source file into the file database using a reader.
    pub fn load_source(&mut self, name: String, mut reader: impl Read) -> Option<FileId> {
        let mut source = String::new();
        match reader.read_to_string(&mut source) {
            Ok(_) => self.load_source_string(name, source),
            Err(error) => {
                self.emit_read_diagnostic(name, error);
                None
            }
        }
    }

    /// Load a source file into the file database from the given path.
    pub fn load_source_path(&mut self, path: &Path) -> Option<FileId> {
        match std::fs::File::open(path) {
            Ok(file) => self.load_source(path.display().to_string(), file),
            Err(error) => {
                self.emit_read_diagnostic(path.display(), error);
                None
            }
        }
    }

    /// Returns `true` if an error diagnostic has been emitted.
    pub fn seen_errors(&self) -> bool {
        *self.seen_errors.borrow()
    }

    /// Compile a loaded file to Rust source, emitting diagnostics for any
    /// errors encountered.
    pub fn compile(&self, file_id: FileId) -> Option<String> {
        let file = match self.files.get(file_id) {
            Ok(file) => file,
            Err(error) => {
                self.emit_diagnostic(Diagnostic::bug().with_message(error.to_string()));
                return None;
            }
        };

        let spec = match parse::parse(file_id, file.source()) {
            Ok(spec) => spec,
            Err(message) => {
                self.emit_diagnostic(message.to_diagnostic());
                return None;
            }
        };
        tracing::debug!(definitions = spec.definitions.len(), "parsed");

        let spec = lower(spec);
        let symbols = match SymbolTable::build(&spec) {
            Ok(symbols) => symbols,
            Err(error) => {
                self.emit_diagnostic(error.to_diagnostic());
                return None;
            }
        };

        let name = file.name();
        let source_name = Path::new(name)
            .file_name()
            .map_or_else(|| name.clone(), |name| name.to_string_lossy().into_owned());
        let output = codegen::generate(&spec, &symbols, &self.options, &source_name, file_id);
        let output = match output {
            Ok(output) => output,
            Err(error) => {
                self.emit_diagnostic(error.to_diagnostic());
                return None;
            }
        };
        tracing::debug!(bytes = output.len(), "generated");

        // Generated code that does not parse is a bug in the generator
        if let Err(error) = syn::parse_file(&output) {
            self.emit_diagnostic(
                Diagnostic::bug()
                    .with_message("generated code is not valid Rust")
                    .with_notes(vec![error.to_string()]),
            );
            return None;
        }

        Some(output)
    }

    /// Compile a loaded file, writing the output to standard output.
    pub fn compile_and_print(&self, file_id: FileId) -> Status {
        let output = match self.compile(file_id) {
            Some(output) => output,
            None => return Status::Error,
        };

        let mut stdout = std::io::stdout().lock();
        match stdout.write_all(output.as_bytes()).and_then(|()| stdout.flush()) {
            Ok(()) => Status::Ok,
            Err(error) => {
                self.emit_write_diagnostic("<stdout>", error);
                Status::Error
            }
        }
    }

    /// Compile a loaded file, replacing the file at `path` with the output.
    ///
    /// The output is written to a temporary file beside `path` and renamed
    /// into place only once it is complete, so `path` is left untouched if
    /// anything fails.
    pub fn compile_and_write(&self, file_id: FileId, path: &Path) -> Status {
        let output = match self.compile(file_id) {
            Some(output) => output,
            None => return Status::Error,
        };

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let result = tempfile::NamedTempFile::new_in(dir).and_then(|mut file| {
            file.write_all(output.as_bytes())?;
            file.as_file().sync_all()?;
            file.persist(path).map_err(|error| error.error)?;
            Ok(())
        });

        match result {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "wrote output");
                Status::Ok
            }
            Err(error) => {
                self.emit_write_diagnostic(path.display(), error);
                Status::Error
            }
        }
    }

    fn emit_diagnostic(&self, diagnostic: Diagnostic<FileId>) {
        let mut writer = self.diagnostic_writer.borrow_mut();
        let config = &self.codespan_config;

        let result = codespan_reporting::term::emit(&mut *writer, config, &self.files, &diagnostic);
        if let Err(error) = result {
            tracing::error!(%error, "failed to render diagnostic");
        }
        let _ = writer.flush();

        if diagnostic.severity >= Severity::Error {
            *self.seen_errors.borrow_mut() = true;
        }
    }

    fn emit_read_diagnostic(&self, name: impl std::fmt::Display, error: std::io::Error) {
        let diagnostic =
            Diagnostic::error().with_message(format!("couldn't read `{name}`: {error}"));
        self.emit_diagnostic(diagnostic);
    }

    fn emit_write_diagnostic(&self, name: impl std::fmt::Display, error: std::io::Error) {
        let diagnostic =
            Diagnostic::error().with_message(format!("couldn't write `{name}`: {error}"));
        self.emit_diagnostic(diagnostic);
    }
}
