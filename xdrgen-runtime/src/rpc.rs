//! Procedure registration and routing for generated RPC dispatch tables.

use fxhash::FxHashMap;
use std::fmt;
use std::sync::Arc;

use crate::{encode, Error, Xdr, XdrState};

/// The result of a dispatched procedure: a value ready to be encoded, or the
/// error that stopped argument decoding.
pub type ProcResult = Result<Box<dyn Xdr + Send>, Error>;

/// A dispatch function: decodes arguments from the state, invokes the
/// handler, and returns the result.
pub type ProcHandler = Arc<dyn Fn(&mut XdrState<'_>) -> ProcResult + Send + Sync>;

/// Program, version and procedure numbers.
pub type ProcKey = (u32, u32, u32);

/// One entry of a generated registration table.
#[derive(Clone)]
pub struct ProcRegistration {
    pub prog: u32,
    pub vers: u32,
    pub proc_num: u32,
    pub handler: ProcHandler,
}

impl ProcRegistration {
    pub fn new<F>(prog: u32, vers: u32, proc_num: u32, handler: F) -> ProcRegistration
    where
        F: Fn(&mut XdrState<'_>) -> ProcResult + Send + Sync + 'static,
    {
        ProcRegistration {
            prog,
            vers,
            proc_num,
            handler: Arc::new(handler),
        }
    }

    pub fn key(&self) -> ProcKey {
        (self.prog, self.vers, self.proc_num)
    }
}

impl fmt::Debug for ProcRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcRegistration")
            .field("prog", &self.prog)
            .field("vers", &self.vers)
            .field("proc_num", &self.proc_num)
            .finish_non_exhaustive()
    }
}

/// Errors returned when registering or dispatching a call.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum DispatchError {
    /// Two registrations share a key.
    DuplicateProcedure(ProcKey),
    /// No version of the program is registered.
    ProgUnavail { prog: u32 },
    /// The program is registered, but not at this version.
    ProgMismatch { prog: u32, low: u32, high: u32 },
    /// The program version is registered, but not this procedure.
    ProcUnavail(ProcKey),
    /// The arguments could not be decoded.
    GarbageArgs(Error),
    /// The result could not be encoded.
    SystemErr(Error),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::DuplicateProcedure((prog, vers, proc_num)) => write!(
                f,
                "procedure {prog}.{vers}.{proc_num} is registered more than once"
            ),
            DispatchError::ProgUnavail { prog } => write!(f, "program {prog} unavailable"),
            DispatchError::ProgMismatch { prog, low, high } => write!(
                f,
                "program {prog} only supports versions {low} to {high}"
            ),
            DispatchError::ProcUnavail((prog, vers, proc_num)) => {
                write!(f, "procedure {prog}.{vers}.{proc_num} unavailable")
            }
            DispatchError::GarbageArgs(error) => write!(f, "cannot decode arguments: {error}"),
            DispatchError::SystemErr(error) => write!(f, "cannot encode result: {error}"),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Routes calls to registered procedures by (program, version, procedure).
#[derive(Default)]
pub struct Dispatcher {
    procs: FxHashMap<ProcKey, ProcHandler>,
}

impl Dispatcher {
    pub fn new() -> Dispatcher {
        Dispatcher::default()
    }

    /// Add a registration table. Fails without registering anything if a key
    /// is duplicated, either within `registrations` or against an earlier
    /// table.
    pub fn register(
        &mut self,
        registrations: impl IntoIterator<Item = ProcRegistration>,
    ) -> Result<(), DispatchError> {
        let registrations: Vec<_> = registrations.into_iter().collect();
        for (index, registration) in registrations.iter().enumerate() {
            let key = registration.key();
            let seen_before = registrations[..index].iter().any(|r| r.key() == key);
            if seen_before || self.procs.contains_key(&key) {
                return Err(DispatchError::DuplicateProcedure(key));
            }
        }

        for registration in registrations {
            self.procs.insert(registration.key(), registration.handler);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.procs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }

    pub fn contains(&self, key: ProcKey) -> bool {
        self.procs.contains_key(&key)
    }

    /// Decode `args`, run the procedure registered under `key`, and return the
    /// encoded result.
    pub fn dispatch(&self, key: ProcKey, args: &[u8]) -> Result<Vec<u8>, DispatchError> {
        let handler = match self.procs.get(&key) {
            Some(handler) => handler,
            None => return Err(self.unavailable(key)),
        };

        let mut xs = XdrState::decoder(args);
        let mut result = handler(&mut xs).map_err(DispatchError::GarbageArgs)?;
        encode(&mut *result).map_err(DispatchError::SystemErr)
    }

    fn unavailable(&self, (prog, vers, proc_num): ProcKey) -> DispatchError {
        let versions = self
            .procs
            .keys()
            .filter(|(p, _, _)| *p == prog)
            .map(|(_, v, _)| *v);
        let (low, high) = versions.fold((u32::MAX, u32::MIN), |(low, high), v| {
            (low.min(v), high.max(v))
        });

        if low > high {
            DispatchError::ProgUnavail { prog }
        } else if !self.procs.keys().any(|(p, v, _)| *p == prog && *v == vers) {
            DispatchError::ProgMismatch { prog, low, high }
        } else {
            DispatchError::ProcUnavail((prog, vers, proc_num))
        }
    }
}
