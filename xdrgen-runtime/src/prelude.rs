pub use crate::error::Error;
pub use crate::rpc::{DispatchError, Dispatcher, ProcRegistration, ProcResult};
pub use crate::{decode, encode, Void, Xdr, XdrState};
