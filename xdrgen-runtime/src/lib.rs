//! Runtime support for code generated by `xdrgen`.
//!
//! Generated types implement [`Xdr`], a single direction-aware codec method
//! that transfers a value through an [`XdrState`]. Generated RPC dispatch
//! tables are lists of [`rpc::ProcRegistration`]s that a transport can load
//! into an [`rpc::Dispatcher`].

pub mod error;
pub mod prelude;
pub mod rpc;
mod state;

pub use crate::error::Error;
pub use crate::state::{padding, XdrState, MAX_DEPTH};

/// Types that can be transferred to and from XDR.
pub trait Xdr {
    /// Encode `self` or decode into `self`, depending on the direction of
    /// `xs`. Errors are recorded in `xs`.
    fn xdr(&mut self, xs: &mut XdrState<'_>);
}

/// The canonical empty value, used for `void` procedure results.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Void;

impl Xdr for Void {
    fn xdr(&mut self, _xs: &mut XdrState<'_>) {}
}

macro_rules! impl_xdr_primitive {
    ($($ty:ident),*) => {
        $(
            impl Xdr for $ty {
                fn xdr(&mut self, xs: &mut XdrState<'_>) {
                    xs.$ty(self);
                }
            }
        )*
    };
}

// Procedures may take and return primitives directly
impl_xdr_primitive!(i32, u32, i64, u64, bool);

/// Encode a value to a fresh buffer.
pub fn encode<T: Xdr + ?Sized>(value: &mut T) -> Result<Vec<u8>, Error> {
    let mut buffer = Vec::new();
    let mut xs = XdrState::encoder(&mut buffer);
    value.xdr(&mut xs);
    xs.check()?;
    Ok(buffer)
}

/// Decode a value that occupies all of `bytes`.
pub fn decode<T: Xdr + Default>(bytes: &[u8]) -> Result<T, Error> {
    let mut value = T::default();
    let mut xs = XdrState::decoder(bytes);
    value.xdr(&mut xs);
    xs.check()?;
    match xs.remaining() {
        0 => Ok(value),
        count => Err(Error::TrailingBytes(count)),
    }
}
