use std::fmt;
use std::marker::PhantomData;

use bytes::Bytes;
use hnet_codec::{Codec, TypeDesc};

use crate::error::Result;

/// The null id; never assigned to a binding.
pub const NULL_ID: u32 = 0;

/// A remote expression registered under a numeric id.
///
/// `input` and `output` hold the encoded descriptors of the argument tuple
/// and the result type, exactly as sent during the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub id: u32,
    pub expr: String,
    pub input: Bytes,
    pub output: Bytes,
}

impl Binding {
    /// Binding for a call taking the tuple `A` and returning `R`.
    pub fn of<A: Codec, R: Codec>(id: u32, expr: impl Into<String>) -> Self {
        Self {
            id,
            expr: expr.into(),
            input: A::describe().encode(),
            output: R::describe().encode(),
        }
    }

    /// Decoded argument descriptor.
    pub fn input_type(&self) -> Result<TypeDesc> {
        Ok(TypeDesc::decode(&self.input)?)
    }

    /// Decoded result descriptor.
    pub fn output_type(&self) -> Result<TypeDesc> {
        Ok(TypeDesc::decode(&self.output)?)
    }
}

/// Typed handle to a registered binding.
///
/// `A` is the argument tuple and `R` the result. A handle is only valid on
/// clients built from the builder that issued it.
pub struct Rpc<A, R> {
    id: u32,
    name: String,
    _sig: PhantomData<fn(A) -> R>,
}

impl<A, R> Rpc<A, R> {
    pub(crate) fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            _sig: PhantomData,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Local name given at registration, for diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<A, R> Clone for Rpc<A, R> {
    fn clone(&self) -> Self {
        Self::new(self.id, self.name.clone())
    }
}

impl<A, R> fmt::Debug for Rpc<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rpc")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
