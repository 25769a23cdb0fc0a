use hnet_codec::Codec;
use hnet_transport::Connection;
use tracing::{debug, trace};

use crate::async_client::AsyncClient;
use crate::binding::{Binding, Rpc, NULL_ID};
use crate::error::{Result, SessionError};
use crate::handshake::{establish, SessionConfig};
use crate::invoke::invoke;

/// Collects the bindings a client will register.
///
/// Ids follow declaration order starting at 1, so a client rebuilt from
/// the same declarations always registers the same ids.
#[derive(Debug, Default)]
pub struct ClientBuilder {
    bindings: Vec<Binding>,
    config: SessionConfig,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            bindings: Vec::new(),
            config,
        }
    }

    /// Register `expr`, called with the argument tuple `A` and returning
    /// `R`. `name` is only used locally for diagnostics.
    pub fn bind<A: Codec, R: Codec>(&mut self, name: &str, expr: impl Into<String>) -> Rpc<A, R> {
        let id = NULL_ID + 1 + self.bindings.len() as u32;
        self.bindings.push(Binding::of::<A, R>(id, expr));
        Rpc::new(id, name)
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Handshake over `conn` and return a blocking client.
    pub fn connect(self, conn: Connection) -> Result<Client> {
        Client::establish(conn, self.bindings, self.config)
    }

    /// Handshake over `conn` and return a pipelining client.
    pub fn connect_async(self, conn: Connection) -> Result<AsyncClient> {
        AsyncClient::establish(conn, self.bindings, self.config)
    }
}

/// Check that `id` names one of `bindings`.
pub(crate) fn check_binding(bindings: &[Binding], id: u32) -> Result<()> {
    match id.checked_sub(1).and_then(|i| bindings.get(i as usize)) {
        Some(binding) if binding.id == id => Ok(()),
        _ => Err(SessionError::UnknownBinding(id)),
    }
}

/// A session whose calls block until their results arrive.
#[derive(Debug)]
pub struct Client {
    conn: Connection,
    bindings: Vec<Binding>,
    config: SessionConfig,
}

impl Client {
    pub(crate) fn establish(
        mut conn: Connection,
        bindings: Vec<Binding>,
        config: SessionConfig,
    ) -> Result<Self> {
        establish(&mut conn, &bindings, &config)?;
        Ok(Self {
            conn,
            bindings,
            config,
        })
    }

    /// Invoke `rpc` and wait for its result.
    pub fn call<A: Codec, R: Codec>(&mut self, rpc: &Rpc<A, R>, args: &A) -> Result<R> {
        check_binding(&self.bindings, rpc.id())?;
        trace!(id = rpc.id(), name = rpc.name(), "calling");
        invoke(&mut self.conn, rpc.id(), args)
    }

    /// Replace the connection and register the same bindings on it.
    pub fn reconnect(&mut self, conn: Connection) -> Result<()> {
        debug!(bindings = self.bindings.len(), "reconnecting");
        let mut conn = conn;
        establish(&mut conn, &self.bindings, &self.config)?;
        self.conn = conn;
        Ok(())
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
