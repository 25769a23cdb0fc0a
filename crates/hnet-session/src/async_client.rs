use hnet_codec::Codec;
use hnet_transport::Connection;
use tracing::{debug, trace, warn};

use crate::binding::{Binding, Rpc};
use crate::client::check_binding;
use crate::error::Result;
use crate::handshake::{establish, SessionConfig};
use crate::invoke::write_invoke;
use crate::scheduler::Scheduler;

/// A session that pipelines calls.
///
/// Each call is written immediately and its continuation queued. Results
/// are decoded as they arrive by [`AsyncClient::drive`], which never
/// blocks, and continuations run in call order. Between calls the
/// connection is non-blocking.
pub struct AsyncClient {
    conn: Connection,
    bindings: Vec<Binding>,
    config: SessionConfig,
    scheduler: Scheduler<Connection>,
}

impl AsyncClient {
    pub(crate) fn establish(
        mut conn: Connection,
        bindings: Vec<Binding>,
        config: SessionConfig,
    ) -> Result<Self> {
        establish(&mut conn, &bindings, &config)?;
        conn.set_blocking(false)?;
        Ok(Self {
            conn,
            bindings,
            config,
            scheduler: Scheduler::new(),
        })
    }

    /// Send a call to `rpc` and queue `k` to receive its result.
    ///
    /// The request is written in full before this returns. `k` runs from a
    /// later [`drive`](Self::drive), after every earlier call's
    /// continuation.
    pub fn call<A, R, F>(&mut self, rpc: &Rpc<A, R>, args: &A, k: F) -> Result<()>
    where
        A: Codec,
        R: Codec + 'static,
        F: FnOnce(R) + 'static,
    {
        check_binding(&self.bindings, rpc.id())?;
        trace!(id = rpc.id(), name = rpc.name(), "queueing call");
        self.conn
            .blocking_section(|conn| write_invoke(conn, rpc.id(), args))?;
        self.scheduler.push::<R, F>(k);
        Ok(())
    }

    /// Decode whatever results have arrived and run their continuations.
    ///
    /// Returns how many calls completed. Call this when the connection is
    /// readable, or poll it.
    pub fn drive(&mut self) -> Result<usize> {
        self.scheduler.drive(&mut self.conn)
    }

    /// Calls sent whose results have not yet been delivered.
    pub fn pending_requests(&self) -> usize {
        self.scheduler.len()
    }

    /// Replace the connection and register the same bindings on it.
    ///
    /// Outstanding calls belong to the old connection; once the new
    /// handshake succeeds they are dropped and their continuations never
    /// run. If the handshake fails the client keeps the old connection and
    /// its queue untouched.
    pub fn reconnect(&mut self, conn: Connection) -> Result<()> {
        debug!(bindings = self.bindings.len(), "reconnecting");

        let mut conn = conn;
        establish(&mut conn, &self.bindings, &self.config)?;
        conn.set_blocking(false)?;

        let dropped = self.scheduler.clear();
        if dropped > 0 {
            warn!(dropped, "dropping pending calls on reconnect");
        }
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

impl std::fmt::Debug for AsyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncClient")
            .field("conn", &self.conn)
            .field("bindings", &self.bindings.len())
            .field("pending", &self.scheduler.len())
            .finish()
    }
}
