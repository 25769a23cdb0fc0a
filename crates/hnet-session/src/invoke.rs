//! The invocation exchange: `[INVOKE][id][args]`, answered by the result.
//!
//! There is no correlation id. Results come back in the order calls were
//! made, and a unit result occupies no bytes at all.

use std::io::{Read, Write};

use hnet_codec::Codec;
use hnet_transport::send_exact;

use crate::error::Result;
use crate::handshake::CMD_INVOKE;

/// Encode a full invocation message.
pub fn encode_invoke<A: Codec>(id: u32, args: &A) -> Result<Vec<u8>> {
    let mut msg = vec![CMD_INVOKE];
    id.write(&mut msg)?;
    args.write(&mut msg)?;
    Ok(msg)
}

/// Send an invocation, blocking until it is fully written.
pub fn write_invoke<W: Write + ?Sized, A: Codec>(w: &mut W, id: u32, args: &A) -> Result<()> {
    send_exact(w, &encode_invoke(id, args)?)?;
    Ok(())
}

/// Send an invocation and block for its result.
pub fn invoke<S, A, R>(stream: &mut S, id: u32, args: &A) -> Result<R>
where
    S: Read + Write + ?Sized,
    A: Codec,
    R: Codec,
{
    write_invoke(stream, id, args)?;
    Ok(R::read(stream)?)
}
