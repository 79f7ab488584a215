/// Byte channel from the dispatcher to the host.
///
/// `receive_command` yields exactly one command byte per query. `send`
/// returns once the bytes are handed to the transport; waiting for the
/// endpoint to become free is the implementation's job.
#[allow(async_fn_in_trait)]
pub trait HostLink {
    type Error;

    async fn receive_command(&mut self) -> Result<u8, Self::Error>;

    async fn send(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}
