//! Raw CAN socket
//!
//! This module provides `CanSocket`, a raw SocketCAN socket bound to one
//! network interface, with acceptance filters and timeout-bounded send and
//! receive.

use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};

use log::{debug, trace};
use nix::errno::Errno;
use nix::net::if_::if_nametoindex;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use socketcan::{Socket, SocketOptions};

use crate::error::{CanError, Result};
use crate::filter::CanFilter;
use crate::frame::CanFrame;
use crate::timeout::Timeout;

/// Direction a readiness wait is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Readiness {
    Read,
    Write,
}

/// Wait until `fd` is readable or writable
///
/// Returns `Ok(false)` when the timeout expires first. `None` waits without
/// bound.
pub(crate) fn wait_ready(
    fd: BorrowedFd<'_>,
    readiness: Readiness,
    timeout: Option<Timeout>,
) -> io::Result<bool> {
    let events = match readiness {
        Readiness::Read => PollFlags::POLLIN,
        Readiness::Write => PollFlags::POLLOUT,
    };
    let mut fds = [PollFd::new(fd, events)];
    let timeout = timeout.map_or(PollTimeout::NONE, |t| t.to_poll_timeout());

    let ready = poll(&mut fds, timeout)?;
    Ok(ready > 0)
}

/// Errors a write reports when the socket could not take the frame in time
fn is_timeout_like(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

/// Raw CAN socket bound to one interface
///
/// The socket is `Closed` until `open` succeeds and is closed again by
/// `close` or on drop. Send and receive each carry a timeout and a separate
/// enabled flag; both are plain session state read at the start of every
/// operation, so they can be changed between calls without reopening.
///
/// Operations take `&mut self`; a socket shared between threads must be
/// serialized by the caller.
///
/// # Example
///
/// ```no_run
/// use can_peripheral::{CanFilter, CanFrame, CanSocket, Timeout};
///
/// let mut socket = CanSocket::new("can0");
/// socket.open()?;
/// socket.set_filter(&CanFilter::new(0x123, 0x7FF))?;
///
/// socket.set_recv_timeout(Timeout::from_millis(100));
/// socket.enable_recv_timeout();
///
/// socket.send_frame(&CanFrame::new(0x100, &[0x01, 0x02])?)?;
/// match socket.receive_frame() {
///     Ok(frame) => println!("RX  {}", frame),
///     Err(e) if e.is_timeout() => println!("nothing received"),
///     Err(e) => return Err(e),
/// }
/// # Ok::<(), can_peripheral::CanError>(())
/// ```
pub struct CanSocket {
    /// Network interface name, e.g. "can0"
    interface: String,
    /// Bound socket while open
    socket: Option<socketcan::CanSocket>,
    recv_timeout: Timeout,
    recv_timeout_enabled: bool,
    send_timeout: Timeout,
    send_timeout_enabled: bool,
}

impl CanSocket {
    /// Create a closed socket for the named interface
    ///
    /// Both timeouts start at zero and disabled, so send and receive block
    /// until they can complete.
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            socket: None,
            recv_timeout: Timeout::ZERO,
            recv_timeout_enabled: false,
            send_timeout: Timeout::ZERO,
            send_timeout_enabled: false,
        }
    }

    /// Wrap an already open descriptor
    #[cfg(test)]
    pub(crate) fn from_owned_fd(interface: impl Into<String>, fd: std::os::fd::OwnedFd) -> Self {
        let mut socket = Self::new(interface);
        socket.socket = Some(socketcan::CanSocket::from(fd));
        socket
    }

    /// Get the interface name
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Check if the socket is open
    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    /// Get the socket file descriptor while open
    pub fn raw_fd(&self) -> Option<RawFd> {
        self.socket.as_ref().map(|socket| socket.as_raw_fd())
    }

    /// Open the socket and bind it to the interface
    ///
    /// Calling this on an open socket does nothing. On failure the socket
    /// stays closed.
    pub fn open(&mut self) -> Result<()> {
        if self.socket.is_some() {
            debug!("{}: socket already open", self.interface);
            return Ok(());
        }

        let if_index =
            if_nametoindex(self.interface.as_str()).map_err(|errno| CanError::InterfaceNotFound {
                interface: self.interface.clone(),
                source: io::Error::from(errno),
            })?;
        let socket = socketcan::CanSocket::open_iface(if_index)?;

        debug!(
            "{}: opened socket fd {} (ifindex {})",
            self.interface,
            socket.as_raw_fd(),
            if_index
        );
        self.socket = Some(socket);
        Ok(())
    }

    /// Close the socket
    ///
    /// Calling this on a closed socket does nothing.
    pub fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            debug!("{}: closing socket fd {}", self.interface, socket.as_raw_fd());
        }
    }

    /// Install a set of acceptance filters, replacing the current set
    ///
    /// A frame is received if it matches any filter. An empty set receives
    /// nothing.
    pub fn set_filters(&mut self, filters: &[CanFilter]) -> Result<()> {
        self.option_socket()?.set_filters(filters)?;

        debug!(
            "{}: installed filters [{}]",
            self.interface,
            filters
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(())
    }

    /// Install a single acceptance filter, replacing the current set
    pub fn set_filter(&mut self, filter: &CanFilter) -> Result<()> {
        self.set_filters(std::slice::from_ref(filter))
    }

    /// Accept every frame again
    ///
    /// Installs `CanFilter::ACCEPT_ALL` (id 0x7FF, mask 0).
    pub fn disable_filter(&mut self) -> Result<()> {
        self.set_filter(&CanFilter::ACCEPT_ALL)
    }

    /// Enable or disable local loopback of sent frames to other sockets
    pub fn set_loopback(&mut self, enabled: bool) -> Result<()> {
        self.option_socket()?.set_loopback(enabled)?;
        Ok(())
    }

    /// Enable or disable receiving frames sent from this socket
    pub fn set_recv_own_msgs(&mut self, enabled: bool) -> Result<()> {
        self.option_socket()?.set_recv_own_msgs(enabled)?;
        Ok(())
    }

    /// Set the receive timeout, used from the next receive on
    pub fn set_recv_timeout(&mut self, timeout: Timeout) {
        self.recv_timeout = timeout;
    }

    /// Set the send timeout, used from the next send on
    pub fn set_send_timeout(&mut self, timeout: Timeout) {
        self.send_timeout = timeout;
    }

    /// Bound receive by the receive timeout
    pub fn enable_recv_timeout(&mut self) {
        self.recv_timeout_enabled = true;
    }

    /// Receive blocks until a frame arrives
    pub fn disable_recv_timeout(&mut self) {
        self.recv_timeout_enabled = false;
    }

    /// Bound send by the send timeout
    pub fn enable_send_timeout(&mut self) {
        self.send_timeout_enabled = true;
    }

    /// Send blocks until the socket is writable
    pub fn disable_send_timeout(&mut self) {
        self.send_timeout_enabled = false;
    }

    /// Get the configured receive timeout, enabled or not
    pub fn recv_timeout(&self) -> Timeout {
        self.recv_timeout
    }

    /// Get the configured send timeout, enabled or not
    pub fn send_timeout(&self) -> Timeout {
        self.send_timeout
    }

    /// Check if receive is bounded by the receive timeout
    pub fn is_recv_timeout_enabled(&self) -> bool {
        self.recv_timeout_enabled
    }

    /// Check if send is bounded by the send timeout
    pub fn is_send_timeout_enabled(&self) -> bool {
        self.send_timeout_enabled
    }

    /// Receive one frame
    ///
    /// With the receive timeout enabled, fails with `CanError::ReadTimeout`
    /// if no frame arrives in time.
    pub fn receive_frame(&mut self) -> Result<CanFrame> {
        let socket = self.io_socket()?;
        let timeout = self.recv_timeout_enabled.then_some(self.recv_timeout);

        if !wait_ready(socket.as_fd(), Readiness::Read, timeout)? {
            return Err(CanError::ReadTimeout);
        }

        let frame = CanFrame::decode(&socket.read_frame()?);
        trace!("{}: RX {}", self.interface, frame);
        Ok(frame)
    }

    /// Send one frame
    ///
    /// With the send timeout enabled, fails with `CanError::WriteTimeout` if
    /// the socket does not become writable in time. A write the kernel
    /// rejects as would-block or timed out is reported the same way.
    pub fn send_frame(&mut self, frame: &CanFrame) -> Result<()> {
        let socket = self.io_socket()?;
        let timeout = self.send_timeout_enabled.then_some(self.send_timeout);

        if !wait_ready(socket.as_fd(), Readiness::Write, timeout)? {
            return Err(CanError::WriteTimeout);
        }

        if let Err(err) = socket.write_frame(&frame.encode()) {
            if is_timeout_like(&err) {
                return Err(CanError::WriteTimeout);
            }
            return Err(err.into());
        }

        trace!("{}: TX {}", self.interface, frame);
        Ok(())
    }

    /// Socket for send/receive; a closed socket is an invalid state
    fn io_socket(&self) -> Result<&socketcan::CanSocket> {
        self.socket.as_ref().ok_or(CanError::NotOpen)
    }

    /// Socket for options; a closed socket fails like setsockopt on a bad fd
    fn option_socket(&self) -> Result<&socketcan::CanSocket> {
        self.socket
            .as_ref()
            .ok_or_else(|| CanError::Io(io::Error::from(Errno::EBADF)))
    }
}

impl std::fmt::Debug for CanSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanSocket")
            .field("interface", &self.interface)
            .field("fd", &self.raw_fd())
            .field("recv_timeout", &self.recv_timeout)
            .field("recv_timeout_enabled", &self.recv_timeout_enabled)
            .field("send_timeout", &self.send_timeout)
            .field("send_timeout_enabled", &self.send_timeout_enabled)
            .finish()
    }
}

impl AsRawFd for CanSocket {
    /// Returns -1 while closed
    fn as_raw_fd(&self) -> RawFd {
        self.raw_fd().unwrap_or(-1)
    }
}

impl Drop for CanSocket {
    fn drop(&mut self) {
        if self.is_open() {
            self.close();
        }
    }
}
