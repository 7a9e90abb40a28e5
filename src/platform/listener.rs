//! Listening socket setup
//!
//! Same order as a classic BSD server: create, `SO_REUSEADDR`, bind on all
//! interfaces, listen, non-blocking. Any failing step closes the socket.

use std::io;
use std::net::TcpListener;

/// Create a non-blocking listener on `0.0.0.0:port` with address reuse.
#[cfg(unix)]
pub fn listen(port: u16, backlog: i32) -> io::Result<TcpListener> {
    use std::mem;
    use std::net::Ipv4Addr;
    use std::os::unix::io::{AsRawFd, FromRawFd, OwnedFd};

    fn check(ret: libc::c_int) -> io::Result<()> {
        if ret < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_STREAM, libc::IPPROTO_TCP) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: fd baru saja dibuat dan belum dimiliki siapa pun.
    // OwnedFd menutup socket otomatis kalau salah satu langkah gagal.
    let socket = unsafe { OwnedFd::from_raw_fd(fd) };

    let optval: libc::c_int = 1;
    check(unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_REUSEADDR,
            &optval as *const _ as *const libc::c_void,
            mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    })?;

    // Zeroed first: some platforms carry extra fields (sin_len)
    let mut addr: libc::sockaddr_in = unsafe { mem::zeroed() };
    addr.sin_family = libc::AF_INET as libc::sa_family_t;
    addr.sin_port = port.to_be();
    addr.sin_addr = libc::in_addr {
        s_addr: u32::from(Ipv4Addr::UNSPECIFIED).to_be(),
    };

    check(unsafe {
        libc::bind(
            socket.as_raw_fd(),
            &addr as *const libc::sockaddr_in as *const libc::sockaddr,
            mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
        )
    })?;
    check(unsafe { libc::listen(socket.as_raw_fd(), backlog) })?;

    let listener = TcpListener::from(socket);
    listener.set_nonblocking(true)?;
    Ok(listener)
}

/// Create a non-blocking listener on `0.0.0.0:port`.
///
/// std already enables address reuse where the platform expects it; the
/// backlog is left to std.
#[cfg(not(unix))]
pub fn listen(port: u16, _backlog: i32) -> io::Result<TcpListener> {
    use std::net::Ipv4Addr;

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))?;
    listener.set_nonblocking(true)?;
    Ok(listener)
}
