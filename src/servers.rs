//! Server loops (§5, §2.7). One thread runs the UDP receive loop, a
//! second runs the TCP accept loop and spawns a thread per connection
//! (§5: "spawns ... connection handlers"). Blocking sockets throughout —
//! spec.md §5 is explicit that no coroutines are needed here, unlike the
//! teacher crate's tokio runtime.
//!
//! Both loops are pure I/O-in, `dispatch::dispatch`-out, I/O-out: all
//! protocol logic lives in `dispatch`, `query`, `update`, `axfr` and
//! `notify`. A loop's only job is framing bytes on and off the wire.

use crate::axfr;
use crate::dispatch::{self, DispatchOutcome, ServerContext, Transport};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream, UdpSocket};
use tracing::{debug, error, info, warn};

/// Largest EDNS-negotiated UDP payload this server will ever advertise
/// (§4.1), plus headroom; also used as the receive buffer size so a
/// maximal query is never truncated.
const UDP_RECV_BUFFER_SIZE: usize = 4096;
/// Inbound TCP message size ceiling (§5: "bounded ... ≥ 65,535").
const TCP_MAX_MESSAGE_SIZE: usize = 65_535;

/// Runs the UDP receive loop on the calling thread. Never returns under
/// normal operation; a `recv_from` error is logged and the loop
/// continues (§7: transport errors are not fatal).
pub fn run_udp(socket: UdpSocket, ctx: &ServerContext) -> ! {
    let mut buf = [0u8; UDP_RECV_BUFFER_SIZE];
    info!("UDP listener ready on {:?}", socket.local_addr().ok());
    loop {
        let (len, peer) = match socket.recv_from(&mut buf) {
            Ok(value) => value,
            Err(e) => {
                error!("UDP recv_from failed: {e:?}");
                continue;
            }
        };
        debug!("{len} bytes received from {peer} via UDP");

        match dispatch::dispatch(&buf[..len], Transport::Udp, ctx) {
            DispatchOutcome::Reply(message) => {
                let had_edns = message.edns_opt().is_some();
                let limit = dispatch::udp_payload_limit(had_edns);
                match message.to_bytes_within(limit) {
                    Ok(bytes) => {
                        if let Err(e) = socket.send_to(&bytes, peer) {
                            warn!("UDP send_to {peer} failed: {e:?}");
                        }
                    }
                    Err(_) => {
                        // Encode failure on a reply that's already too large to
                        // shrink further: drop rather than send garbage (§7).
                        warn!("reply to {peer} exceeded the UDP payload limit, dropping");
                    }
                }
            }
            DispatchOutcome::Axfr { .. } => {
                // dispatch() never returns this for Transport::Udp.
                unreachable!("AXFR does not hand off over UDP");
            }
            DispatchOutcome::Drop => {
                debug!(
                    "dropped UDP message from {peer} (id={:#06x} if decodable)",
                    crate::utils::get_query_id(&buf[..len])
                );
            }
        }
    }
}

/// Runs the TCP accept loop on the calling thread, spawning one thread
/// per accepted connection via `thread::scope` so each handler can
/// borrow `ctx` without requiring `'static` or an `Arc`. Never returns
/// under normal operation.
pub fn run_tcp(listener: TcpListener, ctx: &ServerContext) {
    info!("TCP listener ready on {:?}", listener.local_addr().ok());
    std::thread::scope(|scope| {
        for conn in listener.incoming() {
            let stream = match conn {
                Ok(stream) => stream,
                Err(e) => {
                    error!("TCP accept failed: {e:?}");
                    continue;
                }
            };
            scope.spawn(move || handle_tcp_connection(stream, ctx));
        }
    });
}

/// Services one TCP connection: a single length-prefixed request
/// followed by either a single length-prefixed reply or an AXFR stream
/// (§6: "2-byte length prefix on TCP"). TCP pipelining beyond one
/// request per connection is out of scope (SPEC_FULL.md Non-goals).
fn handle_tcp_connection(mut stream: TcpStream, ctx: &ServerContext) {
    let peer = stream.peer_addr().ok();

    let mut len_buf = [0u8; 2];
    if let Err(e) = stream.read_exact(&mut len_buf) {
        debug!("TCP connection from {peer:?} closed before length prefix: {e:?}");
        return;
    }
    let len = u16::from_be_bytes(len_buf) as usize;
    if len > TCP_MAX_MESSAGE_SIZE {
        warn!("TCP message from {peer:?} declared length {len}, exceeding the limit, dropping connection");
        return;
    }

    let mut message_buf = vec![0u8; len];
    if let Err(e) = stream.read_exact(&mut message_buf) {
        debug!("TCP connection from {peer:?} closed before full message: {e:?}");
        return;
    }

    match dispatch::dispatch(&message_buf, Transport::Tcp, ctx) {
        DispatchOutcome::Reply(message) => {
            let bytes = match message.to_bytes() {
                Ok(bytes) => bytes,
                Err(_) => {
                    warn!("failed to encode TCP reply to {peer:?}, dropping connection");
                    return;
                }
            };
            let Ok(prefix_len) = u16::try_from(bytes.len()) else {
                warn!("TCP reply to {peer:?} too large to length-prefix, dropping connection");
                return;
            };
            if let Err(e) = stream
                .write_all(&prefix_len.to_be_bytes())
                .and_then(|_| stream.write_all(&bytes))
            {
                warn!("TCP write to {peer:?} failed: {e:?}");
            }
        }
        DispatchOutcome::Axfr { query_id, question, zone } => {
            if let Err(e) = axfr::stream_zone(&mut stream, query_id, &question, &zone) {
                warn!("AXFR stream to {peer:?} aborted: {e:?}");
            }
        }
        DispatchOutcome::Drop => {}
    }
}
