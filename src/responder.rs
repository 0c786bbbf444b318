//! Base station responder
//!
//! The other end of a range test: listens for probe datagrams, counts them,
//! and replies `{"pong": n}` to the sender. Run with `--serve` on whatever
//! host the clients target.

use crate::error::{AppError, Result};
use crate::wire::{self, ResponsePayload, WireMessage};
use colored::Colorize;
use tokio::net::UdpSocket;
use tokio::sync::watch;

const MAX_DATAGRAM: usize = 2048;

/// Listen on `bind` and answer probes until the stop flag flips
pub async fn run(bind: &str, mut stop: watch::Receiver<bool>) -> Result<u64> {
    let socket = UdpSocket::bind(bind)
        .await
        .map_err(|e| AppError::transport(format!("Failed to bind {}: {}", bind, e)))?;

    let local = socket
        .local_addr()
        .map_err(|e| AppError::transport(format!("Failed to read local address: {}", e)))?;
    println!("{} {}", "Responder listening on".bold(), local);
    println!("Point clients at this address, Ctrl+C to stop");

    let mut handled: u64 = 0;
    let mut buf = vec![0u8; MAX_DATAGRAM];

    loop {
        tokio::select! {
            received = socket.recv_from(&mut buf) => {
                let (len, from) = match received {
                    Ok(pair) => pair,
                    Err(_) => continue,
                };

                // Foreign traffic and announces are not probes; drop quietly
                let Some(WireMessage::Probe(probe)) = wire::decode(&buf[..len]) else {
                    continue;
                };

                handled += 1;
                println!(
                    "{} Ping #{} from {}... [{}]",
                    "←".cyan(),
                    probe.ping,
                    &probe.from[..probe.from.len().min(16)],
                    handled
                );

                let reply = ResponsePayload::new(probe.ping).encode()?;
                match socket.send_to(&reply, from).await {
                    Ok(_) => println!("{} Pong #{}", "→".cyan(), probe.ping),
                    Err(e) => println!("{} Reply failed: {}", "✗".red(), e),
                }
            }
            _ = stop.changed() => {
                if *stop.borrow() {
                    break;
                }
            }
        }
    }

    println!("\n{} Handled {} pings", "Stopped.".bold(), handled);
    Ok(handled)
}
