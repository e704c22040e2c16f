//! Bootstrap binary (§6, SPEC_FULL.md §1). Wires configuration, CLI
//! overrides, logging, zone loading, the store, and the two server
//! loops together, then waits on SIGINT (§5).
//!
//! Grounded on the teacher's `main.rs` for the overall shape (parse CLI
//! → load config → init logging → build listeners → run), but the
//! teacher's own `main.rs` is a tokio-based early prototype superseded
//! by its real `servers.rs`/`datastore.rs` wiring; the signal-handling
//! piece instead follows `examples/dspeyrer-net/runtime/src/rt.rs`'s
//! `ctrlc::set_handler` over an `AtomicBool`, since std threads (not
//! tokio) are this engine's concurrency model (§5).

use clap::Parser;
use std::net::{TcpListener, UdpSocket};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};
use zoneward::cli::Cli;
use zoneward::config::ConfigFile;
use zoneward::datastore::ZoneStore;
use zoneward::dispatch::ServerContext;
use zoneward::update::UpdatePolicy;
use zoneward::{logging, servers, zonefile};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ConfigFile::load(cli.config.as_deref()) {
        Ok(config) => cli.apply_overrides(config),
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.log_level);

    let zones = match zonefile::load_zone_directory(&config.zone_dir) {
        Ok(zones) => zones,
        Err(e) => {
            error!("Failed to load zone directory {:?}: {e}", config.zone_dir);
            return ExitCode::FAILURE;
        }
    };
    info!("Loaded {} zone(s) from {:?}", zones.len(), config.zone_dir);

    let store = Arc::new(ZoneStore::from_zones(zones));
    let policy = UpdatePolicy {
        allow_zone_create: config.allow_zone_create,
        allow_zone_delete: config.allow_zone_delete,
    };

    let listen_addr = config.listen_address();
    let udp_socket = match UdpSocket::bind(listen_addr) {
        Ok(socket) => socket,
        Err(e) => {
            error!("Failed to bind UDP listener on {listen_addr}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let tcp_listener = match TcpListener::bind(listen_addr) {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind TCP listener on {listen_addr}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        let store = Arc::clone(&store);
        let result = ctrlc::set_handler(move || {
            if shutdown.swap(true, Ordering::SeqCst) {
                // Second SIGINT while the first is still unwinding: just exit.
                std::process::exit(0);
            }
            info!("SIGINT received, shutting down");
            store.shutdown();
            std::process::exit(0);
        });
        if let Err(e) = result {
            error!("Failed to install SIGINT handler: {e}");
            return ExitCode::FAILURE;
        }
    }

    let own_address = match config.address {
        std::net::IpAddr::V4(v4) => v4,
        std::net::IpAddr::V6(_) => {
            error!("NOTIFY self-filtering only supports IPv4 server addresses");
            return ExitCode::FAILURE;
        }
    };

    let ctx = ServerContext {
        store: &store,
        update_policy: &policy,
        own_address,
        notify_enabled: config.notify_enabled,
    };

    info!("zoneward listening on {listen_addr} (udp+tcp)");
    std::thread::scope(|scope| {
        scope.spawn(|| servers::run_tcp(tcp_listener, &ctx));
        servers::run_udp(udp_socket, &ctx);
    });

    ExitCode::SUCCESS
}
