use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::access::GrantTable;
use crate::broker::AccessBroker;
use crate::client::{ClientRegistry, handle_client};
use crate::config::{SharedRuntimeConfig, StartupConfig};
use crate::protocol::responses::{TOO_MANY_CLIENTS, format_response};

pub struct Server {
    listener: TcpListener,
    broker: Arc<AccessBroker>,
    grants: Arc<GrantTable>,
    startup: Arc<StartupConfig>,
    runtime: SharedRuntimeConfig,
    clients: Arc<Mutex<ClientRegistry>>,
}

impl Server {
    /// Binds the listener on the configured address.
    pub async fn bind(
        startup: StartupConfig,
        runtime: SharedRuntimeConfig,
        broker: Arc<AccessBroker>,
        grants: Arc<GrantTable>,
    ) -> std::io::Result<Self> {
        let socket = startup.listen_socket();
        let listener = TcpListener::bind(&socket).await.map_err(|e| {
            error!("Failed to bind to {}: {}", socket, e);
            e
        })?;
        info!("Server bound to {}", listener.local_addr()?);

        Ok(Self {
            listener,
            broker,
            grants,
            startup: Arc::new(startup),
            runtime,
            clients: Arc::new(Mutex::new(ClientRegistry::new())),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn clients(&self) -> Arc<Mutex<ClientRegistry>> {
        Arc::clone(&self.clients)
    }

    /// Accept loop; runs until the task is dropped.
    pub async fn start(&self) {
        info!(
            "Starting RAX file broker for {}://{} (max {} clients)",
            self.startup.scheme,
            self.startup.authority,
            self.runtime.read().await.max_clients
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let max_clients = self.runtime.read().await.max_clients;
                    let admitted = self.clients.lock().await.try_insert(addr, max_clients);
                    if !admitted {
                        reject(stream, addr).await;
                        continue;
                    }

                    let broker = Arc::clone(&self.broker);
                    let grants = Arc::clone(&self.grants);
                    let startup = Arc::clone(&self.startup);
                    let clients = Arc::clone(&self.clients);

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(async move {
                        handle_client(stream, addr, broker, grants, startup, clients).await;
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

async fn reject(mut stream: TcpStream, addr: SocketAddr) {
    warn!("Rejecting {}: too many connections", addr);
    let reply = format_response(TOO_MANY_CLIENTS, "Too many connections. Try again later.");
    let _ = stream.write_all(reply.as_bytes()).await;
    let _ = stream.shutdown().await;
}
