use crate::error::{FixtureError, Result};
use crate::network::{Call, Reply, Request, Response, RpcError, RpcErrorCode};
use log::{debug, error, info, warn};
use serde_json::Deserializer;
use std::io::{BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const TCP_READ_TIMEOUT: u64 = 300;

/// Answers calls on behalf of a node
pub trait RequestHandler: Send + Sync + 'static {
    fn handle(&self, call: Call) -> std::result::Result<Reply, RpcError>;
}

/// Stops a running [`NodeServer`] from another thread
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    addr: SocketAddr,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        if self.flag.swap(true, Ordering::SeqCst) {
            return;
        }
        // Wake the accept loop so it notices the flag
        let _ = TcpStream::connect(self.addr);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Thread-per-connection server speaking newline-delimited JSON
pub struct NodeServer<H: RequestHandler> {
    listener: TcpListener,
    handler: Arc<H>,
    flag: Arc<AtomicBool>,
}

impl<H: RequestHandler> NodeServer<H> {
    pub fn bind(addr: &str, handler: Arc<H>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| FixtureError::Network(format!("Failed to bind to {addr}: {e}")))?;
        Ok(Self {
            listener,
            handler,
            flag: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| FixtureError::Network(format!("Failed to read local address: {e}")))
    }

    pub fn shutdown_handle(&self) -> Result<ShutdownHandle> {
        Ok(ShutdownHandle {
            flag: Arc::clone(&self.flag),
            addr: self.local_addr()?,
        })
    }

    /// Accept connections until shut down
    pub fn run(self) -> Result<()> {
        info!("Node listening on {}", self.local_addr()?);

        for stream in self.listener.incoming() {
            if self.flag.load(Ordering::SeqCst) {
                break;
            }
            match stream {
                Ok(stream) => {
                    let peer_addr = match stream.peer_addr() {
                        Ok(addr) => addr,
                        Err(e) => {
                            error!("Failed to get peer address: {e}");
                            continue;
                        }
                    };

                    let handler = Arc::clone(&self.handler);
                    let flag = Arc::clone(&self.flag);
                    thread::spawn(move || {
                        if let Err(e) = Self::handle_connection(handler, flag, stream, peer_addr) {
                            warn!("Connection from {peer_addr} ended with error: {e}");
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {e}");
                }
            }
        }

        info!("Node stopped");
        Ok(())
    }

    fn handle_connection(
        handler: Arc<H>,
        flag: Arc<AtomicBool>,
        stream: TcpStream,
        peer_addr: SocketAddr,
    ) -> Result<()> {
        stream
            .set_read_timeout(Some(Duration::from_secs(TCP_READ_TIMEOUT)))
            .map_err(|e| FixtureError::Network(format!("Failed to set read timeout: {e}")))?;

        debug!("Client connected from {peer_addr}");
        let reader = BufReader::new(&stream);
        let requests = Deserializer::from_reader(reader).into_iter::<Request>();
        let mut writer = &stream;

        for request in requests {
            if flag.load(Ordering::SeqCst) {
                break;
            }
            let response = match request {
                Ok(request) => {
                    debug!("Request #{} from {peer_addr}: {}", request.id, request.call.method());
                    Response {
                        id: request.id,
                        result: handler.handle(request.call),
                    }
                }
                Err(e) if e.is_eof() || e.is_io() => break,
                Err(e) => {
                    // The stream cannot be resynchronised after a syntax error
                    let response = Response {
                        id: 0,
                        result: Err(RpcError {
                            code: RpcErrorCode::BadRequest,
                            message: format!("Malformed request: {e}"),
                            subject: None,
                            amounts: None,
                        }),
                    };
                    Self::write_response(&mut writer, &response)?;
                    break;
                }
            };
            Self::write_response(&mut writer, &response)?;
        }

        debug!("Client {peer_addr} disconnected");
        let _ = stream.shutdown(Shutdown::Both);
        Ok(())
    }

    fn write_response(writer: &mut &TcpStream, response: &Response) -> Result<()> {
        let mut line = serde_json::to_vec(response)?;
        line.push(b'\n');
        writer
            .write_all(&line)
            .map_err(|e| FixtureError::Network(format!("Failed to send response: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AssetAmount;
    use crate::network::{NodeClient, RetryPolicy};

    struct EmptyNode;

    impl RequestHandler for EmptyNode {
        fn handle(&self, call: Call) -> std::result::Result<Reply, RpcError> {
            match call {
                Call::GetAccountBalances { .. } => Ok(Reply::Balances(Vec::<AssetAmount>::new())),
                Call::GetAccountByName { .. } => Ok(Reply::Account(None)),
                other => Err(FixtureError::Rpc(format!("{} unsupported", other.method())).into()),
            }
        }
    }

    fn spawn_server() -> (SocketAddr, ShutdownHandle, thread::JoinHandle<Result<()>>) {
        let server = NodeServer::bind("127.0.0.1:0", Arc::new(EmptyNode)).unwrap();
        let addr = server.local_addr().unwrap();
        let shutdown = server.shutdown_handle().unwrap();
        let handle = thread::spawn(move || server.run());
        (addr, shutdown, handle)
    }

    #[test]
    fn test_requests_are_answered_in_order() {
        let (addr, shutdown, handle) = spawn_server();
        let mut client = NodeClient::connect(&addr.to_string(), RetryPolicy::never()).unwrap();

        let reply = client
            .call(Call::GetAccountByName {
                name: "init0".to_string(),
            })
            .unwrap();
        assert_eq!(reply, Reply::Account(None));

        let err = client.call(Call::GetChainProperties).unwrap_err();
        assert!(matches!(err, FixtureError::Rpc(_)));

        shutdown.shutdown();
        handle.join().unwrap().unwrap();
        assert!(shutdown.is_shutdown());
    }

    #[test]
    fn test_malformed_request_gets_bad_request() {
        let (addr, shutdown, handle) = spawn_server();
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(b"{not json}\n").unwrap();

        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        std::io::BufRead::read_line(&mut reader, &mut line).unwrap();
        let response: Response = serde_json::from_str(&line).unwrap();
        assert_eq!(response.result.unwrap_err().code, RpcErrorCode::BadRequest);

        shutdown.shutdown();
        handle.join().unwrap().unwrap();
    }
}
