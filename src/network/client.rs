use crate::error::{FixtureError, Result};
use crate::network::{Call, Reply, Request, Response, RetryPolicy};
use log::{debug, info, warn};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

const TCP_CONNECT_TIMEOUT: u64 = 5000;
const TCP_IO_TIMEOUT: u64 = 30_000;
const NODE_SCHEME: &str = "tcp://";

/// Strip an optional `tcp://` scheme from a node url
pub fn parse_node_address(node: &str) -> Result<String> {
    let address = node.strip_prefix(NODE_SCHEME).unwrap_or(node).trim();
    if address.contains("://") {
        return Err(FixtureError::Config(format!(
            "Unsupported node url {node}: use host:port or {NODE_SCHEME}host:port"
        )));
    }
    if address.rsplit_once(':').is_none() {
        return Err(FixtureError::Config(format!(
            "Node url {node} has no port"
        )));
    }
    Ok(address.to_string())
}

struct Connection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

/// One persistent connection to a node; requests are answered in order
pub struct NodeClient {
    address: String,
    retry: RetryPolicy,
    connection: Option<Connection>,
    next_id: u64,
}

impl NodeClient {
    /// Connect to `node`, retrying as the policy allows
    pub fn connect(node: &str, retry: RetryPolicy) -> Result<NodeClient> {
        let mut client = NodeClient {
            address: parse_node_address(node)?,
            retry,
            connection: None,
            next_id: 1,
        };
        client.reconnect()?;
        Ok(client)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn open(address: &str) -> Result<Connection> {
        let socket_addrs = address
            .to_socket_addrs()
            .map_err(|e| FixtureError::Network(format!("Invalid address {address}: {e}")))?;

        let mut last_error = FixtureError::Network(format!("{address} did not resolve"));
        for socket_addr in socket_addrs {
            match TcpStream::connect_timeout(&socket_addr, Duration::from_millis(TCP_CONNECT_TIMEOUT))
            {
                Ok(stream) => {
                    let timeout = Some(Duration::from_millis(TCP_IO_TIMEOUT));
                    stream.set_read_timeout(timeout).map_err(|e| {
                        FixtureError::Network(format!("Failed to set read timeout: {e}"))
                    })?;
                    stream.set_write_timeout(timeout).map_err(|e| {
                        FixtureError::Network(format!("Failed to set write timeout: {e}"))
                    })?;
                    let reader = BufReader::new(stream.try_clone()?);
                    return Ok(Connection {
                        reader,
                        writer: stream,
                    });
                }
                Err(e) => {
                    last_error =
                        FixtureError::Network(format!("Failed to connect to {socket_addr}: {e}"));
                }
            }
        }
        Err(last_error)
    }

    fn reconnect(&mut self) -> Result<()> {
        self.connection = None;
        let mut attempt = 0;
        loop {
            match Self::open(&self.address) {
                Ok(connection) => {
                    self.connection = Some(connection);
                    info!("Connected to node {}", self.address);
                    return Ok(());
                }
                Err(e) => {
                    attempt += 1;
                    if !self.retry.allows(attempt) {
                        return Err(FixtureError::Network(format!(
                            "Giving up on {} after {attempt} attempt(s): {e}",
                            self.address
                        )));
                    }
                    let delay = self.retry.delay_for(attempt);
                    warn!("{e}; retrying in {delay:?}");
                    thread::sleep(delay);
                }
            }
        }
    }

    /// Send one call and wait for its reply.
    ///
    /// Transport failures drop the connection and resend under the retry
    /// policy. Node-side rejections are returned as errors without retrying.
    pub fn call(&mut self, call: Call) -> Result<Reply> {
        let id = self.next_id;
        self.next_id += 1;
        let method = call.method();
        let mut line = serde_json::to_vec(&Request { id, call })?;
        line.push(b'\n');

        let mut attempt = 0;
        let text = loop {
            if self.connection.is_none() {
                self.reconnect()?;
            }
            match self.exchange(&line) {
                Ok(text) => break text,
                Err(e) => {
                    self.connection = None;
                    attempt += 1;
                    if !self.retry.allows(attempt) {
                        return Err(e);
                    }
                    let delay = self.retry.delay_for(attempt);
                    warn!("{method} failed: {e}; retrying in {delay:?}");
                    thread::sleep(delay);
                }
            }
        };

        let response: Response = serde_json::from_str(&text)
            .map_err(|e| FixtureError::Network(format!("Malformed response to {method}: {e}")))?;
        if response.id != id {
            self.connection = None;
            return Err(FixtureError::Network(format!(
                "Response id {} does not match request id {id}",
                response.id
            )));
        }
        debug!("{method} #{id} answered");
        response.result.map_err(FixtureError::from)
    }

    fn exchange(&mut self, line: &[u8]) -> Result<String> {
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| FixtureError::Network("Not connected".to_string()))?;

        connection
            .writer
            .write_all(line)
            .and_then(|_| connection.writer.flush())
            .map_err(|e| FixtureError::Network(format!("Failed to send request: {e}")))?;

        let mut text = String::new();
        let read = connection
            .reader
            .read_line(&mut text)
            .map_err(|e| FixtureError::Network(format!("Failed to read response: {e}")))?;
        if read == 0 {
            return Err(FixtureError::Network(
                "Connection closed by node".to_string(),
            ));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::time::Duration;

    #[test]
    fn test_parse_node_address() {
        assert_eq!(
            parse_node_address("tcp://127.0.0.1:8090").unwrap(),
            "127.0.0.1:8090"
        );
        assert_eq!(parse_node_address("localhost:8090").unwrap(), "localhost:8090");
        assert!(parse_node_address("ws://127.0.0.1:8090").is_err());
        assert!(parse_node_address("127.0.0.1").is_err());
    }

    #[test]
    fn test_connect_gives_up_under_bounded_policy() {
        // Bind then drop to get a port nobody listens on
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let policy = RetryPolicy::from_num_retries(1)
            .with_delays(Duration::from_millis(1), Duration::from_millis(1));

        let result = NodeClient::connect(&format!("127.0.0.1:{port}"), policy);
        assert!(matches!(result, Err(FixtureError::Network(_))));
    }

    #[test]
    fn test_mismatched_response_id_is_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request = String::new();
            reader.read_line(&mut request).unwrap();
            let mut writer = stream;
            writer
                .write_all(b"{\"id\":999,\"result\":{\"Ok\":{\"kind\":\"balances\",\"data\":[]}}}\n")
                .unwrap();
        });

        let mut client = NodeClient::connect(&addr.to_string(), RetryPolicy::never()).unwrap();
        let result = client.call(Call::GetChainProperties);
        assert!(matches!(result, Err(FixtureError::Network(_))));
        assert!(!client.is_connected());
        server.join().unwrap();
    }
}
