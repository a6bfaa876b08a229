use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Mutex};
use tokio::time;
use tracing::{error, info, warn};
use vesselsim::agent::SafetyAgent;
use vesselsim::protocol::{Command, CommandResponse};

const TCP_PORT: u16 = 8080;
const STATUS_BROADCAST_BUFFER_SIZE: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("⚓ Vessel Safety Systems Simulator");
    println!("==================================");

    let agent = Arc::new(Mutex::new(SafetyAgent::new()));
    {
        let mut agent_guard = agent.lock().await;
        agent_guard.start();
    }

    // Broadcast channel for status packets
    let (status_tx, _) = broadcast::channel(STATUS_BROADCAST_BUFFER_SIZE);

    let tcp_agent = Arc::clone(&agent);
    let tcp_status_tx = status_tx.clone();
    let tcp_server = tokio::spawn(async move {
        if let Err(e) = start_tcp_server(tcp_agent, tcp_status_tx).await {
            error!("TCP server error: {}", e);
        }
    });

    // Main simulation loop at 1 Hz
    let mut interval = time::interval(Duration::from_millis(1000));

    loop {
        interval.tick().await;

        let status_result = {
            let mut agent_guard = agent.lock().await;
            agent_guard.update()
        };

        match status_result {
            Ok(Some(status)) => {
                if let Err(e) = status_tx.send(status.clone()) {
                    warn!("Failed to broadcast status: {}", e);
                }
                info!("📡 STATUS: {}", status);
            }
            Ok(None) => {
                // No status this cycle
            }
            Err(e) => {
                error!("❌ Agent error: {}", e);
                break;
            }
        }

        let running = {
            let agent_guard = agent.lock().await;
            agent_guard.get_state().running
        };

        if !running {
            break;
        }
    }

    {
        let mut agent_guard = agent.lock().await;
        agent_guard.stop();
    }

    tcp_server.abort();
    println!("⚓ Vessel Safety Systems Simulator stopped");

    Ok(())
}

async fn start_tcp_server(
    agent: Arc<Mutex<SafetyAgent>>,
    status_tx: broadcast::Sender<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(format!("127.0.0.1:{}", TCP_PORT)).await?;
    info!("🌐 TCP server listening on port {}", TCP_PORT);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("🔗 New client connected: {}", addr);
                let client_agent = Arc::clone(&agent);
                let client_status_rx = status_tx.subscribe();

                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, client_agent, client_status_rx).await {
                        warn!("Client {} error: {}", addr, e);
                    }
                    info!("🔌 Client {} disconnected", addr);
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

async fn handle_client(
    stream: TcpStream,
    agent: Arc<Mutex<SafetyAgent>>,
    mut status_rx: broadcast::Receiver<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (reader, writer) = stream.into_split();
    let mut buf_reader = BufReader::new(reader);

    let writer = Arc::new(Mutex::new(writer));

    // Stream status packets to the client as they are broadcast
    let status_writer = Arc::clone(&writer);
    let status_task = tokio::spawn(async move {
        while let Ok(status) = status_rx.recv().await {
            let mut writer_guard = status_writer.lock().await;
            if let Err(e) = writer_guard.write_all(status.as_bytes()).await {
                warn!("Failed to send status: {}", e);
                break;
            }
            if let Err(e) = writer_guard.write_all(b"\n").await {
                warn!("Failed to send status newline: {}", e);
                break;
            }
        }
    });

    let mut line = String::new();
    loop {
        line.clear();
        match buf_reader.read_line(&mut line).await {
            Ok(0) => break, // Client disconnected
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match serde_json::from_str::<Command>(trimmed) {
                    Ok(command) => {
                        info!("📨 Received command: {:?}", command);

                        let response = {
                            let mut agent_guard = agent.lock().await;
                            match agent_guard.queue_command(command.clone()) {
                                Ok(()) => {
                                    // Process immediately so the client gets its response
                                    if let Err(e) = agent_guard.process_commands() {
                                        error!("Command processing error: {}", e);
                                        CommandResponse {
                                            id: command.id,
                                            timestamp: now_ms(),
                                            status: vesselsim::protocol::ResponseStatus::Error,
                                            message: Some(format!("Processing error: {}", e)),
                                        }
                                    } else {
                                        let responses = agent_guard.get_responses();
                                        if let Some(response) =
                                            responses.iter().find(|r| r.id == command.id)
                                        {
                                            response.clone()
                                        } else {
                                            CommandResponse {
                                                id: command.id,
                                                timestamp: now_ms(),
                                                status: vesselsim::protocol::ResponseStatus::Success,
                                                message: None,
                                            }
                                        }
                                    }
                                }
                                Err(e) => {
                                    error!("Command queue error: {}", e);
                                    CommandResponse {
                                        id: command.id,
                                        timestamp: now_ms(),
                                        status: vesselsim::protocol::ResponseStatus::Error,
                                        message: Some(format!("Queue error: {}", e)),
                                    }
                                }
                            }
                        };

                        let response_json = serde_json::to_string(&response)?;
                        {
                            let mut writer_guard = writer.lock().await;
                            writer_guard.write_all(response_json.as_bytes()).await?;
                            writer_guard.write_all(b"\n").await?;
                        }
                        info!("📤 Sent response: {}", response_json);
                    }
                    Err(e) => {
                        error!("Failed to parse command: {}", e);
                        let error_response = serde_json::json!({
                            "id": 0,
                            "timestamp": now_ms(),
                            "status": "ParseError",
                            "message": format!("Invalid command format: {}", e)
                        });
                        {
                            let mut writer_guard = writer.lock().await;
                            writer_guard
                                .write_all(error_response.to_string().as_bytes())
                                .await?;
                            writer_guard.write_all(b"\n").await?;
                        }
                    }
                }
            }
            Err(e) => {
                error!("Error reading from client: {}", e);
                break;
            }
        }
    }

    status_task.abort();
    Ok(())
}
