use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::access::GrantTable;
use crate::broker::AccessBroker;
use crate::client::ClientRegistry;
use crate::config::StartupConfig;
use crate::protocol::responses::{
    READY, TRANSFER_ABORTED, TRANSFER_COMPLETE, UNKNOWN_COMMAND, format_response,
};
use crate::protocol::{CommandData, CommandStatus, handle_command, parse_command};

/// Handles one caller session on the Tokio runtime.
///
/// - Reads command lines with a BufReader.
/// - Dispatches each command through `handle_command`.
/// - Moves file bytes for READ/WRITE on the same connection.
pub async fn handle_client(
    stream: TcpStream,
    client_addr: SocketAddr,
    broker: Arc<AccessBroker>,
    grants: Arc<GrantTable>,
    config: Arc<StartupConfig>,
    clients: Arc<Mutex<ClientRegistry>>,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::with_capacity(config.buffer_size, read_half);

    if let Err(e) = send(&mut write_half, &format_response(READY, "RAX File Broker ready")).await {
        warn!("Failed to greet {}: {}", client_addr, e);
    } else {
        loop {
            match read_command_line(&mut reader, config.max_command_length).await {
                Ok(CommandLine::Closed) => {
                    info!("Connection closed by client {}", client_addr);
                    break;
                }
                Ok(CommandLine::TooLong) => {
                    warn!(
                        "Command from {} exceeds {} bytes",
                        client_addr, config.max_command_length
                    );
                    let reply = format_response(UNKNOWN_COMMAND, "Command too long");
                    if send(&mut write_half, &reply).await.is_err() {
                        break;
                    }
                }
                Ok(CommandLine::Line(line)) => {
                    let command = parse_command(line.trim_end_matches(['\r', '\n']));
                    info!("Received from {}: {}", client_addr, command.name());

                    let result = handle_command(&command, &broker, &grants).await;

                    if let Some(msg) = &result.message {
                        if let Err(e) = send(&mut write_half, msg).await {
                            error!("Failed to reply to {}: {}", client_addr, e);
                            break;
                        }
                    }

                    if let Some(data) = result.data {
                        if let Err(e) =
                            transfer(data, &mut reader, &mut write_half, config.buffer_size).await
                        {
                            error!("Transfer with {} failed: {}", client_addr, e);
                            break;
                        }
                    }

                    if result.status == CommandStatus::CloseConnection {
                        info!("Client {} requested to quit", client_addr);
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to read from {}: {}", client_addr, e);
                    break;
                }
            }
        }
    }

    clients.lock().await.remove(&client_addr);
    info!("Client {} disconnected", client_addr);
}

/// One control line, read without buffering more than the configured limit.
#[derive(Debug, PartialEq)]
enum CommandLine {
    Line(String),
    TooLong,
    Closed,
}

/// Reads up to `max_len` bytes of the next line, newline included.
///
/// An over-long line is consumed up to its newline in bounded chunks and
/// reported as `TooLong`, so the next command starts on a clean line.
async fn read_command_line<R>(reader: &mut R, max_len: usize) -> std::io::Result<CommandLine>
where
    R: AsyncBufRead + Unpin,
{
    let limit = max_len as u64 + 1;
    let mut buf = Vec::new();

    if (&mut *reader).take(limit).read_until(b'\n', &mut buf).await? == 0 {
        return Ok(CommandLine::Closed);
    }
    if buf.len() <= max_len {
        return Ok(CommandLine::Line(String::from_utf8_lossy(&buf).into_owned()));
    }

    while !buf.ends_with(b"\n") {
        buf.clear();
        if (&mut *reader).take(limit).read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
    }
    Ok(CommandLine::TooLong)
}

/// Moves the bytes of a READ or WRITE and sends the closing reply.
async fn transfer<R, W>(
    data: CommandData,
    reader: &mut R,
    writer: &mut W,
    buffer_size: usize,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (moved, expected) = match data {
        CommandData::Download { file, length } => {
            let file = tokio::fs::File::from_std(file);
            let mut source = BufReader::with_capacity(buffer_size, file.take(length));
            let moved = tokio::io::copy_buf(&mut source, writer).await?;
            (moved, length)
        }
        CommandData::Upload { file, length } => {
            let mut file = tokio::fs::File::from_std(file);
            let mut source = BufReader::with_capacity(buffer_size, reader.take(length));
            let moved = tokio::io::copy_buf(&mut source, &mut file).await?;
            file.flush().await?;
            (moved, length)
        }
    };

    let reply = if moved == expected {
        format_response(TRANSFER_COMPLETE, "Transfer complete")
    } else {
        warn!("Transfer short: moved {} of {} bytes", moved, expected);
        format_response(TRANSFER_ABORTED, "Transfer aborted")
    };
    send(writer, &reply).await
}

async fn send<W: AsyncWrite + Unpin>(writer: &mut W, msg: &str) -> std::io::Result<()> {
    writer.write_all(msg.as_bytes()).await?;
    writer.flush().await
}
