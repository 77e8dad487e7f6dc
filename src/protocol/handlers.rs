//! Command handlers
//!
//! Turns each token command into an `AccessRequest`, checks the grant for it, and
//! dispatches through the broker. Byte transfers are handed back to the session as
//! `CommandData`.

use percent_encoding::utf8_percent_encode;

use crate::access::GrantTable;
use crate::broker::{
    AccessBroker, AccessMode, AccessRequest, BrokerResponse, OpenedFile, Operation, QueryResult,
    QueryValue,
};
use crate::codec::TOKEN_SEGMENT;
use crate::error::handlers::error_reply;
use crate::error::{BrokerError, BrokerResult};
use crate::protocol::commands::{Command, CommandData, CommandResult, CommandStatus};
use crate::protocol::responses::*;

/// Dispatches a parsed command to its handler.
pub async fn handle_command(
    command: &Command,
    broker: &AccessBroker,
    grants: &GrantTable,
) -> CommandResult {
    let outcome = match command {
        Command::QUERY { token, fields } => {
            let request = AccessRequest::new(token, Operation::Query(fields.clone()));
            dispatch(broker, grants, request, None).await
        }
        Command::TYPE(token) => {
            dispatch(broker, grants, AccessRequest::new(token, Operation::TypeLookup), None).await
        }
        Command::READ(token) => {
            let request = AccessRequest::new(token, Operation::Open(AccessMode::Read));
            dispatch(broker, grants, request, None).await
        }
        Command::WRITE {
            token,
            mode,
            length,
        } => match write_request(token, mode) {
            Ok(request) => dispatch(broker, grants, request, Some(*length)).await,
            Err(e) => Err(e),
        },
        Command::DELETE(token) => {
            dispatch(broker, grants, AccessRequest::new(token, Operation::Delete), None).await
        }
        Command::UPDATE(token) => {
            dispatch(broker, grants, AccessRequest::new(token, Operation::Update), None).await
        }
        Command::INSERT(token) => {
            dispatch(broker, grants, AccessRequest::new(token, Operation::Insert), None).await
        }
        Command::NOOP => Ok(reply(OK, "OK")),
        Command::QUIT => Ok(CommandResult {
            status: CommandStatus::CloseConnection,
            message: Some(format_response(GOODBYE, "Goodbye")),
            data: None,
        }),
        Command::MALFORMED(usage) => Ok(CommandResult {
            status: CommandStatus::Failure("Syntax error".into()),
            message: Some(format_response(SYNTAX_ERROR, &format!("Usage: {}", usage))),
            data: None,
        }),
        Command::UNKNOWN => Ok(CommandResult {
            status: CommandStatus::Failure("Unknown command".into()),
            message: Some(format_response(UNKNOWN_COMMAND, "Unknown command")),
            data: None,
        }),
    };

    outcome.unwrap_or_else(|err| CommandResult {
        status: CommandStatus::Failure(err.to_string()),
        message: Some(error_reply(&err)),
        data: None,
    })
}

/// Builds the open request for WRITE. Only write-capable modes are accepted.
fn write_request(token: &str, mode: &str) -> BrokerResult<AccessRequest> {
    let request = AccessRequest::open(token, mode)?;
    match request.operation {
        Operation::Open(mode) if !mode.is_writable() => Err(BrokerError::InvalidArgument(
            format!("Mode {} cannot write; use READ", mode),
        )),
        _ => Ok(request),
    }
}

/// Runs `request` only if a live grant covers its token. Mutating operations need
/// a read-write grant. `upload` carries the byte count announced by WRITE.
async fn dispatch(
    broker: &AccessBroker,
    grants: &GrantTable,
    request: AccessRequest,
    upload: Option<u64>,
) -> BrokerResult<CommandResult> {
    grants
        .check(&request.token, request.operation.mutates())
        .await?;

    match broker.handle(request)? {
        BrokerResponse::Row(row) => Ok(reply(FILE_STATUS, &format_row(&row))),
        BrokerResponse::ContentType(mime) => Ok(reply(CONTENT_TYPE, mime)),
        BrokerResponse::Count(count) => Ok(reply(DELETE_COUNT, &count.to_string())),
        BrokerResponse::Handle(opened) => start_transfer(opened, upload),
    }
}

fn start_transfer(opened: OpenedFile, upload: Option<u64>) -> BrokerResult<CommandResult> {
    let (message, data) = match upload {
        Some(length) => (
            format!("Ready for {} bytes", length),
            CommandData::Upload {
                file: opened.file,
                length,
            },
        ),
        None => {
            let length = opened.file.metadata()?.len();
            (
                length.to_string(),
                CommandData::Download {
                    file: opened.file,
                    length,
                },
            )
        }
    };

    Ok(CommandResult {
        status: CommandStatus::Success,
        message: Some(format_response(TRANSFER_STARTING, &message)),
        data: Some(data),
    })
}

fn reply(code: u16, message: &str) -> CommandResult {
    CommandResult {
        status: CommandStatus::Success,
        message: Some(format_response(code, message)),
        data: None,
    }
}

/// `name=value` pairs joined by `;`. Text values are percent-encoded to stay on one line.
fn format_row(row: &QueryResult) -> String {
    row.columns
        .iter()
        .map(|column| {
            let value = match &column.value {
                QueryValue::Text(text) => utf8_percent_encode(text, TOKEN_SEGMENT).to_string(),
                QueryValue::Integer(n) => n.to_string(),
                QueryValue::Null => String::new(),
            };
            format!("{}={}", column.field.as_str(), value)
        })
        .collect::<Vec<_>>()
        .join(";")
}
