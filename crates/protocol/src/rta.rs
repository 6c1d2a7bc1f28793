//! Real-time activity socket frames.
//!
//! Frames are JSON arrays whose first element is the message type:
//! ```json
//! [1, 1, "https://sessiondirectory.xboxlive.com/connections/"]      // subscribe (client -> server)
//! [1, 1, 0, 73, {"ConnectionId": "3f1c..."}]                        // subscribe result (server -> client)
//! [3, 73, {"...": "..."}]                                           // event (server -> client)
//! ```
//!
//! Only the subscribe result for the connections resource matters here: its
//! payload object at index 4 carries the connection id the session record
//! must reference.

use serde_json::Value;

/// Message type of a subscribe request.
pub const RTA_SUBSCRIBE: u64 = 1;

/// Array index of the payload object in a subscribe result.
pub const CONNECTION_ID_INDEX: usize = 4;

/// Inbound frame classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RtaFrame {
	/// Subscribe result carrying the connection id.
	ConnectionId(String),
	/// Any other frame. Not actionable.
	Other(Value),
}

/// Encodes a subscribe request for `resource` with sequence number `sequence`.
pub fn subscribe_frame(sequence: u64, resource: &str) -> String {
	Value::Array(vec![Value::from(RTA_SUBSCRIBE), Value::from(sequence), Value::from(resource)]).to_string()
}

/// Parses and classifies one text frame.
pub fn parse_frame(text: &str) -> Result<RtaFrame, serde_json::Error> {
	let value: Value = serde_json::from_str(text)?;
	let connection_id = value
		.as_array()
		.and_then(|frame| frame.get(CONNECTION_ID_INDEX))
		.and_then(|payload| payload.get("ConnectionId"))
		.and_then(Value::as_str)
		.filter(|id| !id.is_empty())
		.map(str::to_string);

	Ok(match connection_id {
		Some(id) => RtaFrame::ConnectionId(id),
		None => RtaFrame::Other(value),
	})
}
