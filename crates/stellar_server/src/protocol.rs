//! JSON request/response contract.
//!
//! One JSON object per line. Requests are tagged by `cmd`, responses by
//! `type`:
//!
//! ```json
//! {"cmd":"add_build_request","planet_id":1,"object_id":1}
//! {"type":"queued","item_id":1}
//! ```

use serde::{Deserialize, Serialize};
use stellar_core::catalog::ObjectId;
use stellar_core::error::GameError;
use stellar_core::planet::PlanetId;
use stellar_core::production::QueueItemId;
use stellar_core::research::PlayerId;
use stellar_core::resources::Resources;
use stellar_core::view::PlanetView;

// ============================================================================
// Requests (client -> server)
// ============================================================================

/// A client request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Request {
    /// Register a player.
    CreatePlayer {
        /// Display name.
        name: String,
    },
    /// Create a planet for an existing player.
    CreatePlanet {
        /// Owner.
        player_id: PlayerId,
        /// Display name.
        name: String,
    },
    /// Queue a building level, a research level or units.
    AddBuildRequest {
        /// Target planet (origin planet for research).
        planet_id: PlanetId,
        /// Catalog id.
        object_id: ObjectId,
        /// Units to build; ignored for buildings and research.
        #[serde(default)]
        amount: Option<u32>,
    },
    /// Cancel a queued item.
    CancelBuildRequest {
        /// Planet the item was queued on.
        planet_id: PlanetId,
        /// Catalog id of the queued object.
        object_id: ObjectId,
        /// Item to cancel.
        item_id: QueueItemId,
    },
    /// Add resources to a planet.
    AddResources {
        /// Target planet.
        planet_id: PlanetId,
        /// Metal.
        #[serde(default)]
        metal: u32,
        /// Crystal.
        #[serde(default)]
        crystal: u32,
        /// Deuterium.
        #[serde(default)]
        deuterium: u32,
        /// Ignore storage capacity.
        #[serde(default)]
        allow_overflow: bool,
    },
    /// Deduct resources from a planet, all or nothing.
    DeductResources {
        /// Target planet.
        planet_id: PlanetId,
        /// Metal.
        #[serde(default)]
        metal: u32,
        /// Crystal.
        #[serde(default)]
        crystal: u32,
        /// Deuterium.
        #[serde(default)]
        deuterium: u32,
    },
    /// Set a building level or unit count.
    SetObjectLevel {
        /// Target planet.
        planet_id: PlanetId,
        /// Object machine name.
        machine_name: String,
        /// New level; negative values are rejected.
        level: i64,
    },
    /// Set a research level.
    SetResearchLevel {
        /// Target player.
        player_id: PlayerId,
        /// Research machine name.
        machine_name: String,
        /// New level; negative values are rejected.
        level: i64,
    },
    /// Read the planet state.
    State {
        /// Target planet.
        planet_id: PlanetId,
    },
}

// ============================================================================
// Responses (server -> client)
// ============================================================================

/// Whole-unit resource amounts, floored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireResources {
    /// Metal.
    pub metal: i64,
    /// Crystal.
    pub crystal: i64,
    /// Deuterium.
    pub deuterium: i64,
}

impl From<Resources> for WireResources {
    fn from(value: Resources) -> Self {
        let whole = value.floor();
        Self {
            metal: whole.metal().to_num(),
            crystal: whole.crystal().to_num(),
            deuterium: whole.deuterium().to_num(),
        }
    }
}

/// Resources named by request fields.
#[must_use]
pub fn request_resources(metal: u32, crystal: u32, deuterium: u32) -> Resources {
    Resources::new(
        i64::from(metal),
        i64::from(crystal),
        i64::from(deuterium),
        0,
    )
}

/// A server response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// A player was created.
    PlayerCreated {
        /// New player id.
        player_id: PlayerId,
    },
    /// A planet was created.
    PlanetCreated {
        /// New planet id.
        planet_id: PlanetId,
    },
    /// A build request was queued.
    Queued {
        /// Id of the created item.
        item_id: QueueItemId,
    },
    /// A build request was cancelled.
    Cancelled {
        /// Resources returned to the planet.
        refund: WireResources,
    },
    /// The mutation was applied.
    Ok,
    /// Planet state.
    State {
        /// The view at the instant of the request.
        view: Box<PlanetView>,
    },
    /// The request was rejected; nothing changed.
    Error {
        /// Stable error identifier.
        kind: String,
        /// Human-readable description.
        message: String,
    },
}

impl Response {
    /// Response for a rejected request.
    #[must_use]
    pub fn error(error: &GameError) -> Self {
        Self::Error {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }

    /// Response for a line that is not a valid request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Error {
            kind: "bad_request".to_string(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Line codec
// ============================================================================

/// Parse one request line.
pub fn decode_request(line: &str) -> Result<Request, Response> {
    serde_json::from_str(line).map_err(|e| Response::bad_request(e.to_string()))
}

/// Encode one response line, without the trailing newline.
#[must_use]
pub fn encode_response(response: &Response) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        tracing::error!(error = %e, "response failed to serialize");
        r#"{"type":"error","kind":"internal","message":"response failed to serialize"}"#
            .to_string()
    })
}

/// Convert a wire level to an engine level.
pub fn level_from_wire(machine_name: &str, level: i64) -> Result<u32, GameError> {
    u32::try_from(level).map_err(|_| GameError::InvalidLevel {
        object: machine_name.to_string(),
        level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stellar_core::production::QueueKind;

    #[test]
    fn test_decode_build_request() {
        let request =
            decode_request(r#"{"cmd":"add_build_request","planet_id":1,"object_id":4}"#).unwrap();
        assert_eq!(
            request,
            Request::AddBuildRequest {
                planet_id: PlanetId::new(1),
                object_id: ObjectId::new(4),
                amount: None,
            }
        );
    }

    #[test]
    fn test_decode_resources_with_defaults() {
        let request =
            decode_request(r#"{"cmd":"add_resources","planet_id":2,"metal":100}"#).unwrap();
        assert_eq!(
            request,
            Request::AddResources {
                planet_id: PlanetId::new(2),
                metal: 100,
                crystal: 0,
                deuterium: 0,
                allow_overflow: false,
            }
        );
    }

    #[test]
    fn test_malformed_line_is_bad_request() {
        let response = decode_request(r#"{"cmd":"launch_fleet"}"#).unwrap_err();
        assert!(matches!(response, Response::Error { ref kind, .. } if kind == "bad_request"));

        let response = decode_request("not json").unwrap_err();
        assert!(matches!(response, Response::Error { ref kind, .. } if kind == "bad_request"));
    }

    #[test]
    fn test_error_response_carries_kind() {
        let response = Response::error(&GameError::QueueFull {
            queue: QueueKind::Research,
            limit: 1,
        });
        let line = encode_response(&response);
        assert!(line.contains(r#""type":"error""#));
        assert!(line.contains(r#""kind":"queue_full""#));
    }

    #[test]
    fn test_encode_queued_and_refund() {
        assert_eq!(
            encode_response(&Response::Queued {
                item_id: QueueItemId::new(3)
            }),
            r#"{"type":"queued","item_id":3}"#
        );
        let refund = WireResources::from(Resources::new(60, 15, 0, 0));
        assert_eq!(
            encode_response(&Response::Cancelled { refund }),
            r#"{"type":"cancelled","refund":{"metal":60,"crystal":15,"deuterium":0}}"#
        );
        assert_eq!(encode_response(&Response::Ok), r#"{"type":"ok"}"#);
    }

    #[test]
    fn test_negative_level_is_invalid() {
        assert_eq!(
            level_from_wire("metal_mine", -1).unwrap_err(),
            GameError::InvalidLevel {
                object: "metal_mine".into(),
                level: -1,
            }
        );
        assert_eq!(level_from_wire("metal_mine", 12).unwrap(), 12);
    }
}
