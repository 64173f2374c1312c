use serde::{Deserialize, Serialize};

use crate::constants::{EVENT_SUBSCRIPTIONS, RPC_VERSION, SET_CURRENT_PROGRAM_SCENE};

// ---------------------------------------------------------------------------
// Server to client
// ---------------------------------------------------------------------------

/// First frame sent by the server after the socket opens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obs_web_socket_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_version: Option<u32>,
    /// Present only when the server requires authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AuthChallenge>,
}

/// Authentication challenge carried by [`Hello`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthChallenge {
    pub challenge: String,
    pub salt: String,
}

/// Acknowledges a successful identify.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identified {
    #[serde(default)]
    pub negotiated_rpc_version: Option<u32>,
}

/// Outcome of a request, as reported in [`RequestResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestStatus {
    pub result: bool,
    pub code: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Response to a [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    pub request_type: String,
    pub request_id: String,
    pub request_status: RequestStatus,
}

// ---------------------------------------------------------------------------
// Client to server
// ---------------------------------------------------------------------------

/// Sent in reply to [`Hello`] to establish the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identify {
    pub rpc_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
    pub event_subscriptions: u32,
}

impl Identify {
    /// Builds an identify payload with the default version and subscriptions.
    pub fn new(authentication: Option<String>) -> Self {
        Self {
            rpc_version: RPC_VERSION,
            authentication,
            event_subscriptions: EVENT_SUBSCRIPTIONS,
        }
    }
}

/// A single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request<T> {
    pub request_type: String,
    pub request_id: String,
    pub request_data: T,
}

/// Payload of a `SetCurrentProgramScene` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSceneData {
    pub scene_name: String,
}

impl Request<SetSceneData> {
    /// Builds a request switching the program scene.
    pub fn set_scene(request_id: u64, scene_name: impl Into<String>) -> Self {
        Self {
            request_type: SET_CURRENT_PROGRAM_SCENE.into(),
            request_id: request_id.to_string(),
            request_data: SetSceneData {
                scene_name: scene_name.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_with_authentication() {
        let json = r#"{
            "obsWebSocketVersion": "5.1.0",
            "rpcVersion": 1,
            "authentication": {"challenge": "ch", "salt": "sa"}
        }"#;
        let hello: Hello = serde_json::from_str(json).unwrap();
        assert_eq!(hello.obs_web_socket_version.as_deref(), Some("5.1.0"));
        let auth = hello.authentication.unwrap();
        assert_eq!(auth.challenge, "ch");
        assert_eq!(auth.salt, "sa");
    }

    #[test]
    fn hello_without_authentication() {
        let hello: Hello = serde_json::from_str(r#"{"rpcVersion":1}"#).unwrap();
        assert!(hello.authentication.is_none());
    }

    #[test]
    fn identify_omits_absent_authentication() {
        let value = serde_json::to_value(Identify::new(None)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"rpcVersion": 1, "eventSubscriptions": 33})
        );
    }

    #[test]
    fn identify_includes_authentication() {
        let value = serde_json::to_value(Identify::new(Some("abc".into()))).unwrap();
        assert_eq!(value["authentication"], "abc");
    }

    #[test]
    fn set_scene_request_shape() {
        let value = serde_json::to_value(Request::set_scene(7, "Scene 2")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "requestType": "SetCurrentProgramScene",
                "requestId": "7",
                "requestData": {"sceneName": "Scene 2"}
            })
        );
    }

    #[test]
    fn request_response_parses_status() {
        let json = r#"{
            "requestType": "SetCurrentProgramScene",
            "requestId": "3",
            "requestStatus": {"result": false, "code": 600, "comment": "No source was found"}
        }"#;
        let resp: RequestResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.request_status.result);
        assert_eq!(resp.request_status.code, 600);
        assert_eq!(resp.request_id, "3");
    }
}
