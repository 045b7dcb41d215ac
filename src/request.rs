//! Typed requests
//!
//! Each registry operation has its own request struct. Payloads are decoded
//! into a [`Request`] (tagged by `op`), validated, and only then dispatched to
//! exactly one [`RegistryStore`] call. Unknown or missing fields are decode
//! errors, never silently defaulted.

use serde::{Deserialize, Serialize};

use crate::entity::{AddResult, ModelView, RegistryStats, UserView};
use crate::storage::RegistryStore;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddRoleRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddTaskRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddEventRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddUserRequest {
    pub username: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddModelRequest {
    pub model: String,
    pub task: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddModelVersionRequest {
    pub model: String,
    pub version: String,
    pub creator: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddUserLogRequest {
    pub username: String,
    pub event: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetUserRequest {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetModelRequest {
    pub model: String,
    pub version: String,
}

/// One registry operation with its parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    AddRole(AddRoleRequest),
    AddTask(AddTaskRequest),
    AddEvent(AddEventRequest),
    AddUser(AddUserRequest),
    AddModel(AddModelRequest),
    AddModelVersion(AddModelVersionRequest),
    AddUserLog(AddUserLogRequest),
    GetUser(GetUserRequest),
    GetModel(GetModelRequest),
    Stats,
}

impl Request {
    /// Operation name as it appears in the `op` tag
    pub fn op(&self) -> &'static str {
        match self {
            Request::AddRole(_) => "add_role",
            Request::AddTask(_) => "add_task",
            Request::AddEvent(_) => "add_event",
            Request::AddUser(_) => "add_user",
            Request::AddModel(_) => "add_model",
            Request::AddModelVersion(_) => "add_model_version",
            Request::AddUserLog(_) => "add_user_log",
            Request::GetUser(_) => "get_user",
            Request::GetModel(_) => "get_model",
            Request::Stats => "stats",
        }
    }

    /// Reject blank parameters before touching storage
    pub fn validate(&self) -> Result<()> {
        match self {
            Request::AddRole(r) => require("name", &r.name),
            Request::AddTask(r) => require("name", &r.name),
            Request::AddEvent(r) => require("name", &r.name),
            Request::AddUser(r) => {
                require("username", &r.username)?;
                require("role", &r.role)
            }
            Request::AddModel(r) => {
                require("model", &r.model)?;
                require("task", &r.task)
            }
            Request::AddModelVersion(r) => {
                require("model", &r.model)?;
                require("version", &r.version)?;
                require("creator", &r.creator)
            }
            Request::AddUserLog(r) => {
                require("username", &r.username)?;
                require("event", &r.event)
            }
            Request::GetUser(r) => require("username", &r.username),
            Request::GetModel(r) => {
                require("model", &r.model)?;
                require("version", &r.version)
            }
            Request::Stats => Ok(()),
        }
    }

    /// Decode a JSON payload into a request and validate it
    pub fn from_json(payload: &str) -> Result<Self> {
        let request: Request = serde_json::from_str(payload)
            .map_err(|e| Error::InvalidRequest(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidRequest(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Successful result of a dispatched request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Added(AddResult),
    User(UserView),
    Model(ModelView),
    Stats(RegistryStats),
}

/// Error payload for transports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

impl From<&Error> for ErrorResponse {
    fn from(err: &Error) -> Self {
        Self {
            error: err.to_string(),
            kind: err.code(),
        }
    }
}

/// Validate `request` and run it against `store`
pub fn dispatch(store: &RegistryStore, request: Request) -> Result<Response> {
    request.validate()?;
    tracing::debug!("dispatching {}", request.op());

    let response = match request {
        Request::AddRole(r) => Response::Added(store.add_role(&r.name)?),
        Request::AddTask(r) => Response::Added(store.add_task(&r.name)?),
        Request::AddEvent(r) => Response::Added(store.add_event(&r.name)?),
        Request::AddUser(r) => Response::Added(store.add_user(&r.username, &r.role)?),
        Request::AddModel(r) => Response::Added(store.add_model(&r.model, &r.task)?),
        Request::AddModelVersion(r) => {
            Response::Added(store.add_model_version(&r.model, &r.version, &r.creator)?)
        }
        Request::AddUserLog(r) => Response::Added(store.add_user_log(&r.username, &r.event)?),
        Request::GetUser(r) => Response::User(store.get_user(&r.username)?),
        Request::GetModel(r) => Response::Model(store.get_model(&r.model, &r.version)?),
        Request::Stats => Response::Stats(store.stats()?),
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Outcome;

    #[test]
    fn test_decode_tagged_request() {
        let req = Request::from_json(r#"{"op":"add_user","username":"alice","role":"admin"}"#).unwrap();
        assert_eq!(
            req,
            Request::AddUser(AddUserRequest { username: "alice".into(), role: "admin".into() })
        );

        let req = Request::from_json(r#"{"op":"stats"}"#).unwrap();
        assert_eq!(req, Request::Stats);
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        // missing field
        assert!(Request::from_json(r#"{"op":"add_user","username":"alice"}"#).is_err());
        // unknown field
        assert!(Request::from_json(r#"{"op":"add_role","name":"a","extra":1}"#).is_err());
        // unknown op
        assert!(Request::from_json(r#"{"op":"train","name":"a"}"#).is_err());
        // blank value
        let err = Request::from_json(r#"{"op":"add_task","name":"  "}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn test_dispatch_runs_one_operation() {
        let store = RegistryStore::open_in_memory().unwrap();

        let res = dispatch(&store, Request::AddRole(AddRoleRequest { name: "admin".into() })).unwrap();
        match res {
            Response::Added(added) => assert_eq!(added.outcome, Outcome::Created),
            other => panic!("unexpected response: {:?}", other),
        }

        dispatch(
            &store,
            Request::AddUser(AddUserRequest { username: "alice".into(), role: "admin".into() }),
        )
        .unwrap();

        let res = dispatch(&store, Request::GetUser(GetUserRequest { username: "alice".into() })).unwrap();
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json, serde_json::json!({"username": "alice", "role": "admin"}));
    }

    #[test]
    fn test_dispatch_validates_before_storage() {
        let store = RegistryStore::open_in_memory().unwrap();

        let err = dispatch(&store, Request::AddRole(AddRoleRequest { name: String::new() })).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert_eq!(store.stats().unwrap().roles, 0);
    }

    #[test]
    fn test_error_response_kinds() {
        let store = RegistryStore::open_in_memory().unwrap();
        store.add_task("cv").unwrap();
        store.add_model("resnet", "cv").unwrap();

        let missing_model = dispatch(
            &store,
            Request::GetModel(GetModelRequest { model: "ghost".into(), version: "v1".into() }),
        )
        .unwrap_err();
        let missing_version = dispatch(
            &store,
            Request::GetModel(GetModelRequest { model: "resnet".into(), version: "v2".into() }),
        )
        .unwrap_err();

        assert_eq!(ErrorResponse::from(&missing_model).kind, "not_found");
        assert_eq!(ErrorResponse::from(&missing_version).kind, "version_not_found");
    }
}
