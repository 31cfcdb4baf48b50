//! HTTP front for the sync endpoints.
//!
//! A fixed pool of worker threads pulls from one shared listener; each
//! request decodes, dispatches, and responds to completion. Responses
//! carry a permissive CORS header because the clients are browser-based
//! editors, and `OPTIONS` preflight is answered for every route.

use std::io::Read;
use std::sync::Arc;
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{debug, error, info, warn};

use diffsync_core::ShadowStore;
use diffsync_protocol::{
    DeleteRequest, DeleteResponse, JsonMessage, PatchRequest, PatchResponse, RegisterRequest,
    RegisterResponse, RootRequest, RootResponse,
};
use diffsync_store::{DocumentStore, NamespaceStore};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::RequestHandler;

pub(crate) fn serve<D, S>(config: &ServerConfig, handler: RequestHandler<D, S>) -> ServerResult<()>
where
    D: DocumentStore + NamespaceStore + 'static,
    S: ShadowStore + 'static,
{
    let server =
        Server::http(config.bind_addr).map_err(|err| ServerError::Http(err.to_string()))?;
    let server = Arc::new(server);
    info!(
        addr = %config.bind_addr,
        workers = config.worker_threads,
        "sync server listening"
    );

    let mut workers = Vec::new();
    for _ in 0..config.worker_threads {
        let server = Arc::clone(&server);
        let handler = handler.clone();
        workers.push(std::thread::spawn(move || worker_loop(&server, &handler)));
    }
    for worker in workers {
        if worker.join().is_err() {
            return Err(ServerError::Http("worker thread panicked".into()));
        }
    }
    Ok(())
}

fn worker_loop<D, S>(server: &Server, handler: &RequestHandler<D, S>)
where
    D: DocumentStore + NamespaceStore,
    S: ShadowStore,
{
    loop {
        match server.recv() {
            Ok(request) => handle_request(handler, request),
            Err(err) => {
                error!(%err, "listener closed");
                break;
            }
        }
    }
}

fn handle_request<D, S>(handler: &RequestHandler<D, S>, mut request: Request)
where
    D: DocumentStore + NamespaceStore,
    S: ShadowStore,
{
    let method = request.method().clone();
    let url = request.url().to_string();
    debug!(?method, %url, "incoming request");

    if method == Method::Options {
        respond(request, 204, String::new());
        return;
    }
    if method != Method::Post {
        respond(request, 405, r#"{"status":405,"content":"Method not allowed"}"#.into());
        return;
    }

    let mut body = String::new();
    if request.as_reader().read_to_string(&mut body).is_err() {
        respond(request, 400, r#"{"status":400,"content":"Unreadable body"}"#.into());
        return;
    }

    let path = url.split('?').next().unwrap_or("");
    let (status, payload) = route(handler, path, &body);
    respond(request, status, payload);
}

fn route<D, S>(handler: &RequestHandler<D, S>, path: &str, body: &str) -> (u16, String)
where
    D: DocumentStore + NamespaceStore,
    S: ShadowStore,
{
    match path {
        "/v1/register" => register_endpoint(handler, body),
        "/v1/patch" => patch_endpoint(handler, body),
        "/v1/root" => root_endpoint(handler, body),
        "/v1/delete" => delete_endpoint(handler, body),
        _ => (404, r#"{"status":404,"content":"No such endpoint"}"#.into()),
    }
}

fn register_endpoint<D, S>(handler: &RequestHandler<D, S>, body: &str) -> (u16, String)
where
    D: DocumentStore + NamespaceStore,
    S: ShadowStore,
{
    let request = match RegisterRequest::from_json(body) {
        Ok(request) => request,
        Err(err) => {
            let resp = RegisterResponse::error(400, &err.to_string(), None);
            return (400, encode(&resp));
        }
    };
    match handler.handle_register(&request) {
        Ok(resp) => (resp.status, encode(&resp)),
        Err(err) => {
            let status = log_failure("register", &err);
            (
                status,
                encode(&RegisterResponse::error(status, failure_message(status), None)),
            )
        }
    }
}

fn patch_endpoint<D, S>(handler: &RequestHandler<D, S>, body: &str) -> (u16, String)
where
    D: DocumentStore + NamespaceStore,
    S: ShadowStore,
{
    let request = match PatchRequest::from_json(body) {
        Ok(request) => request,
        Err(err) => return (400, encode(&PatchResponse::error(400, &err.to_string()))),
    };
    match handler.handle_patch(&request) {
        Ok(resp) => (resp.status, encode(&resp)),
        Err(err) => {
            let status = log_failure("patch", &err);
            (
                status,
                encode(&PatchResponse::error(status, failure_message(status))),
            )
        }
    }
}

fn root_endpoint<D, S>(handler: &RequestHandler<D, S>, body: &str) -> (u16, String)
where
    D: DocumentStore + NamespaceStore,
    S: ShadowStore,
{
    let request = match RootRequest::from_json(body) {
        Ok(request) => request,
        Err(err) => {
            let resp = RegisterResponse::error(400, &err.to_string(), None);
            return (400, encode(&resp));
        }
    };
    match handler.handle_root(&request) {
        Ok(resp) => (resp.status, encode(&resp)),
        Err(err) => {
            let status = log_failure("root", &err);
            (
                status,
                encode(&RegisterResponse::error(status, failure_message(status), None)),
            )
        }
    }
}

fn delete_endpoint<D, S>(handler: &RequestHandler<D, S>, body: &str) -> (u16, String)
where
    D: DocumentStore + NamespaceStore,
    S: ShadowStore,
{
    let request = match DeleteRequest::from_json(body) {
        Ok(request) => request,
        Err(err) => return (400, encode(&DeleteResponse::error(400, &err.to_string()))),
    };
    match handler.handle_delete(&request) {
        Ok(resp) => (resp.status, encode(&resp)),
        Err(err) => {
            let status = log_failure("delete", &err);
            (
                status,
                encode(&DeleteResponse::error(status, failure_message(status))),
            )
        }
    }
}

fn encode<M: JsonMessage>(message: &M) -> String {
    message.to_json().unwrap_or_else(|_| "{}".into())
}

/// Logs a handler failure and returns the status to answer with. The
/// response body gets a generic message; the detail stays in the logs.
fn log_failure(endpoint: &str, err: &ServerError) -> u16 {
    if err.is_client_error() {
        warn!(endpoint, %err, "request rejected");
    } else {
        error!(endpoint, %err, "request failed");
    }
    err.status_code()
}

fn failure_message(status: u16) -> &'static str {
    if status == 400 {
        "Invalid request"
    } else {
        "Internal server error"
    }
}

fn respond(request: Request, status: u16, payload: String) {
    let mut response = Response::from_string(payload).with_status_code(status);
    for header in default_headers() {
        response = response.with_header(header);
    }
    if let Err(err) = request.respond(response) {
        debug!(%err, "client hung up before the response");
    }
}

fn default_headers() -> Vec<Header> {
    [
        ("Content-Type", "application/json"),
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Methods", "POST, OPTIONS"),
        ("Access-Control-Allow-Headers", "Content-Type"),
    ]
    .iter()
    .filter_map(|(name, value)| Header::from_bytes(name.as_bytes(), value.as_bytes()).ok())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use diffsync_core::{checksum, DeltaCodec, MemoryShadowStore, SyncEngine};
    use diffsync_store::MemoryStore;
    use std::sync::Arc;

    fn handler() -> RequestHandler<MemoryStore, MemoryShadowStore> {
        let engine = SyncEngine::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryShadowStore::new()),
        );
        RequestHandler::new(Arc::new(engine))
    }

    #[test]
    fn unknown_route_is_404() {
        let handler = handler();
        let (status, body) = route(&handler, "/v1/ghost", "{}");
        assert_eq!(status, 404);
        assert!(body.contains("404"));
    }

    #[test]
    fn register_route_decodes_and_dispatches() {
        let handler = handler();
        let (status, body) = route(
            &handler,
            "/v1/register",
            r#"{"path": "a.txt", "userId": "u1", "content": "hello"}"#,
        );
        assert_eq!(status, 200);
        let resp = RegisterResponse::from_json(&body).unwrap();
        assert_eq!(resp.content.as_deref(), Some("hello"));
    }

    #[test]
    fn missing_field_is_400_with_message() {
        let handler = handler();
        let (status, body) = route(&handler, "/v1/patch", r#"{"path": "a.txt"}"#);
        assert_eq!(status, 400);
        let resp = PatchResponse::from_json(&body).unwrap();
        assert_eq!(resp.status, 400);
        assert!(resp.content.unwrap().contains("malformed request"));
    }

    #[test]
    fn full_patch_flow_over_routes() {
        let handler = handler();
        route(
            &handler,
            "/v1/register",
            r#"{"path": "a.txt", "userId": "u1", "content": "hello"}"#,
        );

        let block = DeltaCodec::new().diff("hello", "hello world").unwrap();
        let request = PatchRequest {
            path: "a.txt".into(),
            checksum: checksum("hello"),
            patch: block,
            user_id: "u1".into(),
            secret_key: "s".into(),
            root: None,
        };
        let (status, body) = route(&handler, "/v1/patch", &request.to_json().unwrap());
        assert_eq!(status, 200);

        let resp = PatchResponse::from_json(&body).unwrap();
        assert!(resp.patch.is_empty());
        assert_eq!(resp.checksum, checksum("hello"));
    }

    #[test]
    fn traversal_path_is_client_error() {
        let handler = handler();
        let (status, _body) = route(
            &handler,
            "/v1/register",
            r#"{"path": "../escape.txt", "userId": "u1", "content": "x"}"#,
        );
        assert_eq!(status, 400);
    }
}
