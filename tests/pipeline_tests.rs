use http::Method;
use std::sync::{Arc, Mutex};

use pipewright::errors::PipelineError;
use pipewright::middleware::{Middleware, MiddlewarePipeline, Next};
use pipewright::request::{HeaderVec, Request};
use pipewright::response::{ErrorHandler, LogErrorHandler, Response};
use serde_json::{json, Value};

type Log = Arc<Mutex<Vec<String>>>;

struct Recording {
    label: &'static str,
    log: Log,
}

impl Middleware for Recording {
    fn handle(&self, request: Request, next: Next<'_>) -> anyhow::Result<Response> {
        self.log.lock().unwrap().push(format!("{}-before", self.label));
        let response = next.run(request);
        self.log.lock().unwrap().push(format!("{}-after", self.label));
        Ok(response)
    }
}

struct ShortCircuit;

impl Middleware for ShortCircuit {
    fn handle(&self, _request: Request, _next: Next<'_>) -> anyhow::Result<Response> {
        Ok(Response::new(403, HeaderVec::new(), json!("blocked")))
    }
}

struct Failing;

impl Middleware for Failing {
    fn handle(&self, _request: Request, _next: Next<'_>) -> anyhow::Result<Response> {
        Err(anyhow::anyhow!("stage blew up"))
    }
}

fn recording_handler(log: Log) -> impl Fn(Request) -> anyhow::Result<Response> + Send + Sync {
    move |_req| {
        log.lock().unwrap().push("HANDLER".to_string());
        Ok(Response::new(200, HeaderVec::new(), Value::Null))
    }
}

#[test]
fn test_onion_order() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let stack: Vec<Arc<dyn Middleware>> = vec![
        Arc::new(Recording {
            label: "A",
            log: Arc::clone(&log),
        }),
        Arc::new(Recording {
            label: "B",
            log: Arc::clone(&log),
        }),
    ];
    let handler = recording_handler(Arc::clone(&log));
    let mut pipeline = MiddlewarePipeline::new(Arc::new(LogErrorHandler))
        .send(Request::new(Method::GET, "/"))
        .through(stack);
    let response = pipeline.then(&handler).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["A-before", "B-before", "HANDLER", "B-after", "A-after"]
    );
}

#[test]
fn test_short_circuit_skips_deeper_stages() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let stack: Vec<Arc<dyn Middleware>> = vec![
        Arc::new(Recording {
            label: "A",
            log: Arc::clone(&log),
        }),
        Arc::new(ShortCircuit),
        Arc::new(Recording {
            label: "C",
            log: Arc::clone(&log),
        }),
    ];
    let handler = recording_handler(Arc::clone(&log));
    let mut pipeline = MiddlewarePipeline::new(Arc::new(LogErrorHandler))
        .send(Request::new(Method::GET, "/"))
        .through(stack);
    let response = pipeline.then(&handler).unwrap();
    assert_eq!(response.status, 403);
    // C and the handler never ran, but A's post-processing did.
    assert_eq!(*log.lock().unwrap(), vec!["A-before", "A-after"]);
}

#[test]
fn test_failing_stage_is_contained_in_place() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let stack: Vec<Arc<dyn Middleware>> = vec![
        Arc::new(Recording {
            label: "A",
            log: Arc::clone(&log),
        }),
        Arc::new(Failing),
    ];
    let handler = recording_handler(Arc::clone(&log));
    let mut pipeline = MiddlewarePipeline::new(Arc::new(LogErrorHandler))
        .send(Request::new(Method::GET, "/"))
        .through(stack);
    let response = pipeline.then(&handler).unwrap();
    // The failure became a response at the failing stage and flowed back
    // out through A.
    assert_eq!(response.status, 500);
    assert_eq!(*log.lock().unwrap(), vec!["A-before", "A-after"]);
}

#[test]
fn test_failing_terminal_handler_is_contained() {
    let failing_handler =
        |_req: Request| -> anyhow::Result<Response> { Err(anyhow::anyhow!("handler blew up")) };
    let mut pipeline = MiddlewarePipeline::new(Arc::new(LogErrorHandler))
        .send(Request::new(Method::GET, "/"));
    let response = pipeline.then(&failing_handler).unwrap();
    assert_eq!(response.status, 500);
}

struct TeapotErrors;

impl ErrorHandler for TeapotErrors {
    fn to_response(&self, error: &anyhow::Error, _request: &Request) -> Response {
        Response::new(418, HeaderVec::new(), json!(error.to_string()))
    }
}

#[test]
fn test_custom_error_handler_shapes_the_contained_response() {
    let stack: Vec<Arc<dyn Middleware>> = vec![Arc::new(Failing)];
    let handler = |_req: Request| -> anyhow::Result<Response> {
        Ok(Response::new(200, HeaderVec::new(), Value::Null))
    };
    let mut pipeline = MiddlewarePipeline::new(Arc::new(TeapotErrors))
        .send(Request::new(Method::GET, "/"))
        .through(stack);
    let response = pipeline.then(&handler).unwrap();
    assert_eq!(response.status, 418);
    assert_eq!(response.body, json!("stage blew up"));
}

#[test]
fn test_pipeline_is_single_use() {
    let handler = |_req: Request| -> anyhow::Result<Response> {
        Ok(Response::new(200, HeaderVec::new(), Value::Null))
    };
    let mut pipeline = MiddlewarePipeline::new(Arc::new(LogErrorHandler))
        .send(Request::new(Method::GET, "/"));
    assert!(pipeline.then(&handler).is_ok());
    assert_eq!(pipeline.then(&handler), Err(PipelineError::Exhausted));

    // Resending a request rearms it.
    let mut pipeline = pipeline.send(Request::new(Method::GET, "/again"));
    assert!(pipeline.then(&handler).is_ok());
}

#[test]
fn test_middleware_attributes_reach_the_handler() {
    struct Tagging;
    impl Middleware for Tagging {
        fn handle(&self, mut request: Request, next: Next<'_>) -> anyhow::Result<Response> {
            request.set_attribute("tenant", json!("acme"));
            Ok(next.run(request))
        }
    }

    let handler = |req: Request| -> anyhow::Result<Response> {
        Ok(Response::new(
            200,
            HeaderVec::new(),
            req.attribute("tenant").cloned().unwrap_or(Value::Null),
        ))
    };
    let stack: Vec<Arc<dyn Middleware>> = vec![Arc::new(Tagging)];
    let mut pipeline = MiddlewarePipeline::new(Arc::new(LogErrorHandler))
        .send(Request::new(Method::GET, "/"))
        .through(stack);
    let response = pipeline.then(&handler).unwrap();
    assert_eq!(response.body, json!("acme"));
}
