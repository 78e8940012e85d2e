//! Development server for calcboard
//!
//! Serves the static page (and the wasm-pack bundle under `static/pkg/`)
//! plus an in-memory stand-in for the calculator API, so the board can be
//! tried without the real orchestrator. Submitted tasks are stored and
//! listed back "In Process"; nothing is evaluated.
//!
//! Usage: `serve [port] [static-root]`

use calcboard::task::{Submission, Task, TaskId, TaskStatus};
use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tiny_http::{Header, Method, Request, Response, Server};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ROOT: &str = "static";

type HttpResponse = Response<std::io::Cursor<Vec<u8>>>;

/// Tasks accepted so far, in submission order
#[derive(Default)]
struct Store {
    tasks: Vec<Task>,
}

impl Store {
    fn add(&mut self, submission: Submission) -> Result<(), u16> {
        let expression = submission.expression.trim();
        // A bare number is not an expression
        if expression.is_empty() || expression.parse::<f64>().is_ok() {
            return Err(422);
        }
        if self.tasks.iter().any(|t| t.id == TaskId(submission.id)) {
            return Err(400);
        }
        self.tasks.push(Task {
            id: TaskId(submission.id),
            status: TaskStatus::from("In Process"),
            original_expression: submission.expression,
            result: None,
        });
        Ok(())
    }
}

fn main() {
    let mut args = std::env::args().skip(1);
    let port = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let root = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_ROOT.to_string()));

    let addr = format!("0.0.0.0:{}", port);
    let server = match Server::http(&addr) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Failed to start server on {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    println!("calcboard dev server");
    println!("  http://localhost:{}  (serving {})", port, root.display());

    let mut store = Store::default();
    for mut request in server.incoming_requests() {
        let response = route(&mut request, &mut store, &root);
        let _ = request.respond(response);
    }
}

fn route(request: &mut Request, store: &mut Store, root: &Path) -> HttpResponse {
    let path = request.url().split('?').next().unwrap_or("/").to_string();
    let method = request.method().clone();

    match (&method, path.as_str()) {
        (Method::Get, "/api/v1/expressions") => match serde_json::to_vec(&store.tasks) {
            Ok(body) => json(200, body),
            Err(_) => text(500, "Internal Server Error"),
        },
        (Method::Post, "/api/v1/calculate") => calculate(request, store),
        (_, "/api/v1/expressions") | (_, "/api/v1/calculate") => text(400, "Bad Request"),
        // No sessions here, so nobody is logged in
        (Method::Get, "/user") => text(401, "Unauthorized"),
        (Method::Get, _) => serve_file(root, &path),
        _ => text(405, "Method Not Allowed"),
    }
}

fn calculate(request: &mut Request, store: &mut Store) -> HttpResponse {
    let is_json = request.headers().iter().any(|h| {
        h.field.equiv("Content-Type") && h.value.as_str().starts_with("application/json")
    });
    if !is_json {
        return text(422, "Bad Request");
    }

    let mut body = String::new();
    if request.as_reader().read_to_string(&mut body).is_err() {
        return text(500, "Internal server error");
    }
    let submission: Submission = match serde_json::from_str(&body) {
        Ok(s) => s,
        Err(_) => return text(500, "Internal server error"),
    };

    match store.add(submission) {
        Ok(()) => json(202, b"{}".to_vec()),
        Err(status) => text(status, "Bad Request"),
    }
}

fn serve_file(root: &Path, url_path: &str) -> HttpResponse {
    let relative = if url_path == "/" {
        "index.html"
    } else {
        url_path.trim_start_matches('/')
    };
    let relative = Path::new(relative);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return text(404, "404 Not Found");
    }

    let path = root.join(relative);
    match fs::read(&path) {
        Ok(contents) => with_type(Response::from_data(contents), mime_type(&path)),
        Err(_) => text(404, "404 Not Found"),
    }
}

fn json(status: u16, body: Vec<u8>) -> HttpResponse {
    with_type(Response::from_data(body).with_status_code(status), "application/json")
}

fn text(status: u16, body: &str) -> HttpResponse {
    with_type(
        Response::from_data(body.as_bytes().to_vec()).with_status_code(status),
        "text/plain",
    )
}

fn with_type(response: HttpResponse, mime: &str) -> HttpResponse {
    match Header::from_bytes("Content-Type", mime) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

fn mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "application/javascript",
        Some("wasm") => "application/wasm",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
