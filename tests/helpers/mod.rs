/// Test helpers and fixtures for request handler tests
///
/// Provides a scripted in-memory `ItemClient`, a journaling middleware and
/// the `Cat` fixture used across the integration tests. Nothing here talks
/// to a live DynamoDB.
pub mod fixtures;

pub use dynamo_request::{
    CancellationToken, Error, HandlerOptions, Item, ItemClient, KeyPart, Middleware, Next,
    OnTable, Request, RequestContext, RequestHandler, Response, TableAccess,
};
pub use fixtures::{Cat, cats_by_home_table, cats_table};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::delete_item::{DeleteItemInput, DeleteItemOutput};
use aws_sdk_dynamodb::operation::get_item::{GetItemInput, GetItemOutput};
use aws_sdk_dynamodb::operation::put_item::{PutItemInput, PutItemOutput};
use aws_sdk_dynamodb::operation::query::{QueryInput, QueryOutput};
use aws_sdk_dynamodb::operation::update_item::{UpdateItemInput, UpdateItemOutput};

/// Shared, ordered record of pipeline events
pub type Journal = Arc<Mutex<Vec<String>>>;

/// Create an empty journal
#[allow(dead_code)]
pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

/// Snapshot a journal's entries
#[allow(dead_code)]
pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// In-memory `ItemClient` that replays scripted responses in order
#[derive(Debug, Default)]
pub struct MockClient {
    responses: Mutex<VecDeque<Result<Response, Error>>>,
    requests: Mutex<Vec<Request>>,
    journal: Option<Journal>,
    delay: Option<Duration>,
}

#[allow(dead_code)]
impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a `network-call` entry in `journal` on every call
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Hold every call for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful response
    pub fn respond(self, response: Response) -> Self {
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    /// Queue a failure
    pub fn fail(self, error: Error) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of calls received
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn next(&self, request: Request) -> Result<Response, Error> {
        if let Some(journal) = &self.journal {
            journal.lock().unwrap().push("network-call".to_string());
        }
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Client("no scripted response left".to_string())))
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

macro_rules! scripted {
    ($self:ident, $request:expr, $variant:ident) => {{
        let result = $self.next($request);
        $self.pause().await;
        match result? {
            Response::$variant(output) => Ok(output),
            other => Err(Error::Client(format!(
                "scripted {} response for a {} call",
                other.operation_name(),
                stringify!($variant)
            ))),
        }
    }};
}

#[async_trait]
impl ItemClient for MockClient {
    async fn get_item(&self, input: GetItemInput) -> Result<GetItemOutput, Error> {
        scripted!(self, Request::Get(input), Get)
    }

    async fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput, Error> {
        scripted!(self, Request::Put(input), Put)
    }

    async fn update_item(&self, input: UpdateItemInput) -> Result<UpdateItemOutput, Error> {
        scripted!(self, Request::Update(input), Update)
    }

    async fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, Error> {
        scripted!(self, Request::Delete(input), Delete)
    }

    async fn query(&self, input: QueryInput) -> Result<QueryOutput, Error> {
        scripted!(self, Request::Query(input), Query)
    }
}

/// Middleware that journals `<name>-enter` and `<name>-exit` around the call
#[derive(Debug, Clone)]
pub struct Recorder {
    name: &'static str,
    journal: Journal,
}

#[allow(dead_code)]
impl Recorder {
    pub fn new(name: &'static str, journal: &Journal) -> Self {
        Self {
            name,
            journal: Arc::clone(journal),
        }
    }
}

#[async_trait]
impl Middleware for Recorder {
    async fn invoke(&self, context: RequestContext, next: Next) -> Result<Response, Error> {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}-enter", self.name));
        let result = next.run(context).await;
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}-exit", self.name));
        result
    }
}

/// Wrap a `MockClient` for handler options while keeping a handle for assertions
#[allow(dead_code)]
pub fn shared(client: MockClient) -> (Arc<MockClient>, Arc<dyn ItemClient>) {
    let client = Arc::new(client);
    let dyn_client: Arc<dyn ItemClient> = client.clone();
    (client, dyn_client)
}
