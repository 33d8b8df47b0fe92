use std::time::{Duration, Instant};

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::get_item::GetItemOutput;
use aws_sdk_dynamodb::operation::put_item::{PutItemInput, PutItemOutput};
use dynamo_request::{GetRequestHandler, RequestLogger, SerdeMarshaller};

mod helpers;
use helpers::*;

fn found(cat: &Cat) -> Response {
    Response::Get(GetItemOutput::builder().set_item(Some(cat.item())).build())
}

fn get_handler<F>(client: MockClient, configure: F) -> GetRequestHandler<SerdeMarshaller<Cat>>
where
    F: FnOnce(&mut HandlerOptions),
{
    let (_, dyn_client) = shared(client);
    cats_table()
        .with_client(dyn_client)
        .to_get_request_handler(
            |table| {
                table.to_get_request_builder_by_keys(
                    KeyPart::by_ref(|cat: &Cat| &cat.id),
                    KeyPart::by_ref(|cat: &Cat| &cat.home_id),
                )
            },
            configure,
        )
        .unwrap()
}

/// Forwards a freshly built context instead of the one it received
#[derive(Debug)]
struct ContextSwapper;

#[async_trait]
impl Middleware for ContextSwapper {
    async fn invoke(&self, context: RequestContext, next: Next) -> Result<Response, Error> {
        let replacement = RequestContext::new(
            context.request().clone(),
            context.cancellation_token().clone(),
        );
        next.run(replacement).await
    }
}

/// Replaces the request with one of another operation
#[derive(Debug)]
struct RequestSwapper;

#[async_trait]
impl Middleware for RequestSwapper {
    async fn invoke(&self, mut context: RequestContext, next: Next) -> Result<Response, Error> {
        let put = PutItemInput::builder()
            .table_name("Cats")
            .build()
            .map_err(Error::from)?;
        *context.request_mut() = Request::Put(put);
        next.run(context).await
    }
}

/// Answers without calling the rest of the pipeline
#[derive(Debug)]
struct ShortCircuit(Response);

#[async_trait]
impl Middleware for ShortCircuit {
    async fn invoke(&self, _context: RequestContext, _next: Next) -> Result<Response, Error> {
        Ok(self.0.clone())
    }
}

/// Renames the table before forwarding
#[derive(Debug)]
struct TableRenamer;

#[async_trait]
impl Middleware for TableRenamer {
    async fn invoke(&self, mut context: RequestContext, next: Next) -> Result<Response, Error> {
        if let Request::Get(input) = context.request_mut() {
            input.table_name = Some("CatsArchive".to_string());
        }
        next.run(context).await
    }
}

#[tokio::test]
async fn test_middleware_runs_in_registration_order() {
    let journal = journal();
    let cat = Cat::new("Tom", 9.5);

    let handler = get_handler(
        MockClient::new()
            .with_journal(journal.clone())
            .respond(found(&cat)),
        |options| {
            options
                .add_middleware(Recorder::new("A", &journal))
                .add_middleware(Recorder::new("B", &journal))
                .add_middleware(Recorder::new("C", &journal));
        },
    );

    let got = handler.send(&cat, &CancellationToken::new()).await.unwrap();
    assert_eq!(got, Some(cat));
    assert_eq!(
        entries(&journal),
        vec![
            "A-enter",
            "B-enter",
            "C-enter",
            "network-call",
            "C-exit",
            "B-exit",
            "A-exit"
        ]
    );
}

#[tokio::test]
async fn test_forwarding_a_different_context_is_rejected() {
    let journal = journal();
    let cat = Cat::new("Tom", 9.5);

    let handler = get_handler(
        MockClient::new()
            .with_journal(journal.clone())
            .respond(found(&cat)),
        |options| {
            options.add_middleware(ContextSwapper);
        },
    );

    let error = handler
        .send(&cat, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(error, Error::InvalidOperation(_)));
    assert!(entries(&journal).is_empty());
}

#[tokio::test]
async fn test_replacing_the_request_kind_is_rejected() {
    let cat = Cat::new("Tom", 9.5);
    let handler = get_handler(MockClient::new().respond(found(&cat)), |options| {
        options.add_middleware(RequestSwapper);
    });

    let error = handler
        .send(&cat, &CancellationToken::new())
        .await
        .unwrap_err();
    match error {
        Error::InvalidOperation(message) => assert!(message.contains("PutItem")),
        other => panic!("expected an invalid operation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_mismatched_response_is_rejected() {
    let cat = Cat::new("Tom", 9.5);
    let handler = get_handler(MockClient::new(), |options| {
        options.add_middleware(ShortCircuit(Response::Put(PutItemOutput::builder().build())));
    });

    let error = handler
        .send(&cat, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(error, Error::InvalidOperation(_)));
}

#[tokio::test]
async fn test_middleware_may_answer_without_network_call() {
    let journal = journal();
    let cat = Cat::new("Tom", 9.5);

    let handler = get_handler(MockClient::new().with_journal(journal.clone()), |options| {
        options
            .add_middleware(Recorder::new("outer", &journal))
            .add_middleware(ShortCircuit(found(&cat)));
    });

    let got = handler.send(&cat, &CancellationToken::new()).await.unwrap();
    assert_eq!(got, Some(cat));
    assert_eq!(entries(&journal), vec!["outer-enter", "outer-exit"]);
}

#[tokio::test]
async fn test_middleware_may_edit_the_request() {
    let cat = Cat::new("Tom", 9.5);
    let (client, dyn_client) = shared(MockClient::new().respond(found(&cat)));

    let handler = cats_table()
        .to_get_request_handler(
            |table| {
                table.to_get_request_builder_by_keys(
                    KeyPart::by_ref(|cat: &Cat| &cat.id),
                    KeyPart::by_ref(|cat: &Cat| &cat.home_id),
                )
            },
            |options| {
                options
                    .with_client(dyn_client)
                    .add_middleware(TableRenamer)
                    .add_middleware(RequestLogger::new().with_values(true));
            },
        )
        .unwrap();

    let _ = handler.send(&cat, &CancellationToken::new()).await.unwrap();
    assert_eq!(
        client.requests()[0].table_name(),
        Some("CatsArchive")
    );
}

#[tokio::test]
async fn test_cancelled_token_skips_network_call() {
    let journal = journal();
    let cat = Cat::new("Tom", 9.5);
    let cancellation = CancellationToken::new();
    cancellation.cancel();

    let with_middleware = get_handler(
        MockClient::new()
            .with_journal(journal.clone())
            .respond(found(&cat)),
        |options| {
            options.add_middleware(Recorder::new("A", &journal));
        },
    );
    let error = with_middleware.send(&cat, &cancellation).await.unwrap_err();
    assert!(error.is_cancelled());
    assert_eq!(entries(&journal), vec!["A-enter", "A-exit"]);

    let direct = get_handler(
        MockClient::new()
            .with_journal(journal.clone())
            .respond(found(&cat)),
        |_| {},
    );
    let error = direct.send(&cat, &cancellation).await.unwrap_err();
    assert!(error.is_cancelled());
    assert!(!entries(&journal).contains(&"network-call".to_string()));
}

#[tokio::test]
async fn test_cancellation_aborts_call_in_flight() {
    let journal = journal();
    let cat = Cat::new("Tom", 9.5);
    let cancellation = CancellationToken::new();

    let handler = get_handler(
        MockClient::new()
            .with_journal(journal.clone())
            .with_delay(Duration::from_secs(5))
            .respond(found(&cat)),
        |options| {
            options
                .add_middleware(Recorder::new("A", &journal))
                .add_middleware(Recorder::new("B", &journal));
        },
    );

    let canceller = cancellation.clone();
    let cancelled = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let error = handler.send(&cat, &cancellation).await.unwrap_err();
    cancelled.await.unwrap();

    assert!(error.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(
        entries(&journal),
        vec!["A-enter", "B-enter", "network-call", "B-exit", "A-exit"]
    );
}

#[tokio::test]
async fn test_client_error_propagates_through_middleware() {
    let journal = journal();
    let cat = Cat::new("Tom", 9.5);

    let handler = get_handler(
        MockClient::new()
            .with_journal(journal.clone())
            .fail(Error::Client("socket closed".to_string())),
        |options| {
            options
                .add_middleware(Recorder::new("A", &journal))
                .add_middleware(RequestLogger::new());
        },
    );

    let error = handler
        .send(&cat, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(error.is_transport_error());
    assert_eq!(
        entries(&journal),
        vec!["A-enter", "network-call", "A-exit"]
    );
}
