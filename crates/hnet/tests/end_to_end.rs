//! Full sessions over real sockets: handshake, descriptors as the server
//! sees them, blocking calls, pipelined calls with arbitrarily split
//! responses, and handshake failure.

use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use hnet::codec::{to_bytes, TypeDesc};
use hnet::session::{Binding, Request, ServerSession, SessionConfig, SessionError};
use hnet::transport::connect_tcp;
use proptest::prelude::*;

hnet::wire_record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Order {
        pub symbol: String,
        pub qty: u32,
        pub side: Side,
    }
}

hnet::wire_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Side {
        Buy = 0,
        Sell = 1,
    }
}

hnet::wire_variant! {
    #[derive(Debug, Clone, PartialEq)]
    pub enum Fill {
        Done(u64),
        Rejected(String),
    }
}

hnet::net_client! {
    #[derive(Debug)]
    struct Exchange {
        fn submit(order: Order) -> Fill = "submit";
        fn echo(lines: Vec<String>) -> Vec<String> = "id";
        fn ping() = "ping";
    }
}

hnet::async_net_client! {
    struct AsyncEcho {
        fn echo(lines: Vec<String>) -> Vec<String> = "id";
    }
}

fn listen() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    (listener, port)
}

/// Serve one session: record definitions, answer `submit` and `id`.
/// Results of `id` are written in pieces of at most `chunk` bytes.
fn exchange_server(stream: TcpStream, chunk: usize) -> Vec<Binding> {
    stream.set_nodelay(true).expect("nodelay");
    let mut session = ServerSession::accept(stream, &SessionConfig::default()).expect("accept");
    let mut defined = Vec::new();
    while let Some(request) = session.next_request().expect("request") {
        match request {
            Request::Define(binding) => {
                defined.push(binding.clone());
                session.accept_define(binding).expect("accept define");
            }
            Request::Invoke { id } => {
                let expr = session.binding(id).expect("known id").expr.clone();
                match expr.as_str() {
                    "submit" => {
                        let (order,): (Order,) = session.read_args().expect("args");
                        let fill = if order.qty == 0 {
                            Fill::Rejected(format!("empty order for {}", order.symbol))
                        } else {
                            Fill::Done(u64::from(order.qty) * 100)
                        };
                        session.write_result(&fill).expect("result");
                    }
                    "id" => {
                        let (lines,): (Vec<String>,) = session.read_args().expect("args");
                        let bytes = to_bytes(&lines).expect("encode");
                        let out = session.get_mut();
                        for piece in bytes.chunks(chunk.max(1)) {
                            out.write_all(piece).expect("write");
                            out.flush().expect("flush");
                        }
                    }
                    "ping" => {
                        let () = session.read_args().expect("args");
                    }
                    other => panic!("unexpected expression {other}"),
                }
            }
        }
    }
    defined
}

#[test]
fn blocking_session_over_tcp() {
    let (listener, port) = listen();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        exchange_server(stream, 64)
    });

    let mut exchange =
        Exchange::connect(connect_tcp("127.0.0.1", port).expect("connect")).expect("handshake");
    let order = Order {
        symbol: "ACME".into(),
        qty: 3,
        side: Side::Sell,
    };
    assert_eq!(exchange.submit(order.clone()).expect("submit"), Fill::Done(300));
    assert_eq!(
        exchange
            .submit(Order { qty: 0, ..order })
            .expect("submit"),
        Fill::Rejected("empty order for ACME".into())
    );
    exchange.ping().expect("ping");
    assert_eq!(
        exchange.echo(vec![String::new(), "x".into()]).expect("echo"),
        vec![String::new(), "x".to_string()]
    );
    drop(exchange);

    let defined = server.join().expect("server thread");
    let ids: Vec<u32> = defined.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let submit = &defined[0];
    assert_eq!(
        submit.input_type().expect("input").to_string(),
        "({symbol:[char], qty:int, side:|Buy:unit, Sell:unit|})"
    );
    assert_eq!(
        submit.output_type().expect("output").to_string(),
        "|Done:long, Rejected:[char]|"
    );
    assert_eq!(defined[2].output_type().expect("output"), TypeDesc::unit());
}

#[test]
fn rejected_definition_fails_the_connect() {
    let (listener, port) = listen();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut session =
            ServerSession::accept(stream, &SessionConfig::default()).expect("accept");
        match session.next_request().expect("request") {
            Some(Request::Define(binding)) => {
                session
                    .reject_define(&format!("cannot typecheck {}", binding.expr))
                    .expect("reject");
            }
            other => panic!("unexpected request: {other:?}"),
        }
        session.next_request().expect("after rejection")
    });

    let err = Exchange::connect(connect_tcp("127.0.0.1", port).expect("connect")).unwrap_err();
    assert_eq!(server.join().expect("server thread"), None);

    assert!(matches!(err, SessionError::DefineRejected { id: 1, .. }));
    assert_eq!(
        err.to_string(),
        "while trying to define 'submit' with id=1: cannot typecheck submit"
    );
}

#[test]
fn version_mismatch_is_seen_by_the_server() {
    let (listener, port) = listen();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        ServerSession::accept(stream, &SessionConfig::default()).map(|_| ())
    });

    let config = SessionConfig {
        protocol_version: 0x0002_0000,
        ..SessionConfig::default()
    };
    let conn = connect_tcp("127.0.0.1", port).expect("connect");
    let client = Exchange::connect_with_config(conn, config);

    let server_result = server.join().expect("server thread");
    assert!(matches!(
        server_result,
        Err(SessionError::VersionMismatch {
            got: 0x0002_0000,
            ..
        })
    ));
    assert!(client.is_err());
}

fn pipelined_echo(batches: Vec<Vec<String>>, chunk: usize) -> Vec<Vec<String>> {
    let (listener, port) = listen();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        exchange_server(stream, chunk)
    });

    let mut echo =
        AsyncEcho::connect(connect_tcp("127.0.0.1", port).expect("connect")).expect("handshake");
    let got = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    for batch in batches {
        let got = got.clone();
        echo.echo(batch, move |lines| got.borrow_mut().push(lines))
            .expect("call");
    }

    let deadline = Instant::now() + Duration::from_secs(10);
    while echo.pending_requests() > 0 {
        if echo.drive().expect("drive") == 0 {
            assert!(Instant::now() < deadline, "results did not arrive in time");
            thread::sleep(Duration::from_micros(200));
        }
    }
    drop(echo);
    server.join().expect("server thread");

    std::rc::Rc::try_unwrap(got)
        .expect("sole owner")
        .into_inner()
}

#[test]
fn pipelined_results_arrive_in_call_order() {
    let batches = vec![
        vec!["a".to_string()],
        vec![],
        vec!["b".to_string(), "c".to_string()],
    ];
    assert_eq!(pipelined_echo(batches.clone(), 1), batches);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn pipelined_results_survive_any_split(
        batches in prop::collection::vec(
            prop::collection::vec("[a-z]{0,12}", 0..4),
            1..6,
        ),
        chunk in 1usize..32,
    ) {
        prop_assert_eq!(pipelined_echo(batches.clone(), chunk), batches);
    }
}
