//! Calculator server and clients in one process.
//!
//! A server thread listens on a local TCP port and evaluates a fixed set of
//! expressions. The blocking client calls them one at a time, then the
//! pipelining client sends a burst of calls and drives the results in.
//!
//! Run with:
//!   cargo run --example calculator --features logging

use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use hnet::logging::{init_logging, LogFormat, LogLevel};
use hnet::session::{Request, ServerSession, SessionConfig};

hnet::wire_record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Point {
        pub x: f64,
        pub y: f64,
    }
}

hnet::wire_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Op {
        Add = 0,
        Mul = 1,
    }
}

hnet::net_client! {
    pub struct Calc {
        fn apply(op: Op, x: i64, y: i64) -> i64 = "\\op x y.apply op x y";
        fn centroid(points: Vec<Point>) -> Point = "centroid";
        fn note(text: String) = "putStrLn";
    }
}

hnet::async_net_client! {
    pub struct PipelinedCalc {
        fn apply(op: Op, x: i64, y: i64) -> i64 = "\\op x y.apply op x y";
    }
}

fn serve(stream: TcpStream) -> hnet::session::Result<()> {
    let mut session = ServerSession::accept(stream, &SessionConfig::default())?;
    while let Some(request) = session.next_request()? {
        let id = match request {
            Request::Define(binding) => {
                eprintln!(
                    "server: define #{} {} :: {} -> {}",
                    binding.id,
                    binding.expr,
                    binding.input_type()?,
                    binding.output_type()?
                );
                session.accept_define(binding)?;
                continue;
            }
            Request::Invoke { id } => id,
        };

        let expr = match session.binding(id) {
            Some(binding) => binding.expr.clone(),
            None => return Err(hnet::session::SessionError::UnknownBinding(id)),
        };
        match expr.as_str() {
            "centroid" => {
                let (points,): (Vec<Point>,) = session.read_args()?;
                let n = points.len().max(1) as f64;
                let sum = points.iter().fold(Point { x: 0.0, y: 0.0 }, |acc, p| Point {
                    x: acc.x + p.x,
                    y: acc.y + p.y,
                });
                session.write_result(&Point {
                    x: sum.x / n,
                    y: sum.y / n,
                })?;
            }
            "putStrLn" => {
                let (text,): (String,) = session.read_args()?;
                eprintln!("server: {text}");
            }
            _ => {
                let (op, x, y): (Op, i64, i64) = session.read_args()?;
                let out = match op {
                    Op::Add => x + y,
                    Op::Mul => x * y,
                };
                session.write_result(&out)?;
            }
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LogFormat::Text, LogLevel::Debug);

    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    eprintln!("listening on {addr}");

    let server = thread::spawn(move || {
        for stream in listener.incoming().take(2) {
            match stream {
                Ok(stream) => {
                    if let Err(e) = serve(stream) {
                        eprintln!("server: session ended: {e}");
                    }
                }
                Err(e) => eprintln!("server: accept failed: {e}"),
            }
        }
    });

    let hostport = addr.to_string();
    {
        let mut calc = Calc::connect_hostport(&hostport)?;
        println!("2 + 3 = {}", calc.apply(Op::Add, 2, 3)?);
        println!("6 * 7 = {}", calc.apply(Op::Mul, 6, 7)?);
        let c = calc.centroid(vec![
            Point { x: 0.0, y: 0.0 },
            Point { x: 4.0, y: 0.0 },
            Point { x: 2.0, y: 3.0 },
        ])?;
        println!("centroid = ({}, {})", c.x, c.y);
        calc.note("blocking client done".to_string())?;
    }

    let mut calc = PipelinedCalc::connect_hostport(&hostport)?;
    for n in 1..=5 {
        calc.apply(Op::Mul, n, n, move |sq| println!("{n}^2 = {sq}"))?;
    }
    while calc.pending_requests() > 0 {
        if calc.drive()? == 0 {
            thread::sleep(Duration::from_millis(1));
        }
    }
    drop(calc);

    let _ = server.join();
    Ok(())
}
