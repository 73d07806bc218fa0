//! Shared harness for pipeline specs

#![allow(dead_code)]

pub use mw4s_core::{Config, Endpoint, Message};
pub use mw4s_roles::{ProtocolError, Sink, Source, Worker};
pub use mw4s_transport::{RepSocket, ReqSocket};
pub use serde_json::{json, Value};
pub use std::thread;
pub use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub const RETRY: Duration = Duration::from_millis(10);

/// Config with no sink linger and a fast connect retry
pub fn config(source: Endpoint, sink: Endpoint) -> Config {
    Config::new(source, sink)
        .with_close_grace(Duration::ZERO)
        .with_reconnect_interval(RETRY)
}

/// A bound source and sink, and the config that reaches both
pub struct Pipeline<T, R> {
    pub source: Source<T>,
    pub sink: Sink<R>,
    pub config: Config,
}

impl<T, R> Pipeline<T, R>
where
    T: Serialize + DeserializeOwned + Send + 'static,
    R: Serialize + DeserializeOwned + Send + 'static,
{
    /// Bind both ends on OS-assigned local ports
    pub fn bind() -> Self {
        let sink = Sink::bind(&config(
            Endpoint::any_local_port(),
            Endpoint::any_local_port(),
        ))
        .unwrap();
        let source =
            Source::bind(&config(Endpoint::any_local_port(), sink.endpoint().clone())).unwrap();
        let config = config(source.endpoint().clone(), sink.endpoint().clone());
        Self {
            source,
            sink,
            config,
        }
    }

    /// Hand out `tasks` to `workers` workers that each apply `work`, and
    /// collect everything the sink yields.
    ///
    /// Every worker has joined before the first task is taken, so none of
    /// them can miss the drain.
    pub fn run<F>(self, tasks: Vec<T>, workers: usize, work: F) -> Run<R>
    where
        F: Fn(T) -> R + Clone + Send + 'static,
    {
        assert!(
            workers == 0 || !tasks.is_empty(),
            "workers can only be joined while the source is handing out tasks"
        );
        let Pipeline {
            mut source,
            mut sink,
            config,
        } = self;

        let sink = thread::spawn(move || {
            let results: Result<Vec<R>, ProtocolError> = (&mut sink).collect();
            sink.close();
            results
        });
        let source = thread::spawn(move || {
            for task in tasks {
                source.send(task)?;
            }
            source.close()?;
            Ok::<_, ProtocolError>(source.workers())
        });

        // The source is blocked handing out the first task, so it serves
        // each join in turn
        let joined: Vec<Worker<T, R>> = (0..workers)
            .map(|_| Worker::join(&config).unwrap())
            .collect();

        let workers: Vec<_> = joined
            .into_iter()
            .map(|worker| {
                let work = work.clone();
                thread::spawn(move || work_until_done(worker, work))
            })
            .collect();

        let handled = workers
            .into_iter()
            .map(|w| w.join().unwrap().unwrap())
            .collect();
        let workers_left = source.join().unwrap().unwrap();
        let results = sink.join().unwrap().unwrap();

        Run {
            results,
            handled,
            workers_left,
        }
    }
}

/// What a finished pipeline produced
pub struct Run<R> {
    /// Results in the order the sink yielded them
    pub results: Vec<R>,
    /// Tasks handled per worker
    pub handled: Vec<usize>,
    /// Workers still registered at the source after it closed
    pub workers_left: usize,
}

/// Process tasks until the source runs dry, then deregister
pub fn work_until_done<T, R, F>(mut worker: Worker<T, R>, work: F) -> Result<usize, ProtocolError>
where
    T: DeserializeOwned,
    R: Serialize,
    F: Fn(T) -> R,
{
    let mut handled = 0;
    while let Some(task) = worker.next_task()? {
        worker.send(work(task))?;
        handled += 1;
    }
    worker.close()?;
    Ok(handled)
}

/// Send one message over a raw request socket and decode the reply
pub fn request(req: &mut ReqSocket, msg: &Message<Value>) -> Message<Value> {
    req.request_message(msg).unwrap()
}
